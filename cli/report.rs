//! This module renders the text the cli prints for each command.

use eda_dataframe::DataFrame;
use eda_stats::{FrequencyTable, SummaryStats};
use eda_util::table::Table;

pub fn info(dataframe: &DataFrame) -> String {
	let counts = dataframe.column_type_counts();
	let rows: Vec<Vec<String>> = dataframe
		.view()
		.columns
		.iter()
		.map(|column| {
			vec![
				column.name().to_owned(),
				column.column_type().to_string(),
				column.valid_count().to_string(),
			]
		})
		.collect();
	format!(
		"Rows: {}\nColumns: {}\nInteger: {}, Float: {}, DateTime: {}, Text: {}\n\n{}",
		dataframe.nrows(),
		dataframe.ncols(),
		counts.integer,
		counts.float,
		counts.datetime,
		counts.text,
		Table::new(&["Column", "Type", "Values"], &rows),
	)
}

/// A blank line follows the frequency table so that consecutive columns are separated.
pub fn describe(name: &str, stats: &SummaryStats, table: &FrequencyTable) -> String {
	let stats_rows: Vec<Vec<String>> = stats
		.iter()
		.map(|(name, value)| vec![name.to_owned(), value.to_string()])
		.collect();
	let frequency_rows: Vec<Vec<String>> = table
		.bins
		.iter()
		.map(|bin| vec![bin.label.clone(), bin.count.to_string()])
		.collect();
	format!(
		"Column: {}\n\n{}\n{}\n",
		name,
		Table::new(&["Statistic", "Value"], &stats_rows),
		Table::new(&["Bin", "Count"], &frequency_rows),
	)
}

#[test]
fn test_info() {
	let csv = "x,label\n1,a\n2,\n";
	let dataframe = DataFrame::from_reader(
		csv.as_bytes(),
		eda_dataframe::FileFormat::Csv,
		eda_dataframe::LoadOptions::default(),
	)
	.unwrap();
	insta::assert_snapshot!(info(&dataframe), @r###"
 Rows: 2
 Columns: 3
 Integer: 2, Float: 0, DateTime: 0, Text: 1

 | Column | Type    | Values |
 |--------|---------|--------|
 | Sample | integer | 2      |
 | x      | integer | 2      |
 | label  | text    | 1      |
 "###);
}

#[test]
fn test_describe() {
	let column = eda_dataframe::Column::Text(eda_dataframe::TextColumn {
		name: "letter".to_owned(),
		data: vec![Some("b".to_owned()), Some("a".to_owned()), Some("b".to_owned())],
	});
	let stats = eda_stats::compute_summary_stats(column.view()).unwrap();
	let table = eda_stats::compute_frequency_table(column.view()).unwrap();
	insta::assert_snapshot!(describe("letter", &stats, &table), @r###"
 Column: letter

 | Statistic | Value |
 |-----------|-------|
 | Unique    | 2     |
 | Mode      | b     |
 | Minimum   | a     |
 | Maximum   | b     |

 | Bin | Count |
 |-----|-------|
 | b   | 2     |
 | a   | 1     |
 "###);
}
