use super::*;
use anyhow::{bail, Context, Result};
use std::{io::Write, path::Path};

impl DataFrame {
	/// Write the dataframe to `path`. The delimiter is chosen from the extension: tabs for `.tsv`, spaces for `.txt` and commas otherwise. Missing values are written as empty fields, or as `NaN` in whitespace delimited files.
	pub fn to_path(&self, path: &Path) -> Result<()> {
		let format = FileFormat::from_path(path).unwrap_or(FileFormat::Csv);
		let file = std::fs::File::create(path)
			.with_context(|| format!("failed to create \"{}\"", path.display()))?;
		self.to_writer(file, format)?;
		log::info!("saved {} rows to \"{}\"", self.nrows(), path.display());
		Ok(())
	}

	/// Write the dataframe to `writer`. Whitespace delimited files cannot quote fields, so a header or text value containing whitespace is an error, and datetimes are written as `2020-01-02T03:04:05`.
	pub fn to_writer<W>(&self, writer: W, format: FileFormat) -> Result<()>
	where
		W: Write,
	{
		let delimiter = match format {
			FileFormat::Csv => b',',
			FileFormat::Tsv => b'\t',
			FileFormat::Whitespace => b' ',
		};
		let quote_style = match format {
			FileFormat::Whitespace => csv::QuoteStyle::Never,
			_ => csv::QuoteStyle::Necessary,
		};
		let mut writer = csv::WriterBuilder::new()
			.delimiter(delimiter)
			.quote_style(quote_style)
			.from_writer(writer);
		let column_names = self.column_names();
		if format == FileFormat::Whitespace {
			if let Some(name) = column_names.iter().find(|name| has_whitespace(name)) {
				bail!(
					"column name \"{}\" contains whitespace and cannot be written to a whitespace delimited file",
					name
				);
			}
		}
		writer.write_record(&column_names)?;
		let view = self.view();
		let mut record = Vec::with_capacity(self.ncols());
		for index in 0..self.nrows() {
			record.clear();
			for column in view.columns.iter() {
				let value = match format {
					FileFormat::Whitespace => whitespace_field(column, index)?,
					_ => column.format_value(index),
				};
				record.push(value);
			}
			writer.write_record(&record)?;
		}
		writer.flush()?;
		Ok(())
	}
}

const WHITESPACE_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

fn whitespace_field(column: &ColumnView, index: usize) -> Result<String> {
	let value = match column {
		ColumnView::DateTime(column) => column.data[index]
			.map(|value| value.format(WHITESPACE_DATETIME_FORMAT).to_string())
			.unwrap_or_default(),
		_ => column.format_value(index),
	};
	// Runs of whitespace collapse when read back, so missing values need a marker.
	if value.is_empty() {
		return Ok("NaN".to_owned());
	}
	if has_whitespace(&value) {
		bail!(
			"value \"{}\" in column \"{}\" contains whitespace and cannot be written to a whitespace delimited file",
			value,
			column.name()
		);
	}
	Ok(value)
}

fn has_whitespace(value: &str) -> bool {
	value.chars().any(char::is_whitespace)
}

#[test]
fn test_to_writer() {
	let csv = "x,y,label\n1,2.5,a b\n2,,c\n";
	let df = DataFrame::from_reader(std::io::Cursor::new(csv), FileFormat::Csv, LoadOptions::default())
		.unwrap();
	let mut output = Vec::new();
	df.to_writer(&mut output, FileFormat::Csv).unwrap();
	let output = String::from_utf8(output).unwrap();
	assert_eq!(output, "Sample,x,y,label\n0,1,2.5,a b\n1,2,,c\n");
	let mut output = Vec::new();
	df.to_writer(&mut output, FileFormat::Tsv).unwrap();
	let output = String::from_utf8(output).unwrap();
	assert_eq!(output, "Sample\tx\ty\tlabel\n0\t1\t2.5\ta b\n1\t2\t\tc\n");
}

#[test]
fn test_whitespace_round_trip() {
	let csv = "x,label,when\n1,a,2020-01-02 03:04:05\n2,,\n";
	let mut column_types = std::collections::BTreeMap::new();
	column_types.insert("when".to_owned(), ColumnType::DateTime);
	let options = LoadOptions {
		column_types: Some(column_types.clone()),
		insert_sample_column: false,
		..Default::default()
	};
	let df = DataFrame::from_reader(std::io::Cursor::new(csv), FileFormat::Csv, options).unwrap();
	let mut output = Vec::new();
	df.to_writer(&mut output, FileFormat::Whitespace).unwrap();
	let text = String::from_utf8(output).unwrap();
	assert_eq!(text, "x label when\n1 a 2020-01-02T03:04:05\n2 NaN NaN\n");
	let options = LoadOptions {
		column_types: Some(column_types),
		insert_sample_column: false,
		..Default::default()
	};
	let reloaded =
		DataFrame::from_reader(std::io::Cursor::new(text), FileFormat::Whitespace, options).unwrap();
	assert_eq!(reloaded, df);
}

#[test]
fn test_whitespace_in_values_is_an_error() {
	let csv = "x,label\n1,a b\n2,c\n";
	let df = DataFrame::from_reader(std::io::Cursor::new(csv), FileFormat::Csv, LoadOptions::default())
		.unwrap();
	let mut output = Vec::new();
	let error = df.to_writer(&mut output, FileFormat::Whitespace).unwrap_err();
	assert!(error.to_string().contains("\"a b\""));
	let csv = "first name\nada\n";
	let df = DataFrame::from_reader(std::io::Cursor::new(csv), FileFormat::Csv, LoadOptions::default())
		.unwrap();
	let mut output = Vec::new();
	assert!(df.to_writer(&mut output, FileFormat::Whitespace).is_err());
}
