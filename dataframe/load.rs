use super::*;
use anyhow::{bail, Context, Result};
use std::{
	collections::{BTreeMap, BTreeSet},
	io::{BufRead, BufReader, Read},
	path::Path,
};

/// This is the name of the row index column that is prepended to every loaded dataframe.
pub const SAMPLE_COLUMN_NAME: &str = "Sample";

/// These values are the default values that are considered missing.
pub const DEFAULT_INVALID_VALUES: &[&str] = &[
	"", "null", "NULL", "n/a", "N/A", "nan", "-nan", "NaN", "-NaN", "?",
];

#[derive(Clone, Debug)]
pub struct LoadOptions<'a> {
	/// Columns named here skip type inference and are loaded with the given type.
	pub column_types: Option<BTreeMap<String, ColumnType>>,
	pub invalid_values: &'a [&'a str],
	/// If true, an integer column named `Sample` holding the row index is inserted before the first column.
	pub insert_sample_column: bool,
}

impl<'a> Default for LoadOptions<'a> {
	fn default() -> Self {
		Self {
			column_types: None,
			invalid_values: DEFAULT_INVALID_VALUES,
			insert_sample_column: true,
		}
	}
}

/// The file format determines how a line of the file is split into fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileFormat {
	/// Comma separated values, `.csv`.
	Csv,
	/// Tab separated values, `.tsv`.
	Tsv,
	/// Fields separated by runs of whitespace, `.txt`.
	Whitespace,
}

impl FileFormat {
	pub fn from_path(path: &Path) -> Result<Self> {
		let extension = path
			.extension()
			.and_then(|extension| extension.to_str())
			.map(|extension| extension.to_lowercase());
		match extension.as_deref() {
			Some("csv") => Ok(FileFormat::Csv),
			Some("tsv") => Ok(FileFormat::Tsv),
			Some("txt") => Ok(FileFormat::Whitespace),
			_ => bail!(
				"unsupported file extension for \"{}\", expected .csv, .tsv or .txt",
				path.display()
			),
		}
	}
}

impl DataFrame {
	pub fn from_path(path: &Path, options: LoadOptions) -> Result<Self> {
		let format = FileFormat::from_path(path)?;
		let file = std::fs::File::open(path)
			.with_context(|| format!("failed to open \"{}\"", path.display()))?;
		let dataframe = Self::from_reader(file, format, options)
			.with_context(|| format!("failed to load \"{}\"", path.display()))?;
		log::info!(
			"data loaded with {} rows and {} columns",
			dataframe.nrows(),
			dataframe.ncols()
		);
		Ok(dataframe)
	}

	pub fn from_reader<R>(reader: R, format: FileFormat, options: LoadOptions) -> Result<Self>
	where
		R: Read,
	{
		let (column_names, records) = match format {
			FileFormat::Csv => read_delimited(reader, b',')?,
			FileFormat::Tsv => read_delimited(reader, b'\t')?,
			FileFormat::Whitespace => read_whitespace(reader)?,
		};
		let mut seen = BTreeSet::new();
		for column_name in column_names.iter() {
			if !seen.insert(column_name.as_str()) {
				bail!("duplicate column name \"{}\"", column_name);
			}
		}
		let LoadOptions {
			column_types,
			invalid_values,
			insert_sample_column,
		} = options;

		// Use the column types present in the options and infer the rest.
		let column_types: Vec<ColumnType> = column_names
			.iter()
			.enumerate()
			.map(|(index, column_name)| {
				if let Some(column_type) = column_types
					.as_ref()
					.and_then(|column_types| column_types.get(column_name))
				{
					return *column_type;
				}
				let mut infer_stats = InferStats::new(invalid_values);
				for record in records.iter() {
					infer_stats.update(record.get(index).unwrap_or(""));
				}
				infer_stats.finalize()
			})
			.collect();
		for (column_name, column_type) in column_names.iter().zip(column_types.iter()) {
			log::debug!("column \"{}\" has type {}", column_name, column_type);
		}

		let mut dataframe = Self::new(column_names, column_types);
		let n_rows = records.len();
		let mut n_unparsed = vec![0usize; dataframe.ncols()];
		for column in dataframe.columns.iter_mut() {
			match column {
				Column::Unknown(_) => {}
				Column::Number(column) => column.data.reserve_exact(n_rows),
				Column::DateTime(column) => column.data.reserve_exact(n_rows),
				Column::Text(column) => column.data.reserve_exact(n_rows),
			}
		}
		for record in records.iter() {
			for ((column, value), n_unparsed) in dataframe
				.columns
				.iter_mut()
				.zip(record.iter())
				.zip(n_unparsed.iter_mut())
			{
				let value = value.trim();
				let is_invalid = invalid_values.contains(&value);
				match column {
					Column::Unknown(column) => {
						column.len += 1;
					}
					Column::Number(column) => {
						let value = if is_invalid {
							f64::NAN
						} else {
							match parse_number(value) {
								Some(value) if column.kind == NumberKind::Integer => value.trunc(),
								Some(value) => value,
								None => {
									*n_unparsed += 1;
									f64::NAN
								}
							}
						};
						column.data.push(value);
					}
					Column::DateTime(column) => {
						let value = if is_invalid {
							None
						} else {
							let value = parse_datetime(value);
							if value.is_none() {
								*n_unparsed += 1;
							}
							value
						};
						column.data.push(value);
					}
					Column::Text(column) => {
						let value = if is_invalid {
							None
						} else {
							Some(value.to_owned())
						};
						column.data.push(value);
					}
				}
			}
		}
		for (column, n_unparsed) in dataframe.columns.iter().zip(n_unparsed) {
			if n_unparsed > 0 {
				log::warn!(
					"{} values in column \"{}\" could not be parsed as {} and were treated as missing",
					n_unparsed,
					column.name(),
					column.column_type(),
				);
			}
		}

		if insert_sample_column {
			if dataframe.column_index(SAMPLE_COLUMN_NAME).is_some() {
				bail!(
					"cannot insert column \"{}\", it already exists",
					SAMPLE_COLUMN_NAME
				);
			}
			let sample = NumberColumn {
				name: SAMPLE_COLUMN_NAME.to_owned(),
				kind: NumberKind::Integer,
				data: (0..n_rows).map(|index| index as f64).collect(),
			};
			dataframe.columns.insert(0, Column::Number(sample));
		}
		Ok(dataframe)
	}
}

fn read_delimited<R>(reader: R, delimiter: u8) -> Result<(Vec<String>, Vec<csv::StringRecord>)>
where
	R: Read,
{
	let mut reader = csv::ReaderBuilder::new()
		.delimiter(delimiter)
		.from_reader(reader);
	let column_names: Vec<String> = reader
		.headers()?
		.into_iter()
		.map(|column_name| column_name.trim().to_owned())
		.collect();
	let records = reader.records().collect::<Result<Vec<_>, _>>()?;
	Ok((column_names, records))
}

fn read_whitespace<R>(reader: R) -> Result<(Vec<String>, Vec<csv::StringRecord>)>
where
	R: Read,
{
	let mut column_names = None;
	let mut records = Vec::new();
	for (index, line) in BufReader::new(reader).lines().enumerate() {
		let line = line?;
		let fields: Vec<&str> = line.split_whitespace().collect();
		if fields.is_empty() {
			continue;
		}
		match column_names.as_ref() {
			None => {
				column_names = Some(fields.iter().map(|field| (*field).to_owned()).collect::<Vec<_>>());
			}
			Some(column_names) => {
				if fields.len() != column_names.len() {
					bail!(
						"line {} has {} fields, but the header has {}",
						index + 1,
						fields.len(),
						column_names.len()
					);
				}
				records.push(csv::StringRecord::from(fields));
			}
		}
	}
	match column_names {
		Some(column_names) => Ok((column_names, records)),
		None => bail!("the file is empty"),
	}
}

pub(crate) fn parse_number(value: &str) -> Option<f64> {
	lexical::parse::<f64, _>(value)
		.ok()
		.filter(|value| value.is_finite())
}

pub(crate) fn parse_integer(value: &str) -> Option<i64> {
	lexical::parse::<i64, _>(value).ok()
}

#[derive(Clone, Debug)]
struct InferStats<'a> {
	invalid_values: &'a [&'a str],
	column_type: InferColumnType,
	has_missing_values: bool,
}

#[derive(PartialEq, Clone, Copy, Debug)]
enum InferColumnType {
	Unknown,
	Integer,
	Float,
	Text,
}

impl<'a> InferStats<'a> {
	fn new(invalid_values: &'a [&'a str]) -> Self {
		Self {
			invalid_values,
			column_type: InferColumnType::Unknown,
			has_missing_values: false,
		}
	}

	fn update(&mut self, value: &str) {
		let value = value.trim();
		if self.invalid_values.contains(&value) {
			self.has_missing_values = true;
			return;
		}
		match self.column_type {
			InferColumnType::Unknown | InferColumnType::Integer => {
				if parse_integer(value).is_some() {
					self.column_type = InferColumnType::Integer;
				} else if parse_number(value).is_some() {
					self.column_type = InferColumnType::Float;
				} else {
					self.column_type = InferColumnType::Text;
				}
			}
			InferColumnType::Float => {
				if parse_number(value).is_none() {
					self.column_type = InferColumnType::Text;
				}
			}
			InferColumnType::Text => {}
		}
	}

	fn finalize(self) -> ColumnType {
		match self.column_type {
			InferColumnType::Unknown => ColumnType::Unknown,
			// Integer columns cannot hold missing values, so they become float columns.
			InferColumnType::Integer if self.has_missing_values => ColumnType::Float,
			InferColumnType::Integer => ColumnType::Integer,
			InferColumnType::Float => ColumnType::Float,
			InferColumnType::Text => ColumnType::Text,
		}
	}
}

#[test]
fn test_infer() {
	let csv = "number,float,text\n1,1.5,hello\n2,,world\n";
	let df = DataFrame::from_reader(
		std::io::Cursor::new(csv),
		FileFormat::Csv,
		LoadOptions {
			insert_sample_column: false,
			..Default::default()
		},
	)
	.unwrap();
	insta::assert_debug_snapshot!(df, @r###"
 DataFrame {
     columns: [
         Number(
             NumberColumn {
                 name: "number",
                 kind: Integer,
                 data: [
                     1.0,
                     2.0,
                 ],
             },
         ),
         Number(
             NumberColumn {
                 name: "float",
                 kind: Float,
                 data: [
                     1.5,
                     NaN,
                 ],
             },
         ),
         Text(
             TextColumn {
                 name: "text",
                 data: [
                     Some(
                         "hello",
                     ),
                     Some(
                         "world",
                     ),
                 ],
             },
         ),
     ],
 }
 "###);
}

#[test]
fn test_missing_value_markers() {
	let tsv = "a\tb\tc\n1\t?\t1\nNA\t\t\n3\t\t3\n";
	let df = DataFrame::from_reader(
		std::io::Cursor::new(tsv),
		FileFormat::Tsv,
		LoadOptions {
			insert_sample_column: false,
			..Default::default()
		},
	)
	.unwrap();
	// "NA" is not a missing value marker, so the column is text.
	assert_eq!(df.columns[0].column_type(), ColumnType::Text);
	assert_eq!(df.columns[1].column_type(), ColumnType::Unknown);
	// Integer columns with missing values are loaded as floats.
	assert_eq!(df.columns[2].column_type(), ColumnType::Float);
	assert!(df.columns[2].as_number().unwrap().data[1].is_nan());
	assert_eq!(df.nrows(), 3);
}

#[test]
fn test_whitespace_and_sample_column() {
	let txt = "x    y\n1  2.5\n\n2   3.5\n";
	let df = DataFrame::from_reader(std::io::Cursor::new(txt), FileFormat::Whitespace, LoadOptions::default())
		.unwrap();
	assert_eq!(df.column_names(), vec!["Sample", "x", "y"]);
	assert_eq!(df.columns[0].as_number().unwrap().data, vec![0.0, 1.0]);
	assert_eq!(df.columns[0].column_type(), ColumnType::Integer);
	assert_eq!(df.columns[2].as_number().unwrap().data, vec![2.5, 3.5]);
}

#[test]
fn test_existing_sample_column_is_an_error() {
	let csv = "Sample,x\n1,2\n";
	let result = DataFrame::from_reader(std::io::Cursor::new(csv), FileFormat::Csv, LoadOptions::default());
	assert!(result.is_err());
}

#[test]
fn test_ragged_rows_are_an_error() {
	let txt = "x y\n1 2 3\n";
	let result = DataFrame::from_reader(std::io::Cursor::new(txt), FileFormat::Whitespace, LoadOptions::default());
	assert!(result.is_err());
	let csv = "x,y\n1,2,3\n";
	let result = DataFrame::from_reader(std::io::Cursor::new(csv), FileFormat::Csv, LoadOptions::default());
	assert!(result.is_err());
}

#[test]
fn test_column_types() {
	let csv = "when,code\n2020-01-02,1\n2021-03-04 05:06:07,2\n";
	let mut column_types = BTreeMap::new();
	column_types.insert("when".to_owned(), ColumnType::DateTime);
	column_types.insert("code".to_owned(), ColumnType::Text);
	let df = DataFrame::from_reader(
		std::io::Cursor::new(csv),
		FileFormat::Csv,
		LoadOptions {
			column_types: Some(column_types),
			insert_sample_column: false,
			..Default::default()
		},
	)
	.unwrap();
	let when = df.columns[0].as_datetime().unwrap();
	assert_eq!(
		when.data[1].unwrap().format(DATETIME_FORMAT).to_string(),
		"2021-03-04 05:06:07"
	);
	let code = df.columns[1].as_text().unwrap();
	assert_eq!(code.data, vec![Some("1".to_owned()), Some("2".to_owned())]);
}

#[test]
fn test_file_format_from_path() {
	assert_eq!(FileFormat::from_path(Path::new("a.CSV")).unwrap(), FileFormat::Csv);
	assert_eq!(FileFormat::from_path(Path::new("a.tsv")).unwrap(), FileFormat::Tsv);
	assert_eq!(FileFormat::from_path(Path::new("a.txt")).unwrap(), FileFormat::Whitespace);
	assert!(FileFormat::from_path(Path::new("a.xlsx")).is_err());
}
