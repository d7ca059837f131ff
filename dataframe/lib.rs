/*!
This crate provides a basic implementation of dataframes, which are two dimensional arrays of data where each column can have a different data type, like a spreadsheet. It implements only what exploratory analysis needs: loading delimited text files, retyping and renaming columns, and writing the result back out.

Missing values are stored in place. Number columns use `NaN`, and datetime and text columns use `None`.
*/

use chrono::NaiveDateTime;

pub mod convert;
pub mod load;
pub mod save;

pub use self::convert::*;
pub use self::load::*;
pub use self::save::*;

/// This is the format used to render datetime values as text.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq)]
pub struct DataFrame {
	pub columns: Vec<Column>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataFrameView<'a> {
	pub columns: Vec<ColumnView<'a>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Column {
	Unknown(UnknownColumn),
	Number(NumberColumn),
	DateTime(DateTimeColumn),
	Text(TextColumn),
}

/// An unknown column is one in which every value is missing.
#[derive(Debug, Clone, PartialEq)]
pub struct UnknownColumn {
	pub name: String,
	pub len: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumberColumn {
	pub name: String,
	pub kind: NumberKind,
	pub data: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DateTimeColumn {
	pub name: String,
	pub data: Vec<Option<NaiveDateTime>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextColumn {
	pub name: String,
	pub data: Vec<Option<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnView<'a> {
	Unknown(UnknownColumnView<'a>),
	Number(NumberColumnView<'a>),
	DateTime(DateTimeColumnView<'a>),
	Text(TextColumnView<'a>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnknownColumnView<'a> {
	pub name: &'a str,
	pub len: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumberColumnView<'a> {
	pub name: &'a str,
	pub kind: NumberKind,
	pub data: &'a [f64],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DateTimeColumnView<'a> {
	pub name: &'a str,
	pub data: &'a [Option<NaiveDateTime>],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextColumnView<'a> {
	pub name: &'a str,
	pub data: &'a [Option<String>],
}

/// Number columns remember whether they hold integers so they can be displayed and saved without a fractional part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberKind {
	Integer,
	Float,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ColumnType {
	Unknown,
	Integer,
	Float,
	DateTime,
	Text,
}

impl std::fmt::Display for ColumnType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let s = match self {
			ColumnType::Unknown => "unknown",
			ColumnType::Integer => "integer",
			ColumnType::Float => "float",
			ColumnType::DateTime => "datetime",
			ColumnType::Text => "text",
		};
		write!(f, "{}", s)
	}
}

impl std::str::FromStr for ColumnType {
	type Err = anyhow::Error;
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_lowercase().as_str() {
			"integer" | "int" => Ok(ColumnType::Integer),
			"float" | "number" => Ok(ColumnType::Float),
			"datetime" | "date" => Ok(ColumnType::DateTime),
			"text" | "object" | "categorical" => Ok(ColumnType::Text),
			_ => Err(anyhow::format_err!(
				"unknown column type \"{}\", expected one of integer, float, datetime, text",
				s
			)),
		}
	}
}

impl DataFrame {
	pub fn new(column_names: Vec<String>, column_types: Vec<ColumnType>) -> Self {
		let columns = column_names
			.into_iter()
			.zip(column_types.into_iter())
			.map(|(column_name, column_type)| Column::new(column_name, column_type))
			.collect();
		Self { columns }
	}

	pub fn ncols(&self) -> usize {
		self.columns.len()
	}

	pub fn nrows(&self) -> usize {
		self.columns.first().map(|column| column.len()).unwrap_or(0)
	}

	pub fn view(&self) -> DataFrameView {
		let columns = self.columns.iter().map(|column| column.view()).collect();
		DataFrameView { columns }
	}

	pub fn column_names(&self) -> Vec<&str> {
		self.columns.iter().map(|column| column.name()).collect()
	}

	pub fn column_index(&self, name: &str) -> Option<usize> {
		self.columns.iter().position(|column| column.name() == name)
	}

	pub fn column(&self, name: &str) -> Option<&Column> {
		self.columns.iter().find(|column| column.name() == name)
	}
}

impl Column {
	pub fn new(name: String, column_type: ColumnType) -> Self {
		match column_type {
			ColumnType::Unknown => Column::Unknown(UnknownColumn { name, len: 0 }),
			ColumnType::Integer => Column::Number(NumberColumn::new(name, NumberKind::Integer)),
			ColumnType::Float => Column::Number(NumberColumn::new(name, NumberKind::Float)),
			ColumnType::DateTime => Column::DateTime(DateTimeColumn {
				name,
				data: Vec::new(),
			}),
			ColumnType::Text => Column::Text(TextColumn {
				name,
				data: Vec::new(),
			}),
		}
	}

	pub fn len(&self) -> usize {
		match self {
			Self::Unknown(s) => s.len,
			Self::Number(s) => s.data.len(),
			Self::DateTime(s) => s.data.len(),
			Self::Text(s) => s.data.len(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn name(&self) -> &str {
		match self {
			Self::Unknown(s) => s.name.as_str(),
			Self::Number(s) => s.name.as_str(),
			Self::DateTime(s) => s.name.as_str(),
			Self::Text(s) => s.name.as_str(),
		}
	}

	pub(crate) fn name_mut(&mut self) -> &mut String {
		match self {
			Self::Unknown(s) => &mut s.name,
			Self::Number(s) => &mut s.name,
			Self::DateTime(s) => &mut s.name,
			Self::Text(s) => &mut s.name,
		}
	}

	pub fn column_type(&self) -> ColumnType {
		self.view().column_type()
	}

	pub fn as_number(&self) -> Option<&NumberColumn> {
		match self {
			Self::Number(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_datetime(&self) -> Option<&DateTimeColumn> {
		match self {
			Self::DateTime(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_text(&self) -> Option<&TextColumn> {
		match self {
			Self::Text(s) => Some(s),
			_ => None,
		}
	}

	pub fn view(&self) -> ColumnView {
		match self {
			Self::Unknown(column) => ColumnView::Unknown(UnknownColumnView {
				name: &column.name,
				len: column.len,
			}),
			Self::Number(column) => ColumnView::Number(column.view()),
			Self::DateTime(column) => ColumnView::DateTime(DateTimeColumnView {
				name: &column.name,
				data: &column.data,
			}),
			Self::Text(column) => ColumnView::Text(TextColumnView {
				name: &column.name,
				data: &column.data,
			}),
		}
	}
}

impl NumberColumn {
	pub fn new(name: String, kind: NumberKind) -> Self {
		Self {
			name,
			kind,
			data: Vec::new(),
		}
	}

	pub fn view(&self) -> NumberColumnView {
		NumberColumnView {
			name: &self.name,
			kind: self.kind,
			data: &self.data,
		}
	}

	/// Return a float column holding `(x - mean) / sd`, where `sd` is the sample standard deviation. Missing values stay missing. If the standard deviation is zero or undefined, every value becomes `NaN`.
	pub fn standardized(&self) -> NumberColumn {
		let values: Vec<f64> = self.view().valid_values().collect();
		let n = values.len() as f64;
		let mean = values.iter().sum::<f64>() / n;
		let sd = (values.iter().map(|value| (value - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt();
		NumberColumn {
			name: self.name.clone(),
			kind: NumberKind::Float,
			data: self.data.iter().map(|value| (value - mean) / sd).collect(),
		}
	}
}

impl<'a> DataFrameView<'a> {
	pub fn ncols(&self) -> usize {
		self.columns.len()
	}

	pub fn nrows(&self) -> usize {
		self.columns.first().map(|column| column.len()).unwrap_or(0)
	}

	pub fn column(&self, name: &str) -> Option<ColumnView<'a>> {
		self.columns.iter().find(|column| column.name() == name).copied()
	}
}

impl<'a> ColumnView<'a> {
	pub fn len(&self) -> usize {
		match self {
			Self::Unknown(s) => s.len,
			Self::Number(s) => s.data.len(),
			Self::DateTime(s) => s.data.len(),
			Self::Text(s) => s.data.len(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn name(&self) -> &'a str {
		match self {
			Self::Unknown(s) => s.name,
			Self::Number(s) => s.name,
			Self::DateTime(s) => s.name,
			Self::Text(s) => s.name,
		}
	}

	pub fn column_type(&self) -> ColumnType {
		match self {
			Self::Unknown(_) => ColumnType::Unknown,
			Self::Number(column) => match column.kind {
				NumberKind::Integer => ColumnType::Integer,
				NumberKind::Float => ColumnType::Float,
			},
			Self::DateTime(_) => ColumnType::DateTime,
			Self::Text(_) => ColumnType::Text,
		}
	}

	/// This is the number of values in the column that are not missing.
	pub fn valid_count(&self) -> usize {
		match self {
			Self::Unknown(_) => 0,
			Self::Number(column) => column.valid_values().count(),
			Self::DateTime(column) => column.data.iter().filter(|value| value.is_some()).count(),
			Self::Text(column) => column.data.iter().filter(|value| value.is_some()).count(),
		}
	}

	pub fn as_number(&self) -> Option<NumberColumnView<'a>> {
		match self {
			Self::Number(s) => Some(*s),
			_ => None,
		}
	}

	pub fn as_datetime(&self) -> Option<DateTimeColumnView<'a>> {
		match self {
			Self::DateTime(s) => Some(*s),
			_ => None,
		}
	}

	pub fn as_text(&self) -> Option<TextColumnView<'a>> {
		match self {
			Self::Text(s) => Some(*s),
			_ => None,
		}
	}

	/// Render the value at `index` as text. Missing values render as the empty string.
	pub fn format_value(&self, index: usize) -> String {
		match self {
			Self::Unknown(_) => String::new(),
			Self::Number(column) => format_number(column.data[index], column.kind),
			Self::DateTime(column) => column.data[index]
				.map(|value| value.format(DATETIME_FORMAT).to_string())
				.unwrap_or_default(),
			Self::Text(column) => column.data[index].clone().unwrap_or_default(),
		}
	}
}

impl<'a> NumberColumnView<'a> {
	/// Iterate over the values that are not missing.
	pub fn valid_values(&self) -> impl Iterator<Item = f64> + 'a {
		self.data.iter().copied().filter(|value| value.is_finite())
	}
}

/// Render a number the way it would appear in a file. Integers have no fractional part, and missing values are empty.
pub fn format_number(value: f64, kind: NumberKind) -> String {
	if !value.is_finite() {
		return String::new();
	}
	match kind {
		NumberKind::Integer => format!("{}", value as i64),
		NumberKind::Float => format!("{}", value),
	}
}

#[test]
fn test_column_type_from_str() {
	assert_eq!("integer".parse::<ColumnType>().unwrap(), ColumnType::Integer);
	assert_eq!("Object".parse::<ColumnType>().unwrap(), ColumnType::Text);
	assert_eq!("datetime".parse::<ColumnType>().unwrap(), ColumnType::DateTime);
	assert!("complex".parse::<ColumnType>().is_err());
}

#[test]
fn test_standardized() {
	let column = NumberColumn {
		name: "x".to_owned(),
		kind: NumberKind::Integer,
		data: vec![1.0, 2.0, f64::NAN, 3.0],
	};
	let standardized = column.standardized();
	assert_eq!(standardized.kind, NumberKind::Float);
	assert_eq!(standardized.data[0], -1.0);
	assert_eq!(standardized.data[1], 0.0);
	assert!(standardized.data[2].is_nan());
	assert_eq!(standardized.data[3], 1.0);
}
