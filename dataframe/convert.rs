use super::*;
use anyhow::{bail, format_err, Context, Result};
use chrono::NaiveDate;

const DATETIME_FORMATS: &[&str] = &[
	"%Y-%m-%d %H:%M:%S%.f",
	"%Y-%m-%dT%H:%M:%S%.f",
	"%Y/%m/%d %H:%M:%S%.f",
	"%Y-%m-%d %H:%M",
	"%Y-%m-%dT%H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"];

const NANOSECONDS_PER_SECOND: i64 = 1_000_000_000;

/// This struct counts the columns of a dataframe by type. Unknown columns count as text.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ColumnTypeCounts {
	pub integer: usize,
	pub float: usize,
	pub datetime: usize,
	pub text: usize,
}

impl DataFrame {
	/// Rename a column. The new name must not be blank and must not already be in use.
	pub fn rename_column(&mut self, name: &str, new_name: &str) -> Result<()> {
		let new_name = new_name.trim();
		if new_name.is_empty() {
			bail!("cannot rename column \"{}\", blank name specified", name);
		}
		let index = self
			.column_index(name)
			.ok_or_else(|| format_err!("no column named \"{}\"", name))?;
		if name == new_name {
			return Ok(());
		}
		if self.column_index(new_name).is_some() {
			bail!(
				"cannot rename column \"{}\", {} name already exists",
				name,
				new_name
			);
		}
		*self.columns[index].name_mut() = new_name.to_owned();
		log::info!("changed variable {} to name {}", name, new_name);
		Ok(())
	}

	/// Convert the column named `name` to `column_type`. If any value fails to convert, the column is left unchanged.
	pub fn convert_column(&mut self, name: &str, column_type: ColumnType) -> Result<()> {
		let index = self
			.column_index(name)
			.ok_or_else(|| format_err!("no column named \"{}\"", name))?;
		let converted = convert(&self.columns[index], column_type)
			.with_context(|| format!("failed to convert {} to data type {}", name, column_type))?;
		self.columns[index] = converted;
		log::info!("converted {} to data type {}", name, column_type);
		Ok(())
	}

	pub fn column_type_counts(&self) -> ColumnTypeCounts {
		let mut counts = ColumnTypeCounts::default();
		for column in self.columns.iter() {
			match column.column_type() {
				ColumnType::Integer => counts.integer += 1,
				ColumnType::Float => counts.float += 1,
				ColumnType::DateTime => counts.datetime += 1,
				ColumnType::Unknown | ColumnType::Text => counts.text += 1,
			}
		}
		counts
	}
}

fn convert(column: &Column, column_type: ColumnType) -> Result<Column> {
	let name = column.name().to_owned();
	let view = column.view();
	let column = match column_type {
		ColumnType::Unknown => bail!("columns cannot be converted to unknown"),
		ColumnType::Integer => {
			let data = match view {
				// Text is parsed as integers directly, so "1.5" is rejected rather than truncated.
				ColumnView::Text(column) => column
					.data
					.iter()
					.map(|value| match value {
						None => bail!("cannot convert missing values to integer"),
						Some(value) => parse_integer(value)
							.map(|value| value as f64)
							.ok_or_else(|| format_err!("invalid literal for integer: \"{}\"", value)),
					})
					.collect::<Result<Vec<f64>>>()?,
				_ => to_float(view)?
					.into_iter()
					.map(|value| {
						if value.is_finite() {
							Ok(value.trunc())
						} else {
							Err(format_err!("cannot convert missing values to integer"))
						}
					})
					.collect::<Result<Vec<f64>>>()?,
			};
			Column::Number(NumberColumn {
				name,
				kind: NumberKind::Integer,
				data,
			})
		}
		ColumnType::Float => Column::Number(NumberColumn {
			name,
			kind: NumberKind::Float,
			data: to_float(view)?,
		}),
		ColumnType::DateTime => Column::DateTime(DateTimeColumn {
			name,
			data: to_datetime(view)?,
		}),
		ColumnType::Text => Column::Text(TextColumn {
			name,
			data: (0..view.len())
				.map(|index| {
					let value = view.format_value(index);
					if value.is_empty() {
						None
					} else {
						Some(value)
					}
				})
				.collect(),
		}),
	};
	Ok(column)
}

fn to_float(view: ColumnView) -> Result<Vec<f64>> {
	let data = match view {
		ColumnView::Unknown(column) => vec![f64::NAN; column.len],
		ColumnView::Number(column) => column.data.to_vec(),
		ColumnView::DateTime(column) => column
			.data
			.iter()
			.map(|value| {
				value
					.and_then(datetime_to_nanoseconds)
					.map(|value| value as f64)
					.unwrap_or(f64::NAN)
			})
			.collect(),
		ColumnView::Text(column) => column
			.data
			.iter()
			.map(|value| match value {
				None => Ok(f64::NAN),
				Some(value) => parse_number(value)
					.ok_or_else(|| format_err!("could not convert string to float: \"{}\"", value)),
			})
			.collect::<Result<Vec<f64>>>()?,
	};
	Ok(data)
}

fn to_datetime(view: ColumnView) -> Result<Vec<Option<NaiveDateTime>>> {
	let data = match view {
		ColumnView::Unknown(column) => vec![None; column.len],
		ColumnView::Number(column) => column
			.data
			.iter()
			.map(|value| {
				if value.is_finite() {
					nanoseconds_to_datetime(*value)
						.map(Some)
						.ok_or_else(|| format_err!("{} is out of bounds for a datetime", value))
				} else {
					Ok(None)
				}
			})
			.collect::<Result<Vec<_>>>()?,
		ColumnView::DateTime(column) => column.data.to_vec(),
		ColumnView::Text(column) => column
			.data
			.iter()
			.map(|value| match value {
				None => Ok(None),
				Some(value) => parse_datetime(value)
					.map(Some)
					.ok_or_else(|| format_err!("unknown datetime format: \"{}\"", value)),
			})
			.collect::<Result<Vec<_>>>()?,
	};
	Ok(data)
}

/// Parse a datetime from RFC 3339 or one of a handful of common date and datetime formats. Dates without a time are placed at midnight.
pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
	let value = value.trim();
	if let Ok(value) = chrono::DateTime::parse_from_rfc3339(value) {
		return Some(value.naive_utc());
	}
	for format in DATETIME_FORMATS {
		if let Ok(value) = NaiveDateTime::parse_from_str(value, format) {
			return Some(value);
		}
	}
	for format in DATE_FORMATS {
		if let Ok(value) = NaiveDate::parse_from_str(value, format) {
			return value.and_hms_opt(0, 0, 0);
		}
	}
	None
}

fn datetime_to_nanoseconds(value: NaiveDateTime) -> Option<i64> {
	value.and_utc().timestamp_nanos_opt()
}

fn nanoseconds_to_datetime(value: f64) -> Option<NaiveDateTime> {
	if value.abs() >= i64::MAX as f64 {
		return None;
	}
	let nanoseconds = value as i64;
	let seconds = nanoseconds.div_euclid(NANOSECONDS_PER_SECOND);
	let subsec_nanoseconds = nanoseconds.rem_euclid(NANOSECONDS_PER_SECOND) as u32;
	chrono::DateTime::from_timestamp(seconds, subsec_nanoseconds).map(|value| value.naive_utc())
}

#[cfg(test)]
fn test_dataframe() -> DataFrame {
	let csv = "id,score,label,when\n1,1.5,a,2020-01-01\n2,2.7,b,2020-01-02 12:00:00\n3,,c,\n";
	DataFrame::from_reader(
		std::io::Cursor::new(csv),
		FileFormat::Csv,
		LoadOptions {
			insert_sample_column: false,
			..Default::default()
		},
	)
	.unwrap()
}

#[test]
fn test_rename_column() {
	let mut df = test_dataframe();
	df.rename_column("id", "identifier").unwrap();
	assert_eq!(df.column_names(), vec!["identifier", "score", "label", "when"]);
	assert!(df.rename_column("score", " ").is_err());
	assert!(df.rename_column("score", "label").is_err());
	assert!(df.rename_column("missing", "other").is_err());
	assert_eq!(df.column_names(), vec!["identifier", "score", "label", "when"]);
}

#[test]
fn test_convert_number_columns() {
	let mut df = test_dataframe();
	df.convert_column("id", ColumnType::Float).unwrap();
	assert_eq!(df.columns[0].column_type(), ColumnType::Float);
	// Missing values cannot be represented in an integer column.
	assert!(df.convert_column("score", ColumnType::Integer).is_err());
	assert_eq!(df.columns[1].column_type(), ColumnType::Float);
	df.convert_column("score", ColumnType::Text).unwrap();
	assert_eq!(
		df.columns[1].as_text().unwrap().data,
		vec![Some("1.5".to_owned()), Some("2.7".to_owned()), None]
	);
}

#[test]
fn test_convert_text_columns() {
	let mut df = test_dataframe();
	assert!(df.convert_column("label", ColumnType::Float).is_err());
	assert_eq!(df.columns[2].column_type(), ColumnType::Text);
	df.convert_column("when", ColumnType::DateTime).unwrap();
	let when = df.columns[3].as_datetime().unwrap();
	assert_eq!(
		when.data[1].unwrap().format(DATETIME_FORMAT).to_string(),
		"2020-01-02 12:00:00"
	);
	assert_eq!(when.data[2], None);
	df.convert_column("when", ColumnType::Float).unwrap();
	let when = df.columns[3].as_number().unwrap();
	assert_eq!(when.data[0], 1_577_836_800.0 * 1e9);
	df.convert_column("when", ColumnType::DateTime).unwrap();
	let when = df.columns[3].as_datetime().unwrap();
	assert_eq!(
		when.data[0].unwrap().format(DATETIME_FORMAT).to_string(),
		"2020-01-01 00:00:00"
	);
}

#[test]
fn test_column_type_counts() {
	let df = test_dataframe();
	assert_eq!(
		df.column_type_counts(),
		ColumnTypeCounts {
			integer: 1,
			float: 1,
			datetime: 0,
			text: 2,
		}
	);
}
