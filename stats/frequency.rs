use crate::{class_counts, summary::no_values_error, Result};
use eda_dataframe::{ColumnView, NumberColumnView, DATETIME_FORMAT};
use itertools::Itertools;
use num_traits::ToPrimitive;
use std::collections::BTreeMap;

/// A FrequencyTable is an ordered list of buckets and the number of values that fall in each.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FrequencyTable {
	pub bins: Vec<FrequencyBin>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyBin {
	pub label: String,
	pub count: usize,
}

impl FrequencyTable {
	pub fn len(&self) -> usize {
		self.bins.len()
	}

	pub fn is_empty(&self) -> bool {
		self.bins.is_empty()
	}

	/// The total count is the number of non-missing values in the column.
	pub fn total_count(&self) -> usize {
		self.bins.iter().map(|bin| bin.count).sum()
	}
}

/**
Compute the frequency table of a column.

Number columns are grouped into equal width bins chosen by Doane's rule. Each bin is half open except the last, which also contains the maximum. Text and datetime columns count each distinct value, most frequent first.
*/
pub fn compute_frequency_table(column: ColumnView) -> Result<FrequencyTable> {
	match column {
		ColumnView::Unknown(column) => Err(no_values_error(column.name)),
		ColumnView::Number(column) => compute_number_frequency_table(column),
		ColumnView::DateTime(column) => compute_categorical_frequency_table(
			column.name,
			class_counts(column.data.iter().flatten()),
			|value| value.format(DATETIME_FORMAT).to_string(),
		),
		ColumnView::Text(column) => compute_categorical_frequency_table(
			column.name,
			class_counts(column.data.iter().flatten().map(String::as_str)),
			|value| value.to_string(),
		),
	}
}

fn compute_number_frequency_table(column: NumberColumnView) -> Result<FrequencyTable> {
	let values: Vec<f64> = column.valid_values().collect();
	let (min, max) = match values.iter().copied().minmax().into_option() {
		Some(minmax) => minmax,
		None => return Err(no_values_error(column.name)),
	};
	let width = doane_bin_width(&values, min, max);
	let (first_edge, last_edge) = if min == max {
		(min - 0.5, max + 0.5)
	} else {
		(min, max)
	};
	let n_bins = if width > 0.0 {
		((last_edge - first_edge) / width)
			.ceil()
			.to_usize()
			.unwrap_or(1)
			.max(1)
	} else {
		1
	};
	log::debug!(
		"binning column \"{}\" into {} bins of width {}",
		column.name,
		n_bins,
		width
	);
	let edges = linspace(first_edge, last_edge, n_bins + 1);
	let mut counts = vec![0; n_bins];
	for value in values.iter() {
		counts[bin_index(*value, &edges)] += 1;
	}
	let bins = counts
		.into_iter()
		.enumerate()
		.map(|(index, count)| {
			let close = if index == n_bins - 1 { ']' } else { ')' };
			FrequencyBin {
				label: format!("[{:.3}, {:.3}{}", edges[index], edges[index + 1], close),
				count,
			}
		})
		.collect();
	Ok(FrequencyTable { bins })
}

fn compute_categorical_frequency_table<T>(
	name: &str,
	histogram: BTreeMap<T, usize>,
	format: impl Fn(&T) -> String,
) -> Result<FrequencyTable>
where
	T: Ord,
{
	if histogram.is_empty() {
		return Err(no_values_error(name));
	}
	let mut bins: Vec<FrequencyBin> = histogram
		.iter()
		.map(|(value, count)| FrequencyBin {
			label: format(value),
			count: *count,
		})
		.collect();
	// The sort is stable, so values with equal counts stay in ascending order.
	bins.sort_by(|a, b| b.count.cmp(&a.count));
	Ok(FrequencyTable { bins })
}

/// Doane's rule extends Sturges' rule with a correction for the skewness of the data. A width of zero means a single bin.
fn doane_bin_width(values: &[f64], min: f64, max: f64) -> f64 {
	let n = values.len();
	if n <= 2 {
		return 0.0;
	}
	let n_f64 = n as f64;
	let sigma_g1 = (6.0 * (n_f64 - 2.0) / ((n_f64 + 1.0) * (n_f64 + 3.0))).sqrt();
	let mean = values.iter().sum::<f64>() / n_f64;
	let sigma = (values.iter().map(|value| (value - mean).powi(2)).sum::<f64>() / n_f64).sqrt();
	if sigma <= 0.0 {
		return 0.0;
	}
	let g1 = values
		.iter()
		.map(|value| ((value - mean) / sigma).powi(3))
		.sum::<f64>()
		/ n_f64;
	(max - min) / (1.0 + n_f64.log2() + (1.0 + g1.abs() / sigma_g1).log2())
}

/// Return `n` equally spaced values from `start` to `stop`. Both ends are exact.
fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
	let intervals = (n - 1) as f64;
	let step = (stop - start) / intervals;
	let mut values: Vec<f64> = if step.is_finite() {
		(0..n).map(|i| start + i as f64 * step).collect()
	} else {
		// The range overflows, so interpolate between the ends instead.
		(0..n)
			.map(|i| {
				let t = i as f64 / intervals;
				start * (1.0 - t) + stop * t
			})
			.collect()
	};
	if let Some(first) = values.first_mut() {
		*first = start;
	}
	if let Some(last) = values.last_mut() {
		*last = stop;
	}
	values
}

/// Find the bin containing `value`, correcting the computed index against the edges so rounding never places a value on the wrong side of an edge.
fn bin_index(value: f64, edges: &[f64]) -> usize {
	let n_bins = edges.len() - 1;
	let first_edge = edges[0];
	let last_edge = edges[n_bins];
	let position = (value - first_edge) * n_bins as f64 / (last_edge - first_edge);
	let mut index = position.to_usize().unwrap_or(0).min(n_bins - 1);
	if index > 0 && value < edges[index] {
		index -= 1;
	} else if index < n_bins - 1 && value >= edges[index + 1] {
		index += 1;
	}
	index
}

#[cfg(test)]
fn render(table: &FrequencyTable) -> String {
	table
		.bins
		.iter()
		.map(|bin| format!("{} {}\n", bin.label, bin.count))
		.collect()
}

#[cfg(test)]
fn number_column(data: &[f64]) -> eda_dataframe::Column {
	eda_dataframe::Column::Number(eda_dataframe::NumberColumn {
		name: "x".to_owned(),
		kind: eda_dataframe::NumberKind::Float,
		data: data.to_owned(),
	})
}

#[test]
fn test_number_frequency_table() {
	let column = number_column(&[1.0, 2.0, f64::NAN, 3.0, 4.0, 5.0]);
	let table = compute_frequency_table(column.view()).unwrap();
	insta::assert_snapshot!(render(&table), @r###"
 [1.000, 2.000) 1
 [2.000, 3.000) 1
 [3.000, 4.000) 1
 [4.000, 5.000] 2
 "###);
}

#[test]
fn test_frequency_counts_sum_to_valid_count() {
	let data: Vec<f64> = (0..200)
		.map(|i| ((i * 37) % 101) as f64 / 7.0 + if i % 9 == 0 { 40.0 } else { 0.0 })
		.collect();
	let column = number_column(&data);
	let table = compute_frequency_table(column.view()).unwrap();
	assert!(table.len() > 1);
	assert_eq!(table.total_count(), 200);
	let (last, rest) = table.bins.split_last().unwrap();
	assert!(last.label.ends_with(']'));
	assert!(rest.iter().all(|bin| bin.label.ends_with(')')));
}

#[test]
fn test_degenerate_number_frequency_tables() {
	let column = number_column(&[2.0, 2.0, 2.0]);
	let table = compute_frequency_table(column.view()).unwrap();
	assert_eq!(render(&table), "[1.500, 2.500] 3\n");
	let column = number_column(&[1.0, 3.0]);
	let table = compute_frequency_table(column.view()).unwrap();
	assert_eq!(render(&table), "[1.000, 3.000] 2\n");
}

#[test]
fn test_frequency_table_with_overflowing_range() {
	let column = number_column(&[-1e308, 1e308]);
	let table = compute_frequency_table(column.view()).unwrap();
	assert_eq!(table.len(), 1);
	assert_eq!(table.total_count(), 2);
	assert!(!table.bins[0].label.contains("NaN"));
	assert!(table.bins[0].label.starts_with("[-1000"));
	assert_eq!(linspace(-1e308, 1e308, 3), vec![-1e308, 0.0, 1e308]);
}

#[test]
fn test_text_frequency_table() {
	let column = eda_dataframe::Column::Text(eda_dataframe::TextColumn {
		name: "letter".to_owned(),
		data: vec![
			Some("b".to_owned()),
			Some("d".to_owned()),
			Some("a".to_owned()),
			None,
			Some("b".to_owned()),
			Some("c".to_owned()),
			Some("a".to_owned()),
			Some("b".to_owned()),
		],
	});
	let table = compute_frequency_table(column.view()).unwrap();
	insta::assert_snapshot!(render(&table), @r###"
 b 3
 a 2
 c 1
 d 1
 "###);
	let stats = crate::compute_summary_stats(column.view()).unwrap();
	assert_eq!(
		stats.get("Unique"),
		Some(&crate::StatValue::Count(table.len()))
	);
}

#[test]
fn test_datetime_frequency_table() {
	let date = |day: u32, hour: u32| {
		chrono::NaiveDate::from_ymd_opt(2021, 3, day)
			.and_then(|date| date.and_hms_opt(hour, 0, 0))
	};
	let column = eda_dataframe::Column::DateTime(eda_dataframe::DateTimeColumn {
		name: "when".to_owned(),
		data: vec![date(2, 0), date(1, 12), None, date(2, 0), date(1, 6), date(1, 12)],
	});
	let table = compute_frequency_table(column.view()).unwrap();
	insta::assert_snapshot!(render(&table), @r###"
 2021-03-01 12:00:00 2
 2021-03-02 00:00:00 2
 2021-03-01 06:00:00 1
 "###);
}

#[test]
fn test_empty_frequency_table_is_invalid() {
	let column = number_column(&[]);
	assert!(compute_frequency_table(column.view()).is_err());
}
