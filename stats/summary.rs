use crate::{class_counts, Error, Result};
use eda_dataframe::{ColumnView, NumberColumnView, DATETIME_FORMAT};
use eda_util::finite::{Finite, ToFinite};
use std::{cmp::Ordering, collections::BTreeMap, fmt};

const QUANTILES: [f64; 7] = [0.005, 0.025, 0.25, 0.5, 0.75, 0.975, 0.995];

/// The value of a single statistic.
#[derive(Debug, Clone, PartialEq)]
pub enum StatValue {
	Number(f64),
	Count(usize),
	Value(String),
}

impl StatValue {
	/// Render the value without rounding, the way it is written to exported files.
	pub fn to_exact_string(&self) -> String {
		match self {
			StatValue::Number(value) => value.to_string(),
			StatValue::Count(count) => count.to_string(),
			StatValue::Value(value) => value.clone(),
		}
	}

	pub fn as_number(&self) -> Option<f64> {
		match self {
			StatValue::Number(value) => Some(*value),
			_ => None,
		}
	}
}

impl fmt::Display for StatValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			StatValue::Number(value) => write!(f, "{:.3}", value),
			StatValue::Count(count) => write!(f, "{}", count),
			StatValue::Value(value) => write!(f, "{}", value),
		}
	}
}

/// SummaryStats are the named statistics of one column, in display order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SummaryStats {
	entries: Vec<(&'static str, StatValue)>,
}

impl SummaryStats {
	fn push(&mut self, name: &'static str, value: StatValue) {
		self.entries.push((name, value));
	}

	pub fn get(&self, name: &str) -> Option<&StatValue> {
		self.entries
			.iter()
			.find(|(entry_name, _)| *entry_name == name)
			.map(|(_, value)| value)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&'static str, &StatValue)> {
		self.entries.iter().map(|(name, value)| (*name, value))
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

/**
Compute the summary statistics of a column. Missing values are ignored.

Number columns produce the mean, median, population variance and standard deviation, biased skewness and excess kurtosis, coefficient of variation, extremes, a fixed set of percentiles and the interquartile range. Text and datetime columns produce the number of unique values, the mode and the extremes under their natural ordering.
*/
pub fn compute_summary_stats(column: ColumnView) -> Result<SummaryStats> {
	match column {
		ColumnView::Unknown(column) => Err(no_values_error(column.name)),
		ColumnView::Number(column) => compute_number_summary_stats(column),
		ColumnView::DateTime(column) => compute_categorical_summary_stats(
			column.name,
			&class_counts(column.data.iter().flatten()),
			|value| value.format(DATETIME_FORMAT).to_string(),
		),
		ColumnView::Text(column) => compute_categorical_summary_stats(
			column.name,
			&class_counts(column.data.iter().flatten().map(String::as_str)),
			|value| value.to_string(),
		),
	}
}

pub(crate) fn no_values_error(name: &str) -> Error {
	Error::InvalidInput(format!("column \"{}\" has no values", name))
}

/// Aggregate the non-missing values of a number column into a histogram of unique values. Quantiles are computed by walking the histogram, so only the unique values need to be sorted.
fn compute_number_histogram(column: NumberColumnView) -> BTreeMap<Finite<f64>, usize> {
	class_counts(column.valid_values().filter_map(|value| value.to_finite().ok()))
}

fn compute_number_summary_stats(column: NumberColumnView) -> Result<SummaryStats> {
	let histogram = compute_number_histogram(column);
	let (min, max) = match (histogram.keys().next(), histogram.keys().next_back()) {
		(Some(min), Some(max)) => (min.get(), max.get()),
		_ => return Err(no_values_error(column.name)),
	};
	let n: usize = histogram.values().sum();
	let moments = compute_moments(&histogram, n);
	let quantiles = compute_quantiles(&histogram, n, &QUANTILES);
	let sd = moments.variance.sqrt();
	let cv = if moments.mean != 0.0 {
		sd / moments.mean
	} else {
		f64::NAN
	};
	let mut stats = SummaryStats::default();
	stats.push("Mean", StatValue::Number(moments.mean));
	stats.push("Median", StatValue::Number(quantiles[3]));
	stats.push("Variance", StatValue::Number(moments.variance));
	stats.push("SD", StatValue::Number(sd));
	stats.push("Skewness", StatValue::Number(moments.skewness));
	stats.push("Kurtosis", StatValue::Number(moments.kurtosis));
	stats.push("CV", StatValue::Number(cv));
	stats.push("Minimum", StatValue::Number(min));
	stats.push("Maximum", StatValue::Number(max));
	stats.push("P 0.5%", StatValue::Number(quantiles[0]));
	stats.push("P 2.5%", StatValue::Number(quantiles[1]));
	stats.push("P 25%", StatValue::Number(quantiles[2]));
	stats.push("P 75%", StatValue::Number(quantiles[4]));
	stats.push("P 97.5%", StatValue::Number(quantiles[5]));
	stats.push("P 99.5%", StatValue::Number(quantiles[6]));
	stats.push("IQR", StatValue::Number(quantiles[4] - quantiles[2]));
	Ok(stats)
}

fn compute_categorical_summary_stats<T>(
	name: &str,
	histogram: &BTreeMap<T, usize>,
	format: impl Fn(&T) -> String,
) -> Result<SummaryStats>
where
	T: Ord,
{
	let (min, max) = match (histogram.keys().next(), histogram.keys().next_back()) {
		(Some(min), Some(max)) => (min, max),
		_ => return Err(no_values_error(name)),
	};
	// Iterating in ascending order and only replacing on a strictly greater count keeps the smallest of the most frequent values.
	let mut mode: Option<(&T, usize)> = None;
	for (value, count) in histogram.iter() {
		match mode {
			Some((_, mode_count)) if mode_count >= *count => {}
			_ => mode = Some((value, *count)),
		}
	}
	let mut stats = SummaryStats::default();
	stats.push("Unique", StatValue::Count(histogram.len()));
	if let Some((mode, _)) = mode {
		stats.push("Mode", StatValue::Value(format(mode)));
	}
	stats.push("Minimum", StatValue::Value(format(min)));
	stats.push("Maximum", StatValue::Value(format(max)));
	Ok(stats)
}

struct Moments {
	mean: f64,
	variance: f64,
	skewness: f64,
	kurtosis: f64,
}

/// Compute the population moments. Skewness and kurtosis are undefined when the variance is zero.
fn compute_moments(histogram: &BTreeMap<Finite<f64>, usize>, n: usize) -> Moments {
	let n = n as f64;
	let mean = histogram
		.iter()
		.map(|(value, count)| value.get() * *count as f64)
		.sum::<f64>()
		/ n;
	let (m2, m3, m4) = histogram.iter().fold(
		(0.0, 0.0, 0.0),
		|(m2, m3, m4), (value, count)| {
			let deviation = value.get() - mean;
			let count = *count as f64;
			(
				m2 + count * deviation.powi(2),
				m3 + count * deviation.powi(3),
				m4 + count * deviation.powi(4),
			)
		},
	);
	let (m2, m3, m4) = (m2 / n, m3 / n, m4 / n);
	let (skewness, kurtosis) = if m2 > 0.0 {
		(m3 / m2.powf(1.5), m4 / (m2 * m2) - 3.0)
	} else {
		(f64::NAN, f64::NAN)
	};
	Moments {
		mean,
		variance: m2,
		skewness,
		kurtosis,
	}
}

/// Compute each quantile `q` as the value at position `q * (n - 1)` of the sorted values, interpolating linearly between neighbors when the position is fractional.
fn compute_quantiles(
	histogram: &BTreeMap<Finite<f64>, usize>,
	n: usize,
	quantiles: &[f64],
) -> Vec<f64> {
	let positions: Vec<(usize, f64)> = quantiles
		.iter()
		.map(|q| {
			let position = q * (n - 1) as f64;
			(position.trunc() as usize, position.fract())
		})
		.collect();
	let mut results: Vec<Option<f64>> = vec![None; quantiles.len()];
	let mut current_count: usize = 0;
	let mut iter = histogram.iter().peekable();
	while let Some((value, count)) = iter.next() {
		let value = value.get();
		current_count += count;
		let results_iter = results
			.iter_mut()
			.zip(positions.iter())
			.filter(|(result, _)| result.is_none());
		for (result, (index, fract)) in results_iter {
			match (current_count - 1).cmp(index) {
				Ordering::Equal => {
					if *fract > 0.0 {
						let next_value = iter.peek().map(|(next, _)| next.get()).unwrap_or(value);
						*result = Some(value + (next_value - value) * fract);
					} else {
						*result = Some(value);
					}
				}
				Ordering::Greater => *result = Some(value),
				Ordering::Less => {}
			}
		}
	}
	results
		.into_iter()
		.map(|result| result.unwrap_or(f64::NAN))
		.collect()
}

#[cfg(test)]
fn render(stats: &SummaryStats) -> String {
	stats
		.iter()
		.map(|(name, value)| format!("{}: {}\n", name, value))
		.collect()
}

#[cfg(test)]
fn number_column(data: &[f64]) -> eda_dataframe::NumberColumn {
	eda_dataframe::NumberColumn {
		name: "x".to_owned(),
		kind: eda_dataframe::NumberKind::Float,
		data: data.to_owned(),
	}
}

#[test]
fn test_number_summary_stats() {
	let column = eda_dataframe::Column::Number(number_column(&[5.0, 1.0, f64::NAN, 3.0, 2.0, 4.0]));
	let stats = compute_summary_stats(column.view()).unwrap();
	insta::assert_snapshot!(render(&stats), @r###"
 Mean: 3.000
 Median: 3.000
 Variance: 2.000
 SD: 1.414
 Skewness: 0.000
 Kurtosis: -1.300
 CV: 0.471
 Minimum: 1.000
 Maximum: 5.000
 P 0.5%: 1.020
 P 2.5%: 1.100
 P 25%: 2.000
 P 75%: 4.000
 P 97.5%: 4.900
 P 99.5%: 4.980
 IQR: 2.000
 "###);
}

#[test]
fn test_summary_stats_are_idempotent() {
	let column = eda_dataframe::Column::Number(number_column(&[0.5, -2.0, 7.25, 7.25, 1.0]));
	let left = compute_summary_stats(column.view()).unwrap();
	let right = compute_summary_stats(column.view()).unwrap();
	assert_eq!(render(&left), render(&right));
}

#[test]
fn test_degenerate_number_summary_stats() {
	let column = eda_dataframe::Column::Number(number_column(&[-1.0, 1.0]));
	let stats = compute_summary_stats(column.view()).unwrap();
	assert!(stats.get("CV").unwrap().as_number().unwrap().is_nan());
	assert_eq!(stats.get("CV").unwrap().to_string(), "NaN");
	let column = eda_dataframe::Column::Number(number_column(&[4.0, 4.0, 4.0]));
	let stats = compute_summary_stats(column.view()).unwrap();
	assert_eq!(stats.get("Variance"), Some(&StatValue::Number(0.0)));
	assert!(stats.get("Skewness").unwrap().as_number().unwrap().is_nan());
	assert!(stats.get("Kurtosis").unwrap().as_number().unwrap().is_nan());
	assert_eq!(stats.get("P 99.5%"), Some(&StatValue::Number(4.0)));
}

#[test]
fn test_quantiles_with_repeated_values() {
	let mut histogram = BTreeMap::new();
	histogram.insert(Finite::new(1.0).unwrap(), 3);
	histogram.insert(Finite::new(2.0).unwrap(), 1);
	let quantiles = compute_quantiles(&histogram, 4, &[0.0, 0.25, 0.5, 0.75, 1.0]);
	assert_eq!(quantiles, vec![1.0, 1.0, 1.0, 1.25, 2.0]);
}

#[test]
fn test_text_summary_stats() {
	let column = eda_dataframe::Column::Text(eda_dataframe::TextColumn {
		name: "fruit".to_owned(),
		data: ["pear", "apple", "pear", "fig", "apple"]
			.iter()
			.map(|value| Some(value.to_string()))
			.chain(std::iter::once(None))
			.collect(),
	});
	let stats = compute_summary_stats(column.view()).unwrap();
	insta::assert_snapshot!(render(&stats), @r###"
 Unique: 3
 Mode: apple
 Minimum: apple
 Maximum: pear
 "###);
}

#[test]
fn test_datetime_summary_stats() {
	let data = ["2021-03-01", "2020-12-31", "2021-03-01"]
		.iter()
		.map(|value| eda_dataframe::parse_datetime(value))
		.collect();
	let column = eda_dataframe::Column::DateTime(eda_dataframe::DateTimeColumn {
		name: "date".to_owned(),
		data,
	});
	let stats = compute_summary_stats(column.view()).unwrap();
	assert_eq!(stats.get("Unique"), Some(&StatValue::Count(2)));
	assert_eq!(
		stats.get("Mode"),
		Some(&StatValue::Value("2021-03-01 00:00:00".to_owned()))
	);
	assert_eq!(
		stats.get("Minimum"),
		Some(&StatValue::Value("2020-12-31 00:00:00".to_owned()))
	);
}

#[test]
fn test_empty_columns_are_invalid() {
	let column = eda_dataframe::Column::Number(number_column(&[f64::NAN]));
	assert!(matches!(
		compute_summary_stats(column.view()),
		Err(Error::InvalidInput(_))
	));
	let column = eda_dataframe::Column::Unknown(eda_dataframe::UnknownColumn {
		name: "empty".to_owned(),
		len: 3,
	});
	assert!(matches!(
		compute_summary_stats(column.view()),
		Err(Error::InvalidInput(_))
	));
}
