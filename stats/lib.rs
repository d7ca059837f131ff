/*!
This crate computes univariate descriptive statistics for a single column of a [`DataFrame`](../eda_dataframe/struct.DataFrame.html): a [`SummaryStats`](struct.SummaryStats.html) of named statistics, a grouped [`FrequencyTable`](struct.FrequencyTable.html), and a check that a label column has enough samples in every class to be used for classification.

Every computation is a pure function of the column's non-missing values.
*/

mod classification;
mod export;
mod frequency;
mod summary;

pub use self::classification::{check_classification_ready, class_counts, is_classification_ready};
pub use self::export::{export_column_stats, ExportPaths};
pub use self::frequency::{compute_frequency_table, FrequencyBin, FrequencyTable};
pub use self::summary::{compute_summary_stats, StatValue, SummaryStats};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
	#[error("invalid input: {0}")]
	InvalidInput(String),
	#[error(
		"class \"{class}\" has {count} samples but at least {required} are required in every class"
	)]
	InsufficientSamplesPerClass {
		class: String,
		count: usize,
		required: usize,
	},
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
