use crate::{FrequencyTable, SummaryStats};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// The files written by [`export_column_stats`](fn.export_column_stats.html).
#[derive(Debug, Clone, PartialEq)]
pub struct ExportPaths {
	pub stats: PathBuf,
	pub frequency: PathBuf,
}

/// Write `<column>_stats.csv` with the header `Statistic,Value` and `<column>_freq.csv` with the header `Bin,Count` to `dir`.
pub fn export_column_stats(
	dir: &Path,
	column_name: &str,
	stats: &SummaryStats,
	table: &FrequencyTable,
) -> Result<ExportPaths> {
	std::fs::create_dir_all(dir)
		.with_context(|| format!("failed to create directory {}", dir.display()))?;
	let stats_path = dir.join(format!("{}_stats.csv", column_name));
	let mut writer = csv::Writer::from_path(&stats_path)
		.with_context(|| format!("failed to create {}", stats_path.display()))?;
	writer.write_record(&["Statistic", "Value"])?;
	for (name, value) in stats.iter() {
		writer.write_record(&[name, value.to_exact_string().as_str()])?;
	}
	writer.flush()?;
	let frequency_path = dir.join(format!("{}_freq.csv", column_name));
	let mut writer = csv::Writer::from_path(&frequency_path)
		.with_context(|| format!("failed to create {}", frequency_path.display()))?;
	writer.write_record(&["Bin", "Count"])?;
	for bin in table.bins.iter() {
		writer.write_record(&[bin.label.as_str(), bin.count.to_string().as_str()])?;
	}
	writer.flush()?;
	log::info!(
		"wrote {} and {}",
		stats_path.display(),
		frequency_path.display()
	);
	Ok(ExportPaths {
		stats: stats_path,
		frequency: frequency_path,
	})
}

#[test]
fn test_export_column_stats() {
	let column = eda_dataframe::Column::Text(eda_dataframe::TextColumn {
		name: "color".to_owned(),
		data: vec![Some("red".to_owned()), Some("blue".to_owned()), Some("red".to_owned())],
	});
	let stats = crate::compute_summary_stats(column.view()).unwrap();
	let table = crate::compute_frequency_table(column.view()).unwrap();
	let dir = std::env::temp_dir().join(format!("eda_stats_export_{}", std::process::id()));
	let paths = export_column_stats(&dir, "color", &stats, &table).unwrap();
	let stats_csv = std::fs::read_to_string(&paths.stats).unwrap();
	let frequency_csv = std::fs::read_to_string(&paths.frequency).unwrap();
	std::fs::remove_dir_all(&dir).unwrap();
	assert_eq!(
		stats_csv,
		"Statistic,Value\nUnique,2\nMode,red\nMinimum,blue\nMaximum,red\n"
	);
	assert_eq!(frequency_csv, "Bin,Count\nred,2\nblue,1\n");
}
