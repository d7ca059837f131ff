/*!
This module defines the `Config` struct, which configures cross validation and the parameters of each model. Every field has a default, so an empty file is a valid config.
*/

use crate::ModelName;
use anyhow::{format_err, Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;

/// The seed used whenever shuffling is enabled without an explicit seed.
pub const DEFAULT_SEED: u64 = 42;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
	/// This is the number of folds used for cross validation. Classification additionally requires every class to have at least this many samples.
	pub n_splits: usize,
	pub shuffle: Shuffle,
	pub linear: LinearOptions,
	pub neighbors: NeighborsOptions,
	pub k_means: KMeansOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum Shuffle {
	Enabled(bool),
	Options { seed: u64 },
}

/// These options control training of the linear models.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LinearOptions {
	/// This is the L2 regularization value to use when updating the model parameters.
	pub l2_regularization: f64,
	/// This is the learning rate to use when updating the model parameters.
	pub learning_rate: f64,
	/// This is the maximum number of epochs to train.
	pub max_epochs: usize,
	/// This is the number of examples to use for each batch of training.
	pub n_examples_per_batch: usize,
	/// If the value is `Some`, early stopping will be enabled.
	pub early_stopping_options: Option<EarlyStoppingOptions>,
}

/// The parameters in this struct control how to determine whether training should stop early after each epoch.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EarlyStoppingOptions {
	/// This is the fraction of the training set that is set aside to compute the early stopping metric.
	pub early_stopping_fraction: f64,
	/// If this many epochs pass by without a significant improvement in the early stopping metric, training will be stopped early.
	pub n_epochs_without_improvement_to_stop: usize,
	/// This is the minimum decrease in the early stopping metric for an epoch to be considered a significant improvement.
	pub min_decrease_in_loss_for_significant_change: f64,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NeighborsOptions {
	pub n_neighbors: usize,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KMeansOptions {
	pub n_clusters: usize,
	pub max_iterations: usize,
	/// Iteration stops once the centroids move less than this fraction of the mean feature variance.
	pub tolerance: f64,
	/// This seeds the choice of initial centroids.
	pub seed: u64,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			n_splits: 3,
			shuffle: Shuffle::Enabled(true),
			linear: LinearOptions::default(),
			neighbors: NeighborsOptions::default(),
			k_means: KMeansOptions::default(),
		}
	}
}

impl Default for LinearOptions {
	fn default() -> Self {
		Self {
			l2_regularization: 0.0,
			learning_rate: 0.1,
			max_epochs: 100,
			n_examples_per_batch: 32,
			early_stopping_options: Some(EarlyStoppingOptions::default()),
		}
	}
}

impl Default for EarlyStoppingOptions {
	fn default() -> Self {
		Self {
			early_stopping_fraction: 0.1,
			n_epochs_without_improvement_to_stop: 3,
			min_decrease_in_loss_for_significant_change: 1e-3,
		}
	}
}

impl Default for NeighborsOptions {
	fn default() -> Self {
		Self { n_neighbors: 5 }
	}
}

impl Default for KMeansOptions {
	fn default() -> Self {
		Self {
			n_clusters: 8,
			max_iterations: 300,
			tolerance: 1e-4,
			seed: DEFAULT_SEED,
		}
	}
}

impl Shuffle {
	/// Return the seed to shuffle with, or `None` if shuffling is disabled.
	pub fn seed(self) -> Option<u64> {
		match self {
			Shuffle::Enabled(true) => Some(DEFAULT_SEED),
			Shuffle::Enabled(false) => None,
			Shuffle::Options { seed } => Some(seed),
		}
	}
}

impl Config {
	/// Load a config from a `.json`, `.yaml`, or `.yml` file.
	pub fn from_path(path: &Path) -> Result<Self> {
		let contents = std::fs::read_to_string(path)
			.with_context(|| format!("failed to read config file {}", path.display()))?;
		let extension = path
			.extension()
			.and_then(|extension| extension.to_str())
			.map(|extension| extension.to_lowercase());
		let config: Config = match extension.as_deref() {
			Some("json") => serde_json::from_str(&contents)
				.with_context(|| format!("failed to parse config file {}", path.display()))?,
			Some("yaml") | Some("yml") => serde_yaml::from_str(&contents)
				.with_context(|| format!("failed to parse config file {}", path.display()))?,
			_ => {
				return Err(format_err!(
					"config file {} must have a .json, .yaml or .yml extension",
					path.display()
				))
			}
		};
		config.validate()?;
		Ok(config)
	}

	pub fn validate(&self) -> Result<()> {
		if self.n_splits < 2 {
			return Err(format_err!("n_splits must be at least 2"));
		}
		if self.linear.n_examples_per_batch == 0 {
			return Err(format_err!("n_examples_per_batch must be at least 1"));
		}
		if let Some(early_stopping_options) = &self.linear.early_stopping_options {
			let fraction = early_stopping_options.early_stopping_fraction;
			if !(0.0..1.0).contains(&fraction) {
				return Err(format_err!("early_stopping_fraction must be in [0, 1)"));
			}
		}
		if self.neighbors.n_neighbors == 0 {
			return Err(format_err!("n_neighbors must be at least 1"));
		}
		if self.k_means.n_clusters == 0 {
			return Err(format_err!("n_clusters must be at least 1"));
		}
		Ok(())
	}

	/// The parameters of one model as a JSON object.
	pub fn model_params(&self, model_name: ModelName) -> Result<serde_json::Value> {
		let params = match model_name {
			ModelName::Linear => serde_json::to_value(&self.linear)?,
			ModelName::KNearestNeighbors => serde_json::to_value(&self.neighbors)?,
			ModelName::KMeans => serde_json::to_value(&self.k_means)?,
		};
		Ok(params)
	}

	/**
	Override the parameters of one model with the fields of the JSON object `params`. Parameters that the model does not have, or whose values have the wrong type, are skipped. The returned warnings describe each skipped parameter.
	*/
	pub fn apply_model_params(
		&mut self,
		model_name: ModelName,
		params: &serde_json::Value,
	) -> Result<Vec<String>> {
		let params = params
			.as_object()
			.ok_or_else(|| format_err!("model parameters must be a JSON object"))?;
		let warnings = match model_name {
			ModelName::Linear => merge_params(&mut self.linear, params)?,
			ModelName::KNearestNeighbors => merge_params(&mut self.neighbors, params)?,
			ModelName::KMeans => merge_params(&mut self.k_means, params)?,
		};
		for warning in warnings.iter() {
			log::warn!("{}", warning);
		}
		self.validate()?;
		Ok(warnings)
	}
}

fn merge_params<T>(
	options: &mut T,
	params: &serde_json::Map<String, serde_json::Value>,
) -> Result<Vec<String>>
where
	T: Serialize + DeserializeOwned,
{
	let mut warnings = Vec::new();
	let mut current = match serde_json::to_value(&*options)? {
		serde_json::Value::Object(current) => current,
		_ => return Err(format_err!("model options must serialize to an object")),
	};
	for (key, value) in params.iter() {
		if !current.contains_key(key) {
			warnings.push(format!("skipping unknown parameter \"{}\"", key));
			continue;
		}
		let mut candidate = current.clone();
		candidate.insert(key.clone(), value.clone());
		match serde_json::from_value::<T>(serde_json::Value::Object(candidate.clone())) {
			Ok(_) => current = candidate,
			Err(error) => warnings.push(format!(
				"skipping invalid value {} for parameter \"{}\": {}",
				value, key, error
			)),
		}
	}
	*options = serde_json::from_value(serde_json::Value::Object(current))?;
	Ok(warnings)
}

#[test]
fn test_config_defaults() {
	let config: Config = serde_yaml::from_str("n_splits: 5\nshuffle: { seed: 7 }\n").unwrap();
	assert_eq!(config.n_splits, 5);
	assert_eq!(config.shuffle.seed(), Some(7));
	assert_eq!(config.neighbors.n_neighbors, 5);
	assert_eq!(config.k_means.n_clusters, 8);
	let config: Config = serde_json::from_str(r#"{ "shuffle": false }"#).unwrap();
	assert_eq!(config.shuffle.seed(), None);
	assert_eq!(config.n_splits, 3);
	assert!(serde_json::from_str::<Config>(r#"{ "n_split": 4 }"#).is_err());
}

#[test]
fn test_apply_model_params() {
	let mut config = Config::default();
	let params = serde_json::json!({
		"n_clusters": 3,
		"tolerance": "small",
		"init": "random",
	});
	let warnings = config.apply_model_params(ModelName::KMeans, &params).unwrap();
	assert_eq!(config.k_means.n_clusters, 3);
	assert_eq!(config.k_means.tolerance, 1e-4);
	assert_eq!(warnings.len(), 2);
	assert!(warnings.iter().any(|warning| warning.contains("\"init\"")));
	assert!(warnings.iter().any(|warning| warning.contains("\"tolerance\"")));
}

#[test]
fn test_model_params() {
	let config = Config::default();
	let params = config.model_params(ModelName::KNearestNeighbors).unwrap();
	assert_eq!(params, serde_json::json!({ "n_neighbors": 5 }));
}

#[test]
fn test_config_from_path() {
	let path = std::env::temp_dir().join(format!("eda_models_config_{}.yaml", std::process::id()));
	std::fs::write(&path, "linear:\n  learning_rate: 0.05\n  early_stopping_options: null\n").unwrap();
	let config = Config::from_path(&path);
	std::fs::remove_file(&path).unwrap();
	let config = config.unwrap();
	assert_eq!(config.linear.learning_rate, 0.05);
	assert_eq!(config.linear.early_stopping_options, None);
	assert_eq!(config.linear.max_epochs, 100);
}
