use crate::{
	Config, Error, KFold, KMeans, KNeighborsClassifier, KNeighborsRegressor, LinearClassifier,
	LinearRegressor, ModelName, ModelType, Result, Split, StandardScaler, StratifiedKFold,
};
use eda_dataframe::{format_number, ColumnView, NumberColumnView};
use eda_metrics::{
	calinski_harabasz_score, silhouette_score, Accuracy, MeanSquaredError, MeanVariance,
	StreamingMetric,
};
use eda_stats::{check_classification_ready, class_counts};
use eda_util::finite::{Finite, ToFinite};
use itertools::izip;
use ndarray::prelude::*;
use std::fmt::{self, Display};

/// The result of fitting a model to a pair of columns.
#[derive(Debug, Clone)]
pub struct FitOutput {
	pub model_type: ModelType,
	pub model_name: ModelName,
	pub x_name: String,
	pub y_name: String,
	/// These are the indexes of the rows that have values in both columns. Predictions are in the same order.
	pub rows: Vec<usize>,
	pub predictions: Predictions,
	pub scores: Scores,
}

/// Supervised predictions are made for each row by the model trained on the folds that do not contain it.
#[derive(Debug, Clone, PartialEq)]
pub enum Predictions {
	Regression(Vec<f64>),
	Classification(Vec<String>),
	Clustering(Vec<usize>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Scores {
	CrossValidation {
		metric: &'static str,
		folds: Vec<f64>,
		mean: f64,
		/// This is the population standard deviation of the fold scores.
		std: f64,
	},
	Clustering {
		silhouette: f64,
		calinski_harabasz: f64,
	},
}

/**
Fit a model that predicts `y` from `x`, or, for clustering, that clusters the points `(x, y)`. Rows missing a value in either column are skipped.

Regression and classification models are evaluated with `config.n_splits`-fold cross validation. Classification uses stratified folds and requires every class to have at least `config.n_splits` samples.
*/
pub fn fit(
	x: ColumnView,
	y: ColumnView,
	model_type: ModelType,
	model_name: ModelName,
	config: &Config,
) -> Result<FitOutput> {
	model_type.check_model(model_name)?;
	let x_column = x
		.as_number()
		.ok_or_else(|| Error::NotNumeric(x.name().to_owned()))?;
	if x.len() != y.len() {
		return Err(Error::InvalidInput(format!(
			"\"{}\" has {} rows but \"{}\" has {}",
			x.name(),
			x.len(),
			y.name(),
			y.len()
		)));
	}
	let rows: Vec<usize> = (0..x.len())
		.filter(|row| x_column.data[*row].is_finite() && is_present(y, *row))
		.collect();
	if rows.len() < x.len() {
		log::warn!(
			"skipping {} rows with missing values in \"{}\" or \"{}\"",
			x.len() - rows.len(),
			x.name(),
			y.name()
		);
	}
	if rows.is_empty() {
		return Err(Error::InvalidInput(format!(
			"no rows have values in both \"{}\" and \"{}\"",
			x.name(),
			y.name()
		)));
	}
	log::info!(
		"fitting {} model {} on {} rows",
		model_type,
		model_name,
		rows.len()
	);
	let (predictions, scores) = match model_type {
		ModelType::Regression => {
			let y_column = y
				.as_number()
				.ok_or_else(|| Error::NotNumeric(y.name().to_owned()))?;
			let features = feature_matrix(&[x_column], &rows);
			let labels: Vec<f64> = rows.iter().map(|row| y_column.data[*row]).collect();
			fit_regression(features.view(), &labels, model_name, config)?
		}
		ModelType::Classification => {
			let (classes, labels) = match y {
				ColumnView::Number(y_column) => {
					let values: Vec<Finite<f64>> = rows
						.iter()
						.filter_map(|row| y_column.data[*row].to_finite().ok())
						.collect();
					encode_classes(&values, config.n_splits, |value| {
						format_number(value.get(), y_column.kind)
					})?
				}
				ColumnView::Text(y_column) => {
					let values: Vec<&str> = rows
						.iter()
						.filter_map(|row| y_column.data[*row].as_deref())
						.collect();
					encode_classes(&values, config.n_splits, |value| value.to_string())?
				}
				_ => {
					return Err(Error::InvalidInput(format!(
						"column \"{}\" must be a number or text column to be used as classes",
						y.name()
					)))
				}
			};
			let features = feature_matrix(&[x_column], &rows);
			fit_classification(features.view(), &labels, &classes, model_name, config)?
		}
		ModelType::Clustering => {
			let y_column = y
				.as_number()
				.ok_or_else(|| Error::NotNumeric(y.name().to_owned()))?;
			let features = feature_matrix(&[x_column, y_column], &rows);
			fit_clustering(features.view(), config)?
		}
	};
	Ok(FitOutput {
		model_type,
		model_name,
		x_name: x.name().to_owned(),
		y_name: y.name().to_owned(),
		rows,
		predictions,
		scores,
	})
}

fn is_present(column: ColumnView, row: usize) -> bool {
	match column {
		ColumnView::Unknown(_) => false,
		ColumnView::Number(column) => column.data[row].is_finite(),
		ColumnView::DateTime(column) => column.data[row].is_some(),
		ColumnView::Text(column) => column.data[row].is_some(),
	}
}

fn feature_matrix(columns: &[NumberColumnView], rows: &[usize]) -> Array2<f64> {
	Array2::from_shape_fn((rows.len(), columns.len()), |(index, feature)| {
		columns[feature].data[rows[index]]
	})
}

/// Map each label to the index of its class, with classes in ascending order.
fn encode_classes<T>(
	values: &[T],
	n_splits: usize,
	format: impl Fn(&T) -> String,
) -> Result<(Vec<String>, Vec<usize>)>
where
	T: Ord + Clone + Display,
{
	check_classification_ready(values, n_splits)?;
	let classes: Vec<T> = class_counts(values.iter().cloned()).into_iter().map(|(class, _)| class).collect();
	let labels = values
		.iter()
		.map(|value| classes.binary_search(value).unwrap_or_else(|index| index))
		.collect();
	Ok((classes.iter().map(format).collect(), labels))
}

/// Standardize the training and test features of one fold using statistics of the training features only.
fn scale_split(features: ArrayView2<f64>, split: &Split) -> (Array2<f64>, Array2<f64>) {
	let train_features = features.select(Axis(0), &split.train);
	let test_features = features.select(Axis(0), &split.test);
	let scaler = StandardScaler::fit(train_features.view());
	(
		scaler.transform(train_features.view()),
		scaler.transform(test_features.view()),
	)
}

fn fit_regression(
	features: ArrayView2<f64>,
	labels: &[f64],
	model_name: ModelName,
	config: &Config,
) -> Result<(Predictions, Scores)> {
	let splits = KFold {
		n_splits: config.n_splits,
		seed: config.shuffle.seed(),
	}
	.split(labels.len())?;
	let mut predictions = vec![f64::NAN; labels.len()];
	let mut fold_scores = Vec::with_capacity(splits.len());
	for split in splits.iter() {
		let (train_features, test_features) = scale_split(features, split);
		let train_labels: Vec<f64> = split.train.iter().map(|row| labels[*row]).collect();
		let fold_predictions = match model_name {
			ModelName::Linear => LinearRegressor::train(
				train_features.view(),
				ArrayView1::from(train_labels.as_slice()),
				&config.linear,
			)
			.predict(test_features.view())
			.to_vec(),
			ModelName::KNearestNeighbors => KNeighborsRegressor::train(
				train_features.view(),
				&train_labels,
				config.neighbors.n_neighbors,
			)?
			.predict(test_features.view()),
			ModelName::KMeans => {
				return Err(Error::UnsupportedModel {
					model_type: ModelType::Regression,
					model_name,
				})
			}
		};
		let mut metric = MeanSquaredError::default();
		for (row, prediction) in izip!(split.test.iter(), fold_predictions) {
			predictions[*row] = prediction;
			metric.update((prediction, labels[*row]));
		}
		fold_scores.push(metric.finalize().unwrap_or(f64::NAN));
	}
	Ok((
		Predictions::Regression(predictions),
		cross_validation_scores("Mean Squared Error", fold_scores),
	))
}

fn fit_classification(
	features: ArrayView2<f64>,
	labels: &[usize],
	classes: &[String],
	model_name: ModelName,
	config: &Config,
) -> Result<(Predictions, Scores)> {
	let splits = StratifiedKFold {
		n_splits: config.n_splits,
		seed: config.shuffle.seed(),
	}
	.split(labels)?;
	let mut predictions = vec![0; labels.len()];
	let mut fold_scores = Vec::with_capacity(splits.len());
	for split in splits.iter() {
		let (train_features, test_features) = scale_split(features, split);
		let train_labels: Vec<usize> = split.train.iter().map(|row| labels[*row]).collect();
		let fold_predictions = match model_name {
			ModelName::Linear => LinearClassifier::train(
				train_features.view(),
				ArrayView1::from(train_labels.as_slice()),
				classes.len(),
				&config.linear,
			)
			.predict(test_features.view()),
			ModelName::KNearestNeighbors => KNeighborsClassifier::train(
				train_features.view(),
				&train_labels,
				config.neighbors.n_neighbors,
			)?
			.predict(test_features.view()),
			ModelName::KMeans => {
				return Err(Error::UnsupportedModel {
					model_type: ModelType::Classification,
					model_name,
				})
			}
		};
		let mut metric = Accuracy::new();
		for (row, prediction) in izip!(split.test.iter(), fold_predictions) {
			predictions[*row] = prediction;
			metric.update((prediction, labels[*row]));
		}
		fold_scores.push(metric.finalize().unwrap_or(f64::NAN));
	}
	let predictions = predictions
		.into_iter()
		.map(|class_index| classes[class_index].clone())
		.collect();
	Ok((
		Predictions::Classification(predictions),
		cross_validation_scores("Accuracy", fold_scores),
	))
}

fn fit_clustering(features: ArrayView2<f64>, config: &Config) -> Result<(Predictions, Scores)> {
	let model = KMeans::train(features, &config.k_means)?;
	let undefined = || {
		Error::InvalidInput(format!(
			"clustering scores are undefined for {} clusters of {} rows",
			config.k_means.n_clusters,
			features.nrows()
		))
	};
	let silhouette = silhouette_score(features, &model.labels).ok_or_else(undefined)?;
	let calinski_harabasz =
		calinski_harabasz_score(features, &model.labels).ok_or_else(undefined)?;
	Ok((
		Predictions::Clustering(model.labels),
		Scores::Clustering {
			silhouette,
			calinski_harabasz,
		},
	))
}

fn cross_validation_scores(metric: &'static str, folds: Vec<f64>) -> Scores {
	let mut mean_variance = MeanVariance::default();
	for score in folds.iter() {
		mean_variance.update(*score);
	}
	let (mean, std) = mean_variance
		.finalize()
		.map(|output| (output.mean, output.variance.sqrt()))
		.unwrap_or((f64::NAN, f64::NAN));
	Scores::CrossValidation {
		metric,
		folds,
		mean,
		std,
	}
}

impl FitOutput {
	/// Render the model summary. `model_id` numbers the models fit in one session, starting from 1.
	pub fn summary(&self, model_id: usize) -> Summary {
		Summary {
			output: self,
			model_id,
		}
	}
}

/// The model summary of a [`FitOutput`](struct.FitOutput.html), which implements `Display`.
pub struct Summary<'a> {
	output: &'a FitOutput,
	model_id: usize,
}

impl<'a> Display for Summary<'a> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let output = self.output;
		writeln!(f, "Model ID: {}", self.model_id)?;
		writeln!(f, "Model Type: {}", output.model_type)?;
		writeln!(f, "Model Name: {}", output.model_name)?;
		writeln!(f)?;
		writeln!(f, "X-Axis: {}", output.x_name)?;
		writeln!(f, "Y-Axis: {}", output.y_name)?;
		writeln!(f)?;
		match &output.scores {
			Scores::CrossValidation {
				metric,
				folds,
				mean,
				std,
			} => {
				for (fold_index, score) in folds.iter().enumerate() {
					writeln!(f, "Fold {}: {} = {:.3}", fold_index + 1, metric, score)?;
				}
				writeln!(f, "Overall {}: {:.3} +/- {:.3}", metric, mean, std)?;
			}
			Scores::Clustering {
				silhouette,
				calinski_harabasz,
			} => {
				writeln!(f, "Metric: Silhouette Score = {:.3}", silhouette)?;
				writeln!(f, "Metric: Calinski Harabasz Score = {:.3}", calinski_harabasz)?;
			}
		}
		writeln!(f, "--------")
	}
}

#[cfg(test)]
fn number_column(name: &str, data: Vec<f64>) -> eda_dataframe::Column {
	eda_dataframe::Column::Number(eda_dataframe::NumberColumn {
		name: name.to_owned(),
		kind: eda_dataframe::NumberKind::Float,
		data,
	})
}

#[test]
fn test_fit_regression() {
	let x = number_column("x", (0..30).map(|i| i as f64).collect());
	let y = number_column("y", (0..30).map(|i| 2.0 * i as f64 + 1.0).collect());
	let mut config = Config::default();
	config.linear.max_epochs = 500;
	config.linear.early_stopping_options = None;
	let output = fit(
		x.view(),
		y.view(),
		ModelType::Regression,
		ModelName::Linear,
		&config,
	)
	.unwrap();
	assert_eq!(output.rows.len(), 30);
	match &output.scores {
		Scores::CrossValidation { metric, folds, mean, .. } => {
			assert_eq!(*metric, "Mean Squared Error");
			assert_eq!(folds.len(), 3);
			assert!(*mean < 0.1);
		}
		_ => panic!("expected cross validation scores"),
	}
	match &output.predictions {
		Predictions::Regression(predictions) => {
			assert!(predictions.iter().all(|prediction| prediction.is_finite()));
		}
		_ => panic!("expected regression predictions"),
	}
}

#[test]
fn test_fit_classification() {
	let x = number_column(
		"x",
		vec![1.0, 2.0, 3.0, 1.5, 2.5, 11.0, 12.0, 13.0, 11.5, f64::NAN, 12.5],
	);
	let y = eda_dataframe::Column::Text(eda_dataframe::TextColumn {
		name: "label".to_owned(),
		data: ["low", "low", "low", "low", "low", "high", "high", "high", "high", "high", "high"]
			.iter()
			.map(|value| Some(value.to_string()))
			.collect(),
	});
	let config = Config::default();
	let output = fit(
		x.view(),
		y.view(),
		ModelType::Classification,
		ModelName::KNearestNeighbors,
		&config,
	)
	.unwrap();
	assert_eq!(output.rows.len(), 10);
	let summary = output.summary(1).to_string();
	assert!(summary.contains("Overall Accuracy: "));
	assert!(summary.starts_with("Model ID: 1\nModel Type: Classification\nModel Name: K-Nearest Neighbors\n"));
}

#[test]
fn test_fit_classification_requires_enough_samples_per_class() {
	let x = number_column("x", vec![1.0, 2.0, 3.0, 4.0]);
	let y = number_column("y", vec![0.0, 0.0, 0.0, 1.0]);
	let error = fit(
		x.view(),
		y.view(),
		ModelType::Classification,
		ModelName::Linear,
		&Config::default(),
	)
	.unwrap_err();
	assert!(matches!(
		error,
		Error::Stats(eda_stats::Error::InsufficientSamplesPerClass { .. })
	));
}

#[test]
fn test_fit_clustering() {
	let x = number_column("x", vec![0.0, 0.2, 0.1, 5.0, 5.2, 5.1]);
	let y = number_column("y", vec![0.0, 0.1, 0.2, 5.0, 5.1, 5.2]);
	let mut config = Config::default();
	config.k_means.n_clusters = 2;
	let output = fit(
		x.view(),
		y.view(),
		ModelType::Clustering,
		ModelName::KMeans,
		&config,
	)
	.unwrap();
	match &output.scores {
		Scores::Clustering { silhouette, .. } => assert!(*silhouette > 0.9),
		_ => panic!("expected clustering scores"),
	}
	let summary = output.summary(2).to_string();
	assert!(summary.contains("Metric: Silhouette Score = "));
	assert!(summary.ends_with("--------\n"));
}

#[test]
fn test_fit_rejects_unsupported_models_and_columns() {
	let x = number_column("x", vec![1.0, 2.0, 3.0]);
	let y = eda_dataframe::Column::Text(eda_dataframe::TextColumn {
		name: "y".to_owned(),
		data: vec![Some("a".to_owned()), Some("b".to_owned()), Some("c".to_owned())],
	});
	let config = Config::default();
	assert!(matches!(
		fit(x.view(), y.view(), ModelType::Regression, ModelName::KMeans, &config),
		Err(Error::UnsupportedModel { .. })
	));
	assert!(matches!(
		fit(x.view(), y.view(), ModelType::Regression, ModelName::Linear, &config),
		Err(Error::NotNumeric(_))
	));
}

#[test]
fn test_fit_rejects_columns_of_different_lengths() {
	let x = number_column("x", vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
	let y = number_column("y", vec![1.0, 2.0, 3.0]);
	let error = fit(
		x.view(),
		y.view(),
		ModelType::Regression,
		ModelName::Linear,
		&Config::default(),
	)
	.unwrap_err();
	assert!(matches!(error, Error::InvalidInput(_)));
	assert_eq!(error.to_string(), "invalid input: \"x\" has 6 rows but \"y\" has 3");
}

#[test]
fn test_summary() {
	let output = FitOutput {
		model_type: ModelType::Regression,
		model_name: ModelName::Linear,
		x_name: "x".to_owned(),
		y_name: "y".to_owned(),
		rows: vec![],
		predictions: Predictions::Regression(vec![]),
		scores: cross_validation_scores("Mean Squared Error", vec![1.0, 2.0, 3.0]),
	};
	insta::assert_snapshot!(output.summary(3).to_string(), @r###"
 Model ID: 3
 Model Type: Regression
 Model Name: Linear Model

 X-Axis: x
 Y-Axis: y

 Fold 1: Mean Squared Error = 1.000
 Fold 2: Mean Squared Error = 2.000
 Fold 3: Mean Squared Error = 3.000
 Overall Mean Squared Error: 2.000 +/- 0.816
 --------
 "###);
}
