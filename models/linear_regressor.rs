use crate::{
	early_stopping::{train_early_stopping_split, EarlyStoppingMonitor},
	LinearOptions,
};
use eda_metrics::{MeanSquaredError, StreamingMetric};
use itertools::izip;
use ndarray::prelude::*;

/// This struct describes a linear regressor model. You can train one by calling `LinearRegressor::train`.
#[derive(Debug, Clone)]
pub struct LinearRegressor {
	pub bias: f64,
	pub weights: Array1<f64>,
	/// These are the early stopping losses for each epoch.
	pub losses: Vec<f64>,
}

impl LinearRegressor {
	/// Train a linear regressor with mini-batch gradient descent on the squared error.
	pub fn train(features: ArrayView2<f64>, labels: ArrayView1<f64>, options: &LinearOptions) -> Self {
		let n_features = features.ncols();
		let (features_train, labels_train, features_early_stopping, labels_early_stopping) =
			train_early_stopping_split(
				features,
				labels,
				options
					.early_stopping_options
					.as_ref()
					.map(|o| o.early_stopping_fraction)
					.unwrap_or(0.0),
			);
		let mut model = Self {
			bias: 0.0,
			weights: Array1::<f64>::zeros(n_features),
			losses: vec![],
		};
		let mut early_stopping_monitor = match &options.early_stopping_options {
			Some(early_stopping_options) if features_early_stopping.nrows() > 0 => {
				Some(EarlyStoppingMonitor::new(
					early_stopping_options.min_decrease_in_loss_for_significant_change,
					early_stopping_options.n_epochs_without_improvement_to_stop,
				))
			}
			_ => None,
		};
		let batch_size = options.n_examples_per_batch.max(1);
		for epoch in 0..options.max_epochs {
			for (features, labels) in izip!(
				features_train.axis_chunks_iter(Axis(0), batch_size),
				labels_train.axis_chunks_iter(Axis(0), batch_size),
			) {
				model.train_batch(features, labels, options);
			}
			if let Some(early_stopping_monitor) = early_stopping_monitor.as_mut() {
				let loss = model.compute_mean_squared_error(features_early_stopping, labels_early_stopping);
				model.losses.push(loss);
				if early_stopping_monitor.update(loss) {
					log::debug!("stopped training the linear regressor after {} epochs", epoch + 1);
					break;
				}
			}
		}
		model
	}

	fn train_batch(&mut self, features: ArrayView2<f64>, labels: ArrayView1<f64>, options: &LinearOptions) {
		let learning_rate = options.learning_rate;
		let n = features.nrows() as f64;
		let py = features.dot(&self.weights) + self.bias - labels;
		let weight_gradients = features.t().dot(&py) / n;
		let bias_gradient = py.sum() / n;
		for (weight, weight_gradient) in izip!(self.weights.iter_mut(), weight_gradients.iter()) {
			*weight += -learning_rate * (weight_gradient + options.l2_regularization * *weight);
		}
		self.bias += -learning_rate * bias_gradient;
	}

	fn compute_mean_squared_error(&self, features: ArrayView2<f64>, labels: ArrayView1<f64>) -> f64 {
		let mut metric = MeanSquaredError::default();
		for (prediction, label) in izip!(self.predict(features).iter(), labels.iter()) {
			metric.update((*prediction, *label));
		}
		metric.finalize().unwrap_or(f64::NAN)
	}

	pub fn predict(&self, features: ArrayView2<f64>) -> Array1<f64> {
		features.dot(&self.weights) + self.bias
	}
}

#[test]
fn test_linear_regressor() {
	let features = Array2::from_shape_fn((40, 1), |(i, _)| (i as f64 - 20.0) / 10.0);
	let labels = features.column(0).mapv(|x| 3.0 * x - 1.0);
	let options = LinearOptions {
		max_epochs: 500,
		n_examples_per_batch: 8,
		early_stopping_options: None,
		..Default::default()
	};
	let model = LinearRegressor::train(features.view(), labels.view(), &options);
	assert!((model.weights[0] - 3.0).abs() < 1e-3);
	assert!((model.bias + 1.0).abs() < 1e-3);
	let predictions = model.predict(array![[1.0]].view());
	assert!((predictions[0] - 2.0).abs() < 1e-2);
}

#[test]
fn test_linear_regressor_early_stopping() {
	let features = Array2::from_shape_fn((50, 1), |(i, _)| ((i * 7) % 50) as f64 / 25.0 - 1.0);
	let labels = features.column(0).mapv(|x| 0.5 * x + 2.0);
	let options = LinearOptions::default();
	let model = LinearRegressor::train(features.view(), labels.view(), &options);
	assert!(!model.losses.is_empty());
	assert!(model.losses.len() <= options.max_epochs);
	assert!(*model.losses.last().unwrap() < 0.05);
}
