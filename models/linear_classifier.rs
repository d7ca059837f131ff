use crate::{
	early_stopping::{train_early_stopping_split, EarlyStoppingMonitor},
	LinearOptions,
};
use eda_metrics::{Mean, StreamingMetric};
use itertools::izip;
use ndarray::prelude::*;

/// This struct describes a multiclass linear classifier. It trains `n_classes` linear models whose outputs are combined with the `softmax` function.
#[derive(Debug, Clone)]
pub struct LinearClassifier {
	pub biases: Array1<f64>,
	/// The weights have shape `(n_features, n_classes)`.
	pub weights: Array2<f64>,
	/// These are the early stopping losses for each epoch.
	pub losses: Vec<f64>,
}

impl LinearClassifier {
	/// Train a classifier on `labels`, which are class indexes in `0..n_classes`, with mini-batch gradient descent on the cross entropy.
	pub fn train(
		features: ArrayView2<f64>,
		labels: ArrayView1<usize>,
		n_classes: usize,
		options: &LinearOptions,
	) -> Self {
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
			biases: Array1::<f64>::zeros(n_classes),
			weights: Array2::<f64>::zeros((n_features, n_classes)),
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
				let loss = model.compute_cross_entropy(features_early_stopping, labels_early_stopping);
				model.losses.push(loss);
				if early_stopping_monitor.update(loss) {
					log::debug!("stopped training the linear classifier after {} epochs", epoch + 1);
					break;
				}
			}
		}
		model
	}

	fn train_batch(&mut self, features: ArrayView2<f64>, labels: ArrayView1<usize>, options: &LinearOptions) {
		let learning_rate = options.learning_rate;
		let n = features.nrows() as f64;
		let mut py = self.predict_probabilities(features);
		for (mut row, label) in izip!(py.axis_iter_mut(Axis(0)), labels.iter()) {
			row[*label] -= 1.0;
		}
		let weight_gradients = features.t().dot(&py) / n;
		let bias_gradients = py.sum_axis(Axis(0)) / n;
		let l2_regularization = options.l2_regularization;
		self.weights
			.zip_mut_with(&weight_gradients, |weight, weight_gradient| {
				*weight += -learning_rate * (weight_gradient + l2_regularization * *weight)
			});
		self.biases
			.zip_mut_with(&bias_gradients, |bias, bias_gradient| *bias += -learning_rate * bias_gradient);
	}

	fn compute_cross_entropy(&self, features: ArrayView2<f64>, labels: ArrayView1<usize>) -> f64 {
		let probabilities = self.predict_probabilities(features);
		let mut metric = Mean::default();
		for (probabilities, label) in izip!(probabilities.axis_iter(Axis(0)), labels.iter()) {
			metric.update(-probabilities[*label].max(f64::EPSILON).ln());
		}
		metric.finalize().unwrap_or(f64::NAN)
	}

	/// Compute the probability of each class, with shape `(n_examples, n_classes)`.
	pub fn predict_probabilities(&self, features: ArrayView2<f64>) -> Array2<f64> {
		let mut logits = features.dot(&self.weights) + &self.biases;
		softmax(logits.view_mut());
		logits
	}

	/// Predict the most probable class index for each example.
	pub fn predict(&self, features: ArrayView2<f64>) -> Vec<usize> {
		self.predict_probabilities(features)
			.axis_iter(Axis(0))
			.map(|probabilities| {
				probabilities
					.iter()
					.enumerate()
					.fold((0, f64::NEG_INFINITY), |best, (class_index, probability)| {
						if *probability > best.1 {
							(class_index, *probability)
						} else {
							best
						}
					})
					.0
			})
			.collect()
	}
}

fn softmax(mut logits: ArrayViewMut2<f64>) {
	for mut logits in logits.axis_iter_mut(Axis(0)) {
		let max = logits.iter().fold(f64::MIN, |a, &b| a.max(b));
		logits -= max;
		logits.mapv_inplace(|l| l.exp());
		let sum = logits.iter().fold(0.0, |a, b| a + b);
		logits /= sum;
	}
}

#[test]
fn test_linear_classifier() {
	let features = array![[-2.0], [-1.5], [-1.0], [-0.5], [0.5], [1.0], [1.5], [2.0]];
	let labels = array![0, 0, 0, 0, 1, 1, 1, 1];
	let options = LinearOptions {
		max_epochs: 200,
		early_stopping_options: None,
		..Default::default()
	};
	let model = LinearClassifier::train(features.view(), labels.view(), 2, &options);
	assert_eq!(model.predict(features.view()), vec![0, 0, 0, 0, 1, 1, 1, 1]);
	let probabilities = model.predict_probabilities(array![[3.0]].view());
	assert!((probabilities.sum() - 1.0).abs() < 1e-9);
	assert!(probabilities[[0, 1]] > 0.9);
}
