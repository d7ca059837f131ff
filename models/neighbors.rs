use crate::{Error, Result};
use eda_metrics::{Mean, Metric, Mode, StreamingMetric};
use itertools::izip;
use ndarray::prelude::*;
use std::cmp::Ordering;

/// A KNeighborsClassifier predicts the most common class among the `n_neighbors` nearest training examples. Ties go to the smallest class index.
#[derive(Debug, Clone)]
pub struct KNeighborsClassifier {
	n_neighbors: usize,
	features: Array2<f64>,
	labels: Vec<usize>,
}

/// A KNeighborsRegressor predicts the mean label of the `n_neighbors` nearest training examples.
#[derive(Debug, Clone)]
pub struct KNeighborsRegressor {
	n_neighbors: usize,
	features: Array2<f64>,
	labels: Vec<f64>,
}

impl KNeighborsClassifier {
	pub fn train(features: ArrayView2<f64>, labels: &[usize], n_neighbors: usize) -> Result<Self> {
		check_n_neighbors(n_neighbors, features.nrows())?;
		Ok(Self {
			n_neighbors,
			features: features.to_owned(),
			labels: labels.to_owned(),
		})
	}

	pub fn predict(&self, features: ArrayView2<f64>) -> Vec<usize> {
		features
			.axis_iter(Axis(0))
			.map(|example| {
				let neighbor_labels: Vec<usize> =
					nearest_neighbors(self.features.view(), example, self.n_neighbors)
						.into_iter()
						.map(|index| self.labels[index])
						.collect();
				Mode::<usize>::compute(neighbor_labels.as_slice())
					.copied()
					.unwrap_or_default()
			})
			.collect()
	}
}

impl KNeighborsRegressor {
	pub fn train(features: ArrayView2<f64>, labels: &[f64], n_neighbors: usize) -> Result<Self> {
		check_n_neighbors(n_neighbors, features.nrows())?;
		Ok(Self {
			n_neighbors,
			features: features.to_owned(),
			labels: labels.to_owned(),
		})
	}

	pub fn predict(&self, features: ArrayView2<f64>) -> Vec<f64> {
		features
			.axis_iter(Axis(0))
			.map(|example| {
				let mut mean = Mean::default();
				for index in nearest_neighbors(self.features.view(), example, self.n_neighbors) {
					mean.update(self.labels[index]);
				}
				mean.finalize().unwrap_or(f64::NAN)
			})
			.collect()
	}
}

fn check_n_neighbors(n_neighbors: usize, n_examples: usize) -> Result<()> {
	if n_neighbors == 0 || n_neighbors > n_examples {
		return Err(Error::InvalidInput(format!(
			"n_neighbors must be between 1 and the number of training examples ({}), got {}",
			n_examples, n_neighbors
		)));
	}
	Ok(())
}

/// Return the indexes of the `k` training examples closest to `example`. Examples at equal distances are ordered by index.
fn nearest_neighbors(features: ArrayView2<f64>, example: ArrayView1<f64>, k: usize) -> Vec<usize> {
	let mut distances: Vec<(f64, usize)> = features
		.axis_iter(Axis(0))
		.enumerate()
		.map(|(index, train_example)| {
			let distance: f64 = izip!(train_example, example)
				.map(|(a, b)| (a - b).powi(2))
				.sum();
			(distance, index)
		})
		.collect();
	distances.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
	distances.into_iter().take(k).map(|(_, index)| index).collect()
}

#[test]
fn test_k_neighbors_classifier() {
	let features = array![[0.0], [1.0], [2.0], [10.0], [11.0]];
	let model = KNeighborsClassifier::train(features.view(), &[0, 0, 1, 1, 1], 3).unwrap();
	assert_eq!(model.predict(array![[0.5], [10.5], [1.6]].view()), vec![0, 1, 0]);
	let model = KNeighborsClassifier::train(features.view(), &[1, 0, 1, 0, 1], 2).unwrap();
	// The two nearest labels of 0.4 are 1 and 0, and the tie goes to class 0.
	assert_eq!(model.predict(array![[0.4]].view()), vec![0]);
	assert!(KNeighborsClassifier::train(features.view(), &[0, 0, 1, 1, 1], 6).is_err());
}

#[test]
fn test_k_neighbors_regressor() {
	let features = array![[0.0], [1.0], [2.0], [10.0]];
	let model = KNeighborsRegressor::train(features.view(), &[1.0, 2.0, 6.0, 100.0], 2).unwrap();
	assert_eq!(model.predict(array![[0.2], [9.0]].view()), vec![1.5, 53.0]);
}
