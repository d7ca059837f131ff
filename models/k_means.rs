use crate::{Error, KMeansOptions, Result};
use eda_metrics::{MeanVariance, StreamingMetric};
use itertools::izip;
use ndarray::prelude::*;
use rand::{distributions::WeightedIndex, prelude::*};
use rand_xoshiro::Xoshiro256Plus;

/// This struct describes a k-means clustering, found with Lloyd's algorithm from centroids chosen by k-means++.
#[derive(Debug, Clone)]
pub struct KMeans {
	/// The centroids have shape `(n_clusters, n_features)`.
	pub centroids: Array2<f64>,
	/// This is the index of the nearest centroid for each training example.
	pub labels: Vec<usize>,
	/// This is the sum of squared distances from each example to its centroid.
	pub inertia: f64,
	pub n_iterations: usize,
}

impl KMeans {
	pub fn train(features: ArrayView2<f64>, options: &KMeansOptions) -> Result<Self> {
		let n_examples = features.nrows();
		let n_clusters = options.n_clusters;
		if n_clusters == 0 || n_clusters > n_examples {
			return Err(Error::InvalidInput(format!(
				"n_clusters must be between 1 and the number of examples ({}), got {}",
				n_examples, n_clusters
			)));
		}
		let mut rng = Xoshiro256Plus::seed_from_u64(options.seed);
		let mut centroids = initial_centroids(features, n_clusters, &mut rng);
		let tolerance = options.tolerance * mean_variance(features);
		let mut labels = vec![0; n_examples];
		let mut n_iterations = 0;
		for _ in 0..options.max_iterations {
			n_iterations += 1;
			assign(features, centroids.view(), &mut labels);
			let new_centroids = update_centroids(features, &labels, centroids.view());
			let shift: f64 = izip!(new_centroids.iter(), centroids.iter())
				.map(|(a, b)| (a - b).powi(2))
				.sum();
			centroids = new_centroids;
			if shift <= tolerance {
				break;
			}
		}
		let inertia = assign(features, centroids.view(), &mut labels);
		log::debug!(
			"k-means converged after {} iterations with inertia {}",
			n_iterations,
			inertia
		);
		Ok(Self {
			centroids,
			labels,
			inertia,
			n_iterations,
		})
	}

	/// Return the index of the nearest centroid for each example.
	pub fn predict(&self, features: ArrayView2<f64>) -> Vec<usize> {
		let mut labels = vec![0; features.nrows()];
		assign(features, self.centroids.view(), &mut labels);
		labels
	}
}

/// Choose the first centroid uniformly, and each subsequent one with probability proportional to its squared distance from the nearest centroid chosen so far.
fn initial_centroids(features: ArrayView2<f64>, n_clusters: usize, rng: &mut Xoshiro256Plus) -> Array2<f64> {
	let n_examples = features.nrows();
	let mut centroids = Array2::zeros((n_clusters, features.ncols()));
	let first = rng.gen_range(0..n_examples);
	centroids.row_mut(0).assign(&features.row(first));
	let mut distances: Vec<f64> = features
		.axis_iter(Axis(0))
		.map(|example| squared_distance(example, features.row(first)))
		.collect();
	for cluster_index in 1..n_clusters {
		let next = match WeightedIndex::new(&distances) {
			Ok(distribution) => distribution.sample(rng),
			// Every remaining example coincides with a centroid.
			Err(_) => rng.gen_range(0..n_examples),
		};
		centroids.row_mut(cluster_index).assign(&features.row(next));
		for (distance, example) in izip!(distances.iter_mut(), features.axis_iter(Axis(0))) {
			*distance = distance.min(squared_distance(example, features.row(next)));
		}
	}
	centroids
}

/// Assign each example to its nearest centroid, with ties going to the lowest index, and return the inertia.
fn assign(features: ArrayView2<f64>, centroids: ArrayView2<f64>, labels: &mut [usize]) -> f64 {
	let mut inertia = 0.0;
	for (example, label) in izip!(features.axis_iter(Axis(0)), labels.iter_mut()) {
		let (nearest, distance) = centroids
			.axis_iter(Axis(0))
			.map(|centroid| squared_distance(example, centroid))
			.enumerate()
			.fold((0, f64::INFINITY), |best, (index, distance)| {
				if distance < best.1 {
					(index, distance)
				} else {
					best
				}
			});
		*label = nearest;
		inertia += distance;
	}
	inertia
}

/// Move each centroid to the mean of its examples. Centroids without examples stay where they are.
fn update_centroids(features: ArrayView2<f64>, labels: &[usize], centroids: ArrayView2<f64>) -> Array2<f64> {
	let mut sums = Array2::<f64>::zeros(centroids.raw_dim());
	let mut counts = vec![0usize; centroids.nrows()];
	for (example, label) in izip!(features.axis_iter(Axis(0)), labels.iter()) {
		let mut sum = sums.row_mut(*label);
		sum += &example;
		counts[*label] += 1;
	}
	let mut new_centroids = centroids.to_owned();
	for (mut centroid, sum, count) in izip!(new_centroids.axis_iter_mut(Axis(0)), sums.axis_iter(Axis(0)), counts) {
		if count > 0 {
			centroid.assign(&(&sum / count as f64));
		}
	}
	new_centroids
}

fn mean_variance(features: ArrayView2<f64>) -> f64 {
	let variances: Vec<f64> = features
		.axis_iter(Axis(1))
		.map(|column| {
			let mut metric = MeanVariance::default();
			for value in column.iter() {
				metric.update(*value);
			}
			metric.finalize().map(|output| output.variance).unwrap_or(0.0)
		})
		.collect();
	if variances.is_empty() {
		0.0
	} else {
		variances.iter().sum::<f64>() / variances.len() as f64
	}
}

fn squared_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
	izip!(a, b).map(|(a, b)| (a - b).powi(2)).sum()
}

#[test]
fn test_k_means() {
	let features = array![
		[0.0, 0.0],
		[0.5, 0.0],
		[0.0, 0.5],
		[10.0, 10.0],
		[10.5, 10.0],
		[10.0, 10.5],
	];
	let options = KMeansOptions {
		n_clusters: 2,
		..Default::default()
	};
	let model = KMeans::train(features.view(), &options).unwrap();
	assert_eq!(model.labels[0], model.labels[1]);
	assert_eq!(model.labels[0], model.labels[2]);
	assert_eq!(model.labels[3], model.labels[4]);
	assert_eq!(model.labels[3], model.labels[5]);
	assert_ne!(model.labels[0], model.labels[3]);
	// Each centroid sits 1/6 from its corner on both axes, so each cluster contributes 1/3.
	assert!((model.inertia - 2.0 / 3.0).abs() < 1e-9);
	assert_eq!(model.predict(array![[9.0, 9.0]].view())[0], model.labels[3]);
	let again = KMeans::train(features.view(), &options).unwrap();
	assert_eq!(again.labels, model.labels);
}

#[test]
fn test_k_means_too_many_clusters() {
	let features = array![[0.0], [1.0]];
	let options = KMeansOptions {
		n_clusters: 3,
		..Default::default()
	};
	assert!(KMeans::train(features.view(), &options).is_err());
}
