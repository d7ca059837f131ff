/*!
These scores evaluate a clustering without ground truth labels. Both are undefined unless the number of distinct clusters is at least 2 and at most `n_samples - 1`, in which case they return `None`.
*/

use itertools::izip;
use ndarray::prelude::*;
use std::collections::BTreeMap;

/// The mean silhouette coefficient over all samples. For each sample, `a` is the mean distance to the other members of its cluster and `b` is the smallest mean distance to the members of another cluster. The coefficient is `(b - a) / max(a, b)`, or zero for samples alone in their cluster.
pub fn silhouette_score(features: ArrayView2<f64>, labels: &[usize]) -> Option<f64> {
	let clusters = cluster_members(labels);
	if !is_valid_clustering(clusters.len(), labels.len()) {
		return None;
	}
	let mut total = 0.0;
	for (index, (sample, label)) in izip!(features.axis_iter(Axis(0)), labels).enumerate() {
		let own_cluster = &clusters[label];
		if own_cluster.len() == 1 {
			continue;
		}
		let mean_distance = |members: &[usize]| -> f64 {
			let sum: f64 = members
				.iter()
				.filter(|member| **member != index)
				.map(|member| euclidean_distance(sample, features.row(*member)))
				.sum();
			let n = members.iter().filter(|member| **member != index).count();
			sum / n as f64
		};
		let a = mean_distance(own_cluster);
		let b = clusters
			.iter()
			.filter(|(other_label, _)| *other_label != label)
			.map(|(_, members)| mean_distance(members))
			.fold(f64::INFINITY, f64::min);
		let max = f64::max(a, b);
		if max > 0.0 {
			total += (b - a) / max;
		}
	}
	Some(total / labels.len() as f64)
}

/// The ratio of between-cluster dispersion to within-cluster dispersion, each normalized by its degrees of freedom. If every cluster is a single point, the score is 1.
pub fn calinski_harabasz_score(features: ArrayView2<f64>, labels: &[usize]) -> Option<f64> {
	let clusters = cluster_members(labels);
	let n_samples = labels.len();
	let n_clusters = clusters.len();
	if !is_valid_clustering(n_clusters, n_samples) {
		return None;
	}
	let mean = features.mean_axis(Axis(0))?;
	let mut between = 0.0;
	let mut within = 0.0;
	for members in clusters.values() {
		let cluster = features.select(Axis(0), members);
		let cluster_mean = cluster.mean_axis(Axis(0))?;
		between += members.len() as f64 * squared_distance(cluster_mean.view(), mean.view());
		for sample in cluster.axis_iter(Axis(0)) {
			within += squared_distance(sample, cluster_mean.view());
		}
	}
	if within == 0.0 {
		return Some(1.0);
	}
	Some(between * (n_samples - n_clusters) as f64 / (within * (n_clusters - 1) as f64))
}

fn cluster_members(labels: &[usize]) -> BTreeMap<usize, Vec<usize>> {
	let mut clusters: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
	for (index, label) in labels.iter().enumerate() {
		clusters.entry(*label).or_default().push(index);
	}
	clusters
}

fn is_valid_clustering(n_clusters: usize, n_samples: usize) -> bool {
	n_clusters >= 2 && n_clusters < n_samples
}

fn squared_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
	izip!(a, b).map(|(a, b)| (a - b).powi(2)).sum()
}

fn euclidean_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
	squared_distance(a, b).sqrt()
}

#[test]
fn test_silhouette_score() {
	let features = array![[0.0], [1.0], [10.0], [11.0]];
	let score = silhouette_score(features.view(), &[0, 0, 1, 1]).unwrap();
	// Each sample has a = 1, and b is 9.5, 10.5, 9.5 or 10.5.
	let expected = ((8.5 / 9.5) + (9.5 / 10.5)) / 2.0;
	assert!((score - expected).abs() < 1e-12);
	assert!(silhouette_score(features.view(), &[0, 0, 0, 0]).is_none());
	assert!(silhouette_score(features.view(), &[0, 1, 2, 3]).is_none());
}

#[test]
fn test_calinski_harabasz_score() {
	let features = array![[0.0], [2.0], [10.0], [12.0]];
	let score = calinski_harabasz_score(features.view(), &[0, 0, 1, 1]).unwrap();
	// The between dispersion is 2 * 25 + 2 * 25 = 100 and the within dispersion is 4 * 1 = 4.
	assert!((score - 100.0 * 2.0 / (4.0 * 1.0)).abs() < 1e-12);
	let features = array![[0.0], [0.0], [5.0]];
	assert_eq!(calinski_harabasz_score(features.view(), &[0, 0, 1]), Some(1.0));
}
