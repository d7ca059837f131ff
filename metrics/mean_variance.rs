//! https://en.wikipedia.org/wiki/Algorithms_for_calculating_variance#Parallel_algorithm

use super::StreamingMetric;
use num_traits::ToPrimitive;

/// Combine two separate means and sums of squared deviations into a single mean and sum of squared deviations. Merging a single value `x` repeated `n` times is `merge_mean_m2(n_a, mean_a, m2_a, n, x, 0.0)`.
pub fn merge_mean_m2(
	n_a: u64,
	mean_a: f64,
	m2_a: f64,
	n_b: u64,
	mean_b: f64,
	m2_b: f64,
) -> (f64, f64) {
	let n_a = n_a.to_f64().unwrap_or(f64::NAN);
	let n_b = n_b.to_f64().unwrap_or(f64::NAN);
	(
		(((n_a * mean_a) + (n_b * mean_b)) / (n_a + n_b)),
		m2_a + m2_b + (mean_b - mean_a) * (mean_b - mean_a) * (n_a * n_b / (n_a + n_b)),
	)
}

/// This is the population variance, which divides by `n`.
pub fn m2_to_variance(m2: f64, n: u64) -> f64 {
	m2 / n.to_f64().unwrap_or(f64::NAN)
}

/// The population mean and variance of the inputs.
#[derive(Debug, Clone, Default)]
pub struct MeanVariance {
	n: u64,
	mean: f64,
	m2: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeanVarianceOutput {
	pub n: u64,
	pub mean: f64,
	pub variance: f64,
}

impl MeanVariance {
	/// Add `count` copies of `value` at once, which is how histograms of unique values are aggregated.
	pub fn update_with_count(&mut self, value: f64, count: u64) {
		if count == 0 {
			return;
		}
		let (mean, m2) = merge_mean_m2(self.n, self.mean, self.m2, count, value, 0.0);
		self.n += count;
		self.mean = mean;
		self.m2 = m2;
	}
}

impl StreamingMetric<'_> for MeanVariance {
	type Input = f64;
	type Output = Option<MeanVarianceOutput>;

	fn update(&mut self, value: f64) {
		self.update_with_count(value, 1)
	}

	fn merge(&mut self, other: Self) {
		if other.n == 0 {
			return;
		}
		let (mean, m2) = merge_mean_m2(self.n, self.mean, self.m2, other.n, other.mean, other.m2);
		self.n += other.n;
		self.mean = mean;
		self.m2 = m2;
	}

	fn finalize(self) -> Self::Output {
		if self.n == 0 {
			return None;
		}
		Some(MeanVarianceOutput {
			n: self.n,
			mean: self.mean,
			variance: m2_to_variance(self.m2, self.n),
		})
	}
}

#[test]
fn test_mean_variance() {
	let mut metric = MeanVariance::default();
	metric.update_with_count(1.0, 3);
	metric.update(2.0);
	let output = metric.finalize().unwrap();
	assert_eq!(output.n, 4);
	assert_eq!(output.mean, 1.25);
	assert_eq!(output.variance, 0.1875);
}

#[test]
fn test_mean_variance_merge() {
	let mut a = MeanVariance::default();
	for value in [2.0, 4.0, 4.0, 4.0].iter() {
		a.update(*value);
	}
	let mut b = MeanVariance::default();
	for value in [5.0, 5.0, 7.0, 9.0].iter() {
		b.update(*value);
	}
	a.merge(b);
	a.merge(MeanVariance::default());
	let output = a.finalize().unwrap();
	assert_eq!(output.mean, 5.0);
	assert_eq!(output.variance, 4.0);
	assert_eq!(MeanVariance::default().finalize(), None);
}
