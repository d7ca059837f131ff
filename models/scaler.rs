use eda_metrics::{MeanVariance, StreamingMetric};
use ndarray::prelude::*;

/// A StandardScaler centers each feature on its training mean and divides by its training standard deviation. Features with zero standard deviation are only centered.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
	pub means: Array1<f64>,
	pub scales: Array1<f64>,
}

impl StandardScaler {
	pub fn fit(features: ArrayView2<f64>) -> Self {
		let mut means = Array1::zeros(features.ncols());
		let mut scales = Array1::ones(features.ncols());
		for (column, mean, scale) in
			itertools::izip!(features.axis_iter(Axis(1)), means.iter_mut(), scales.iter_mut())
		{
			let mut metric = MeanVariance::default();
			for value in column.iter() {
				metric.update(*value);
			}
			if let Some(output) = metric.finalize() {
				*mean = output.mean;
				let sd = output.variance.sqrt();
				if sd > 0.0 {
					*scale = sd;
				}
			}
		}
		Self { means, scales }
	}

	pub fn transform(&self, features: ArrayView2<f64>) -> Array2<f64> {
		(&features - &self.means) / &self.scales
	}
}

#[test]
fn test_standard_scaler() {
	let features = array![[1.0, 5.0], [3.0, 5.0]];
	let scaler = StandardScaler::fit(features.view());
	assert_eq!(scaler.means, array![2.0, 5.0]);
	assert_eq!(scaler.scales, array![1.0, 1.0]);
	let transformed = scaler.transform(array![[1.0, 5.0], [4.0, 6.0]].view());
	assert_eq!(transformed, array![[-1.0, 0.0], [2.0, 1.0]]);
}
