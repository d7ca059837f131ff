use crate::{Error, Result};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ModelType {
	Classification,
	Regression,
	Clustering,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ModelName {
	Linear,
	KNearestNeighbors,
	KMeans,
}

impl ModelType {
	/// These are the models that can be fit for this model type.
	pub fn models(self) -> &'static [ModelName] {
		match self {
			ModelType::Classification | ModelType::Regression => {
				&[ModelName::Linear, ModelName::KNearestNeighbors]
			}
			ModelType::Clustering => &[ModelName::KMeans],
		}
	}

	pub fn check_model(self, model_name: ModelName) -> Result<()> {
		if self.models().contains(&model_name) {
			Ok(())
		} else {
			Err(Error::UnsupportedModel {
				model_type: self,
				model_name,
			})
		}
	}

	pub fn is_supervised(self) -> bool {
		!matches!(self, ModelType::Clustering)
	}
}

impl fmt::Display for ModelType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			ModelType::Classification => "Classification",
			ModelType::Regression => "Regression",
			ModelType::Clustering => "Clustering",
		};
		write!(f, "{}", s)
	}
}

impl std::str::FromStr for ModelType {
	type Err = Error;
	fn from_str(s: &str) -> Result<Self> {
		match s.to_lowercase().as_str() {
			"classification" => Ok(ModelType::Classification),
			"regression" => Ok(ModelType::Regression),
			"clustering" => Ok(ModelType::Clustering),
			_ => Err(Error::InvalidInput(format!(
				"unknown model type \"{}\", expected one of classification, regression, clustering",
				s
			))),
		}
	}
}

impl fmt::Display for ModelName {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			ModelName::Linear => "Linear Model",
			ModelName::KNearestNeighbors => "K-Nearest Neighbors",
			ModelName::KMeans => "K-Means",
		};
		write!(f, "{}", s)
	}
}

impl std::str::FromStr for ModelName {
	type Err = Error;
	fn from_str(s: &str) -> Result<Self> {
		match s.to_lowercase().as_str() {
			"linear" | "linear model" => Ok(ModelName::Linear),
			"knn" | "neighbors" | "k-nearest neighbors" => Ok(ModelName::KNearestNeighbors),
			"kmeans" | "k-means" => Ok(ModelName::KMeans),
			_ => Err(Error::InvalidInput(format!(
				"unknown model \"{}\", expected one of linear, knn, kmeans",
				s
			))),
		}
	}
}

#[test]
fn test_check_model() {
	assert!(ModelType::Regression.check_model(ModelName::Linear).is_ok());
	assert!(ModelType::Clustering.check_model(ModelName::KMeans).is_ok());
	let error = ModelType::Classification
		.check_model(ModelName::KMeans)
		.unwrap_err();
	assert_eq!(error.to_string(), "K-Means is not a Classification model");
}

#[test]
fn test_parse_model_names() {
	assert_eq!("K-Nearest Neighbors".parse::<ModelName>().unwrap(), ModelName::KNearestNeighbors);
	assert_eq!("kmeans".parse::<ModelName>().unwrap(), ModelName::KMeans);
	assert_eq!("Regression".parse::<ModelType>().unwrap(), ModelType::Regression);
	assert!("forest".parse::<ModelName>().is_err());
}
