/*!
This crate fits small models to a pair of columns and evaluates them. Supervised models are evaluated with k-fold cross validation, training a fresh model on each standardized training fold and scoring its predictions on the held out fold. Clustering models are evaluated with the silhouette and Calinski-Harabasz scores.

The entry point is [`fit`](fn.fit.html), which is configured by a [`Config`](struct.Config.html).
*/

mod catalog;
mod config;
mod cross_validation;
mod early_stopping;
mod fit;
mod k_means;
mod linear_classifier;
mod linear_regressor;
mod neighbors;
mod scaler;

pub use self::catalog::{ModelName, ModelType};
pub use self::config::{
	Config, EarlyStoppingOptions, KMeansOptions, LinearOptions, NeighborsOptions, Shuffle,
	DEFAULT_SEED,
};
pub use self::cross_validation::{KFold, Split, StratifiedKFold};
pub use self::fit::{fit, FitOutput, Predictions, Scores, Summary};
pub use self::k_means::KMeans;
pub use self::linear_classifier::LinearClassifier;
pub use self::linear_regressor::LinearRegressor;
pub use self::neighbors::{KNeighborsClassifier, KNeighborsRegressor};
pub use self::scaler::StandardScaler;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("invalid input: {0}")]
	InvalidInput(String),
	#[error("{model_name} is not a {model_type} model")]
	UnsupportedModel {
		model_type: ModelType,
		model_name: ModelName,
	},
	#[error("column \"{0}\" must be a number column")]
	NotNumeric(String),
	#[error(transparent)]
	Stats(#[from] eda_stats::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
