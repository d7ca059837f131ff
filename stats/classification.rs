use crate::{Error, Result};
use std::{collections::BTreeMap, fmt::Display};

/// Count the occurrences of each distinct value, in ascending order of value.
pub fn class_counts<T, I>(values: I) -> BTreeMap<T, usize>
where
	T: Ord,
	I: IntoIterator<Item = T>,
{
	let mut counts = BTreeMap::new();
	for value in values {
		*counts.entry(value).or_insert(0) += 1;
	}
	counts
}

/// Return true if there is at least one label and every distinct label occurs at least `min_per_class` times.
pub fn is_classification_ready<T>(labels: &[T], min_per_class: usize) -> bool
where
	T: Ord + Display,
{
	check_classification_ready(labels, min_per_class).is_ok()
}

/// Check that the labels can be split into `min_per_class` stratified folds. The error names the smallest class that has too few samples.
pub fn check_classification_ready<T>(labels: &[T], min_per_class: usize) -> Result<()>
where
	T: Ord + Display,
{
	if labels.is_empty() {
		return Err(Error::InvalidInput("there are no labels".to_owned()));
	}
	let counts = class_counts(labels.iter());
	log::debug!("found {} classes among {} labels", counts.len(), labels.len());
	match counts.into_iter().find(|(_, count)| *count < min_per_class) {
		Some((class, count)) => Err(Error::InsufficientSamplesPerClass {
			class: class.to_string(),
			count,
			required: min_per_class,
		}),
		None => Ok(()),
	}
}

#[test]
fn test_is_classification_ready() {
	assert!(is_classification_ready(&["a", "a", "a", "b", "b", "b"], 3));
	assert!(!is_classification_ready(&["a", "a", "b"], 3));
	assert!(!is_classification_ready::<&str>(&[], 1));
	assert!(is_classification_ready(&[2, 1, 2, 1], 2));
}

#[test]
fn test_check_classification_ready() {
	let error = check_classification_ready(&["c", "a", "b", "c", "a", "b", "a"], 3).unwrap_err();
	assert_eq!(
		error,
		Error::InsufficientSamplesPerClass {
			class: "b".to_owned(),
			count: 2,
			required: 3,
		}
	);
	assert_eq!(
		error.to_string(),
		"class \"b\" has 2 samples but at least 3 are required in every class"
	);
}

#[test]
fn test_class_counts() {
	let counts = class_counts(vec!["b", "a", "b"]);
	assert_eq!(counts.into_iter().collect::<Vec<_>>(), vec![("a", 1), ("b", 2)]);
}
