use crate::{Error, Result};
use rand::{seq::SliceRandom, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;
use std::collections::BTreeMap;

/// A Split holds the row indexes used to train and to test one fold. Test rows are in ascending order. Training rows are in ascending order when the splitter has no seed, and shuffled otherwise, so a holdout taken from the end of the training rows is not biased by the order of the file.
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
	pub train: Vec<usize>,
	pub test: Vec<usize>,
}

/// KFold divides the rows into `n_splits` folds of nearly equal size. The first `n_samples % n_splits` folds have one extra row.
#[derive(Debug, Clone)]
pub struct KFold {
	pub n_splits: usize,
	/// If the value is `Some`, rows are shuffled with this seed before being divided.
	pub seed: Option<u64>,
}

/// StratifiedKFold divides the rows into folds that preserve the proportion of each class. The members of each class are shuffled and then dealt to the folds in turn.
#[derive(Debug, Clone)]
pub struct StratifiedKFold {
	pub n_splits: usize,
	pub seed: Option<u64>,
}

impl KFold {
	pub fn split(&self, n_samples: usize) -> Result<Vec<Split>> {
		check_n_splits(self.n_splits, n_samples)?;
		let mut indexes: Vec<usize> = (0..n_samples).collect();
		let mut rng = self.seed.map(Xoshiro256Plus::seed_from_u64);
		if let Some(rng) = rng.as_mut() {
			indexes.shuffle(rng);
		}
		let mut folds = Vec::with_capacity(self.n_splits);
		let mut start = 0;
		for fold_index in 0..self.n_splits {
			let fold_size = n_samples / self.n_splits
				+ if fold_index < n_samples % self.n_splits {
					1
				} else {
					0
				};
			folds.push(indexes[start..start + fold_size].to_vec());
			start += fold_size;
		}
		log::debug!(
			"split {} rows into folds of sizes {:?}",
			n_samples,
			folds.iter().map(|fold| fold.len()).collect::<Vec<_>>()
		);
		Ok(splits_from_folds(folds, n_samples, rng.as_mut()))
	}
}

impl StratifiedKFold {
	/// Split rows given the class index of each row.
	pub fn split(&self, labels: &[usize]) -> Result<Vec<Split>> {
		check_n_splits(self.n_splits, labels.len())?;
		let mut classes: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
		for (index, label) in labels.iter().enumerate() {
			classes.entry(*label).or_default().push(index);
		}
		let mut rng = self.seed.map(Xoshiro256Plus::seed_from_u64);
		let mut folds = vec![Vec::new(); self.n_splits];
		// The next fold to deal to carries over between classes, so fold sizes differ by at most one.
		let mut next_fold = 0;
		for (class, mut members) in classes.into_iter() {
			if members.len() < self.n_splits {
				return Err(Error::InvalidInput(format!(
					"class {} has {} samples, which is fewer than the {} folds",
					class,
					members.len(),
					self.n_splits
				)));
			}
			if let Some(rng) = rng.as_mut() {
				members.shuffle(rng);
			}
			for member in members {
				folds[next_fold].push(member);
				next_fold = (next_fold + 1) % self.n_splits;
			}
		}
		Ok(splits_from_folds(folds, labels.len(), rng.as_mut()))
	}
}

fn check_n_splits(n_splits: usize, n_samples: usize) -> Result<()> {
	if n_splits < 2 {
		return Err(Error::InvalidInput(format!(
			"the number of folds must be at least 2, got {}",
			n_splits
		)));
	}
	if n_samples < n_splits {
		return Err(Error::InvalidInput(format!(
			"cannot split {} samples into {} folds",
			n_samples, n_splits
		)));
	}
	Ok(())
}

fn splits_from_folds(
	folds: Vec<Vec<usize>>,
	n_samples: usize,
	mut rng: Option<&mut Xoshiro256Plus>,
) -> Vec<Split> {
	let mut fold_of_row = vec![0; n_samples];
	for (fold_index, fold) in folds.iter().enumerate() {
		for row in fold.iter() {
			fold_of_row[*row] = fold_index;
		}
	}
	(0..folds.len())
		.map(|fold_index| {
			let (test, mut train): (Vec<usize>, Vec<usize>) =
				(0..n_samples).partition(|row| fold_of_row[*row] == fold_index);
			if let Some(rng) = rng.as_deref_mut() {
				train.shuffle(rng);
			}
			Split { train, test }
		})
		.collect()
}

#[test]
fn test_k_fold() {
	let splits = KFold {
		n_splits: 3,
		seed: None,
	}
	.split(7)
	.unwrap();
	let tests: Vec<Vec<usize>> = splits.iter().map(|split| split.test.clone()).collect();
	assert_eq!(tests, vec![vec![0, 1, 2], vec![3, 4], vec![5, 6]]);
	assert_eq!(splits[1].train, vec![0, 1, 2, 5, 6]);
}

#[test]
fn test_shuffled_k_fold_covers_every_row_once() {
	let k_fold = KFold {
		n_splits: 4,
		seed: Some(42),
	};
	let splits = k_fold.split(10).unwrap();
	let mut tests: Vec<usize> = splits.iter().flat_map(|split| split.test.clone()).collect();
	tests.sort_unstable();
	assert_eq!(tests, (0..10).collect::<Vec<_>>());
	for split in splits.iter() {
		assert_eq!(split.train.len() + split.test.len(), 10);
	}
	assert_eq!(k_fold.split(10).unwrap(), splits);
}

#[test]
fn test_stratified_k_fold() {
	let labels = [0, 1, 0, 1, 0, 1, 1, 0, 0];
	let splits = StratifiedKFold {
		n_splits: 3,
		seed: Some(1),
	}
	.split(&labels)
	.unwrap();
	for split in splits.iter() {
		assert_eq!(split.test.len(), 3);
		let n_ones = split.test.iter().filter(|row| labels[**row] == 1).count();
		assert!(n_ones == 1 || n_ones == 2);
	}
	let error = StratifiedKFold {
		n_splits: 3,
		seed: None,
	}
	.split(&[0, 0, 0, 1, 1])
	.unwrap_err();
	assert!(error.to_string().contains("class 1 has 2 samples"));
}

#[test]
fn test_seeded_training_rows_are_shuffled() {
	// The labels are sorted by class, as in a file sorted by its label column.
	let labels: Vec<usize> = (0..60).map(|row| row / 30).collect();
	let splits = StratifiedKFold {
		n_splits: 3,
		seed: Some(42),
	}
	.split(&labels)
	.unwrap();
	for split in splits.iter() {
		let mut train = split.train.clone();
		train.sort_unstable();
		assert_eq!(train.len(), 40);
		assert!(train.iter().all(|row| !split.test.contains(row)));
		let tail = &split.train[30..];
		assert!(tail.iter().any(|row| labels[*row] == 0));
		assert!(tail.iter().any(|row| labels[*row] == 1));
	}
	let splits = StratifiedKFold {
		n_splits: 3,
		seed: None,
	}
	.split(&labels)
	.unwrap();
	for split in splits.iter() {
		assert!(split.train.windows(2).all(|pair| pair[0] < pair[1]));
	}
}

#[test]
fn test_too_few_samples() {
	assert!(KFold {
		n_splits: 3,
		seed: None
	}
	.split(2)
	.is_err());
	assert!(KFold {
		n_splits: 1,
		seed: None
	}
	.split(5)
	.is_err());
}
