use super::Metric;
use std::{collections::BTreeMap, marker::PhantomData};

/// The most frequent value. When several values are equally frequent, the smallest one wins.
#[derive(Debug, Clone, Default)]
pub struct Mode<T>(PhantomData<T>);

impl<'a, T> Metric<'a> for Mode<T>
where
	T: 'a + Ord,
{
	type Input = &'a [T];
	type Output = Option<&'a T>;
	fn compute(input: Self::Input) -> Self::Output {
		let mut histogram = BTreeMap::new();
		for value in input.iter() {
			*histogram.entry(value).or_insert(0usize) += 1;
		}
		let mut mode: Option<(&T, usize)> = None;
		for (value, count) in histogram.into_iter() {
			match mode {
				Some((_, mode_count)) if mode_count >= count => {}
				_ => mode = Some((value, count)),
			}
		}
		mode.map(|(value, _)| value)
	}
}

#[test]
fn test_mode() {
	assert_eq!(Mode::<usize>::compute(&[3usize, 1, 3, 2][..]), Some(&3));
	assert_eq!(Mode::<usize>::compute(&[2usize, 1, 2, 1][..]), Some(&1));
	assert_eq!(Mode::<usize>::compute(&[][..]), None);
}
