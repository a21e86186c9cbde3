use std::{collections::HashSet, hash::Hash};

/// Appends the items of `batch` whose key has not been seen in `accumulated` yet.
///
/// Earlier positions always win, so the order of the first stage that produced an item is kept.
/// Returns the number of appended items.
pub fn merge_unique_by<T, K, F>(accumulated: &mut Vec<T>, batch: Vec<T>, key: F) -> usize
where
	K: Eq + Hash,
	F: Fn(&T) -> K,
{
	let mut seen: HashSet<K> = accumulated.iter().map(&key).collect();
	let before = accumulated.len();

	for item in batch {
		if seen.insert(key(&item)) {
			accumulated.push(item);
		}
	}

	accumulated.len() - before
}
