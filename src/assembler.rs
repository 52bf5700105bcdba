use indexmap::IndexMap;
use std::hash::Hash;

/// Groups items by key, keeping first-occurrence order of keys and the
/// original order of items within each group.
pub fn group_by<T, K, F>(items: impl IntoIterator<Item = T>, key_fn: F) -> IndexMap<K, Vec<T>>
where
    K: Hash + Eq,
    F: Fn(&T) -> K,
{
    items.into_iter().fold(IndexMap::new(), |mut groups, item| {
        groups.entry(key_fn(&item)).or_insert_with(Vec::new).push(item);
        groups
    })
}

/// Keys in first-occurrence order, without duplicates.
pub fn distinct_keys<T, K, F>(items: &[T], key_fn: F) -> Vec<K>
where
    K: Hash + Eq + Clone,
    F: Fn(&T) -> K,
{
    let mut seen = IndexMap::new();
    for item in items {
        seen.entry(key_fn(item)).or_insert(());
    }
    seen.into_keys().collect()
}
