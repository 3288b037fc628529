//! Keyed list reconciliation.
//!
//! A snapshot is diffed against the keys currently on screen in one linear
//! pass. Keys present on both sides are retained untouched, new keys are
//! created, and keys missing from the snapshot are removed. Only the first
//! occurrence of a key within one snapshot counts.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilePlan<K, T> {
    /// New items in snapshot order.
    pub to_create: Vec<T>,
    /// Stale keys in the order they appear in the current collection.
    pub to_remove: Vec<K>,
    /// Items whose key already has an entry.
    pub retained: Vec<T>,
    /// Repeated keys dropped from the snapshot.
    pub duplicates: usize,
}

impl<K, T> Default for ReconcilePlan<K, T> {
    fn default() -> Self {
        Self {
            to_create: Vec::new(),
            to_remove: Vec::new(),
            retained: Vec::new(),
            duplicates: 0,
        }
    }
}

impl<K, T> ReconcilePlan<K, T> {
    pub fn is_noop(&self) -> bool {
        self.to_create.is_empty() && self.to_remove.is_empty()
    }
}

pub fn reconcile<'a, K, T, I, F>(
    current: I,
    items: impl IntoIterator<Item = T>,
    mut key_of: F,
) -> ReconcilePlan<K, T>
where
    K: Eq + Hash + Clone + 'a,
    I: IntoIterator<Item = &'a K>,
    F: FnMut(&T) -> K,
{
    let mut working: HashMap<K, usize> = current
        .into_iter()
        .enumerate()
        .map(|(position, key)| (key.clone(), position))
        .collect();
    let mut seen = HashSet::new();
    let mut plan = ReconcilePlan::default();

    for item in items {
        let key = key_of(&item);
        if !seen.insert(key.clone()) {
            plan.duplicates += 1;
            continue;
        }
        if working.remove(&key).is_some() {
            plan.retained.push(item);
        } else {
            plan.to_create.push(item);
        }
    }

    let mut stale: Vec<(K, usize)> = working.into_iter().collect();
    stale.sort_unstable_by_key(|(_, position)| *position);
    plan.to_remove = stale.into_iter().map(|(key, _)| key).collect();
    plan
}

/// What one sync did to a [`ViewList`]. Removed entries are handed back so
/// the caller can destroy them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome<K, E> {
    pub created: Vec<K>,
    pub removed: Vec<(K, E)>,
    pub refreshed: Vec<K>,
}

impl<K, E> Default for SyncOutcome<K, E> {
    fn default() -> Self {
        Self {
            created: Vec::new(),
            removed: Vec::new(),
            refreshed: Vec::new(),
        }
    }
}

impl<K, E> SyncOutcome<K, E> {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.removed.is_empty() && self.refreshed.is_empty()
    }

    pub fn removed_keys(&self) -> impl Iterator<Item = &K> {
        self.removed.iter().map(|(key, _)| key)
    }
}

/// Ordered container of view entries, at most one per key. New entries are
/// appended; surviving entries keep their relative order.
#[derive(Debug, Clone)]
pub struct ViewList<K, E> {
    entries: Vec<(K, E)>,
}

impl<K, E> Default for ViewList<K, E> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<K: Eq + Hash + Clone, E> ViewList<K, E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(key, _)| key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &E)> {
        self.entries.iter().map(|(key, entry)| (key, entry))
    }

    pub fn get(&self, key: &K) -> Option<&E> {
        self.entries
            .iter()
            .find(|(candidate, _)| candidate == key)
            .map(|(_, entry)| entry)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    pub fn sync<T>(
        &mut self,
        items: impl IntoIterator<Item = T>,
        key_of: impl FnMut(&T) -> K,
        build: impl FnMut(T) -> E,
    ) -> SyncOutcome<K, E> {
        self.sync_with(items, key_of, build, |_, _| false)
    }

    /// Like [`ViewList::sync`], but every retained item is offered to
    /// `refresh` together with its existing entry. Returning `true` marks the
    /// key as refreshed; the entry is never recreated.
    pub fn sync_with<T>(
        &mut self,
        items: impl IntoIterator<Item = T>,
        mut key_of: impl FnMut(&T) -> K,
        mut build: impl FnMut(T) -> E,
        mut refresh: impl FnMut(&mut E, T) -> bool,
    ) -> SyncOutcome<K, E> {
        let plan = reconcile(self.keys(), items, &mut key_of);
        let mut outcome = SyncOutcome::default();

        if !plan.to_remove.is_empty() {
            let doomed: HashSet<&K> = plan.to_remove.iter().collect();
            let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entries)
                .into_iter()
                .partition(|(key, _)| doomed.contains(key));
            outcome.removed = removed;
            self.entries = kept;
        }

        if !plan.retained.is_empty() {
            let positions: HashMap<K, usize> = self
                .entries
                .iter()
                .enumerate()
                .map(|(position, (key, _))| (key.clone(), position))
                .collect();
            for item in plan.retained {
                let key = key_of(&item);
                let Some(&position) = positions.get(&key) else {
                    continue;
                };
                if refresh(&mut self.entries[position].1, item) {
                    outcome.refreshed.push(key);
                }
            }
        }

        for item in plan.to_create {
            let key = key_of(&item);
            outcome.created.push(key.clone());
            self.entries.push((key, build(item)));
        }

        outcome
    }

    /// Removes every entry, returning them in display order.
    pub fn drain(&mut self) -> Vec<(K, E)> {
        std::mem::take(&mut self.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Item {
        key: u32,
        label: &'static str,
    }

    fn item(key: u32, label: &'static str) -> Item {
        Item { key, label }
    }

    fn sync_labels(list: &mut ViewList<u32, &'static str>, items: Vec<Item>) -> SyncOutcome<u32, &'static str> {
        list.sync(items, |item| item.key, |item| item.label)
    }

    #[test]
    fn two_snapshot_scenario() {
        let empty: Vec<u32> = Vec::new();
        let first = reconcile(&empty, vec![item(1, "A"), item(2, "B")], |i| i.key);
        assert_eq!(first.to_create, vec![item(1, "A"), item(2, "B")]);
        assert!(first.to_remove.is_empty());

        let current = [1u32, 2];
        let second = reconcile(&current, vec![item(2, "B"), item(3, "C")], |i| i.key);
        assert_eq!(second.to_create, vec![item(3, "C")]);
        assert_eq!(second.to_remove, vec![1]);
        assert_eq!(second.retained, vec![item(2, "B")]);
    }

    #[test]
    fn duplicate_keys_only_count_first_occurrence() {
        let empty: Vec<u32> = Vec::new();
        let plan = reconcile(&empty, vec![item(7, "first"), item(7, "second")], |i| i.key);
        assert_eq!(plan.to_create, vec![item(7, "first")]);
        assert_eq!(plan.duplicates, 1);

        let current = [7u32];
        let plan = reconcile(&current, vec![item(7, "kept"), item(7, "again")], |i| i.key);
        assert!(plan.to_create.is_empty());
        assert_eq!(plan.retained, vec![item(7, "kept")]);
        assert_eq!(plan.duplicates, 1);
    }

    #[test]
    fn stale_keys_follow_current_order() {
        let current = [5u32, 1, 9, 3];
        let plan = reconcile(&current, vec![item(1, "x")], |i| i.key);
        assert_eq!(plan.to_remove, vec![5, 9, 3]);
    }

    #[test]
    fn sync_leaves_retained_entries_in_place() {
        let mut list = ViewList::new();
        sync_labels(&mut list, vec![item(1, "A"), item(2, "B"), item(3, "C")]);

        let outcome = sync_labels(&mut list, vec![item(4, "D"), item(3, "C*"), item(1, "A*")]);
        assert_eq!(outcome.created, vec![4]);
        assert_eq!(outcome.removed, vec![(2, "B")]);
        assert!(outcome.refreshed.is_empty());

        let order: Vec<_> = list.iter().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(order, vec![(1, "A"), (3, "C"), (4, "D")]);
    }

    #[test]
    fn sync_with_refreshes_changed_entries() {
        let mut list: ViewList<u32, &'static str> = ViewList::new();
        sync_labels(&mut list, vec![item(1, "A"), item(2, "B")]);

        let outcome = list.sync_with(
            vec![item(1, "A"), item(2, "B2")],
            |item| item.key,
            |item| item.label,
            |entry, item| {
                if *entry == item.label {
                    return false;
                }
                *entry = item.label;
                true
            },
        );
        assert_eq!(outcome.refreshed, vec![2]);
        assert!(outcome.created.is_empty());
        assert!(outcome.removed.is_empty());
        assert_eq!(list.get(&2), Some(&"B2"));
    }

    #[test]
    fn drain_empties_the_list() {
        let mut list = ViewList::new();
        sync_labels(&mut list, vec![item(1, "A"), item(2, "B")]);
        assert_eq!(list.drain(), vec![(1, "A"), (2, "B")]);
        assert!(list.is_empty());
        assert!(!list.contains_key(&1));
    }
}
