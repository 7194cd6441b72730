use crate::{table::ListTable, Error, Result};

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::{debug, info};

/// The named-list store.
///
/// Each operation is atomic with respect to other operations on the same
/// list id. Operations on different ids never share a lock beyond the
/// brief map lookup.
///
/// # Example
/// ```
/// use listd::Store;
///
/// let store = Store::new();
/// assert_eq!(store.size("evens"), 0);
///
/// for v in [2, 4, 6, 8, 10] {
///     assert!(store.append("evens", v));
/// }
/// assert_eq!(store.size("evens"), 5);
/// assert_eq!(store.get("evens", 2).unwrap(), 6);
/// assert_eq!(store.remove("evens").unwrap(), 10);
/// assert_eq!(store.size("evens"), 4);
///
/// assert!(store.remove("nonexistent").is_err());
/// assert!(store.get("nonexistent", 0).is_err());
/// ```
#[derive(Default)]
pub struct Store {
    lists: ListTable,
    stats: Stats,
    shut_down: AtomicBool,
}

#[derive(Default)]
struct Stats {
    appends: AtomicU64,
    removes: AtomicU64,
    rejected: AtomicU64,
}

/// Point-in-time counters for a [`Store`].
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct StoreStats {
    pub appends: u64,
    pub removes: u64,
    pub rejected: u64,
    pub lists: usize,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `value` to the tail of `list`, creating the list on first use.
    pub fn append(&self, list: &str, value: i32) -> bool {
        let len = self.lists.get_or_create(list).push_back(value);
        self.stats.appends.fetch_add(1, Ordering::Relaxed);
        debug!(list, value, len, "append");
        true
    }

    pub fn get(&self, list: &str, index: i32) -> Result<i32> {
        self.lists
            .get(list)
            .and_then(|l| l.get(index))
            .ok_or_else(|| {
                self.reject(Error::Index {
                    list: list.to_owned(),
                    index,
                })
            })
    }

    /// Removes and returns the most recently appended value of `list`.
    pub fn remove(&self, list: &str) -> Result<i32> {
        match self.lists.get(list).and_then(|l| l.pop_back()) {
            Some((value, len)) => {
                self.stats.removes.fetch_add(1, Ordering::Relaxed);
                debug!(list, value, len, "remove");
                Ok(value)
            }
            None => Err(self.reject(Error::EmptyOrUnknown(list.to_owned()))),
        }
    }

    /// Number of values in `list`; zero for ids never appended to.
    pub fn size(&self, list: &str) -> usize {
        self.lists.get(list).map_or(0, |l| l.len())
    }

    pub fn list_ids(&self) -> Vec<String> {
        self.lists.ids()
    }

    /// Advisory only: the store keeps serving after this.
    pub fn shutdown(&self) {
        let already = self.shut_down.swap(true, Ordering::AcqRel);
        let stats = self.stats();
        info!(
            appends = stats.appends,
            removes = stats.removes,
            rejected = stats.rejected,
            lists = stats.lists,
            repeated = already,
            "store shutdown requested"
        );
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            appends: self.stats.appends.load(Ordering::Relaxed),
            removes: self.stats.removes.load(Ordering::Relaxed),
            rejected: self.stats.rejected.load(Ordering::Relaxed),
            lists: self.lists.len(),
        }
    }

    fn reject(&self, err: Error) -> Error {
        self.stats.rejected.fetch_add(1, Ordering::Relaxed);
        debug!(%err, "rejected");
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_ids_are_empty_and_unlisted() {
        let store = Store::new();
        assert_eq!(store.size("ghost"), 0);
        assert!(store.list_ids().is_empty());
        assert!(matches!(store.remove("ghost"), Err(Error::EmptyOrUnknown(_))));
        assert!(matches!(store.get("ghost", 0), Err(Error::Index { .. })));
        // failed reads never create the list
        assert!(store.list_ids().is_empty());
    }

    #[test]
    fn emptied_lists_stay_listed() {
        let store = Store::new();
        store.append("a", 1);
        assert_eq!(store.remove("a").unwrap(), 1);
        assert_eq!(store.size("a"), 0);
        assert_eq!(store.list_ids(), vec!["a".to_string()]);
        assert!(store.remove("a").is_err());
    }

    #[test]
    fn stats_track_outcomes() {
        let store = Store::new();
        store.append("a", 1);
        store.append("b", 2);
        store.remove("a").unwrap();
        let _ = store.remove("a");
        let _ = store.get("b", 5);

        assert_eq!(
            store.stats(),
            StoreStats {
                appends: 2,
                removes: 1,
                rejected: 2,
                lists: 2,
            }
        );
    }

    #[test]
    fn shutdown_is_advisory() {
        let store = Store::new();
        assert!(!store.is_shut_down());
        store.shutdown();
        assert!(store.is_shut_down());
        assert!(store.append("after", 7));
        assert_eq!(store.get("after", 0).unwrap(), 7);
    }
}
