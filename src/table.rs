use crate::list::List;
use dashmap::DashMap;

use std::sync::Arc;

/// The id → list map.
///
/// Entries are created on first write and never removed. Lookups hand out an
/// `Arc<List>` so the shard lock is released before the list's own lock is
/// taken.
#[derive(Default)]
pub struct ListTable {
    inner: DashMap<String, Arc<List>>,
}

impl ListTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<Arc<List>> {
        self.inner.get(id).map(|r| r.value().clone())
    }

    /// Returns the list stored under `id`, creating it if absent. Racing
    /// creators all observe the same list.
    pub fn get_or_create(&self, id: &str) -> Arc<List> {
        // first we try a shared get, to not contend the map
        if let Some(r) = self.inner.get(id) {
            return r.value().clone();
        }

        // if that fails, the entry api resolves the race under the shard's write lock
        self.inner
            .entry(id.to_owned())
            .or_insert_with(|| Arc::new(List::new()))
            .value()
            .clone()
    }

    /// All ids ever created, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.inner.iter().map(|r| r.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_or_create_is_idempotent() {
        let table = ListTable::new();
        assert!(table.get("a").is_none());

        let first = table.get_or_create("a");
        let second = table.get_or_create("a");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn racing_creators_share_one_list() {
        let table = Arc::new(ListTable::new());

        let handles = (0..8)
            .map(|i| {
                let table = table.clone();
                std::thread::spawn(move || {
                    table.get_or_create("fresh").push_back(i);
                })
            })
            .collect::<Vec<_>>();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(table.ids(), vec!["fresh".to_string()]);
        assert_eq!(table.get("fresh").unwrap().len(), 8);
    }
}
