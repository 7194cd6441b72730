use super::HarnessConfig;
use crate::{ListService, Result};
use rand::Rng;

use tracing::{debug, warn};

/// A sampled value outside the domain the workers append from.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Suspicious {
    pub list: String,
    pub index: i32,
    pub value: i32,
}

#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct IntegrityReport {
    /// Every known list with its size, in id order
    pub lists: Vec<(String, usize)>,
    pub total_elements: usize,
    pub suspicious: Vec<Suspicious>,
    /// Calls that failed during the pass
    pub errors: u64,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.suspicious.is_empty() && self.errors == 0
    }
}

/// Enumerates every list, totals their sizes and samples a few elements of
/// each for values no worker could have appended.
///
/// Fails only when the list ids themselves cannot be fetched; per-list
/// failures are counted in the report.
pub fn check_integrity<S: ListService>(svc: &S, config: &HarnessConfig) -> Result<IntegrityReport> {
    let mut rng = rand::thread_rng();
    let mut report = IntegrityReport::default();

    for list in svc.list_ids()? {
        let size = match svc.size(&list) {
            Ok(size) => size,
            Err(e) => {
                report.errors += 1;
                warn!(list = %list, %e, "size failed during integrity pass");
                continue;
            }
        };
        report.total_elements += size;
        debug!(list = %list, size, "list");

        for _ in 0..config.samples_per_list.min(size) {
            let index = i32::try_from(rng.gen_range(0..size)).unwrap_or(i32::MAX);
            match svc.get(&list, index) {
                Ok(value) if !config.in_domain(value) => {
                    warn!(list = %list, index, value, "suspicious value");
                    report.suspicious.push(Suspicious {
                        list: list.clone(),
                        index,
                        value,
                    });
                }
                Ok(_) => {}
                Err(e) => {
                    report.errors += 1;
                    warn!(list = %list, index, %e, "get failed during integrity pass");
                }
            }
        }

        report.lists.push((list, size));
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Store;

    #[test]
    fn totals_and_flags_out_of_domain_values() {
        let store = Store::new();
        let config = HarnessConfig::default().with_samples_per_list(10);
        store.append("good", 1);
        store.append("good", 2);
        store.append("bad", -5);
        store.append("empty", 3);
        store.remove("empty").unwrap();

        let report = check_integrity(&store, &config).unwrap();
        assert_eq!(
            report.lists,
            vec![
                ("bad".to_string(), 1),
                ("empty".to_string(), 0),
                ("good".to_string(), 2)
            ]
        );
        assert_eq!(report.total_elements, 3);
        assert_eq!(report.errors, 0);
        assert!(!report.suspicious.is_empty());
        assert!(report
            .suspicious
            .iter()
            .all(|s| s.list == "bad" && s.value == -5 && s.index == 0));
        assert!(!report.is_clean());
    }
}
