use std::time::Duration;

/// Values are `worker * stride + op`, with the stride at least this large.
pub const VALUE_STRIDE: usize = 1000;

/// Configuration for a load run.
#[derive(Clone, Debug)]
pub struct HarnessConfig {
    /// Number of concurrent workers
    pub workers: usize,
    /// Operations each worker attempts
    pub ops_per_worker: usize,
    /// Wall-clock budget for the load phase; stragglers are cancelled after it
    pub deadline: Duration,
    /// Bounds of the randomized pause after each operation
    pub min_pause: Duration,
    pub max_pause: Duration,
    /// List every worker targets
    pub shared_list: String,
    /// Second list every worker targets
    pub stress_list: String,
    /// Each worker also targets `<prefix><worker id>`
    pub private_prefix: String,
    /// Elements sampled per list during the integrity pass
    pub samples_per_list: usize,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            workers: 10,
            ops_per_worker: 50,
            deadline: Duration::from_secs(30),
            min_pause: Duration::from_millis(10),
            max_pause: Duration::from_millis(60),
            shared_list: "shared_list".into(),
            stress_list: "stress_test".into(),
            private_prefix: "client_".into(),
            samples_per_list: 3,
        }
    }
}

impl HarnessConfig {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_ops_per_worker(mut self, ops: usize) -> Self {
        self.ops_per_worker = ops;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Sets the pause bounds; a reversed pair is swapped.
    pub fn with_pause(mut self, min: Duration, max: Duration) -> Self {
        self.min_pause = min.min(max);
        self.max_pause = min.max(max);
        self
    }

    pub fn with_samples_per_list(mut self, samples: usize) -> Self {
        self.samples_per_list = samples;
        self
    }

    /// The three lists worker `id` picks from.
    pub fn lists_for(&self, id: usize) -> [String; 3] {
        [
            self.shared_list.clone(),
            format!("{}{}", self.private_prefix, id),
            self.stress_list.clone(),
        ]
    }

    fn stride(&self) -> usize {
        VALUE_STRIDE.max(self.ops_per_worker)
    }

    /// The value worker `id` appends at its `op`th operation.
    pub fn value_for(&self, id: usize, op: usize) -> i32 {
        let v = id.saturating_mul(self.stride()).saturating_add(op);
        i32::try_from(v).unwrap_or(i32::MAX)
    }

    /// Largest value any worker can append under this configuration.
    pub fn max_value(&self) -> i32 {
        self.value_for(
            self.workers.saturating_sub(1),
            self.ops_per_worker.saturating_sub(1),
        )
    }

    /// Whether `value` is something a worker could have appended.
    pub fn in_domain(&self, value: i32) -> bool {
        value >= 0 && value <= self.max_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_domain() {
        let config = HarnessConfig::default();
        assert_eq!(config.value_for(0, 0), 0);
        assert_eq!(config.value_for(3, 7), 3007);
        assert_eq!(config.max_value(), 9049);
        assert!(config.in_domain(9049));
        assert!(!config.in_domain(9050));
        assert!(!config.in_domain(-1));
    }

    #[test]
    fn stride_grows_with_op_count() {
        let config = HarnessConfig::default().with_ops_per_worker(5000);
        assert_eq!(config.value_for(1, 0), 5000);
        assert_ne!(config.value_for(0, 4999), config.value_for(1, 0));
    }

    #[test]
    fn reversed_pause_is_swapped() {
        let config =
            HarnessConfig::default().with_pause(Duration::from_millis(50), Duration::from_millis(5));
        assert_eq!(config.min_pause, Duration::from_millis(5));
        assert_eq!(config.max_pause, Duration::from_millis(50));
    }

    #[test]
    fn worker_lists() {
        let config = HarnessConfig::default();
        assert_eq!(
            config.lists_for(4),
            [
                "shared_list".to_string(),
                "client_4".to_string(),
                "stress_test".to_string()
            ]
        );
    }
}
