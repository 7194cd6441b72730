use super::{Cancel, Connect, Counters, HarnessConfig};
use crate::{ListService, Result};
use rand::{rngs::StdRng, Rng, SeedableRng};

use std::time::Duration;
use tracing::{debug, trace, warn};

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum WorkerExit {
    /// Ran every configured operation
    Finished,
    /// Stopped early because the deadline passed
    Cancelled,
    /// Never reached the store
    Aborted,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum Op {
    Append,
    Get,
    Size,
    Remove,
}

impl Op {
    fn pick<R: Rng>(rng: &mut R) -> Self {
        match rng.gen_range(0..4) {
            0 => Op::Append,
            1 => Op::Get,
            2 => Op::Size,
            _ => Op::Remove,
        }
    }
}

enum Outcome {
    Done,
    /// The list was empty when the op ran; expected under concurrent removes
    Skipped,
}

/// Runs worker `id` to completion or cancellation.
///
/// The worker's choices come from an rng seeded with its id, so a given
/// configuration replays the same sequence of list/op picks per worker.
pub(super) fn run<C: Connect>(
    id: usize,
    connector: &C,
    config: &HarnessConfig,
    counters: &Counters,
    cancel: &Cancel,
) -> WorkerExit {
    let conn = match connector.connect() {
        Ok(conn) => conn,
        Err(e) => {
            counters.error();
            warn!(worker = id, %e, "could not reach store");
            return WorkerExit::Aborted;
        }
    };

    let mut rng = StdRng::seed_from_u64(id as u64);
    let lists = config.lists_for(id);

    for op_ix in 0..config.ops_per_worker {
        if cancel.is_cancelled() {
            debug!(worker = id, completed = op_ix, "cancelled");
            return WorkerExit::Cancelled;
        }

        let list = &lists[rng.gen_range(0..lists.len())];
        let op = Op::pick(&mut rng);

        match execute(&conn, &mut rng, op, list, config.value_for(id, op_ix)) {
            Ok(Outcome::Done) => counters.operation(),
            Ok(Outcome::Skipped) => {
                counters.operation();
                counters.skip();
            }
            Err(e) => {
                counters.error();
                warn!(worker = id, op = op_ix, kind = ?op, list = %list, %e, "operation failed");
            }
        }

        let pause = pause(&mut rng, config);
        if cancel.sleep(pause) && op_ix + 1 < config.ops_per_worker {
            debug!(worker = id, completed = op_ix + 1, "cancelled");
            return WorkerExit::Cancelled;
        }
    }

    debug!(worker = id, ops = config.ops_per_worker, "finished");
    WorkerExit::Finished
}

fn pause<R: Rng>(rng: &mut R, config: &HarnessConfig) -> Duration {
    let lo = config.min_pause.as_micros() as u64;
    let hi = (config.max_pause.as_micros() as u64).max(lo);
    Duration::from_micros(rng.gen_range(lo..=hi))
}

fn execute<S: ListService, R: Rng>(
    conn: &S,
    rng: &mut R,
    op: Op,
    list: &str,
    value: i32,
) -> Result<Outcome> {
    match op {
        Op::Append => {
            conn.append(list, value)?;
            trace!(list, value, "append");
            Ok(Outcome::Done)
        }
        Op::Get => {
            // the size can shrink between these two calls
            let size = conn.size(list)?;
            if size == 0 {
                return Ok(Outcome::Skipped);
            }
            let ix = i32::try_from(rng.gen_range(0..size)).unwrap_or(i32::MAX);
            tolerate_empty(conn.get(list, ix))
        }
        Op::Size => {
            let size = conn.size(list)?;
            trace!(list, size, "size");
            Ok(Outcome::Done)
        }
        Op::Remove => tolerate_empty(conn.remove(list)),
    }
}

fn tolerate_empty<T>(res: Result<T>) -> Result<Outcome> {
    match res {
        Ok(_) => Ok(Outcome::Done),
        Err(e) if e.is_validation() => Ok(Outcome::Skipped),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, Store, TransportError};
    use std::sync::Arc;

    #[test]
    fn op_choice_is_reproducible() {
        let picks = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..32).map(|_| Op::pick(&mut rng)).collect::<Vec<_>>()
        };
        assert_eq!(picks(3), picks(3));
        assert_ne!(picks(3), picks(4));
    }

    #[test]
    fn empty_list_outcomes_are_skips() {
        let store = Store::new();
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            execute(&store, &mut rng, Op::Remove, "empty", 0),
            Ok(Outcome::Skipped)
        ));
        assert!(matches!(
            execute(&store, &mut rng, Op::Get, "empty", 0),
            Ok(Outcome::Skipped)
        ));
        assert!(matches!(
            execute(&store, &mut rng, Op::Append, "empty", 0),
            Ok(Outcome::Done)
        ));
        assert!(matches!(
            execute(&store, &mut rng, Op::Get, "empty", 0),
            Ok(Outcome::Done)
        ));
    }

    #[test]
    fn transport_failures_are_errors() {
        let res: Result<i32> = Err(Error::Transport(TransportError::Closed));
        assert!(tolerate_empty(res).is_err());
    }

    #[test]
    fn worker_runs_all_ops() {
        let store = Arc::new(Store::new());
        let config = HarnessConfig::default()
            .with_ops_per_worker(20)
            .with_pause(Duration::from_millis(0), Duration::from_millis(0));
        let counters = Counters::default();
        let cancel = Cancel::new();

        let exit = run(7, &store, &config, &counters, &cancel);
        assert_eq!(exit, WorkerExit::Finished);
        assert_eq!(counters.snapshot().operations, 20);
        assert_eq!(counters.snapshot().errors, 0);
    }

    #[test]
    fn cancelled_worker_stops_early() {
        let store = Arc::new(Store::new());
        let config = HarnessConfig::default().with_ops_per_worker(20);
        let counters = Counters::default();
        let cancel = Cancel::new();
        cancel.cancel();

        let exit = run(0, &store, &config, &counters, &cancel);
        assert_eq!(exit, WorkerExit::Cancelled);
        assert_eq!(counters.snapshot().operations, 0);
    }
}
