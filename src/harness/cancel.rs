use parking_lot::{Condvar, Mutex};

use std::time::{Duration, Instant};

/// One-shot cancellation shared by every worker of a run.
#[derive(Default)]
pub struct Cancel {
    cancelled: Mutex<bool>,
    cond: Condvar,
}

impl Cancel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        *self.cancelled.lock() = true;
        self.cond.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancelled.lock()
    }

    /// Sleeps for `dur` or until cancelled, whichever is first. Returns
    /// whether the token is cancelled.
    pub fn sleep(&self, dur: Duration) -> bool {
        let until = Instant::now() + dur;
        let mut cancelled = self.cancelled.lock();
        while !*cancelled {
            if self.cond.wait_until(&mut cancelled, until).timed_out() {
                break;
            }
        }
        *cancelled
    }
}
