use super::IntegrityReport;

use std::{fmt, time::Duration};

/// Outcome of the load phase.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct LoadReport {
    pub elapsed: Duration,
    /// Whether the deadline cut the run short
    pub timed_out: bool,
    /// Completed operations, including skipped ones
    pub operations: u64,
    pub errors: u64,
    /// Gets and removes that found their list empty
    pub skipped: u64,
    pub workers_finished: usize,
    pub workers_cancelled: usize,
    pub workers_aborted: usize,
}

impl LoadReport {
    /// Completed operations per second of wall time.
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.operations as f64 / secs
        } else {
            0.0
        }
    }
}

#[derive(Clone, Debug)]
pub struct Report {
    pub load: LoadReport,
    pub integrity: IntegrityReport,
}

impl fmt::Display for LoadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "elapsed:     {:.2}s", self.elapsed.as_secs_f64())?;
        writeln!(f, "operations:  {}", self.operations)?;
        writeln!(f, "errors:      {}", self.errors)?;
        writeln!(f, "skipped:     {}", self.skipped)?;
        writeln!(f, "throughput:  {:.2} ops/s", self.throughput())?;
        write!(
            f,
            "workers:     {} finished, {} cancelled, {} aborted",
            self.workers_finished, self.workers_cancelled, self.workers_aborted
        )?;
        if self.timed_out {
            write!(f, " (deadline reached)")?;
        }
        Ok(())
    }
}

impl fmt::Display for IntegrityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "lists:       {}", self.lists.len())?;
        for (list, size) in &self.lists {
            writeln!(f, "  {:?}: {}", list, size)?;
        }
        writeln!(f, "elements:    {}", self.total_elements)?;
        for s in &self.suspicious {
            writeln!(f, "  suspicious {:?}[{}] = {}", s.list, s.index, s.value)?;
        }
        write!(
            f,
            "integrity:   {} suspicious, {} errors",
            self.suspicious.len(),
            self.errors
        )
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.load)?;
        write!(f, "{}", self.integrity)
    }
}
