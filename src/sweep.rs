use std::fmt;

/// What happened to one item of a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Written,
    /// Output already present and current.
    Skipped,
}

/// Tally of a sweep. Skips count as successes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl SweepReport {
    pub fn record(&mut self, outcome: Outcome) {
        self.succeeded += 1;
        if outcome == Outcome::Skipped {
            self.skipped += 1;
        }
    }

    pub fn record_failure(&mut self) {
        self.failed += 1;
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}

impl fmt::Display for SweepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "succeeded {} (skipped {}), failed {}",
            self.succeeded, self.skipped, self.failed
        )
    }
}
