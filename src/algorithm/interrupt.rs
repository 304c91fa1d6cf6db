//! # Cooperative cancellation
//!
//! Long running loops poll an `Interrupt` before each unit of work: the branch-and-price search
//! before every node it takes from its queue, the local branch-and-bound before every node it takes
//! from its stack.
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// A flag that callers can raise, from any thread, to stop a running solve.
///
/// Clones share the flag.
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    #[allow(missing_docs)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every solve holding this flag to stop at the next opportunity.
    pub fn raise(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[allow(missing_docs)]
    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Why a loop should stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    /// The stop flag was raised.
    Stopped,
    /// The deadline passed.
    Deadline,
}

/// A stop flag together with an optional deadline.
#[derive(Debug, Clone)]
pub struct Interrupt {
    flag: StopFlag,
    deadline: Option<Instant>,
}

impl Interrupt {
    /// Create an interrupt that fires when `flag` is raised or `time_limit` has elapsed from now.
    pub fn new(flag: StopFlag, time_limit: Option<Duration>) -> Self {
        let deadline = time_limit.and_then(|limit| Instant::now().checked_add(limit));
        Self { flag, deadline }
    }

    /// An interrupt that never fires.
    pub fn never() -> Self {
        Self { flag: StopFlag::new(), deadline: None }
    }

    /// Whether work should stop, and why.
    pub fn check(&self) -> Option<Reason> {
        if self.flag.is_raised() {
            Some(Reason::Stopped)
        } else if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            Some(Reason::Deadline)
        } else {
            None
        }
    }
}
