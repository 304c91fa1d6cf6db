//! # Incumbent
//!
//! The best solution found so far. It can be read from other threads while a search runs, and is
//! only ever replaced by a strictly better solution.
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::data::linear_program::elements::Objective;

/// A feasible solution with its objective value.
#[derive(Debug, Clone, PartialEq)]
pub struct Incumbent {
    /// Objective value, including the objective constant.
    pub objective: f64,
    /// Value of every column of the model.
    pub primal: Vec<f64>,
}

/// Incumbent that can be shared between threads.
///
/// The objective value is also cached in an atomic, so it can be read without taking the lock.
pub struct SharedIncumbent {
    direction: Objective,
    best: Mutex<Option<Incumbent>>,
    /// Bits of the objective value, `NaN` while there is no incumbent.
    objective: AtomicU64,
}

impl SharedIncumbent {
    #[allow(missing_docs)]
    pub fn new(direction: Objective) -> Self {
        Self { direction, best: Mutex::new(None), objective: AtomicU64::new(f64::NAN.to_bits()) }
    }

    /// Install a solution if it is strictly better than the current incumbent.
    ///
    /// Comparing and replacing happen under a single lock, so of two competing solutions the
    /// better one always ends up installed.
    ///
    /// # Return value
    ///
    /// Whether the solution was installed.
    pub fn try_install(&self, objective: f64, primal: &[f64]) -> bool {
        if objective.is_nan() {
            return false;
        }

        let mut best = self.lock();
        let improves = best.as_ref()
            .is_none_or(|current| self.direction.is_better(objective, current.objective));
        if improves {
            *best = Some(Incumbent { objective, primal: primal.to_vec() });
            self.objective.store(objective.to_bits(), Ordering::Release);
        }

        improves
    }

    /// Objective value of the incumbent, if there is one.
    pub fn objective(&self) -> Option<f64> {
        let objective = f64::from_bits(self.objective.load(Ordering::Acquire));
        (!objective.is_nan()).then_some(objective)
    }

    /// A copy of the incumbent, if there is one.
    pub fn snapshot(&self) -> Option<Incumbent> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Incumbent>> {
        // The incumbent is replaced in a single assignment, so a poisoned lock still holds a
        // consistent value
        self.best.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
