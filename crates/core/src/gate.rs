//! Admission gate bounding the number of simultaneously running jobs.
//!
//! The gate owns the process-wide registry of in-flight job ids. It is not
//! persisted: a restart forgets every admitted job, and a job whose worker
//! never reaches a terminal status keeps its slot until the process exits.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::types::JobId;

/// Default number of jobs admitted at once.
pub const DEFAULT_CAPACITY: usize = 1;

/// Why an admission attempt was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateFull {
    /// In-flight jobs at the moment of refusal.
    pub active: usize,
    /// Configured capacity.
    pub capacity: usize,
}

/// Bounded registry of in-flight jobs.
///
/// Every operation takes the same lock, so the check-and-register performed
/// by [`ConcurrencyGate::try_admit`] can never oversubscribe the capacity
/// under concurrent submissions.
#[derive(Debug)]
pub struct ConcurrencyGate {
    capacity: usize,
    active: Mutex<HashSet<JobId>>,
}

impl ConcurrencyGate {
    /// Create a gate admitting at most `capacity` jobs (clamped to at least 1).
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            active: Mutex::new(HashSet::new()),
        }
    }

    /// Atomically check for a free slot and register `job_id` in it.
    ///
    /// Returns the in-flight count after registration. Admitting an id that
    /// is already registered succeeds without consuming a second slot.
    pub fn try_admit(&self, job_id: &JobId) -> Result<usize, GateFull> {
        let mut active = self.lock();
        if active.contains(job_id) {
            return Ok(active.len());
        }
        if active.len() >= self.capacity {
            return Err(GateFull {
                active: active.len(),
                capacity: self.capacity,
            });
        }
        active.insert(job_id.clone());
        Ok(active.len())
    }

    /// Remove `job_id` from the registry.
    ///
    /// Returns `true` if the id was registered. Releasing an unknown id is a
    /// no-op, so repeated releases for the same job are harmless.
    pub fn release(&self, job_id: &JobId) -> bool {
        self.lock().remove(job_id)
    }

    /// Number of in-flight jobs.
    pub fn count(&self) -> usize {
        self.lock().len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // A panic while holding the lock cannot leave the set half-updated
    // (every mutation is a single insert or remove), so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, HashSet<JobId>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ConcurrencyGate {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
