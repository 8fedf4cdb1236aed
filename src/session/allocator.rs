use std::{
    collections::HashSet,
    sync::{Mutex, MutexGuard},
    thread,
    time::{Duration, Instant},
};

use rand::Rng;

use crate::error::{Error, Result};

/// How long `allocate` keeps drawing candidates before giving up.
pub const DEFAULT_ALLOCATION_TIMEOUT: Duration = Duration::from_secs(5);

/// Hands out random decimal session ids that are not currently in use.
///
/// Candidates are drawn outside the lock; only the check-and-mark of a single
/// candidate runs under it, so two callers can never claim the same id.
pub struct SessionIdAllocator {
    in_use: Mutex<HashSet<String>>,
    max_id: u64,
    timeout: Duration,
}

impl Default for SessionIdAllocator {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOCATION_TIMEOUT)
    }
}

impl SessionIdAllocator {
    pub fn new(timeout: Duration) -> Self {
        Self {
            in_use: Mutex::new(HashSet::new()),
            max_id: i64::MAX as u64,
            timeout,
        }
    }

    /// Restricts candidates to `0..=max_id`.
    pub fn with_id_space(mut self, max_id: u64) -> Self {
        self.max_id = max_id;
        self
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        match self.in_use.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Reserves a fresh id, or fails with [`Error::AllocationTimeout`] once the deadline passes.
    pub fn allocate(&self) -> Result<String> {
        let deadline = Instant::now() + self.timeout;
        let mut rng = rand::thread_rng();

        loop {
            let candidate = rng.gen_range(0..=self.max_id).to_string();
            if self.lock().insert(candidate.clone()) {
                return Ok(candidate);
            }

            if Instant::now() >= deadline {
                return Err(Error::AllocationTimeout(self.timeout));
            }
            thread::yield_now();
        }
    }

    /// Frees an id for reuse. Returns whether it was reserved.
    pub fn release(&self, session_id: &str) -> bool {
        self.lock().remove(session_id)
    }

    pub fn is_in_use(&self, session_id: &str) -> bool {
        self.lock().contains(session_id)
    }

    /// Marks an id as taken without drawing it.
    pub fn reserve(&self, session_id: &str) -> bool {
        self.lock().insert(session_id.to_string())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
