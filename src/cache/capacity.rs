//! Capacity Tracker Module
//!
//! Running byte accounting for the bounded cache.

use parking_lot::Mutex;

// == Capacity Tracker ==
/// Tracks bytes consumed by live entries against an optional budget.
///
/// The lock guards only the counter's own read-modify-write. Nothing called
/// while it is held re-enters the cache, so the eviction callback may call
/// [`release`](Self::release) from inside any cache operation.
#[derive(Debug, Default)]
pub struct CapacityTracker {
    /// Byte budget, 0 = unbounded
    limit: u64,
    /// Bytes currently reserved
    used: Mutex<u64>,
}

impl CapacityTracker {
    pub fn new(limit: u64) -> Self {
        Self {
            limit,
            used: Mutex::new(0),
        }
    }

    pub fn is_bounded(&self) -> bool {
        self.limit > 0
    }

    /// True if `n` bytes could never fit, even in an empty cache.
    pub fn exceeds_budget(&self, n: u64) -> bool {
        self.is_bounded() && n > self.limit
    }

    // == Reserve ==
    /// Reserves `n` bytes if the budget allows.
    ///
    /// Returns false and changes nothing when it does not.
    pub fn reserve(&self, n: u64) -> bool {
        let mut used = self.used.lock();
        let next = used.saturating_add(n);
        if self.is_bounded() && next > self.limit {
            return false;
        }
        *used = next;
        true
    }

    // == Release ==
    /// Returns `n` previously reserved bytes to the budget.
    pub fn release(&self, n: u64) {
        let mut used = self.used.lock();
        *used = used.saturating_sub(n);
    }

    /// Bytes currently reserved.
    pub fn used(&self) -> u64 {
        *self.used.lock()
    }

    /// `(budget, used)`, or `(0, 0)` when unbounded.
    pub fn usage(&self) -> (u64, u64) {
        if !self.is_bounded() {
            return (0, 0);
        }
        (self.limit, self.used())
    }
}
