//! Prevent-Sleep Gate
//!
//! A reference count any subsystem raises before starting a hardware
//! operation that would not survive a core power-down (a DMA transfer, an
//! IPC exchange with the DSP, a flash write) and lowers once it finishes.
//! While the count is above zero the policy gate never picks deep sleep.
//!
//! Updates run inside a critical section so the count can be touched from
//! tasks and interrupt handlers alike, including on cores without atomic
//! read-modify-write instructions.

use core::sync::atomic::{AtomicU32, Ordering};

/// Process-wide prevent-sleep count
pub static PREVENT_SLEEP: PreventSleep = PreventSleep::new();

/// Deep-sleep veto counter
#[derive(Debug)]
pub struct PreventSleep {
    count: AtomicU32,
}

impl PreventSleep {
    /// Create a gate with a count of zero
    #[must_use]
    pub const fn new() -> Self {
        Self {
            count: AtomicU32::new(0),
        }
    }

    /// Raise the count
    pub fn acquire(&self) {
        critical_section::with(|_| {
            let count = self.count.load(Ordering::Relaxed);
            self.count.store(count.saturating_add(1), Ordering::Relaxed);
        });
    }

    /// Lower the count
    ///
    /// Releasing an idle gate is ignored: the count never goes below zero.
    pub fn release(&self) {
        critical_section::with(|_| {
            let count = self.count.load(Ordering::Relaxed);
            if count == 0 {
                warn!("prevent-sleep released while not held");
                return;
            }
            self.count.store(count - 1, Ordering::Relaxed);
        });
    }

    /// Current count
    #[must_use]
    pub fn count(&self) -> u32 {
        self.count.load(Ordering::Relaxed)
    }

    /// True while any holder blocks deep sleep
    #[must_use]
    pub fn is_held(&self) -> bool {
        self.count() > 0
    }

    /// Acquire and return a guard that releases on drop
    #[must_use = "the gate is released as soon as the guard is dropped"]
    pub fn hold(&self) -> PreventSleepGuard<'_> {
        self.acquire();
        PreventSleepGuard { gate: self }
    }
}

impl Default for PreventSleep {
    fn default() -> Self {
        Self::new()
    }
}

/// Holds the gate until dropped
#[derive(Debug)]
pub struct PreventSleepGuard<'a> {
    gate: &'a PreventSleep,
}

impl Drop for PreventSleepGuard<'_> {
    fn drop(&mut self) {
        self.gate.release();
    }
}
