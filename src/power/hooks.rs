//! Application Hooks
//!
//! Points where the application can veto or observe a deep sleep. Every
//! method has a default, so an application only overrides what it needs.

use super::handshake::Fault;

/// Application callbacks around a sleep cycle
pub trait SleepHooks {
    /// Whether the application currently tolerates deep sleep at all
    ///
    /// Consulted by the policy gate. Returning `false` forces light sleep.
    fn deep_sleep_allowed(&mut self) -> bool {
        true
    }

    /// Last chance to cancel a deep sleep
    ///
    /// Called with interrupts masked and the scheduler suspended. Returning
    /// `false` unwinds to active with nothing touched.
    fn pre_sleep_veto(&mut self) -> bool {
        true
    }

    /// Deep sleep is about to start; save peripheral state here
    fn pre_sleep_notify(&mut self) {}

    /// Core is back, scheduler still suspended and interrupts masked
    ///
    /// For peripherals that must be restored before any handler runs.
    fn post_wake_notify_immediate(&mut self) {}

    /// Scheduler has resumed
    fn post_wake_notify_deferred(&mut self) {}

    /// A register handshake never completed
    fn fatal(&mut self, fault: Fault) -> ! {
        panic!("low-power fault: {:?}", fault)
    }
}

/// Hooks that accept every default
#[derive(Clone, Copy, Debug, Default)]
pub struct NoHooks;

impl SleepHooks for NoHooks {}
