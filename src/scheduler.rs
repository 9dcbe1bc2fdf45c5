//! Scheduler Interface
//!
//! The calls the idle hook makes back into the RTOS kernel. Task selection
//! and context switching stay on the kernel side.

/// RTOS kernel services used around a tickless sleep
pub trait Scheduler {
    /// Suspend task switching without masking interrupts
    fn suspend_all(&mut self);

    /// Undo [`Scheduler::suspend_all`]
    fn resume_all(&mut self);

    /// Step the tick count forward after suppressed ticks
    ///
    /// Must not run tick hooks for the stepped ticks.
    fn advance_ticks(&mut self, ticks: u32);

    /// Whether a task became ready or a switch was pended since the idle
    /// task decided to sleep
    ///
    /// Called with interrupts masked.
    fn abort_sleep_requested(&mut self) -> bool;
}
