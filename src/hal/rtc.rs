//! RTC Port
//!
//! Free-running counter in the always-on PMU domain, clocked by the
//! low-power RC oscillator. The counter cannot be read directly: software
//! requests a sample, waits for the PMU to clear the sample bit, then reads
//! the latched value. The handshake loop itself lives in
//! [`crate::power::handshake`] so its wait policy is configurable.

/// PMU RTC counter and the alarm used for deep-sleep wake
pub trait RtcCounter {
    /// Set the sample request bit
    fn start_sample(&mut self);

    /// Whether the PMU is still latching the counter
    fn sample_in_progress(&mut self) -> bool;

    /// Latched counter value from the last completed sample
    fn sampled_counter(&mut self) -> u32;

    /// Program the alarm comparator
    fn set_alarm(&mut self, target: u32);

    /// Enable the alarm and its wake interrupt
    fn enable_alarm(&mut self);

    /// Disable the alarm
    fn disable_alarm(&mut self);

    /// Clear a latched alarm event
    fn clear_alarm(&mut self);

    /// Whether the alarm event is latched
    fn alarm_fired(&mut self) -> bool;
}
