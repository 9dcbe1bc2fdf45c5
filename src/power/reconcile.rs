//! Time Reconciliation
//!
//! Arithmetic that carries time across the clock-domain gap. While the core
//! is powered down only the RTC runs, clocked by the low-power oscillator;
//! on wake its elapsed cycles become whole OS ticks plus a sub-tick phase
//! that seeds the next timer reload.
//!
//! All intermediate products are 64-bit: a multi-minute sleep at 32 kHz
//! times one million overflows 32 bits.

use crate::config::SleepConfig;
use crate::types::{ElapsedTime, WakeSource};

/// Convert RTC cycles to microseconds
#[must_use]
pub const fn lp_cycles_to_us(cycles: u32, lp_hz: u32) -> u64 {
    if lp_hz == 0 {
        return 0;
    }
    cycles as u64 * 1_000_000 / lp_hz as u64
}

/// Convert microseconds to RTC cycles, rounding down
#[must_use]
pub const fn us_to_lp_cycles(us: u64, lp_hz: u32) -> u64 {
    us * lp_hz as u64 / 1_000_000
}

/// Convert SysTick counts to microseconds
#[must_use]
pub const fn timer_counts_to_us(counts: u32, config: &SleepConfig) -> u32 {
    let per_tick = config.counts_per_tick();
    if per_tick == 0 {
        return 0;
    }
    (counts as u64 * config.tick_period_us() as u64 / per_tick as u64) as u32
}

/// Convert microseconds to SysTick counts
#[must_use]
pub const fn us_to_timer_counts(us: u32, config: &SleepConfig) -> u32 {
    let period = config.tick_period_us();
    if period == 0 {
        return 0;
    }
    (us as u64 * config.counts_per_tick() as u64 / period as u64) as u32
}

/// Microseconds to program into the alarm
///
/// The requested period less everything that will pass outside the RTC
/// window: the part of the current tick already gone, the fixed wake-path
/// latency and the time spent getting here. Saturates at zero.
#[must_use]
pub const fn alarm_budget_us(
    requested_us: u64,
    carried_phase_us: u32,
    wake_latency_us: u32,
    consumed_us: u32,
) -> u64 {
    requested_us
        .saturating_sub(carried_phase_us as u64)
        .saturating_sub(wake_latency_us as u64)
        .saturating_sub(consumed_us as u64)
}

/// Split a sleep into whole ticks and the phase into the next one
///
/// Whole ticks are capped at one more than requested; a longer sleep means
/// the RTC reading is off and the excess is dropped rather than stepped.
#[must_use]
pub fn split_elapsed(
    total_us: u64,
    tick_period_us: u32,
    requested_ticks: u32,
    wake_source: WakeSource,
) -> ElapsedTime {
    let period = u64::from(tick_period_us.max(1));
    let whole = total_us / period;
    let remainder = (total_us % period) as u32;
    let cap = requested_ticks.saturating_add(1);

    if whole > u64::from(cap) {
        warn!("slept {} ticks, capping to {}", whole, cap);
        return ElapsedTime::new(cap, 0, wake_source);
    }
    // whole <= cap, which fits u32
    ElapsedTime::new(whole as u32, remainder, wake_source)
}
