//! Configuration and Constants Tests
//!
//! Tests to verify configuration values are valid and consistent.
//! Run with: cargo test --target x86_64-unknown-linux-gnu --no-default-features --features std --test config_tests

use fr30xx_lowpower::config::*;
use fr30xx_lowpower::power::HandshakePolicy;

// =============================================================================
// Constant Tests
// =============================================================================

#[test]
fn tick_rate_is_one_millisecond() {
    assert_eq!(TICK_RATE_HZ, 1_000);
    assert_eq!(SleepConfig::new().tick_period_us(), 1_000);
}

#[test]
fn wake_latency_is_pmu_timing_plus_margin() {
    assert_eq!(WAKE_LATENCY_US, 1_800);
    assert_eq!(WAKE_LATENCY_US, PMU_WAKE_TIMING_US + WAKE_MARGIN_US);
}

#[test]
fn wake_latency_fits_below_threshold() {
    // A minimum-length deep sleep must still leave time for the alarm
    assert!(WAKE_LATENCY_US < MIN_DEEP_SLEEP_MS * 1_000);
}

#[test]
fn systick_reload_is_24_bit() {
    assert_eq!(SYSTICK_MAX_RELOAD, (1 << 24) - 1);
}

#[test]
fn compensation_below_one_tick() {
    let config = SleepConfig::new();
    assert!(STOPPED_TIMER_COMPENSATION < config.counts_per_tick());
}

// =============================================================================
// Derived Value Tests
// =============================================================================

#[test]
fn counts_per_tick_default() {
    // 24 MHz / 1 kHz
    assert_eq!(SleepConfig::new().counts_per_tick(), 24_000);
}

#[test]
fn max_suppressed_ticks_default() {
    // 0xFFFFFF / 24000 = 699
    assert_eq!(SleepConfig::new().max_suppressed_ticks(), 699);
}

#[test]
fn max_deep_sleep_ticks_matches_alarm_range() {
    let config = SleepConfig::new();
    assert_eq!(config.max_deep_sleep_ticks(), MAX_SLEEP_MS);
}

#[test]
fn ticks_to_ms_scales_with_rate() {
    let config = SleepConfig::new().with_tick_rate_hz(100);
    assert_eq!(config.ticks_to_ms(3), 30);
    assert_eq!(SleepConfig::new().ticks_to_ms(3), 3);
}

#[test]
fn default_matches_new() {
    assert_eq!(SleepConfig::default(), SleepConfig::new());
    assert_eq!(SleepConfig::new().handshake, HandshakePolicy::Unbounded);
}

// =============================================================================
// Validation Tests
// =============================================================================

#[test]
fn default_config_validates() {
    assert!(SleepConfig::new().validate().is_ok());
}

#[test]
fn zero_tick_rate_rejected() {
    let config = SleepConfig::new().with_tick_rate_hz(0);
    assert_eq!(config.validate(), Err(ConfigError::ZeroTickRate));
}

#[test]
fn uneven_tick_period_rejected() {
    // 1e6 / 300 is not whole
    let config = SleepConfig::new().with_tick_rate_hz(300);
    assert_eq!(config.validate(), Err(ConfigError::UnevenTickPeriod));
}

#[test]
fn slow_timer_clock_rejected() {
    let config = SleepConfig::new().with_timer_clock_hz(500);
    assert_eq!(config.validate(), Err(ConfigError::TimerClockTooSlow));
}

#[test]
fn long_tick_rejected() {
    // 96 MHz at 1 Hz needs 96M counts per tick
    let config = SleepConfig::new()
        .with_timer_clock_hz(96_000_000)
        .with_tick_rate_hz(1);
    assert_eq!(config.validate(), Err(ConfigError::TickPeriodTooLong));
}

#[test]
fn zero_threshold_rejected() {
    let config = SleepConfig::new().with_min_deep_sleep_ms(0);
    assert_eq!(config.validate(), Err(ConfigError::ZeroDeepSleepThreshold));
}

#[test]
fn max_sleep_below_threshold_rejected() {
    let config = SleepConfig::new().with_min_deep_sleep_ms(10).with_max_sleep_ms(5);
    assert_eq!(config.validate(), Err(ConfigError::MaxSleepBelowThreshold));
}

#[test]
fn builder_sets_fields() {
    let config = SleepConfig::new()
        .with_wake_latency_us(2_000)
        .with_stopped_timer_compensation(50)
        .with_handshake(HandshakePolicy::Bounded { max_polls: 16 });
    assert_eq!(config.wake_latency_us, 2_000);
    assert_eq!(config.stopped_timer_compensation, 50);
    assert_eq!(config.handshake, HandshakePolicy::Bounded { max_polls: 16 });
    assert!(config.validate().is_ok());
}
