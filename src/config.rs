//! System configuration and hardware constants
//!
//! Compile-time constants for the FR30xx low-power subsystem plus
//! [`SleepConfig`], the runtime configuration a [`PowerManager`] is built
//! from. All clock rates, thresholds and latency figures are centralized here.
//!
//! [`PowerManager`]: crate::power::PowerManager

use crate::power::handshake::HandshakePolicy;

/// Default RTOS tick rate (1 kHz, one tick per millisecond)
pub const TICK_RATE_HZ: u32 = 1_000;

/// Default SysTick input clock (core clock after the pre-sleep switch to COREH)
pub const SYSTICK_CLOCK_HZ: u32 = 24_000_000;

/// Idle periods shorter than this always use light sleep
pub const MIN_DEEP_SLEEP_MS: u32 = 5;

/// PMU power on/off sequencing time programmed before every deep sleep
pub const PMU_WAKE_TIMING_US: u32 = 1_700;

/// Extra margin on top of the PMU timing for clock and flash bring-up
pub const WAKE_MARGIN_US: u32 = 100;

/// Fixed wake-path latency subtracted from every deep-sleep target
pub const WAKE_LATENCY_US: u32 = PMU_WAKE_TIMING_US + WAKE_MARGIN_US;

/// Longest deep sleep the RTC alarm can express, in milliseconds
pub const MAX_SLEEP_MS: u32 = 0x01FF_FFFF;

/// SysTick reload register is 24 bits wide
pub const SYSTICK_MAX_RELOAD: u32 = 0x00FF_FFFF;

/// Timer counts lost while SysTick is stopped and reprogrammed
pub const STOPPED_TIMER_COMPENSATION: u32 = 94;

/// The alarm is always armed at least this many RTC cycles ahead
pub const MIN_ALARM_LEAD_CYCLES: u32 = 2;

/// The alarm is never armed more than half the RTC range ahead, so the
/// wrapped target stays distinguishable from the counter
pub const MAX_ALARM_CYCLES: u32 = u32::MAX / 2;

/// Number of sleep cycles kept in the diagnostic history
pub const HISTORY_DEPTH: usize = 8;

/// Configuration validation failure
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Tick rate of zero
    ZeroTickRate,
    /// Tick period not a whole number of microseconds
    UnevenTickPeriod,
    /// Timer clock slower than the tick rate
    TimerClockTooSlow,
    /// One tick does not fit the 24-bit reload register
    TickPeriodTooLong,
    /// Deep-sleep threshold of zero would allow zero-length deep sleeps
    ZeroDeepSleepThreshold,
    /// Maximum sleep shorter than the deep-sleep threshold
    MaxSleepBelowThreshold,
}

#[cfg(feature = "embedded")]
impl defmt::Format for ConfigError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::ZeroTickRate => defmt::write!(f, "tick rate is zero"),
            Self::UnevenTickPeriod => defmt::write!(f, "tick period not whole us"),
            Self::TimerClockTooSlow => defmt::write!(f, "timer clock below tick rate"),
            Self::TickPeriodTooLong => defmt::write!(f, "tick exceeds 24-bit reload"),
            Self::ZeroDeepSleepThreshold => defmt::write!(f, "deep sleep threshold is zero"),
            Self::MaxSleepBelowThreshold => defmt::write!(f, "max sleep below threshold"),
        }
    }
}

/// Runtime configuration of the low-power subsystem
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SleepConfig {
    /// SysTick input clock in Hz
    pub timer_clock_hz: u32,
    /// RTOS tick rate in Hz
    pub tick_rate_hz: u32,
    /// Light sleep is forced below this many milliseconds
    pub min_deep_sleep_ms: u32,
    /// PMU on/off sequencing time
    pub pmu_wake_timing_us: u32,
    /// Total wake-path latency subtracted from the alarm target
    pub wake_latency_us: u32,
    /// Timer counts subtracted from the light-sleep reload
    pub stopped_timer_compensation: u32,
    /// Clamp for the requested deep-sleep duration
    pub max_sleep_ms: u32,
    /// How register handshakes wait
    pub handshake: HandshakePolicy,
}

impl SleepConfig {
    /// Configuration matching the SDK defaults
    #[must_use]
    pub const fn new() -> Self {
        Self {
            timer_clock_hz: SYSTICK_CLOCK_HZ,
            tick_rate_hz: TICK_RATE_HZ,
            min_deep_sleep_ms: MIN_DEEP_SLEEP_MS,
            pmu_wake_timing_us: PMU_WAKE_TIMING_US,
            wake_latency_us: WAKE_LATENCY_US,
            stopped_timer_compensation: STOPPED_TIMER_COMPENSATION,
            max_sleep_ms: MAX_SLEEP_MS,
            handshake: HandshakePolicy::Unbounded,
        }
    }

    /// Set the SysTick input clock
    #[must_use]
    pub const fn with_timer_clock_hz(mut self, hz: u32) -> Self {
        self.timer_clock_hz = hz;
        self
    }

    /// Set the RTOS tick rate
    #[must_use]
    pub const fn with_tick_rate_hz(mut self, hz: u32) -> Self {
        self.tick_rate_hz = hz;
        self
    }

    /// Set the deep-sleep threshold
    #[must_use]
    pub const fn with_min_deep_sleep_ms(mut self, ms: u32) -> Self {
        self.min_deep_sleep_ms = ms;
        self
    }

    /// Set the wake-path latency subtracted from every alarm
    #[must_use]
    pub const fn with_wake_latency_us(mut self, us: u32) -> Self {
        self.wake_latency_us = us;
        self
    }

    /// Set the stopped-timer compensation
    #[must_use]
    pub const fn with_stopped_timer_compensation(mut self, counts: u32) -> Self {
        self.stopped_timer_compensation = counts;
        self
    }

    /// Set the maximum deep-sleep duration
    #[must_use]
    pub const fn with_max_sleep_ms(mut self, ms: u32) -> Self {
        self.max_sleep_ms = ms;
        self
    }

    /// Set the handshake policy
    #[must_use]
    pub const fn with_handshake(mut self, policy: HandshakePolicy) -> Self {
        self.handshake = policy;
        self
    }

    /// Check the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub const fn validate(self) -> Result<Self, ConfigError> {
        if self.tick_rate_hz == 0 {
            return Err(ConfigError::ZeroTickRate);
        }
        if 1_000_000 % self.tick_rate_hz != 0 {
            return Err(ConfigError::UnevenTickPeriod);
        }
        if self.timer_clock_hz < self.tick_rate_hz {
            return Err(ConfigError::TimerClockTooSlow);
        }
        if self.timer_clock_hz / self.tick_rate_hz > SYSTICK_MAX_RELOAD + 1 {
            return Err(ConfigError::TickPeriodTooLong);
        }
        if self.min_deep_sleep_ms == 0 {
            return Err(ConfigError::ZeroDeepSleepThreshold);
        }
        if self.max_sleep_ms < self.min_deep_sleep_ms {
            return Err(ConfigError::MaxSleepBelowThreshold);
        }
        Ok(self)
    }

    /// Timer counts in one tick period
    #[must_use]
    pub const fn counts_per_tick(&self) -> u32 {
        self.timer_clock_hz / self.tick_rate_hz
    }

    /// Tick period in microseconds
    #[must_use]
    pub const fn tick_period_us(&self) -> u32 {
        1_000_000 / self.tick_rate_hz
    }

    /// Most ticks one light sleep can suppress
    #[must_use]
    pub const fn max_suppressed_ticks(&self) -> u32 {
        SYSTICK_MAX_RELOAD / self.counts_per_tick()
    }

    /// Most ticks one deep sleep can cover before the alarm range is exceeded
    #[must_use]
    pub const fn max_deep_sleep_ticks(&self) -> u32 {
        let ticks = self.max_sleep_ms as u64 * 1_000 / self.tick_period_us() as u64;
        if ticks > u32::MAX as u64 {
            u32::MAX
        } else {
            ticks as u32
        }
    }

    /// Convert a tick count to whole milliseconds
    #[must_use]
    pub const fn ticks_to_ms(&self, ticks: u32) -> u64 {
        ticks as u64 * self.tick_period_us() as u64 / 1_000
    }
}

impl Default for SleepConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for SleepConfig {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "SleepConfig(tick={}Hz, timer={}Hz, deep>={}ms)",
            self.tick_rate_hz,
            self.timer_clock_hz,
            self.min_deep_sleep_ms
        );
    }
}
