//! Shared types used across the low-power subsystem
//!
//! Domain types for sleep requests, wake reasons and elapsed-time results.
//! Everything here is plain `Copy` data; the state lives in
//! [`PowerManager`](crate::power::PowerManager).

use core::fmt;

/// One idle-hook invocation
///
/// Built fresh every time the scheduler calls the idle hook and dropped when
/// the hook returns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SleepRequest {
    /// Ticks the scheduler expects to stay idle
    pub requested_idle_ticks: u32,
    /// Tick timer current value sampled at entry
    pub timer_count_at_entry: u32,
}

impl SleepRequest {
    /// Create a request
    #[must_use]
    pub const fn new(requested_idle_ticks: u32, timer_count_at_entry: u32) -> Self {
        Self {
            requested_idle_ticks,
            timer_count_at_entry,
        }
    }

    /// Same request with the tick count clamped to `max`
    #[must_use]
    pub const fn clamped(self, max: u32) -> Self {
        if self.requested_idle_ticks > max {
            Self {
                requested_idle_ticks: max,
                ..self
            }
        } else {
            self
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for SleepRequest {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "SleepRequest({} ticks, count={})",
            self.requested_idle_ticks,
            self.timer_count_at_entry
        );
    }
}

/// What ended a sleep
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WakeSource {
    /// The tick timer expired at the end of the requested period
    TickTimer,
    /// The RTC alarm programmed for deep sleep fired
    RtcAlarm,
    /// Any other interrupt, before the planned wake time
    OtherInterrupt,
}

impl WakeSource {
    /// True when the sleep ended before the planned wake time
    #[must_use]
    pub const fn is_early(self) -> bool {
        matches!(self, Self::OtherInterrupt)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for WakeSource {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::TickTimer => defmt::write!(f, "TICK"),
            Self::RtcAlarm => defmt::write!(f, "RTC"),
            Self::OtherInterrupt => defmt::write!(f, "IRQ"),
        }
    }
}

/// Power state of the core
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PowerState {
    /// Running
    #[default]
    Active,
    /// CPU halted on WFI, clocks and rails on
    LightSleep,
    /// Core rail cut, only the RTC domain running
    DeepSleep,
}

#[cfg(feature = "embedded")]
impl defmt::Format for PowerState {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Active => defmt::write!(f, "ACTIVE"),
            Self::LightSleep => defmt::write!(f, "LIGHT"),
            Self::DeepSleep => defmt::write!(f, "DEEP"),
        }
    }
}

/// Sleep depth chosen by the policy gate
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SleepMode {
    /// WFI with the tick timer reprogrammed
    Light,
    /// Core power-down with an RTC wake alarm
    Deep,
}

#[cfg(feature = "embedded")]
impl defmt::Format for SleepMode {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Light => defmt::write!(f, "light"),
            Self::Deep => defmt::write!(f, "deep"),
        }
    }
}

/// Time that passed during one sleep, in scheduler units
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ElapsedTime {
    /// Whole ticks the OS tick counter was advanced by
    pub whole_ticks: u32,
    /// Part of the next tick already elapsed, in microseconds
    pub phase_remainder_us: u32,
    /// What ended the sleep
    pub wake_source: WakeSource,
}

impl ElapsedTime {
    /// Create an elapsed time
    #[must_use]
    pub const fn new(whole_ticks: u32, phase_remainder_us: u32, wake_source: WakeSource) -> Self {
        Self {
            whole_ticks,
            phase_remainder_us,
            wake_source,
        }
    }

    /// Total elapsed microseconds for a given tick period
    #[must_use]
    pub const fn total_us(&self, tick_period_us: u32) -> u64 {
        self.whole_ticks as u64 * tick_period_us as u64 + self.phase_remainder_us as u64
    }
}

impl fmt::Debug for ElapsedTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ElapsedTime({} ticks + {} us, {:?})",
            self.whole_ticks, self.phase_remainder_us, self.wake_source
        )
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for ElapsedTime {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "{} ticks + {}us ({})",
            self.whole_ticks,
            self.phase_remainder_us,
            self.wake_source
        );
    }
}

/// One completed sleep, kept in the diagnostic history
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SleepRecord {
    /// Depth that was used
    pub mode: SleepMode,
    /// Ticks requested by the scheduler (after clamping)
    pub requested_ticks: u32,
    /// Result of the wake-up accounting
    pub elapsed: ElapsedTime,
}

#[cfg(feature = "embedded")]
impl defmt::Format for SleepRecord {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "{} sleep: {}/{} ticks ({})",
            self.mode,
            self.elapsed.whole_ticks,
            self.requested_ticks,
            self.elapsed.wake_source
        );
    }
}

/// Running counters for the idle hook
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SleepStats {
    /// Light sleeps completed
    pub light_sleeps: u32,
    /// Deep sleeps completed (resumed)
    pub deep_sleeps: u32,
    /// Idle calls abandoned because a task became ready
    pub aborts: u32,
    /// Deep sleeps cancelled by the pre-sleep veto hook
    pub vetoes: u32,
    /// Ticks stepped into the OS tick counter by the idle hook
    pub ticks_stepped: u64,
    /// Idle ticks requested by the most recent call, before clamping
    pub last_requested_ticks: u32,
}

impl SleepStats {
    /// Count a finished sleep
    pub fn record(&mut self, mode: SleepMode, elapsed: &ElapsedTime) {
        match mode {
            SleepMode::Light => self.light_sleeps = self.light_sleeps.wrapping_add(1),
            SleepMode::Deep => self.deep_sleeps = self.deep_sleeps.wrapping_add(1),
        }
        self.ticks_stepped = self.ticks_stepped.wrapping_add(u64::from(elapsed.whole_ticks));
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for SleepStats {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "Sleep(light={}, deep={}, abort={}, veto={})",
            self.light_sleeps,
            self.deep_sleeps,
            self.aborts,
            self.vetoes
        );
    }
}

/// What the idle hook did
///
/// `E` is the exit type of the core-rail cut: uninhabited on silicon, so the
/// `Retained` arm can only be observed with fake hardware.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdleOutcome<E> {
    /// A task became ready; nothing was touched
    Aborted,
    /// Light sleep finished
    LightSlept(ElapsedTime),
    /// Deep sleep was cancelled by the pre-sleep veto
    Vetoed,
    /// The core rail was cut; the wake continues in `PowerManager::resume`
    Retained(E),
}

impl<E> IdleOutcome<E> {
    /// True when any sleep happened or is in progress
    #[must_use]
    pub const fn slept(&self) -> bool {
        matches!(self, Self::LightSlept(_) | Self::Retained(_))
    }
}
