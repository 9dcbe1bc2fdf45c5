//! Power Management Unit Port
//!
//! The PMU owns the core rail, the boot-time resume vector and a status
//! register that tells the boot path whether it is coming out of deep sleep.

/// Boot-path entry the PMU jumps to when the core rail comes back
pub type ResumeEntry = extern "C" fn() -> !;

/// PMU status flag read by the boot path
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SleepStatus {
    /// Cold boot or normal run
    #[default]
    Normal,
    /// Core rail is (or was) cut for deep sleep
    DeepSleep,
}

#[cfg(feature = "embedded")]
impl defmt::Format for SleepStatus {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Normal => defmt::write!(f, "NORMAL"),
            Self::DeepSleep => defmt::write!(f, "DEEP_SLEEP"),
        }
    }
}

/// Power management unit
pub trait PowerController {
    /// Result of [`PowerController::enter_retention`]
    ///
    /// Silicon drivers use an uninhabited type such as
    /// [`core::convert::Infallible`]; fakes use `()`.
    type Exit;

    /// Program the PMU power on/off sequencing time
    fn set_wake_timing_us(&mut self, us: u32);

    /// Write the status flag the boot path inspects
    fn set_sleep_status(&mut self, status: SleepStatus);

    /// Free-running microsecond counter used for latency accounting
    ///
    /// Counts up and wraps; only differences are meaningful.
    fn free_counter_us(&mut self) -> u32;

    /// Record `entry` as the resume vector and cut the core rail
    ///
    /// Does not return on silicon: execution restarts at `entry`, which must
    /// call [`PowerManager::resume`](crate::power::PowerManager::resume).
    fn enter_retention(&mut self, entry: ResumeEntry) -> Self::Exit;
}
