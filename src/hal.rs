//! Hardware Abstraction Layer
//!
//! Narrow ports onto the registers the low-power path touches. Each port is
//! a trait so the orchestration logic runs unchanged against silicon or the
//! in-memory fakes in [`crate::fake`].
//!
//! Silicon implementations live here only for the Cortex-M core blocks
//! (SysTick, interrupt masking, VTOR/SHPR3). RTC, clock gating, flash,
//! voltage trim and the PMU belong to their peripheral drivers, which
//! implement the corresponding trait.

pub mod clock;
pub mod cpu;
pub mod pmu;
pub mod rtc;
pub mod timer;
pub mod trim;

pub use self::clock::ClockResume;
pub use self::cpu::{CoreControl, SavedWakeContext};
pub use self::pmu::{PowerController, ResumeEntry, SleepStatus};
pub use self::rtc::RtcCounter;
pub use self::timer::TickTimer;
pub use self::trim::PowerTrim;

/// Every port the low-power subsystem needs, bundled
///
/// Accessors hand out one port at a time. A single type may serve as
/// several ports by naming itself as the associated type.
pub trait HardwareRegisters {
    /// Periodic tick timer
    type Timer: TickTimer;
    /// Low-power RTC counter and alarm
    type Rtc: RtcCounter;
    /// Clock gates and flash controller
    type Clocks: ClockResume;
    /// Voltage rail trim
    type Trim: PowerTrim;
    /// Power management unit
    type Pmu: PowerController;
    /// CPU core control
    type Core: CoreControl;

    /// Tick timer port
    fn timer(&mut self) -> &mut Self::Timer;
    /// RTC port
    fn rtc(&mut self) -> &mut Self::Rtc;
    /// Clock and flash port
    fn clocks(&mut self) -> &mut Self::Clocks;
    /// Power trim port
    fn trim(&mut self) -> &mut Self::Trim;
    /// PMU port
    fn pmu(&mut self) -> &mut Self::Pmu;
    /// Core control port
    fn core(&mut self) -> &mut Self::Core;
}

/// Silicon port bundle
///
/// Pairs the Cortex-M SysTick and core blocks owned by this crate with the
/// chip drivers that implement the remaining ports.
#[cfg(feature = "embedded")]
pub struct Board<R, C, T, P> {
    /// SysTick
    pub timer: timer::SysTickTimer,
    /// PMU RTC driver
    pub rtc: R,
    /// Clock and flash driver
    pub clocks: C,
    /// Trim driver
    pub trim: T,
    /// PMU driver
    pub pmu: P,
    /// Core registers
    pub core: cpu::CortexM,
}

#[cfg(feature = "embedded")]
impl<R, C, T, P> Board<R, C, T, P>
where
    R: RtcCounter,
    C: ClockResume,
    T: PowerTrim,
    P: PowerController,
{
    /// Bundle the SysTick peripheral with the chip drivers
    #[must_use]
    pub fn new(syst: cortex_m::peripheral::SYST, rtc: R, clocks: C, trim: T, pmu: P) -> Self {
        Self {
            timer: timer::SysTickTimer::new(syst),
            rtc,
            clocks,
            trim,
            pmu,
            core: cpu::CortexM::new(),
        }
    }
}

#[cfg(feature = "embedded")]
impl<R, C, T, P> HardwareRegisters for Board<R, C, T, P>
where
    R: RtcCounter,
    C: ClockResume,
    T: PowerTrim,
    P: PowerController,
{
    type Timer = timer::SysTickTimer;
    type Rtc = R;
    type Clocks = C;
    type Trim = T;
    type Pmu = P;
    type Core = cpu::CortexM;

    fn timer(&mut self) -> &mut Self::Timer {
        &mut self.timer
    }

    fn rtc(&mut self) -> &mut Self::Rtc {
        &mut self.rtc
    }

    fn clocks(&mut self) -> &mut Self::Clocks {
        &mut self.clocks
    }

    fn trim(&mut self) -> &mut Self::Trim {
        &mut self.trim
    }

    fn pmu(&mut self) -> &mut Self::Pmu {
        &mut self.pmu
    }

    fn core(&mut self) -> &mut Self::Core {
        &mut self.core
    }
}
