//! FR30xx Tickless Low-Power Library
//!
//! The idle-time half of an RTOS port for the FR30xx SoC family. When the
//! scheduler has no runnable task it hands the expected idle period to this
//! crate, which either halts the core with the tick timer stretched over the
//! period (light sleep) or powers the core domain down with an RTC alarm as
//! the wake source (deep sleep), then steps the OS tick by exactly the time
//! that passed.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      RTOS KERNEL                             │
//! │  idle task ─► suppress_ticks_and_sleep    boot ─► resume     │
//! ├─────────────────────────────────────────────────────────────┤
//! │                    POWER MANAGER                             │
//! │  Policy Gate │ Light Sleep │ Deep-Sleep Orchestrator         │
//! │  Prevent-Sleep Gate │ Time Reconciliation │ Handshakes       │
//! ├─────────────────────────────────────────────────────────────┤
//! │                 HAL PORTS (traits)                           │
//! │  SysTick │ RTC │ Clock/Flash │ Trim │ PMU │ Core             │
//! ├─────────────────────────────────────────────────────────────┤
//! │        Cortex-M33 (cortex-m)  │  chip drivers  │  fakes      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Design Principles
//!
//! - **One context object**: all sleep-cycle state lives in
//!   [`power::PowerManager`], nothing in statics except the prevent-sleep
//!   count
//! - **Ports as traits**: the orchestration runs unchanged on silicon and on
//!   the in-memory fakes
//! - **No unsafe outside the HAL**: SysTick and SCB register access only
//! - **Two-phase deep sleep**: the rail cut and the resume are separate calls

#![cfg_attr(feature = "embedded", no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

#[macro_use]
mod fmt;

/// Hardware Abstraction Layer
///
/// Register ports for SysTick, RTC, clocks, trim, PMU and the core.
pub mod hal;

/// RTOS kernel interface
pub mod scheduler;

/// Power Management
///
/// Idle hook, sleep policy, light and deep sleep, time reconciliation.
pub mod power;

/// Shared types used across modules
pub mod types;

/// System configuration and constants
pub mod config;

/// In-memory hardware for host tests
#[cfg(any(test, feature = "std"))]
pub mod fake;

/// Prelude module for common imports
pub mod prelude {
    //! Convenient re-exports for common types and traits.

    pub use crate::config::*;
    pub use crate::types::*;

    pub use crate::hal::{
        ClockResume, CoreControl, HardwareRegisters, PowerController, PowerTrim, RtcCounter,
        TickTimer,
    };
    pub use crate::power::{PowerManager, PreventSleep, SleepHooks, PREVENT_SLEEP};
    pub use crate::scheduler::Scheduler;
}
