//! Power Management
//!
//! The tickless idle hook. When the scheduler has nothing to run it calls
//! [`PowerManager::suppress_ticks_and_sleep`], which picks a sleep depth and
//! either halts on WFI with the tick timer stretched (light sleep) or cuts
//! the core rail with an RTC alarm as the wake source (deep sleep).
//!
//! ```text
//!  idle hook ─► abort check ─► policy ─┬─► light ───────────────────► Active
//!                                      └─► deep: PreEntry ─► PoweringDown
//!                                                               │ rail cut
//!  boot path ─► resume ─► Waking ─► Reconciling ─► Active ◄─────┘
//! ```
//!
//! A deep sleep is split across two calls. On silicon the rail cut does not
//! return; the boot path calls [`PowerManager::resume`] from the recorded
//! entry. With fake hardware the cut returns `IdleOutcome::Retained(())`
//! and the test calls `resume` itself.

pub mod deep;
pub mod gate;
pub mod handshake;
pub mod hooks;
pub mod light;
pub mod policy;
pub mod reconcile;

pub use self::deep::{EntrySnapshot, SleepCycle};
pub use self::gate::{PreventSleep, PreventSleepGuard, PREVENT_SLEEP};
pub use self::handshake::{Fault, HandshakePolicy, HandshakeResult, SampleStage};
pub use self::hooks::{NoHooks, SleepHooks};

use heapless::HistoryBuffer;

use crate::config::{ConfigError, SleepConfig, HISTORY_DEPTH};
use crate::hal::{CoreControl, HardwareRegisters, PowerController, ResumeEntry};
use crate::scheduler::Scheduler;
use crate::types::{ElapsedTime, IdleOutcome, PowerState, SleepMode, SleepRecord, SleepStats};

/// Idle outcome for a given hardware bundle
pub type Outcome<H> = IdleOutcome<<<H as HardwareRegisters>::Pmu as PowerController>::Exit>;

/// Sleep-cycle context
///
/// Owns the hardware ports and every piece of state that has to survive
/// from the idle hook to the resume entry.
pub struct PowerManager<'g, H: HardwareRegisters> {
    hw: H,
    config: SleepConfig,
    gate: &'g PreventSleep,
    resume_entry: ResumeEntry,
    state: PowerState,
    cycle: Option<SleepCycle>,
    stats: SleepStats,
    history: HistoryBuffer<SleepRecord, HISTORY_DEPTH>,
}

impl<'g, H: HardwareRegisters> PowerManager<'g, H> {
    /// Create a power manager
    ///
    /// `resume_entry` is where the PMU restarts the core after a deep sleep;
    /// it must end up calling [`PowerManager::resume`].
    ///
    /// # Errors
    ///
    /// Returns the configuration error if `config` does not validate.
    pub fn new(
        hw: H,
        config: SleepConfig,
        gate: &'g PreventSleep,
        resume_entry: ResumeEntry,
    ) -> Result<Self, ConfigError> {
        let config = config.validate()?;
        info!("low-power idle ready: {}", config);
        Ok(Self {
            hw,
            config,
            gate,
            resume_entry,
            state: PowerState::Active,
            cycle: None,
            stats: SleepStats::default(),
            history: HistoryBuffer::new(),
        })
    }

    /// Current power state
    #[must_use]
    pub const fn state(&self) -> PowerState {
        self.state
    }

    /// Active configuration
    #[must_use]
    pub const fn config(&self) -> &SleepConfig {
        &self.config
    }

    /// Sleep counters
    #[must_use]
    pub const fn stats(&self) -> &SleepStats {
        &self.stats
    }

    /// Most recent completed sleeps
    #[must_use]
    pub const fn history(&self) -> &HistoryBuffer<SleepRecord, HISTORY_DEPTH> {
        &self.history
    }

    /// Deep sleep waiting for [`PowerManager::resume`], if any
    #[must_use]
    pub const fn pending_cycle(&self) -> Option<&SleepCycle> {
        self.cycle.as_ref()
    }

    /// Hardware ports
    #[must_use]
    pub const fn hardware(&self) -> &H {
        &self.hw
    }

    /// Hardware ports, mutably
    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hw
    }

    /// Idle hook: sleep for up to `idle_ticks` ticks
    ///
    /// Returns once the light sleep is over, the sleep was abandoned, or (on
    /// fake hardware only) the core rail was cut.
    pub fn suppress_ticks_and_sleep<S, K>(
        &mut self,
        sched: &mut S,
        hooks: &mut K,
        idle_ticks: u32,
    ) -> Outcome<H>
    where
        S: Scheduler,
        K: SleepHooks,
    {
        if self.state != PowerState::Active {
            warn!("idle hook entered in state {}", self.state);
            return IdleOutcome::Aborted;
        }
        self.stats.last_requested_ticks = idle_ticks;

        self.hw.core().mask_interrupts();
        if sched.abort_sleep_requested() {
            self.hw.core().unmask_interrupts();
            self.stats.aborts = self.stats.aborts.wrapping_add(1);
            return IdleOutcome::Aborted;
        }

        match policy::choose(&self.config, idle_ticks, self.gate.is_held(), hooks) {
            SleepMode::Light => {
                self.state = PowerState::LightSleep;
                let elapsed = light::sleep(&mut self.hw, sched, &self.config, idle_ticks);
                self.hw.core().unmask_interrupts();
                self.state = PowerState::Active;
                let suppressed = idle_ticks.min(self.config.max_suppressed_ticks());
                self.finish(SleepMode::Light, suppressed, elapsed);
                IdleOutcome::LightSlept(elapsed)
            }
            SleepMode::Deep => self.deep_sleep(sched, hooks, idle_ticks),
        }
    }

    fn deep_sleep<S, K>(&mut self, sched: &mut S, hooks: &mut K, idle_ticks: u32) -> Outcome<H>
    where
        S: Scheduler,
        K: SleepHooks,
    {
        let Some(entry) = deep::pre_entry(&mut self.hw, sched, hooks) else {
            self.stats.vetoes = self.stats.vetoes.wrapping_add(1);
            return IdleOutcome::Vetoed;
        };

        let cycle = match deep::power_down(&mut self.hw, &self.config, idle_ticks, entry) {
            Ok(cycle) => cycle,
            Err(fault) => hooks.fatal(fault),
        };
        self.cycle = Some(cycle);
        self.state = PowerState::DeepSleep;

        IdleOutcome::Retained(self.hw.pmu().enter_retention(self.resume_entry))
    }

    /// Boot-path half of a deep sleep
    ///
    /// Restores the hardware, steps the scheduler by the time the RTC
    /// measured and reopens interrupts. Returns `None` when there is no
    /// deep sleep to resume from.
    pub fn resume<S, K>(&mut self, sched: &mut S, hooks: &mut K) -> Option<ElapsedTime>
    where
        S: Scheduler,
        K: SleepHooks,
    {
        let Some(cycle) = self.cycle.take() else {
            warn!("resume without a pending deep sleep");
            return None;
        };

        deep::wake(&mut self.hw, &cycle);
        let elapsed = match deep::reconcile(&mut self.hw, &self.config, &cycle) {
            Ok(elapsed) => elapsed,
            Err(fault) => hooks.fatal(fault),
        };
        deep::activate(&mut self.hw, &self.config, sched, hooks, &elapsed);
        self.state = PowerState::Active;

        debug!("deep sleep over: {}", elapsed);
        self.finish(SleepMode::Deep, cycle.requested_ticks, elapsed);
        Some(elapsed)
    }

    fn finish(&mut self, mode: SleepMode, requested_ticks: u32, elapsed: ElapsedTime) {
        self.stats.record(mode, &elapsed);
        self.history.write(SleepRecord {
            mode,
            requested_ticks,
            elapsed,
        });
    }
}
