//! In-Memory Hardware
//!
//! Host-side stand-ins for every port, used by the unit and integration
//! tests. [`FakeHardware`] models just enough of the silicon to make the
//! tick arithmetic meaningful: a 24-bit down-counting SysTick with a sticky
//! COUNTFLAG, and a free-running RTC that keeps counting through a core
//! power-down. Every write is appended to an event log so tests can check
//! ordering.

use heapless::Vec;

use crate::config::SleepConfig;
use crate::hal::{
    ClockResume, CoreControl, HardwareRegisters, PowerController, PowerTrim, ResumeEntry,
    RtcCounter, SavedWakeContext, SleepStatus, TickTimer,
};
use crate::power::{Fault, SleepHooks};
use crate::scheduler::Scheduler;

/// Calibrated RC oscillator frequency reported by default
pub const FAKE_LP_HZ: u32 = 32_768;

/// RTC cycles the wake path takes before the counter is sampled again
///
/// About 1.8 ms at 32 kHz, matching the configured wake latency.
pub const FAKE_WAKE_CYCLES: u32 = 59;

/// SysTick counts between the timer firing and WFI returning
pub const FAKE_ISR_LATENCY: u32 = 12;

/// Log capacity
pub const LOG_DEPTH: usize = 256;

/// Boot entry handed to the PMU in tests; never actually jumped to
pub extern "C" fn fake_resume_entry() -> ! {
    loop {
        core::hint::spin_loop();
    }
}

/// A register write or core action seen by the fake
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FakeEvent {
    /// PRIMASK set
    MaskInterrupts,
    /// PRIMASK cleared
    UnmaskInterrupts,
    /// Core halted
    WaitForInterrupt,
    /// SysTick reload written
    TimerReload(u32),
    /// SysTick current value cleared
    TimerReset,
    /// SysTick started
    TimerEnable,
    /// SysTick stopped
    TimerDisable,
    /// RTC counter latched
    RtcSample(u32),
    /// RTC alarm target written
    AlarmSet(u32),
    /// RTC alarm interrupt enabled
    AlarmEnable,
    /// RTC alarm interrupt disabled
    AlarmDisable,
    /// RTC alarm status cleared
    AlarmClear,
    /// Minimum clock gates on
    MinClocks,
    /// Flash put into deep power-down
    FlashEnterLowPower,
    /// Flash woken and controller reinitialized
    FlashExitLowPower,
    /// Trim pre-sleep stage
    TrimPreSleep,
    /// Trim post-wake stage
    TrimPostWake,
    /// PMU wake timing written
    WakeTiming(u32),
    /// PMU status written
    Status(SleepStatus),
    /// Core registers captured
    SaveContext,
    /// Core registers written back
    RestoreContext,
    /// Core rail cut
    EnterRetention,
}

impl FakeEvent {
    /// True for writes to the RTC, flash, trim or PMU blocks
    #[must_use]
    pub const fn is_deep_sleep_only(&self) -> bool {
        matches!(
            self,
            Self::RtcSample(_)
                | Self::AlarmSet(_)
                | Self::AlarmEnable
                | Self::AlarmDisable
                | Self::AlarmClear
                | Self::MinClocks
                | Self::FlashEnterLowPower
                | Self::FlashExitLowPower
                | Self::TrimPreSleep
                | Self::TrimPostWake
                | Self::WakeTiming(_)
                | Self::Status(_)
                | Self::SaveContext
                | Self::RestoreContext
                | Self::EnterRetention
        )
    }
}

/// SysTick register model
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FakeTimer {
    /// LOAD
    pub reload: u32,
    /// VAL
    pub current: u32,
    /// CTRL.ENABLE
    pub enabled: bool,
    /// CTRL.COUNTFLAG, cleared on read
    pub count_flag: bool,
}

impl FakeTimer {
    /// Running timer with the given reload, at the start of a period
    #[must_use]
    pub const fn running(reload: u32) -> Self {
        Self {
            reload,
            current: reload,
            enabled: true,
            count_flag: false,
        }
    }

    /// Clocks until the counter next reaches zero
    #[must_use]
    pub const fn clocks_to_expiry(&self) -> u32 {
        if self.current == 0 {
            self.reload.saturating_add(1)
        } else {
            self.current
        }
    }

    /// Advance by `clocks` input clocks
    pub fn elapse(&mut self, clocks: u32) {
        if !self.enabled || clocks == 0 {
            return;
        }
        let mut clocks = clocks;
        if self.current == 0 {
            self.current = self.reload;
            clocks -= 1;
        }
        if clocks < self.current {
            self.current -= clocks;
            return;
        }
        clocks -= self.current;
        self.current = 0;
        self.count_flag = true;

        let period = u64::from(self.reload) + 1;
        let rem = u64::from(clocks) % period;
        // rem < period <= 2^24
        self.current = if rem == 0 { 0 } else { (period - rem) as u32 };
    }
}

/// Every port in one struct
#[derive(Debug)]
pub struct FakeHardware {
    /// SysTick
    pub timer: FakeTimer,
    /// SysTick clocks WFI lasts before another interrupt; `None` waits for
    /// the timer
    pub wfi_wake_after: Option<u32>,
    /// SysTick clocks between the timer firing and WFI returning
    pub isr_latency: u32,
    /// RTC counter
    pub rtc_counter: u32,
    /// Last alarm target written, `None` if never written
    pub alarm: Option<u32>,
    /// Alarm interrupt enabled
    pub alarm_enabled: bool,
    /// Alarm status flag
    pub alarm_pending: bool,
    /// Polls each RTC sample stays busy
    pub sample_busy_polls: u32,
    /// Sample handshake never completes
    pub sample_stuck: bool,
    sample_countdown: u32,
    /// Calibrated low-power oscillator frequency
    pub lp_hz: u32,
    /// RTC cycles of a deep sleep ended by another interrupt; `None`
    /// sleeps until the alarm
    pub deep_wake_after: Option<u32>,
    /// RTC cycles the wake path consumes
    pub wake_cycles: u32,
    /// Free-running microsecond counter
    pub free_counter: u32,
    /// Microseconds of wall time that pass after every read of the free counter
    pub free_counter_step: u32,
    timer_clocks_per_us: u32,
    rtc_residue: u64,
    /// PMU status register
    pub status: SleepStatus,
    /// PMU wake timing register
    pub wake_timing_us: u32,
    /// Resume vector recorded by the last rail cut
    pub resume_entry: Option<ResumeEntry>,
    /// PRIMASK
    pub interrupts_masked: bool,
    /// Flash in deep power-down
    pub flash_low_power: bool,
    /// SCB VTOR
    pub vector_table: u32,
    /// SCB SHPR3
    pub handler_priorities: u32,
    /// Register writes, oldest first
    pub log: Vec<FakeEvent, LOG_DEPTH>,
}

impl FakeHardware {
    /// Fresh hardware with the tick running for `config`
    #[must_use]
    pub fn new(config: &SleepConfig) -> Self {
        Self {
            timer: FakeTimer::running(config.counts_per_tick() - 1),
            wfi_wake_after: None,
            isr_latency: FAKE_ISR_LATENCY,
            rtc_counter: 1_000,
            alarm: None,
            alarm_enabled: false,
            alarm_pending: false,
            sample_busy_polls: 2,
            sample_stuck: false,
            sample_countdown: 0,
            lp_hz: FAKE_LP_HZ,
            deep_wake_after: None,
            wake_cycles: FAKE_WAKE_CYCLES,
            free_counter: 0,
            free_counter_step: 0,
            timer_clocks_per_us: config.timer_clock_hz / 1_000_000,
            rtc_residue: 0,
            status: SleepStatus::Normal,
            wake_timing_us: 0,
            resume_entry: None,
            interrupts_masked: false,
            flash_low_power: false,
            vector_table: 0x0800_4000,
            handler_priorities: 0xF0F0_0000,
            log: Vec::new(),
        }
    }

    /// Let `us` microseconds of wall time pass with the core running
    ///
    /// Moves the free counter, SysTick (if enabled) and the RTC together.
    pub fn elapse_us(&mut self, us: u32) {
        self.free_counter = self.free_counter.wrapping_add(us);
        self.timer.elapse(us.saturating_mul(self.timer_clocks_per_us));

        self.rtc_residue += u64::from(us) * u64::from(self.lp_hz);
        let cycles = self.rtc_residue / 1_000_000;
        self.rtc_residue %= 1_000_000;
        self.rtc_counter = self
            .rtc_counter
            .wrapping_add(u32::try_from(cycles).unwrap_or(u32::MAX));
    }

    fn record(&mut self, event: FakeEvent) {
        // A full log drops the newest entries; tests clear it between cycles
        let _ = self.log.push(event);
    }

    /// Forget every logged event
    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    /// Index of the first occurrence of `event`
    #[must_use]
    pub fn position(&self, event: FakeEvent) -> Option<usize> {
        self.log.iter().position(|e| *e == event)
    }

    /// Whether `event` was logged
    #[must_use]
    pub fn logged(&self, event: FakeEvent) -> bool {
        self.position(event).is_some()
    }

    /// Number of logged events matching `pred`
    pub fn count<F: Fn(&FakeEvent) -> bool>(&self, pred: F) -> usize {
        self.log.iter().filter(|&e| pred(e)).count()
    }
}

impl TickTimer for FakeHardware {
    fn set_reload(&mut self, value: u32) {
        self.timer.reload = value & crate::config::SYSTICK_MAX_RELOAD;
        self.record(FakeEvent::TimerReload(value));
    }

    fn read_current(&mut self) -> u32 {
        self.timer.current
    }

    fn reset_current(&mut self) {
        self.timer.current = 0;
        self.timer.count_flag = false;
        self.record(FakeEvent::TimerReset);
    }

    fn enable(&mut self) {
        self.timer.enabled = true;
        self.record(FakeEvent::TimerEnable);
    }

    fn disable(&mut self) {
        self.timer.enabled = false;
        self.record(FakeEvent::TimerDisable);
    }

    fn count_flag(&mut self) -> bool {
        core::mem::take(&mut self.timer.count_flag)
    }
}

impl RtcCounter for FakeHardware {
    fn start_sample(&mut self) {
        self.sample_countdown = self.sample_busy_polls;
    }

    fn sample_in_progress(&mut self) -> bool {
        if self.sample_stuck {
            return true;
        }
        if self.sample_countdown == 0 {
            return false;
        }
        self.sample_countdown -= 1;
        true
    }

    fn sampled_counter(&mut self) -> u32 {
        let counter = self.rtc_counter;
        self.record(FakeEvent::RtcSample(counter));
        counter
    }

    fn set_alarm(&mut self, target: u32) {
        self.alarm = Some(target);
        self.record(FakeEvent::AlarmSet(target));
    }

    fn enable_alarm(&mut self) {
        self.alarm_enabled = true;
        self.record(FakeEvent::AlarmEnable);
    }

    fn disable_alarm(&mut self) {
        self.alarm_enabled = false;
        self.record(FakeEvent::AlarmDisable);
    }

    fn clear_alarm(&mut self) {
        self.alarm_pending = false;
        self.record(FakeEvent::AlarmClear);
    }

    fn alarm_fired(&mut self) -> bool {
        self.alarm_pending
    }
}

impl ClockResume for FakeHardware {
    fn enable_min_clocks(&mut self) {
        self.record(FakeEvent::MinClocks);
    }

    fn flash_enter_low_power(&mut self) {
        self.flash_low_power = true;
        self.record(FakeEvent::FlashEnterLowPower);
    }

    fn flash_exit_low_power_and_reinit(&mut self) {
        self.flash_low_power = false;
        self.rtc_counter = self.rtc_counter.wrapping_add(self.wake_cycles);
        self.record(FakeEvent::FlashExitLowPower);
    }

    fn calibrated_lp_frequency_hz(&mut self) -> u32 {
        self.lp_hz
    }
}

impl PowerTrim for FakeHardware {
    fn pre_sleep_stage(&mut self) {
        self.record(FakeEvent::TrimPreSleep);
    }

    fn post_wake_stage(&mut self) {
        self.record(FakeEvent::TrimPostWake);
    }
}

impl PowerController for FakeHardware {
    type Exit = ();

    fn set_wake_timing_us(&mut self, us: u32) {
        self.wake_timing_us = us;
        self.record(FakeEvent::WakeTiming(us));
    }

    fn set_sleep_status(&mut self, status: SleepStatus) {
        self.status = status;
        self.record(FakeEvent::Status(status));
    }

    fn free_counter_us(&mut self) -> u32 {
        let now = self.free_counter;
        self.elapse_us(self.free_counter_step);
        now
    }

    fn enter_retention(&mut self, entry: ResumeEntry) -> Self::Exit {
        self.resume_entry = Some(entry);
        self.record(FakeEvent::EnterRetention);

        // Core domain loses its state
        self.timer = FakeTimer::default();
        self.vector_table = 0;
        self.handler_priorities = 0;

        let to_alarm = self
            .alarm
            .filter(|_| self.alarm_enabled)
            .map(|target| target.wrapping_sub(self.rtc_counter));
        let (cycles, fired) = match (self.deep_wake_after.take(), to_alarm) {
            (Some(early), Some(full)) if early < full => (early, false),
            (Some(early), None) => (early, false),
            (_, Some(full)) => (full, true),
            (None, None) => (0, false),
        };
        self.rtc_counter = self.rtc_counter.wrapping_add(cycles);
        if fired {
            self.alarm_pending = true;
        }
    }
}

impl CoreControl for FakeHardware {
    fn mask_interrupts(&mut self) {
        self.interrupts_masked = true;
        self.record(FakeEvent::MaskInterrupts);
    }

    fn unmask_interrupts(&mut self) {
        self.interrupts_masked = false;
        self.record(FakeEvent::UnmaskInterrupts);
    }

    fn wait_for_interrupt(&mut self) {
        self.record(FakeEvent::WaitForInterrupt);
        let to_tick = self.timer.clocks_to_expiry().saturating_add(self.isr_latency);
        let clocks = self.wfi_wake_after.take().map_or(to_tick, |n| n.min(to_tick));
        self.timer.elapse(clocks);
    }

    fn save_wake_context(&mut self) -> SavedWakeContext {
        self.record(FakeEvent::SaveContext);
        SavedWakeContext {
            vector_table: self.vector_table,
            handler_priorities: self.handler_priorities,
        }
    }

    fn restore_wake_context(&mut self, context: &SavedWakeContext) {
        self.vector_table = context.vector_table;
        self.handler_priorities = context.handler_priorities;
        self.record(FakeEvent::RestoreContext);
    }
}

impl HardwareRegisters for FakeHardware {
    type Timer = Self;
    type Rtc = Self;
    type Clocks = Self;
    type Trim = Self;
    type Pmu = Self;
    type Core = Self;

    fn timer(&mut self) -> &mut Self {
        self
    }

    fn rtc(&mut self) -> &mut Self {
        self
    }

    fn clocks(&mut self) -> &mut Self {
        self
    }

    fn trim(&mut self) -> &mut Self {
        self
    }

    fn pmu(&mut self) -> &mut Self {
        self
    }

    fn core(&mut self) -> &mut Self {
        self
    }
}

/// Scheduler stand-in that just counts
#[derive(Debug, Default)]
pub struct FakeScheduler {
    /// OS tick counter
    pub tick_count: u64,
    /// Nesting depth of `suspend_all`
    pub suspend_depth: u32,
    /// Deepest nesting seen
    pub max_suspend_depth: u32,
    /// Answer to the abort-sleep check
    pub abort: bool,
    /// Every `advance_ticks` argument, oldest first
    pub steps: Vec<u32, 64>,
}

impl FakeScheduler {
    /// Scheduler at tick zero
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Scheduler for FakeScheduler {
    fn suspend_all(&mut self) {
        self.suspend_depth += 1;
        self.max_suspend_depth = self.max_suspend_depth.max(self.suspend_depth);
    }

    fn resume_all(&mut self) {
        self.suspend_depth = self.suspend_depth.saturating_sub(1);
    }

    fn advance_ticks(&mut self, ticks: u32) {
        self.tick_count += u64::from(ticks);
        let _ = self.steps.push(ticks);
    }

    fn abort_sleep_requested(&mut self) -> bool {
        self.abort
    }
}

/// Hook invocation seen by [`ScriptedHooks`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HookCall {
    /// `deep_sleep_allowed`
    DeepSleepAllowed,
    /// `pre_sleep_veto`
    PreSleepVeto,
    /// `pre_sleep_notify`
    PreSleepNotify,
    /// `post_wake_notify_immediate`
    PostWakeImmediate,
    /// `post_wake_notify_deferred`
    PostWakeDeferred,
}

/// Hooks with canned answers and a call log
#[derive(Debug)]
pub struct ScriptedHooks {
    /// Answer to `deep_sleep_allowed`
    pub allow_deep: bool,
    /// Answer to `pre_sleep_veto`; `false` cancels the sleep
    pub allow_entry: bool,
    /// Calls, oldest first
    pub calls: Vec<HookCall, 32>,
}

impl ScriptedHooks {
    /// Hooks that allow everything
    #[must_use]
    pub fn new() -> Self {
        Self {
            allow_deep: true,
            allow_entry: true,
            calls: Vec::new(),
        }
    }

    /// Hooks whose pre-sleep veto cancels every deep sleep
    #[must_use]
    pub fn vetoing() -> Self {
        Self {
            allow_entry: false,
            ..Self::new()
        }
    }

    fn record(&mut self, call: HookCall) {
        let _ = self.calls.push(call);
    }
}

impl Default for ScriptedHooks {
    fn default() -> Self {
        Self::new()
    }
}

impl SleepHooks for ScriptedHooks {
    fn deep_sleep_allowed(&mut self) -> bool {
        self.record(HookCall::DeepSleepAllowed);
        self.allow_deep
    }

    fn pre_sleep_veto(&mut self) -> bool {
        self.record(HookCall::PreSleepVeto);
        self.allow_entry
    }

    fn pre_sleep_notify(&mut self) {
        self.record(HookCall::PreSleepNotify);
    }

    fn post_wake_notify_immediate(&mut self) {
        self.record(HookCall::PostWakeImmediate);
    }

    fn post_wake_notify_deferred(&mut self) {
        self.record(HookCall::PostWakeDeferred);
    }

    fn fatal(&mut self, fault: Fault) -> ! {
        panic!("fatal low-power fault: {fault:?}")
    }
}
