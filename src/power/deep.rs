//! Deep-Sleep Orchestrator
//!
//! One deep sleep walks through
//!
//! ```text
//!   PreEntry ──veto──────────────────────────────────────────┐
//!      │                                                     ▼
//!      └─► PoweringDown ─► Asleep ─► Waking ─► Reconciling ─► Active
//! ```
//!
//! `Asleep` is not code: the core rail is cut at the end of
//! [`power_down`] and execution comes back through the resume entry, which
//! runs [`wake`], [`reconcile`] and [`activate`] in that order. Interrupts
//! stay masked from [`pre_entry`] until [`activate`] unmasks them.

use super::handshake::{sample_rtc, HandshakeResult, SampleStage};
use super::hooks::SleepHooks;
use super::reconcile::{
    alarm_budget_us, lp_cycles_to_us, split_elapsed, timer_counts_to_us, us_to_lp_cycles,
    us_to_timer_counts,
};
use crate::config::{SleepConfig, MAX_ALARM_CYCLES, MIN_ALARM_LEAD_CYCLES};
use crate::hal::{
    ClockResume, CoreControl, HardwareRegisters, PowerController, PowerTrim, RtcCounter,
    SavedWakeContext, SleepStatus, TickTimer,
};
use crate::scheduler::Scheduler;
use crate::types::{ElapsedTime, SleepRequest, WakeSource};

/// State carried from power-down to resume
///
/// Lives in the [`PowerManager`](super::PowerManager) while the core is
/// off, and is consumed exactly once by the resume path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SleepCycle {
    /// Idle ticks the cycle was planned for, after clamping
    pub requested_ticks: u32,
    /// RTC counter when the alarm was armed
    pub rtc_before: u32,
    /// RTC alarm target
    pub alarm: u32,
    /// Calibrated oscillator frequency used for both conversions
    pub lp_hz: u32,
    /// Part of the interrupted tick already elapsed at entry
    pub carried_phase_us: u32,
    /// Time spent between entry and arming the alarm
    pub pre_arm_latency_us: u32,
    /// Core registers to write back on wake
    pub context: SavedWakeContext,
}

#[cfg(feature = "embedded")]
impl defmt::Format for SleepCycle {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "SleepCycle({} ticks, rtc {}->{} @ {}Hz)",
            self.requested_ticks,
            self.rtc_before,
            self.alarm,
            self.lp_hz
        );
    }
}

/// Tick phase and latency counter read back to back at entry
///
/// Time spent after this instant (hooks, PMU setup) is charged once, to the
/// pre-arm latency; the part of the tick before it is the carried phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntrySnapshot {
    /// Tick timer current value
    pub timer_count: u32,
    /// Free-running microsecond counter
    pub free_counter_us: u32,
}

/// Suspend the scheduler and ask the application for permission
///
/// Interrupts are already masked. Returns the entry snapshot, or `None`
/// after unwinding a veto.
pub fn pre_entry<H, S, K>(hw: &mut H, sched: &mut S, hooks: &mut K) -> Option<EntrySnapshot>
where
    H: HardwareRegisters,
    S: Scheduler,
    K: SleepHooks,
{
    sched.suspend_all();
    let timer_count = hw.timer().read_current();
    let free_counter_us = hw.pmu().free_counter_us();

    if !hooks.pre_sleep_veto() {
        debug!("deep sleep vetoed");
        sched.resume_all();
        hw.core().unmask_interrupts();
        return None;
    }
    hooks.pre_sleep_notify();
    Some(EntrySnapshot {
        timer_count,
        free_counter_us,
    })
}

/// Stop the tick, arm the RTC alarm and put every domain into retention
///
/// Everything short of cutting the rail, which the caller does once the
/// returned cycle is stored.
///
/// # Errors
///
/// Returns a fault when the RTC sample handshake gives up.
pub fn power_down<H>(
    hw: &mut H,
    config: &SleepConfig,
    idle_ticks: u32,
    entry: EntrySnapshot,
) -> HandshakeResult<SleepCycle>
where
    H: HardwareRegisters,
{
    hw.timer().disable();
    let max_ticks = config.max_deep_sleep_ticks();
    let request = SleepRequest::new(idle_ticks, entry.timer_count).clamped(max_ticks);
    if idle_ticks > max_ticks {
        debug!("deep sleep clamped {} -> {} ticks", idle_ticks, max_ticks);
    }
    let requested_ticks = request.requested_idle_ticks;
    let consumed_counts =
        (config.counts_per_tick() - 1).saturating_sub(request.timer_count_at_entry);
    let carried_phase_us = timer_counts_to_us(consumed_counts, config);

    hw.pmu().set_wake_timing_us(config.pmu_wake_timing_us);
    let lp_hz = hw.clocks().calibrated_lp_frequency_hz();

    let pre_arm_latency_us = hw.pmu().free_counter_us().wrapping_sub(entry.free_counter_us);
    let requested_us = u64::from(requested_ticks) * u64::from(config.tick_period_us());
    let budget_us = alarm_budget_us(
        requested_us,
        carried_phase_us,
        config.wake_latency_us,
        pre_arm_latency_us,
    );
    let wanted = us_to_lp_cycles(budget_us, lp_hz);
    if wanted > u64::from(MAX_ALARM_CYCLES) {
        debug!("alarm clamped {} -> {} cycles", wanted, MAX_ALARM_CYCLES);
    }
    let cycles = u32::try_from(wanted)
        .unwrap_or(MAX_ALARM_CYCLES)
        .clamp(MIN_ALARM_LEAD_CYCLES, MAX_ALARM_CYCLES);

    let rtc_before = sample_rtc(hw.rtc(), config.handshake, SampleStage::Arming)?;
    let alarm = rtc_before.wrapping_add(cycles);
    let rtc = hw.rtc();
    rtc.clear_alarm();
    rtc.set_alarm(alarm);
    rtc.enable_alarm();

    hw.trim().pre_sleep_stage();
    hw.clocks().flash_enter_low_power();
    hw.pmu().set_sleep_status(SleepStatus::DeepSleep);
    let context = hw.core().save_wake_context();

    debug!(
        "deep sleep {} ticks: {} cycles @ {}Hz, carried {}us",
        requested_ticks, cycles, lp_hz, carried_phase_us
    );

    Ok(SleepCycle {
        requested_ticks,
        rtc_before,
        alarm,
        lp_hz,
        carried_phase_us,
        pre_arm_latency_us,
        context,
    })
}

/// Bring the core domains back, in the only order that works
///
/// Clocks first so registers respond, then the flash controller so code
/// can be fetched again, then the core registers, then the rail trim.
pub fn wake<H: HardwareRegisters>(hw: &mut H, cycle: &SleepCycle) {
    let clocks = hw.clocks();
    clocks.enable_min_clocks();
    clocks.flash_exit_low_power_and_reinit();
    hw.core().restore_wake_context(&cycle.context);
    hw.trim().post_wake_stage();
    hw.pmu().set_sleep_status(SleepStatus::Normal);
}

/// Measure the sleep on the RTC and convert it to ticks
///
/// The RTC is the only clock that ran, so this is used whatever woke the
/// core.
///
/// # Errors
///
/// Returns a fault when the RTC sample handshake gives up.
pub fn reconcile<H: HardwareRegisters>(
    hw: &mut H,
    config: &SleepConfig,
    cycle: &SleepCycle,
) -> HandshakeResult<ElapsedTime> {
    let rtc = hw.rtc();
    let fired = rtc.alarm_fired();
    rtc.disable_alarm();
    rtc.clear_alarm();
    let rtc_after = sample_rtc(rtc, config.handshake, SampleStage::Reconciling)?;

    let slept_cycles = rtc_after.wrapping_sub(cycle.rtc_before);
    let total_us = lp_cycles_to_us(slept_cycles, cycle.lp_hz)
        + u64::from(cycle.carried_phase_us)
        + u64::from(cycle.pre_arm_latency_us);
    let source = if fired {
        WakeSource::RtcAlarm
    } else {
        WakeSource::OtherInterrupt
    };

    Ok(split_elapsed(
        total_us,
        config.tick_period_us(),
        cycle.requested_ticks,
        source,
    ))
}

/// Restart the tick in phase, step the scheduler and reopen interrupts
pub fn activate<H, S, K>(
    hw: &mut H,
    config: &SleepConfig,
    sched: &mut S,
    hooks: &mut K,
    elapsed: &ElapsedTime,
) where
    H: HardwareRegisters,
    S: Scheduler,
    K: SleepHooks,
{
    let counts = config.counts_per_tick();
    let phase_counts = us_to_timer_counts(elapsed.phase_remainder_us, config).min(counts - 1);

    let timer = hw.timer();
    timer.set_reload((counts - 1 - phase_counts).max(1));
    timer.reset_current();
    timer.enable();
    sched.advance_ticks(elapsed.whole_ticks);
    timer.set_reload(counts - 1);

    hooks.post_wake_notify_immediate();
    hw.core().unmask_interrupts();
    sched.resume_all();
    hooks.post_wake_notify_deferred();
}
