//! Power Management Tests
//!
//! Tests for the idle hook as a whole: abort handling, sleep depth
//! selection, state transitions and the diagnostic counters.
//! Run with: cargo test --target x86_64-unknown-linux-gnu --no-default-features --features std --test power_tests

use fr30xx_lowpower::config::{ConfigError, SleepConfig, HISTORY_DEPTH};
use fr30xx_lowpower::fake::{fake_resume_entry, FakeEvent, FakeHardware, FakeScheduler, ScriptedHooks};
use fr30xx_lowpower::power::{NoHooks, PowerManager, PreventSleep};
use fr30xx_lowpower::types::{IdleOutcome, PowerState, SleepMode, WakeSource};

fn manager(gate: &PreventSleep) -> PowerManager<'_, FakeHardware> {
    let config = SleepConfig::new();
    PowerManager::new(FakeHardware::new(&config), config, gate, fake_resume_entry).unwrap()
}

// =============================================================================
// Construction Tests
// =============================================================================

#[test]
fn new_manager_is_active() {
    let gate = PreventSleep::new();
    let pm = manager(&gate);
    assert_eq!(pm.state(), PowerState::Active);
    assert_eq!(pm.stats().light_sleeps, 0);
    assert_eq!(pm.history().len(), 0);
    assert!(pm.pending_cycle().is_none());
}

#[test]
fn invalid_config_rejected() {
    let gate = PreventSleep::new();
    let config = SleepConfig::new().with_tick_rate_hz(0);
    let result = PowerManager::new(
        FakeHardware::new(&SleepConfig::new()),
        config,
        &gate,
        fake_resume_entry,
    );
    assert_eq!(result.err(), Some(ConfigError::ZeroTickRate));
}

// =============================================================================
// Abort Tests
// =============================================================================

#[test]
fn abort_leaves_hardware_untouched() {
    let gate = PreventSleep::new();
    let mut pm = manager(&gate);
    let timer_before = pm.hardware().timer;
    let mut sched = FakeScheduler::new();
    sched.abort = true;
    let mut hooks = ScriptedHooks::new();

    let outcome = pm.suppress_ticks_and_sleep(&mut sched, &mut hooks, 500);

    assert_eq!(outcome, IdleOutcome::Aborted);
    let hw = pm.hardware();
    assert_eq!(
        hw.log.as_slice(),
        &[FakeEvent::MaskInterrupts, FakeEvent::UnmaskInterrupts]
    );
    assert_eq!(hw.timer, timer_before);
    assert!(hooks.calls.is_empty());
    assert_eq!(sched.tick_count, 0);
    assert_eq!(pm.stats().aborts, 1);
}

#[test]
fn abort_is_not_a_sleep() {
    let outcome: IdleOutcome<()> = IdleOutcome::Aborted;
    assert!(!outcome.slept());
    assert!(!IdleOutcome::<()>::Vetoed.slept());
    assert!(IdleOutcome::Retained(()).slept());
}

// =============================================================================
// Policy Scenario Tests
// =============================================================================

#[test]
fn two_ticks_sleeps_light() {
    let gate = PreventSleep::new();
    let mut pm = manager(&gate);
    let mut sched = FakeScheduler::new();

    let outcome = pm.suppress_ticks_and_sleep(&mut sched, &mut NoHooks, 2);

    assert!(matches!(outcome, IdleOutcome::LightSlept(_)));
    let hw = pm.hardware();
    assert_eq!(hw.count(FakeEvent::is_deep_sleep_only), 0);
    assert!(hw.logged(FakeEvent::WaitForInterrupt));
    assert!(!hw.interrupts_masked);
    assert_eq!(pm.state(), PowerState::Active);
}

#[test]
fn held_gate_forces_light_for_long_idle() {
    let gate = PreventSleep::new();
    let mut pm = manager(&gate);
    let mut sched = FakeScheduler::new();
    gate.acquire();

    let outcome = pm.suppress_ticks_and_sleep(&mut sched, &mut NoHooks, 10_000);

    assert!(matches!(outcome, IdleOutcome::LightSlept(_)));
    assert_eq!(pm.hardware().count(FakeEvent::is_deep_sleep_only), 0);
    assert!(sched.tick_count <= 10_000);
    gate.release();
}

#[test]
fn guard_scope_controls_depth() {
    let gate = PreventSleep::new();
    let mut pm = manager(&gate);
    let mut sched = FakeScheduler::new();

    {
        let _guard = gate.hold();
        let outcome = pm.suppress_ticks_and_sleep(&mut sched, &mut NoHooks, 500);
        assert!(matches!(outcome, IdleOutcome::LightSlept(_)));
    }

    let outcome = pm.suppress_ticks_and_sleep(&mut sched, &mut NoHooks, 500);
    assert_eq!(outcome, IdleOutcome::Retained(()));
}

#[test]
fn application_predicate_forces_light() {
    let gate = PreventSleep::new();
    let mut pm = manager(&gate);
    let mut sched = FakeScheduler::new();
    let mut hooks = ScriptedHooks::new();
    hooks.allow_deep = false;

    let outcome = pm.suppress_ticks_and_sleep(&mut sched, &mut hooks, 500);

    assert!(matches!(outcome, IdleOutcome::LightSlept(_)));
    assert_eq!(pm.hardware().alarm, None);
}

#[test]
fn threshold_boundary() {
    let gate = PreventSleep::new();
    let mut pm = manager(&gate);
    let mut sched = FakeScheduler::new();

    let outcome = pm.suppress_ticks_and_sleep(&mut sched, &mut NoHooks, 4);
    assert!(matches!(outcome, IdleOutcome::LightSlept(_)));

    let outcome = pm.suppress_ticks_and_sleep(&mut sched, &mut NoHooks, 5);
    assert_eq!(outcome, IdleOutcome::Retained(()));
}

// =============================================================================
// Light Sleep Through the Manager
// =============================================================================

#[test]
fn light_sleep_reports_elapsed() {
    let gate = PreventSleep::new();
    let mut pm = manager(&gate);
    let mut sched = FakeScheduler::new();
    pm.hardware_mut().wfi_wake_after = Some(30_000);

    let IdleOutcome::LightSlept(elapsed) = pm.suppress_ticks_and_sleep(&mut sched, &mut NoHooks, 3)
    else {
        panic!("expected light sleep");
    };

    assert_eq!(elapsed.wake_source, WakeSource::OtherInterrupt);
    assert_eq!(elapsed.whole_ticks, 1);
    assert_eq!(sched.tick_count, 1);
}

#[test]
fn light_sleep_masks_for_whole_window() {
    let gate = PreventSleep::new();
    let mut pm = manager(&gate);
    pm.suppress_ticks_and_sleep(&mut FakeScheduler::new(), &mut NoHooks, 3);

    let hw = pm.hardware();
    let mask = hw.position(FakeEvent::MaskInterrupts).unwrap();
    let wfi = hw.position(FakeEvent::WaitForInterrupt).unwrap();
    let unmask = hw.position(FakeEvent::UnmaskInterrupts).unwrap();
    assert_eq!(mask, 0);
    assert!(mask < wfi && wfi < unmask);
    assert_eq!(unmask, hw.log.len() - 1);
}

#[test]
fn light_sleep_does_not_suspend_scheduler() {
    let gate = PreventSleep::new();
    let mut pm = manager(&gate);
    let mut sched = FakeScheduler::new();
    pm.suppress_ticks_and_sleep(&mut sched, &mut NoHooks, 3);
    assert_eq!(sched.max_suspend_depth, 0);
}

// =============================================================================
// Diagnostics Tests
// =============================================================================

#[test]
fn stats_count_each_outcome() {
    let gate = PreventSleep::new();
    let mut pm = manager(&gate);
    let mut sched = FakeScheduler::new();

    pm.suppress_ticks_and_sleep(&mut sched, &mut NoHooks, 3);
    pm.suppress_ticks_and_sleep(&mut sched, &mut ScriptedHooks::vetoing(), 500);
    pm.suppress_ticks_and_sleep(&mut sched, &mut NoHooks, 500);
    pm.resume(&mut sched, &mut NoHooks);
    sched.abort = true;
    pm.suppress_ticks_and_sleep(&mut sched, &mut NoHooks, 500);

    let stats = pm.stats();
    assert_eq!(stats.light_sleeps, 1);
    assert_eq!(stats.deep_sleeps, 1);
    assert_eq!(stats.vetoes, 1);
    assert_eq!(stats.aborts, 1);
    assert_eq!(stats.ticks_stepped, sched.tick_count);
    assert_eq!(stats.last_requested_ticks, 500);
}

#[test]
fn history_keeps_most_recent() {
    let gate = PreventSleep::new();
    let mut pm = manager(&gate);
    let mut sched = FakeScheduler::new();

    for ticks in 1..=(HISTORY_DEPTH as u32 + 3) {
        pm.suppress_ticks_and_sleep(&mut sched, &mut NoHooks, ticks.min(4));
    }

    let history = pm.history();
    assert_eq!(history.len(), HISTORY_DEPTH);
    assert!(history.oldest_ordered().all(|r| r.mode == SleepMode::Light));
    assert_eq!(history.recent().unwrap().requested_ticks, 4);
}

#[test]
fn mixed_sleeps_keep_tick_monotonic() {
    let gate = PreventSleep::new();
    let mut pm = manager(&gate);
    let mut sched = FakeScheduler::new();
    let mut last = 0;

    for i in 0..20_u32 {
        let ticks = if i % 3 == 0 { 2 + i } else { 40 + i * 11 };
        pm.hardware_mut().wfi_wake_after = Some(5_000 + i * 4_001);
        if i % 4 == 1 {
            pm.hardware_mut().deep_wake_after = Some(300 + i * 50);
        }
        if let IdleOutcome::Retained(()) = pm.suppress_ticks_and_sleep(&mut sched, &mut NoHooks, ticks) {
            pm.resume(&mut sched, &mut NoHooks).unwrap();
        }
        pm.hardware_mut().wfi_wake_after = None;
        assert!(sched.tick_count >= last);
        last = sched.tick_count;
        assert_eq!(pm.state(), PowerState::Active);
    }
}
