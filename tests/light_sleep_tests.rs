//! Light-Sleep Path Tests
//!
//! Tests for tickless WFI: timer reprogramming, wake classification and
//! tick stepping, run against the SysTick model in the fake hardware.
//! Run with: cargo test --target x86_64-unknown-linux-gnu --no-default-features --features std --test light_sleep_tests

use fr30xx_lowpower::config::SleepConfig;
use fr30xx_lowpower::fake::{FakeEvent, FakeHardware, FakeScheduler, FAKE_ISR_LATENCY};
use fr30xx_lowpower::power::light;
use fr30xx_lowpower::types::WakeSource;

const COUNTS: u32 = 24_000;

fn setup() -> (SleepConfig, FakeHardware, FakeScheduler) {
    let config = SleepConfig::new();
    let hw = FakeHardware::new(&config);
    (config, hw, FakeScheduler::new())
}

// =============================================================================
// Reload Programming Tests
// =============================================================================

#[test]
fn reload_spans_idle_minus_compensation() {
    let (config, mut hw, mut sched) = setup();
    light::sleep(&mut hw, &mut sched, &config, 3);

    // current (23999) + 2 full periods - 94
    assert_eq!(hw.log[1], FakeEvent::TimerReload(23_999 + 2 * COUNTS - 94));
}

#[test]
fn timer_stopped_before_reprogramming() {
    let (config, mut hw, mut sched) = setup();
    light::sleep(&mut hw, &mut sched, &config, 3);

    let wfi = hw.position(FakeEvent::WaitForInterrupt).unwrap();
    assert_eq!(hw.log[0], FakeEvent::TimerDisable);
    assert_eq!(hw.log[2], FakeEvent::TimerReset);
    assert_eq!(hw.log[3], FakeEvent::TimerEnable);
    assert_eq!(wfi, 4);
    assert_eq!(hw.log[wfi + 1], FakeEvent::TimerDisable);
}

#[test]
fn standard_reload_restored() {
    let (config, mut hw, mut sched) = setup();
    light::sleep(&mut hw, &mut sched, &config, 5);

    assert_eq!(hw.log.last(), Some(&FakeEvent::TimerReload(COUNTS - 1)));
    assert_eq!(hw.timer.reload, COUNTS - 1);
    assert!(hw.timer.enabled);
}

#[test]
fn clamped_to_reload_range() {
    let (config, mut hw, mut sched) = setup();
    let elapsed = light::sleep(&mut hw, &mut sched, &config, 10_000);

    assert_eq!(hw.log[1], FakeEvent::TimerReload(23_999 + 698 * COUNTS - 94));
    assert_eq!(elapsed.whole_ticks, 698);
    assert!(u64::from(elapsed.whole_ticks) <= u64::from(config.max_suppressed_ticks()));
}

// =============================================================================
// Full-Period Wake Tests
// =============================================================================

#[test]
fn full_period_steps_all_but_pending_tick() {
    let (config, mut hw, mut sched) = setup();
    let elapsed = light::sleep(&mut hw, &mut sched, &config, 3);

    assert_eq!(elapsed.wake_source, WakeSource::TickTimer);
    assert_eq!(elapsed.whole_ticks, 2);
    assert_eq!(sched.tick_count, 2);
}

#[test]
fn full_period_reloads_rest_of_tick() {
    let (config, mut hw, mut sched) = setup();
    light::sleep(&mut hw, &mut sched, &config, 3);

    // ISR latency (plus the reload clock) already ran into the next tick
    let expected = COUNTS - 1 - (FAKE_ISR_LATENCY - 1);
    assert!(hw.logged(FakeEvent::TimerReload(expected)));
}

#[test]
fn single_tick_sleep_steps_nothing() {
    let (config, mut hw, mut sched) = setup();
    let elapsed = light::sleep(&mut hw, &mut sched, &config, 1);

    assert_eq!(elapsed.whole_ticks, 0);
    assert_eq!(sched.tick_count, 0);
    assert_eq!(hw.log[1], FakeEvent::TimerReload(23_999 - 94));
}

// =============================================================================
// Early Wake Tests
// =============================================================================

#[test]
fn early_wake_counts_completed_ticks() {
    let (config, mut hw, mut sched) = setup();
    hw.wfi_wake_after = Some(30_000);
    let elapsed = light::sleep(&mut hw, &mut sched, &config, 3);

    assert_eq!(elapsed.wake_source, WakeSource::OtherInterrupt);
    assert_eq!(elapsed.whole_ticks, 1);
    assert_eq!(sched.tick_count, 1);
}

#[test]
fn early_wake_reloads_fraction() {
    let (config, mut hw, mut sched) = setup();
    hw.wfi_wake_after = Some(30_000);
    let elapsed = light::sleep(&mut hw, &mut sched, &config, 3);

    // Counter left at 71905 - 29999; completed = 72000 - 41906 = 30094
    assert!(hw.logged(FakeEvent::TimerReload(2 * COUNTS - 30_094)));
    assert_eq!(elapsed.phase_remainder_us, 6_094 * 1_000 / COUNTS);
}

#[test]
fn early_wake_within_first_tick() {
    let (config, mut hw, mut sched) = setup();
    hw.wfi_wake_after = Some(1_000);
    let elapsed = light::sleep(&mut hw, &mut sched, &config, 50);

    assert_eq!(elapsed.whole_ticks, 0);
    assert_eq!(sched.tick_count, 0);
}

// =============================================================================
// Property Tests
// =============================================================================

#[test]
fn never_steps_more_than_requested() {
    for ticks in [1_u32, 2, 3, 7, 50, 200, 699] {
        for wake in [None, Some(500), Some(COUNTS * 2 + 17), Some(COUNTS * 100)] {
            let (config, mut hw, mut sched) = setup();
            hw.wfi_wake_after = wake;
            let elapsed = light::sleep(&mut hw, &mut sched, &config, ticks);
            assert!(
                elapsed.whole_ticks <= ticks,
                "{} ticks, wake {:?}: stepped {}",
                ticks,
                wake,
                elapsed.whole_ticks
            );
        }
    }
}

#[test]
fn accounted_time_matches_slept_time() {
    // Completed periods plus the part of the current one stay within one
    // tick of the clocks that actually ran
    for clocks in [1_000_u32, 23_999, 24_001, 50_000, 99_999, 150_000] {
        let (config, mut hw, mut sched) = setup();
        hw.wfi_wake_after = Some(clocks);
        let elapsed = light::sleep(&mut hw, &mut sched, &config, 10);

        let accounted = u64::from(elapsed.whole_ticks) * u64::from(COUNTS)
            + u64::from(elapsed.phase_remainder_us) * u64::from(COUNTS) / 1_000;
        let actual = u64::from(clocks);
        assert!(
            accounted.abs_diff(actual) < u64::from(COUNTS),
            "{} clocks accounted as {}",
            clocks,
            accounted
        );
    }
}

#[test]
fn tick_count_monotonic_across_sleeps() {
    let (config, mut hw, mut sched) = setup();
    let mut last = sched.tick_count;
    for i in 0..40_u32 {
        hw.wfi_wake_after = if i % 3 == 0 { None } else { Some(i * 3_517) };
        light::sleep(&mut hw, &mut sched, &config, 1 + i % 9);
        assert!(sched.tick_count >= last);
        last = sched.tick_count;
    }
    assert!(sched.steps.iter().all(|&step| step <= 9));
}
