//! Light-Sleep Path
//!
//! Tickless WFI. The tick timer is reprogrammed to fire at the end of the
//! idle period instead of every tick, the core halts, and on wake the
//! ticks that actually passed are stepped into the scheduler.
//!
//! Called with interrupts masked. The caller unmasks afterwards.

use super::reconcile::timer_counts_to_us;
use crate::config::SleepConfig;
use crate::hal::{CoreControl, HardwareRegisters, TickTimer};
use crate::scheduler::Scheduler;
use crate::types::{ElapsedTime, SleepRequest, WakeSource};

/// Suppress up to `idle_ticks` ticks and halt until an interrupt
pub fn sleep<H, S>(hw: &mut H, sched: &mut S, config: &SleepConfig, idle_ticks: u32) -> ElapsedTime
where
    H: HardwareRegisters,
    S: Scheduler,
{
    let counts = config.counts_per_tick();
    let max_ticks = config.max_suppressed_ticks();
    if idle_ticks > max_ticks {
        debug!("light sleep clamped {} -> {} ticks", idle_ticks, max_ticks);
    }

    let timer = hw.timer();
    timer.disable();
    let request = SleepRequest::new(idle_ticks, timer.read_current()).clamped(max_ticks);
    let ticks = request.requested_idle_ticks.max(1);
    let current = request.timer_count_at_entry;

    let mut reload = current.wrapping_add(counts * (ticks - 1));
    if reload > config.stopped_timer_compensation {
        reload -= config.stopped_timer_compensation;
    }
    timer.set_reload(reload);
    timer.reset_current();
    timer.enable();

    hw.core().wait_for_interrupt();

    let timer = hw.timer();
    // Plain write: reading CTRL first would clear COUNTFLAG
    timer.disable();

    let (complete, next_reload, phase_counts, wake_source) = if timer.count_flag() {
        // Expired and reloaded; only the tail of this tick is left
        let remaining = reload.wrapping_sub(timer.read_current());
        let mut next = (counts - 1).wrapping_sub(remaining);
        if next <= config.stopped_timer_compensation || next > counts {
            next = counts - 1;
        }
        (ticks - 1, next, counts - 1 - next.min(counts - 1), WakeSource::TickTimer)
    } else {
        let completed = (ticks * counts).saturating_sub(timer.read_current());
        let complete = completed / counts;
        let into_tick = completed - complete * counts;
        (complete, counts - into_tick, into_tick, WakeSource::OtherInterrupt)
    };

    timer.set_reload(next_reload);
    timer.reset_current();
    timer.enable();
    sched.advance_ticks(complete);
    timer.set_reload(counts - 1);

    ElapsedTime::new(complete, timer_counts_to_us(phase_counts, config), wake_source)
}
