//! Sleep depth selection

use super::hooks::SleepHooks;
use crate::config::SleepConfig;
use crate::types::SleepMode;

/// Pick light or deep sleep for an idle period
///
/// Deep sleep needs all three: a period of at least the configured
/// threshold, no prevent-sleep holder, and the application's consent. The
/// application predicate is only consulted when the first two pass.
#[must_use]
pub fn choose<K: SleepHooks>(
    config: &SleepConfig,
    idle_ticks: u32,
    gate_held: bool,
    hooks: &mut K,
) -> SleepMode {
    let ms = config.ticks_to_ms(idle_ticks);
    let mode = if ms < u64::from(config.min_deep_sleep_ms) || gate_held || !hooks.deep_sleep_allowed()
    {
        SleepMode::Light
    } else {
        SleepMode::Deep
    };
    trace!("idle {} ticks ({} ms), held={} -> {}", idle_ticks, ms, gate_held, mode);
    mode
}
