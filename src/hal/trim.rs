//! Power Trim Port

/// Two-stage voltage rail reconfiguration around deep sleep
///
/// The pre-sleep stage drops the core clock to COREH and lowers the digital
/// LDOs; the post-wake stage restores the values captured on the first
/// pre-sleep call.
pub trait PowerTrim {
    /// Reconfigure rails for retention
    fn pre_sleep_stage(&mut self);

    /// Restore run-mode rail settings
    fn post_wake_stage(&mut self);
}
