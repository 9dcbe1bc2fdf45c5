//! Clock and Flash Resume Port
//!
//! After the core rail comes back, only the always-on domain is configured.
//! Register access needs a minimal set of clock gates, and the QSPI flash
//! controller needs a full re-init before code can be fetched from flash.

/// Clock gating, external flash low-power control, LP oscillator calibration
pub trait ClockResume {
    /// Enable the clock gates needed for register access (SoC fabric, misc, APB)
    fn enable_min_clocks(&mut self);

    /// Put the external flash into deep power-down
    fn flash_enter_low_power(&mut self);

    /// Re-init the QSPI controller and bring the flash out of power-down
    ///
    /// On silicon the implementation must run from RAM: the flash it
    /// reinitializes is not readable until this returns.
    fn flash_exit_low_power_and_reinit(&mut self);

    /// Calibrated low-power oscillator frequency in Hz
    fn calibrated_lp_frequency_hz(&mut self) -> u32;
}
