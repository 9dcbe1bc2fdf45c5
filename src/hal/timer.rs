//! Tick Timer Port
//!
//! The periodic timer that drives the RTOS tick. On FR30xx this is the
//! Cortex-M SysTick: a 24-bit down-counter that raises COUNTFLAG when it
//! reaches zero and reloads from the reload register on the next clock.

/// Periodic tick timer
pub trait TickTimer {
    /// Write the reload register
    fn set_reload(&mut self, value: u32);

    /// Read the current down-counter value
    fn read_current(&mut self) -> u32;

    /// Zero the current value (also clears the count flag)
    fn reset_current(&mut self);

    /// Start counting with the tick interrupt enabled
    fn enable(&mut self);

    /// Stop counting
    ///
    /// Must be a plain register write, never read-modify-write: reading the
    /// control register clears a pending count flag.
    fn disable(&mut self);

    /// Whether the counter reached zero since the flag was last read
    fn count_flag(&mut self) -> bool;
}

#[cfg(feature = "embedded")]
pub use self::systick::SysTickTimer;

#[cfg(feature = "embedded")]
#[allow(unsafe_code)]
mod systick {
    use super::TickTimer;
    use cortex_m::peripheral::SYST;

    const CSR_ENABLE: u32 = 1 << 0;
    const CSR_TICKINT: u32 = 1 << 1;
    const CSR_CLKSOURCE: u32 = 1 << 2;
    const CSR_COUNTFLAG: u32 = 1 << 16;

    /// SysTick driven from the core clock
    pub struct SysTickTimer {
        syst: SYST,
    }

    impl SysTickTimer {
        /// Take ownership of the SysTick peripheral
        #[must_use]
        pub fn new(syst: SYST) -> Self {
            Self { syst }
        }

        /// Give the peripheral back
        #[must_use]
        pub fn free(self) -> SYST {
            self.syst
        }
    }

    impl TickTimer for SysTickTimer {
        fn set_reload(&mut self, value: u32) {
            self.syst.set_reload(value);
        }

        fn read_current(&mut self) -> u32 {
            self.syst.cvr.read()
        }

        fn reset_current(&mut self) {
            self.syst.clear_current();
        }

        fn enable(&mut self) {
            // SAFETY: SYST is owned; the write only touches SysTick control.
            unsafe {
                self.syst
                    .csr
                    .write(CSR_CLKSOURCE | CSR_TICKINT | CSR_ENABLE);
            }
        }

        fn disable(&mut self) {
            // SAFETY: as above. No read first, COUNTFLAG must survive.
            unsafe { self.syst.csr.write(CSR_CLKSOURCE | CSR_TICKINT) };
        }

        fn count_flag(&mut self) -> bool {
            self.syst.csr.read() & CSR_COUNTFLAG != 0
        }
    }
}
