//! Core Control Port
//!
//! Interrupt masking, wait-for-interrupt and the handful of System Control
//! Block registers that do not survive a core power-down.

/// Core registers lost across a core-rail cut
///
/// Captured right before the cut and written back exactly once on wake.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SavedWakeContext {
    /// Vector table offset (SCB VTOR)
    pub vector_table: u32,
    /// System handler priorities for PendSV and SysTick (SCB SHPR3)
    pub handler_priorities: u32,
}

#[cfg(feature = "embedded")]
impl defmt::Format for SavedWakeContext {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "WakeCtx(vtor={=u32:#x}, shpr3={=u32:#x})",
            self.vector_table,
            self.handler_priorities
        );
    }
}

/// CPU-level controls used by the idle hook
pub trait CoreControl {
    /// Globally mask interrupts (PRIMASK) and synchronize
    fn mask_interrupts(&mut self);

    /// Unmask interrupts
    fn unmask_interrupts(&mut self);

    /// Halt until an interrupt is pending
    ///
    /// Returns with interrupts still masked; a pending interrupt wakes the
    /// core even when PRIMASK is set.
    fn wait_for_interrupt(&mut self);

    /// Capture the registers lost across deep sleep
    fn save_wake_context(&mut self) -> SavedWakeContext;

    /// Write back registers captured by [`CoreControl::save_wake_context`]
    fn restore_wake_context(&mut self, context: &SavedWakeContext);
}

#[cfg(feature = "embedded")]
pub use self::cortex::CortexM;

#[cfg(feature = "embedded")]
#[allow(unsafe_code)]
mod cortex {
    use super::{CoreControl, SavedWakeContext};
    use cortex_m::asm;

    const SCB_VTOR: *mut u32 = 0xE000_ED08 as *mut u32;
    const SCB_SHPR3: *mut u32 = 0xE000_ED20 as *mut u32;

    /// Cortex-M33 core
    pub struct CortexM {
        _private: (),
    }

    impl CortexM {
        /// Create the core handle
        #[must_use]
        pub const fn new() -> Self {
            Self { _private: () }
        }
    }

    impl Default for CortexM {
        fn default() -> Self {
            Self::new()
        }
    }

    impl CoreControl for CortexM {
        fn mask_interrupts(&mut self) {
            cortex_m::interrupt::disable();
            asm::dsb();
            asm::isb();
        }

        fn unmask_interrupts(&mut self) {
            // SAFETY: only called by the idle hook to close its own masked
            // section, never from inside a critical section it does not own.
            unsafe { cortex_m::interrupt::enable() };
        }

        fn wait_for_interrupt(&mut self) {
            asm::dsb();
            asm::wfi();
            asm::isb();
        }

        fn save_wake_context(&mut self) -> SavedWakeContext {
            // SAFETY: architecturally defined, always-mapped SCB registers.
            unsafe {
                SavedWakeContext {
                    vector_table: core::ptr::read_volatile(SCB_VTOR),
                    handler_priorities: core::ptr::read_volatile(SCB_SHPR3),
                }
            }
        }

        fn restore_wake_context(&mut self, context: &SavedWakeContext) {
            // SAFETY: as above; values were read from the same registers.
            unsafe {
                core::ptr::write_volatile(SCB_VTOR, context.vector_table);
                core::ptr::write_volatile(SCB_SHPR3, context.handler_priorities);
            }
            asm::dsb();
            asm::isb();
        }
    }
}
