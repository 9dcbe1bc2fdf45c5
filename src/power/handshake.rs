//! Register Handshakes
//!
//! PMU registers sit behind a slow always-on bus. Several operations set a
//! request bit and spin until hardware clears it. Production firmware spins
//! forever: a stuck handshake means the device is wedged and the watchdog
//! owns recovery. Host tests and bring-up builds bound the spin instead and
//! surface a [`Fault`].

use crate::hal::RtcCounter;

/// How long a handshake may spin
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum HandshakePolicy {
    /// Spin until hardware answers
    #[default]
    Unbounded,
    /// Give up after this many polls that all read busy (at least one)
    Bounded {
        /// Poll budget
        max_polls: u32,
    },
}

#[cfg(feature = "embedded")]
impl defmt::Format for HandshakePolicy {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Unbounded => defmt::write!(f, "unbounded"),
            Self::Bounded { max_polls } => defmt::write!(f, "bounded({})", max_polls),
        }
    }
}

/// Where in the sleep cycle a sample was taken
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SampleStage {
    /// Reading the start counter before arming the alarm
    Arming,
    /// Reading the end counter after wake
    Reconciling,
}

/// Unrecoverable hardware fault
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fault {
    /// The RTC sample bit never cleared
    RtcSampleStuck(SampleStage),
}

#[cfg(feature = "embedded")]
impl defmt::Format for Fault {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::RtcSampleStuck(SampleStage::Arming) => {
                defmt::write!(f, "RTC sample stuck (arming)");
            }
            Self::RtcSampleStuck(SampleStage::Reconciling) => {
                defmt::write!(f, "RTC sample stuck (reconciling)");
            }
        }
    }
}

/// Handshake result
pub type HandshakeResult<T> = Result<T, Fault>;

/// Spin while `busy` reports true
///
/// # Errors
///
/// Returns `fault` when a bounded budget runs out.
pub fn wait_while<F>(policy: HandshakePolicy, fault: Fault, mut busy: F) -> HandshakeResult<()>
where
    F: FnMut() -> bool,
{
    match policy {
        HandshakePolicy::Unbounded => {
            while busy() {
                core::hint::spin_loop();
            }
            Ok(())
        }
        HandshakePolicy::Bounded { max_polls } => {
            for _ in 0..max_polls.max(1) {
                if !busy() {
                    return Ok(());
                }
                core::hint::spin_loop();
            }
            error!("handshake budget of {} polls exhausted", max_polls);
            Err(fault)
        }
    }
}

/// Latch and read the RTC counter
///
/// # Errors
///
/// Returns [`Fault::RtcSampleStuck`] when a bounded policy gives up.
pub fn sample_rtc<R: RtcCounter>(
    rtc: &mut R,
    policy: HandshakePolicy,
    stage: SampleStage,
) -> HandshakeResult<u32> {
    rtc.start_sample();
    wait_while(policy, Fault::RtcSampleStuck(stage), || rtc.sample_in_progress())?;
    Ok(rtc.sampled_counter())
}
