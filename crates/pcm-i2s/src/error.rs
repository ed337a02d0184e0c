//! Error and degraded-outcome types.
//!
//! Configuration errors abort the operation before any register is
//! written. Handshake timeouts are *degraded* outcomes: the operation
//! completes, the condition is logged, and the caller carries on.

use thiserror_no_std::Error;

/// Rejected stream configuration. Raised before any register mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Only two-channel (stereo) frames are supported.
    #[error("unsupported channel count {0}, only stereo frames are supported")]
    UnsupportedChannelCount(u32),
    /// Sample width outside {16, 24, 32}.
    #[error("unsupported sample width of {0} bits")]
    UnsupportedSampleWidth(u32),
    /// Frame protocol unset or other than standard I2S.
    #[error("unsupported frame format")]
    UnsupportedFrameFormat,
    /// Clock/frame master role unset.
    #[error("unsupported clock/frame master role")]
    UnsupportedMasterRole,
    /// Sample rate outside 8 kHz..=384 kHz.
    #[error("unsupported sample rate of {0} Hz")]
    UnsupportedSampleRate(u32),
    /// Bit clocks per frame outside what the frame-length field can hold.
    #[error("unsupported bit-clock ratio {0}")]
    UnsupportedBclkRatio(u32),
    /// Divider for the requested bit clock does not fit the 12-bit field.
    #[error("bit clock of {0} Hz cannot be synthesised")]
    UnreachableBitClock(u32),
}

/// The FIFO sync flag never reflected the toggle within the poll budget.
///
/// Known to happen when the bit clock is driven externally and absent. The
/// FIFOs are left in a best-effort cleared state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[error("FIFO sync flag did not toggle within {attempts} polls")]
pub struct SyncTimeout {
    /// Polls performed before giving up.
    pub attempts: u32,
}

/// The clock generator stayed busy after being disabled and was killed.
///
/// The clock is guaranteed stopped when this is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[error("clock generator still busy after {attempts} polls, killed")]
pub struct ClockStopTimeout {
    /// Polls performed before the kill.
    pub attempts: u32,
}

/// Error returned by [`StreamController`](crate::controller::StreamController)
/// operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum I2sError<E> {
    /// Stream configuration was rejected; nothing was written.
    #[error("invalid stream configuration: {0}")]
    Config(#[from] ConfigError),
    /// The register transport failed.
    #[error("register transport error: {0:?}")]
    Bus(E),
}
