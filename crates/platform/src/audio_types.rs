//! Audio domain newtypes for compile-time safety.
//!
//! These zero-cost abstractions prevent common errors:
//! - `SampleRateHz`: validates the 8000–384000 Hz range of the serial port
//! - `SampleWidth`: the three PCM sample widths the frame encoder knows
//! - `Direction`: playback vs. capture, instead of a bare bool

// ── Error type ───────────────────────────────────────────────────────────────

/// Error returned when a value is out of the valid range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OutOfRangeError {
    /// The value that was out of range.
    pub value: u32,
    /// The inclusive minimum allowed value.
    pub min: u32,
    /// The inclusive maximum allowed value.
    pub max: u32,
}

// ── SampleRateHz ─────────────────────────────────────────────────────────────

/// Sample rate in Hz, validated to the range the serial port can clock.
///
/// Valid range: 8000–384000 Hz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct SampleRateHz(u32);

impl SampleRateHz {
    /// Minimum supported sample rate: 8000 Hz (telephony).
    pub const MIN_HZ: u32 = 8_000;

    /// Maximum supported sample rate: 384000 Hz.
    pub const MAX_HZ: u32 = 384_000;

    /// Create a `SampleRateHz`, returning an error if out of 8000–384000 Hz.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRangeError`] if `hz < 8000` or `hz > 384000`.
    pub fn new(hz: u32) -> Result<Self, OutOfRangeError> {
        if hz < Self::MIN_HZ || hz > Self::MAX_HZ {
            Err(OutOfRangeError {
                value: hz,
                min: Self::MIN_HZ,
                max: Self::MAX_HZ,
            })
        } else {
            Ok(Self(hz))
        }
    }

    /// Return the sample rate in Hz.
    #[must_use]
    pub fn get(self) -> u32 {
        self.0
    }
}

// ── SampleWidth ──────────────────────────────────────────────────────────────

/// Little-endian signed PCM sample widths carried on the serial link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SampleWidth {
    /// 16-bit samples (two per 32-bit FIFO word in packed mode).
    S16,
    /// 24-bit samples in a 32-bit container.
    S24,
    /// 32-bit samples.
    S32,
}

impl SampleWidth {
    /// Every supported width, narrowest first.
    pub const ALL: [SampleWidth; 3] = [SampleWidth::S16, SampleWidth::S24, SampleWidth::S32];

    /// Number of significant bits per sample.
    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            Self::S16 => 16,
            Self::S24 => 24,
            Self::S32 => 32,
        }
    }

    /// Map a bit count back to a width, if supported.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            16 => Some(Self::S16),
            24 => Some(Self::S24),
            32 => Some(Self::S32),
            _ => None,
        }
    }
}

// ── Direction ────────────────────────────────────────────────────────────────

/// Stream direction through the serial port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Memory → codec (transmit path).
    Playback,
    /// Codec → memory (receive path).
    Capture,
}

impl Direction {
    /// The other direction sharing the same register block.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Playback => Self::Capture,
            Self::Capture => Self::Playback,
        }
    }
}
