//! Clock sources feeding the PCM clock generator.
//!
//! The general-purpose clock generator that drives the PCM bit clock can
//! select one of eight inputs through its 4-bit `SRC` field. Only two of
//! them are usable on this board configuration:
//!
//! ```text
//! SRC  source      nominal       usable
//! ---  ----------  ------------  ------
//!  0   GND         0             no
//!  1   oscillator  19.2 MHz      yes   integer division only when exact
//!  2   testdebug0  0             no
//!  3   testdebug1  0             no
//!  4   PLLA        0             no    (owned by another subsystem)
//!  5   PLLC        0             no    (core clock, varies with scaling)
//!  6   PLLD        500 MHz       yes   preferred for fractional (MASH) mode
//!  7   HDMI aux    0             no
//! ```
//!
//! Unusable sources report a frequency of 0 and must never be selected.

/// Crystal oscillator frequency (Hz).
pub const OSCILLATOR_HZ: u32 = 19_200_000;

/// PLLD tap frequency (Hz).
pub const PLLD_HZ: u32 = 500_000_000;

/// Inputs of the PCM clock generator, in `SRC` field order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockSource {
    /// Tied to ground.
    Ground,
    /// 19.2 MHz crystal oscillator.
    Oscillator,
    /// Test/debug input 0.
    Debug0,
    /// Test/debug input 1.
    Debug1,
    /// PLLA tap.
    PllA,
    /// PLLC tap.
    PllC,
    /// PLLD tap (500 MHz).
    PllD,
    /// HDMI auxiliary clock.
    Hdmi,
}

impl ClockSource {
    /// Every source, in `SRC` field order.
    pub const ALL: [ClockSource; 8] = [
        ClockSource::Ground,
        ClockSource::Oscillator,
        ClockSource::Debug0,
        ClockSource::Debug1,
        ClockSource::PllA,
        ClockSource::PllC,
        ClockSource::PllD,
        ClockSource::Hdmi,
    ];

    /// Value of the clock-control `SRC` field selecting this source.
    #[must_use]
    pub const fn code(self) -> u32 {
        match self {
            Self::Ground => 0,
            Self::Oscillator => 1,
            Self::Debug0 => 2,
            Self::Debug1 => 3,
            Self::PllA => 4,
            Self::PllC => 5,
            Self::PllD => 6,
            Self::Hdmi => 7,
        }
    }

    /// Decode a `SRC` field value.
    #[must_use]
    pub const fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::Ground),
            1 => Some(Self::Oscillator),
            2 => Some(Self::Debug0),
            3 => Some(Self::Debug1),
            4 => Some(Self::PllA),
            5 => Some(Self::PllC),
            6 => Some(Self::PllD),
            7 => Some(Self::Hdmi),
            _ => None,
        }
    }

    /// Nominal frequency in Hz; 0 for sources that cannot be used.
    #[must_use]
    pub const fn frequency_hz(self) -> u32 {
        match self {
            Self::Oscillator => OSCILLATOR_HZ,
            Self::PllD => PLLD_HZ,
            Self::Ground
            | Self::Debug0
            | Self::Debug1
            | Self::PllA
            | Self::PllC
            | Self::Hdmi => 0,
        }
    }

    /// Returns `true` if the source has a known, non-zero frequency.
    #[must_use]
    pub const fn is_usable(self) -> bool {
        self.frequency_hz() != 0
    }

    /// Returns `true` for the PLL taps.
    #[must_use]
    pub const fn is_pll(self) -> bool {
        matches!(self, Self::PllA | Self::PllC | Self::PllD)
    }

    /// The usable PLL tap with the highest frequency.
    #[must_use]
    pub fn fastest_pll() -> Option<Self> {
        Self::ALL
            .into_iter()
            .filter(|source| source.is_pll() && source.is_usable())
            .max_by_key(|source| source.frequency_hz())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
