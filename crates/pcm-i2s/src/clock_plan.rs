//! Bit-clock divider planning.
//!
//! The clock generator divides a source clock by `DIVI + DIVF/4096`. A
//! MASH noise-shaping stage dithers between adjacent integer divisors when
//! the fractional part is non-zero.
//!
//! # Source selection
//!
//! ```text
//! full master && OSC % target == 0  ->  OSC (19.2 MHz), integer divider, MASH off
//! otherwise                          ->  PLLD (500 MHz), fractional divider, MASH 1
//! ```
//!
//! # Worked example: 48 kHz, 16-bit
//!
//!   ratio  = 50 bit clocks per frame (2 x 25, one spare bit per half)
//!   target = 48 000 x 50 = 2 400 000 Hz
//!   19 200 000 % 2 400 000 = 0  ->  OSC / 8, exact
//!
//! # Worked example: 44.1 kHz, 32-bit
//!
//!   ratio  = 100, target = 4 410 000 Hz
//!   19 200 000 % 4 410 000 != 0  ->  PLLD
//!   dividend = (500 000 000 << 12) / 4 410 000 = 464 399
//!   DIVI = 113, DIVF = 1551
//!   output   = 500 000 000 x 4096 / 464 399 = 4 410 000.9 Hz  (0.2 ppm)

// Shifts are by the constant fraction width on u64 values below 2^41.
#![allow(clippy::arithmetic_side_effects)]

use platform::clock_config::OSCILLATOR_HZ;
use platform::{ClockSource, SampleRateHz, SampleWidth};

/// Fractional bits of the divider.
pub const DIVIDER_FRACTION_BITS: u32 = 12;

/// Largest value of either divider field.
pub const DIVIDER_FIELD_MAX: u32 = 0xfff;

/// Integer + fractional clock divider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockDivider {
    /// DIVI: whole part of the divisor.
    pub integer_part: u32,
    /// DIVF: fractional part in 1/4096 units.
    pub fractional_part: u32,
}

impl ClockDivider {
    /// Divisor in 1/4096 units.
    pub const fn scaled(self) -> u64 {
        ((self.integer_part as u64) << DIVIDER_FRACTION_BITS) | (self.fractional_part as u64)
    }

    /// True when the divisor is a whole number.
    pub const fn is_integer(self) -> bool {
        self.fractional_part == 0
    }

    /// Both parts fit their 12-bit register fields and the divisor is non-zero.
    pub const fn fits_register(self) -> bool {
        self.integer_part >= 1
            && self.integer_part <= DIVIDER_FIELD_MAX
            && self.fractional_part <= DIVIDER_FIELD_MAX
    }

    /// Output frequency for `source_hz`, truncated. `None` for a zero divisor.
    pub fn output_hz(self, source_hz: u32) -> Option<u32> {
        let numerator = u64::from(source_hz) << DIVIDER_FRACTION_BITS;
        let hz = numerator.checked_div(self.scaled())?;
        u32::try_from(hz).ok()
    }
}

/// MASH noise-shaping filter order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MashStage {
    /// Integer division only; DIVF ignored.
    Integer,
    /// First-order MASH.
    Stage1,
    /// Second-order MASH.
    Stage2,
    /// Third-order MASH.
    Stage3,
}

impl MashStage {
    /// MASH field encoding.
    pub const fn code(self) -> u32 {
        match self {
            Self::Integer => 0,
            Self::Stage1 => 1,
            Self::Stage2 => 2,
            Self::Stage3 => 3,
        }
    }

    /// Inverse of [`code`](Self::code).
    pub const fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::Integer),
            1 => Some(Self::Stage1),
            2 => Some(Self::Stage2),
            3 => Some(Self::Stage3),
            _ => None,
        }
    }
}

/// Default bit clocks per frame for `width` when the caller requested none.
///
/// 16- and 24-bit samples use 2 x 25 clocks, which leaves 19.2 MHz evenly
/// divisible at the common 8/16/32/48/96 kHz rates. 32-bit samples need at
/// least 2 x 32 and use 2 x 50.
pub const fn default_bclk_ratio(width: SampleWidth) -> u32 {
    match width {
        SampleWidth::S16 | SampleWidth::S24 => 50,
        SampleWidth::S32 => 100,
    }
}

/// Source, divider and MASH stage chosen for a target bit-clock frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockPlan {
    /// Selected clock source.
    pub source: ClockSource,
    /// Divider programmed into CLK_DIV.
    pub divider: ClockDivider,
    /// MASH stage programmed into CLK_CTL.
    pub mash: MashStage,
    /// Requested bit-clock frequency.
    pub target_hz: u32,
    /// Bit clocks per frame the plan was made for.
    pub bclk_ratio: u32,
}

impl ClockPlan {
    /// Plan a divider for `target_hz`.
    ///
    /// The oscillator is used only when the peripheral masters both bit
    /// clock and frame sync and the target divides 19.2 MHz exactly.
    /// Everything else goes through the fastest usable PLL with a
    /// fractional divider. Never fails; `target_hz` must be non-zero for
    /// the divider to be meaningful.
    pub fn plan(target_hz: u32, bclk_ratio: u32, full_master: bool) -> Self {
        let exact_oscillator = OSCILLATOR_HZ.checked_rem(target_hz) == Some(0);
        if full_master && exact_oscillator {
            let integer_part = OSCILLATOR_HZ.checked_div(target_hz).unwrap_or(0);
            return Self {
                source: ClockSource::Oscillator,
                divider: ClockDivider { integer_part, fractional_part: 0 },
                mash: MashStage::Integer,
                target_hz,
                bclk_ratio,
            };
        }

        let source = ClockSource::fastest_pll().unwrap_or(ClockSource::Oscillator);
        let dividend = (u64::from(source.frequency_hz()) << DIVIDER_FRACTION_BITS)
            .checked_div(u64::from(target_hz))
            .unwrap_or(0);
        let integer_part = u32::try_from(dividend >> DIVIDER_FRACTION_BITS).unwrap_or(u32::MAX);
        let fractional_part = u32::try_from(dividend & u64::from(DIVIDER_FIELD_MAX)).unwrap_or(0);

        Self {
            source,
            divider: ClockDivider { integer_part, fractional_part },
            mash: MashStage::Stage1,
            target_hz,
            bclk_ratio,
        }
    }

    /// Plan the bit clock for a stream.
    ///
    /// Uses `requested_ratio` when set, otherwise [`default_bclk_ratio`].
    /// When no ratio was requested and the default cannot be produced from
    /// the oscillator, the ratio shrinks to exactly `2 x width` so the
    /// fractional divider runs the slowest possible bit clock.
    pub fn for_stream(
        width: SampleWidth,
        rate: SampleRateHz,
        requested_ratio: Option<u32>,
        full_master: bool,
    ) -> Self {
        let ratio = requested_ratio.unwrap_or_else(|| default_bclk_ratio(width));
        let plan = Self::plan(rate.get().saturating_mul(ratio), ratio, full_master);
        if requested_ratio.is_some() || plan.is_exact() {
            return plan;
        }

        let tight = width.bits().saturating_mul(2);
        Self::plan(rate.get().saturating_mul(tight), tight, full_master)
    }

    /// True when the plan reproduces the target exactly (integer oscillator path).
    pub const fn is_exact(&self) -> bool {
        matches!(self.mash, MashStage::Integer)
    }

    /// Frequency the programmed divider actually produces.
    pub fn reconstructed_hz(&self) -> u32 {
        self.divider.output_hz(self.source.frequency_hz()).unwrap_or(0)
    }
}
