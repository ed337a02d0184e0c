//! Routing of the four PCM signals (CLK, FS, DIN, DOUT) to GPIO pins.
//!
//! The signals come out on four consecutive pins. Boards with the 40-pin
//! header expose them on GPIO18..21 (ALT0); the earlier 26-pin boards on
//! GPIO28..31 (ALT2).

use platform::{PinFunction, PinMux};

/// Number of PCM signals.
pub const PCM_PIN_COUNT: u8 = 4;

/// Which GPIO bank carries the PCM signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinLayout {
    /// Choose from the board revision.
    #[default]
    Auto,
    /// GPIO18..21, ALT0.
    Gpio18,
    /// GPIO28..31, ALT2.
    Gpio28,
}

/// Board revision code as reported by firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BoardRevision(pub u32);

impl BoardRevision {
    /// First revision with the 40-pin header.
    pub const FIRST_40_PIN: u32 = 0x10;

    /// Board routes PCM to the 40-pin header.
    pub const fn has_40_pin_header(self) -> bool {
        (self.0 & 0x00ff_ffff) >= Self::FIRST_40_PIN
    }
}

/// Resolved pin bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinBank {
    /// GPIO carrying PCM_CLK; the other three follow.
    pub first_pin: u8,
    /// Alternate function selecting PCM on these pins.
    pub function: PinFunction,
}

impl PinLayout {
    /// Pin bank for this layout on `revision`.
    pub const fn resolve(self, revision: BoardRevision) -> PinBank {
        let layout = match self {
            Self::Auto if revision.has_40_pin_header() => Self::Gpio18,
            Self::Auto => Self::Gpio28,
            fixed => fixed,
        };
        match layout {
            Self::Gpio28 => PinBank { first_pin: 28, function: PinFunction::Alt2 },
            Self::Gpio18 | Self::Auto => PinBank { first_pin: 18, function: PinFunction::Alt0 },
        }
    }
}

/// Switch the four PCM pins to their PCM function.
pub fn route<M: PinMux>(mux: &mut M, layout: PinLayout, revision: BoardRevision) -> Result<PinBank, M::Error> {
    let bank = layout.resolve(revision);
    for pin in (bank.first_pin..).take(usize::from(PCM_PIN_COUNT)) {
        mux.set_function(pin, bank.function)?;
    }
    debug!("PCM pins routed from GPIO{}", bank.first_pin);
    Ok(bank)
}
