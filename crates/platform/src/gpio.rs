//! GPIO function multiplexing.
//!
//! Peripheral drivers route their signals through a [`PinMux`]; the board
//! crate owns the actual GPIO block. The function-select register layout
//! is shared by every implementation, so its encoding lives here.
//!
//! ```text
//! GPFSELn  (n = pin / 10), one 3-bit field per pin:
//!   field shift = (pin % 10) * 3
//!   000 input   001 output
//!   100 ALT0    101 ALT1    110 ALT2    111 ALT3    011 ALT4    010 ALT5
//! ```

/// Number of GPIO lines on the SoC.
pub const GPIO_COUNT: u8 = 54;

/// Function selected for a GPIO line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinFunction {
    /// Plain input.
    Input,
    /// Plain output.
    Output,
    /// Alternate function 0.
    Alt0,
    /// Alternate function 1.
    Alt1,
    /// Alternate function 2.
    Alt2,
    /// Alternate function 3.
    Alt3,
    /// Alternate function 4.
    Alt4,
    /// Alternate function 5.
    Alt5,
}

impl PinFunction {
    /// 3-bit function-select code.
    #[must_use]
    pub const fn fsel_code(self) -> u32 {
        match self {
            Self::Input => 0b000,
            Self::Output => 0b001,
            Self::Alt0 => 0b100,
            Self::Alt1 => 0b101,
            Self::Alt2 => 0b110,
            Self::Alt3 => 0b111,
            Self::Alt4 => 0b011,
            Self::Alt5 => 0b010,
        }
    }
}

/// Location of a pin's field in the function-select registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FselField {
    /// Byte offset of the GPFSEL register.
    pub offset: u32,
    /// Bit position of the 3-bit field.
    pub shift: u32,
}

impl FselField {
    /// Locate the field for `pin`, or `None` past the last GPIO.
    #[must_use]
    pub fn locate(pin: u8) -> Option<Self> {
        if pin >= GPIO_COUNT {
            return None;
        }
        let bank = u32::from(pin / 10);
        let slot = u32::from(pin % 10);
        Some(Self {
            offset: bank.checked_mul(4)?,
            shift: slot.checked_mul(3)?,
        })
    }

    /// Replace this field of a GPFSEL word with `function`.
    #[must_use]
    pub const fn apply(self, word: u32, function: PinFunction) -> u32 {
        (word & !(0b111 << self.shift)) | (function.fsel_code() << self.shift)
    }
}

/// Pin multiplexing capability provided by the board.
pub trait PinMux {
    /// Error type
    type Error: core::fmt::Debug;

    /// Select `function` for GPIO `pin`.
    fn set_function(&mut self, pin: u8, function: PinFunction) -> Result<(), Self::Error>;
}

impl<T: PinMux + ?Sized> PinMux for &mut T {
    type Error = T::Error;

    fn set_function(&mut self, pin: u8, function: PinFunction) -> Result<(), Self::Error> {
        (**self).set_function(pin, function)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn pin_21_lives_in_gpfsel2_bits_5_3() {
        let field = FselField::locate(21).unwrap();
        assert_eq!(field, FselField { offset: 8, shift: 3 });
    }

    #[test]
    fn pins_past_the_last_gpio_have_no_field() {
        assert!(FselField::locate(53).is_some());
        assert!(FselField::locate(54).is_none());
    }

    #[test]
    fn apply_only_touches_the_pin_field() {
        let field = FselField::locate(18).unwrap();
        let word = field.apply(0xFFFF_FFFF, PinFunction::Alt0);
        assert_eq!(word, !(0b011 << 24));
    }

    #[test]
    fn alternate_codes_follow_the_hardware_table() {
        assert_eq!(PinFunction::Alt0.fsel_code(), 4);
        assert_eq!(PinFunction::Alt3.fsel_code(), 7);
        assert_eq!(PinFunction::Alt4.fsel_code(), 3);
        assert_eq!(PinFunction::Alt5.fsel_code(), 2);
    }
}
