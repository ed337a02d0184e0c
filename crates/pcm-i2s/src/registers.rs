//! Register map of the PCM/I2S block and its clock generator.
//!
//! Bit positions are fixed by the hardware. Every field is named here and
//! every composite register word is produced by an `encode_*` function, so
//! no other module shifts raw numbers.
//!
//! # Control bank
//!
//! ```text
//! 0x00 CS_A     control / status (SYNC handshake, FIFO flags, run enables)
//! 0x04 FIFO_A   FIFO data port (DMA endpoint, precious)
//! 0x08 MODE_A   frame length, sync length, clock/frame roles, polarity
//! 0x0c RXC_A    receive channel format (two 16-bit halves)
//! 0x10 TXC_A    transmit channel format
//! 0x14 DREQ_A   DMA request / panic levels
//! 0x18 INTEN_A  interrupt enables
//! 0x1c INTSTC_A interrupt status (write-1-to-clear)
//! 0x20 GRAY     gray-code mode control
//! ```
//!
//! # Clock bank
//!
//! Both clock registers ignore writes whose top byte is not [`clk::PASSWD`].

// Field shifts are constants below 32 and every shifted value is masked.
#![allow(clippy::arithmetic_side_effects)]

use platform::{ClockSource, Direction, I2sTuning, RegmapConfig};

use crate::clock_plan::{ClockDivider, MashStage};
use crate::frame_format::{ChannelSlot, FrameGeometry};

// ── Offsets ──────────────────────────────────────────────────────────────────

/// Control / status.
pub const CS_A: u32 = 0x00;
/// FIFO data port.
pub const FIFO_A: u32 = 0x04;
/// Frame mode.
pub const MODE_A: u32 = 0x08;
/// Receive channel format.
pub const RXC_A: u32 = 0x0c;
/// Transmit channel format.
pub const TXC_A: u32 = 0x10;
/// DMA request levels.
pub const DREQ_A: u32 = 0x14;
/// Interrupt enables.
pub const INTEN_A: u32 = 0x18;
/// Interrupt status and clear.
pub const INTSTC_A: u32 = 0x1c;
/// Gray-code mode.
pub const GRAY: u32 = 0x20;

/// Clock generator control.
pub const CLK_CTL: u32 = 0x00;
/// Clock generator divider.
pub const CLK_DIV: u32 = 0x04;

/// Control bank description.
pub static CONTROL_REGMAP: RegmapConfig = RegmapConfig {
    name: "pcm",
    stride: 4,
    max_register: GRAY,
    volatile: &[CS_A, FIFO_A, INTSTC_A, GRAY],
    precious: &[FIFO_A],
};

/// Clock bank description. BUSY lives in CTL, so it is never cached.
pub static CLOCK_REGMAP: RegmapConfig = RegmapConfig {
    name: "pcm-clk",
    stride: 4,
    max_register: CLK_DIV,
    volatile: &[CLK_CTL],
    precious: &[],
};

// ── CS_A ─────────────────────────────────────────────────────────────────────

/// CS_A fields.
pub mod cs {
    use platform::Direction;

    /// RAM standby release (set = RAMs powered, clear = standby).
    pub const STBY: u32 = 1 << 25;
    /// Two-clock sync handshake flag.
    pub const SYNC: u32 = 1 << 24;
    /// Receive sign extension.
    pub const RXSEX: u32 = 1 << 23;
    /// Receive FIFO full.
    pub const RXF: u32 = 1 << 22;
    /// Transmit FIFO empty.
    pub const TXE: u32 = 1 << 21;
    /// Receive FIFO contains data.
    pub const RXD: u32 = 1 << 20;
    /// Transmit FIFO can accept data.
    pub const TXD: u32 = 1 << 19;
    /// Receive FIFO needs reading.
    pub const RXR: u32 = 1 << 18;
    /// Transmit FIFO needs writing.
    pub const TXW: u32 = 1 << 17;
    /// Receive FIFO overflow.
    pub const RXERR: u32 = 1 << 16;
    /// Transmit FIFO underflow.
    pub const TXERR: u32 = 1 << 15;
    /// Receive FIFO in sync.
    pub const RXSYNC: u32 = 1 << 14;
    /// Transmit FIFO in sync.
    pub const TXSYNC: u32 = 1 << 13;
    /// DMA DREQ enable.
    pub const DMAEN: u32 = 1 << 9;
    /// Receive threshold field.
    pub const RXTHR_MASK: u32 = 0b11 << 7;
    /// Transmit threshold field.
    pub const TXTHR_MASK: u32 = 0b11 << 5;
    /// Clear the receive FIFO (self-clearing).
    pub const RXCLR: u32 = 1 << 4;
    /// Clear the transmit FIFO (self-clearing).
    pub const TXCLR: u32 = 1 << 3;
    /// Transmit run enable.
    pub const TXON: u32 = 1 << 2;
    /// Receive run enable.
    pub const RXON: u32 = 1 << 1;
    /// Block enable.
    pub const EN: u32 = 1 << 0;

    /// Flags the hardware owns; writes to them are ignored.
    pub const STATUS_MASK: u32 = RXF | TXE | RXD | TXD | RXR | TXW | RXSYNC | TXSYNC;

    /// Receive threshold field value.
    pub const fn rxthr(level: u32) -> u32 {
        (level << 7) & RXTHR_MASK
    }

    /// Transmit threshold field value.
    pub const fn txthr(level: u32) -> u32 {
        (level << 5) & TXTHR_MASK
    }

    /// Run-enable bit for `dir`.
    pub const fn run_bit(dir: Direction) -> u32 {
        match dir {
            Direction::Playback => TXON,
            Direction::Capture => RXON,
        }
    }

    /// FIFO-clear bit for `dir`.
    pub const fn clear_bit(dir: Direction) -> u32 {
        match dir {
            Direction::Playback => TXCLR,
            Direction::Capture => RXCLR,
        }
    }
}

/// Threshold bits and DMA enable written on every configuration.
pub const fn dma_threshold_bits() -> (u32, u32) {
    let mask = cs::RXTHR_MASK | cs::TXTHR_MASK | cs::DMAEN;
    let value = cs::rxthr(I2sTuning::RX_THRESHOLD) | cs::txthr(I2sTuning::TX_THRESHOLD) | cs::DMAEN;
    (mask, value)
}

// ── MODE_A ───────────────────────────────────────────────────────────────────

/// MODE_A fields.
pub mod mode {
    /// Disable the bit clock output.
    pub const CLKDIS: u32 = 1 << 28;
    /// PDM decimation factor.
    pub const PDMN: u32 = 1 << 27;
    /// PDM input mode.
    pub const PDME: u32 = 1 << 26;
    /// Receive frame packed mode.
    pub const FRXP: u32 = 1 << 25;
    /// Transmit frame packed mode.
    pub const FTXP: u32 = 1 << 24;
    /// Bit clock is an input (peripheral is bit-clock slave).
    pub const CLKM: u32 = 1 << 23;
    /// Clock invert.
    pub const CLKI: u32 = 1 << 22;
    /// Frame sync is an input (peripheral is frame slave).
    pub const FSM: u32 = 1 << 21;
    /// Frame sync invert.
    pub const FSI: u32 = 1 << 20;
    /// Frame length field shift.
    pub const FLEN_SHIFT: u32 = 10;
    /// Frame length field (stored as length - 1).
    pub const FLEN_MASK: u32 = 0x3ff << FLEN_SHIFT;
    /// Frame sync length field.
    pub const FSLEN_MASK: u32 = 0x3ff;
}

/// Largest frame length the FLEN field can express.
pub const MAX_FRAME_LENGTH: u32 = (mode::FLEN_MASK >> mode::FLEN_SHIFT) + 1;

/// MODE_A word for a computed frame geometry.
pub fn encode_mode(geometry: &FrameGeometry) -> u32 {
    let flen = geometry.frame_length.saturating_sub(1);
    let mut word = ((flen << mode::FLEN_SHIFT) & mode::FLEN_MASK)
        | (geometry.frame_sync_length & mode::FSLEN_MASK);
    if geometry.packed {
        word |= mode::FTXP | mode::FRXP;
    }
    if geometry.bclk_slave {
        word |= mode::CLKM;
    }
    if geometry.frame_slave {
        word |= mode::FSM;
    }
    if geometry.bclk_inverted {
        word |= mode::CLKI;
    }
    if geometry.fsync_inverted {
        word |= mode::FSI;
    }
    word
}

/// Decoded MODE_A word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ModeFields {
    /// Bit clocks per frame.
    pub frame_length: u32,
    /// Frame sync pulse length in bit clocks.
    pub frame_sync_length: u32,
    /// Both directions in packed mode.
    pub packed: bool,
    /// CLKM.
    pub bclk_slave: bool,
    /// FSM.
    pub frame_slave: bool,
    /// CLKI.
    pub bclk_inverted: bool,
    /// FSI.
    pub fsync_inverted: bool,
}

/// Split a MODE_A word into its fields.
pub const fn decode_mode(word: u32) -> ModeFields {
    ModeFields {
        frame_length: ((word & mode::FLEN_MASK) >> mode::FLEN_SHIFT) + 1,
        frame_sync_length: word & mode::FSLEN_MASK,
        packed: word & (mode::FTXP | mode::FRXP) == (mode::FTXP | mode::FRXP),
        bclk_slave: word & mode::CLKM != 0,
        frame_slave: word & mode::FSM != 0,
        bclk_inverted: word & mode::CLKI != 0,
        fsync_inverted: word & mode::FSI != 0,
    }
}

// ── RXC_A / TXC_A ────────────────────────────────────────────────────────────

/// Channel format fields (one 16-bit half per channel).
pub mod chan {
    /// Channel width extension (+16 bits).
    pub const CHWEX: u32 = 1 << 15;
    /// Channel enable.
    pub const CHEN: u32 = 1 << 14;
    /// Channel position shift.
    pub const CHPOS_SHIFT: u32 = 4;
    /// Channel position field (first bit clock of the slot).
    pub const CHPOS_MASK: u32 = 0x3ff << CHPOS_SHIFT;
    /// Channel width field (width - 8, low four bits).
    pub const CHWID_MASK: u32 = 0xf;
    /// Channel 1 occupies the upper half.
    pub const CH1_SHIFT: u32 = 16;
    /// Mask of one half-word.
    pub const HALF_MASK: u32 = 0xffff;
}

/// 16-bit descriptor for one channel slot.
pub const fn encode_channel(slot: ChannelSlot) -> u32 {
    let mut half = ((slot.slot_position << chan::CHPOS_SHIFT) & chan::CHPOS_MASK)
        | (slot.slot_width_code & chan::CHWID_MASK);
    if slot.wide_extension {
        half |= chan::CHWEX;
    }
    if slot.enabled {
        half |= chan::CHEN;
    }
    half
}

/// Inverse of [`encode_channel`] for the lower 16 bits of `half`.
pub const fn decode_channel(half: u32) -> ChannelSlot {
    ChannelSlot {
        slot_position: (half & chan::CHPOS_MASK) >> chan::CHPOS_SHIFT,
        slot_width_code: half & chan::CHWID_MASK,
        wide_extension: half & chan::CHWEX != 0,
        enabled: half & chan::CHEN != 0,
    }
}

/// RXC_A / TXC_A word carrying both slots (channel 1 high, channel 2 low).
pub const fn encode_channels(slots: [ChannelSlot; 2]) -> u32 {
    let [ch1, ch2] = slots;
    (encode_channel(ch1) << chan::CH1_SHIFT) | encode_channel(ch2)
}

/// Split an RXC_A / TXC_A word into its two slots.
pub const fn decode_channels(word: u32) -> [ChannelSlot; 2] {
    [
        decode_channel((word >> chan::CH1_SHIFT) & chan::HALF_MASK),
        decode_channel(word & chan::HALF_MASK),
    ]
}

// ── DREQ_A ───────────────────────────────────────────────────────────────────

/// DREQ_A fields (7 bits each).
pub mod dreq {
    /// Transmit panic level shift.
    pub const TX_PANIC_SHIFT: u32 = 24;
    /// Receive panic level shift.
    pub const RX_PANIC_SHIFT: u32 = 16;
    /// Transmit request level shift.
    pub const TX_SHIFT: u32 = 8;
    /// Receive request level shift.
    pub const RX_SHIFT: u32 = 0;
    /// Width mask of one level field.
    pub const LEVEL_MASK: u32 = 0x7f;
    /// All four fields.
    pub const ALL_MASK: u32 = (LEVEL_MASK << TX_PANIC_SHIFT)
        | (LEVEL_MASK << RX_PANIC_SHIFT)
        | (LEVEL_MASK << TX_SHIFT)
        | (LEVEL_MASK << RX_SHIFT);
}

/// DMA request and panic levels, in FIFO words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DreqLevels {
    /// Transmit panic level.
    pub tx_panic: u32,
    /// Receive panic level.
    pub rx_panic: u32,
    /// Transmit request level.
    pub tx_request: u32,
    /// Receive request level.
    pub rx_request: u32,
}

impl DreqLevels {
    /// Levels programmed on every configuration.
    pub const TUNED: Self = Self {
        tx_panic: I2sTuning::TX_PANIC,
        rx_panic: I2sTuning::RX_PANIC,
        tx_request: I2sTuning::TX_REQUEST,
        rx_request: I2sTuning::RX_REQUEST,
    };

    /// DREQ_A word.
    pub const fn encode(self) -> u32 {
        ((self.tx_panic & dreq::LEVEL_MASK) << dreq::TX_PANIC_SHIFT)
            | ((self.rx_panic & dreq::LEVEL_MASK) << dreq::RX_PANIC_SHIFT)
            | ((self.tx_request & dreq::LEVEL_MASK) << dreq::TX_SHIFT)
            | ((self.rx_request & dreq::LEVEL_MASK) << dreq::RX_SHIFT)
    }

    /// Split a DREQ_A word.
    pub const fn decode(word: u32) -> Self {
        Self {
            tx_panic: (word >> dreq::TX_PANIC_SHIFT) & dreq::LEVEL_MASK,
            rx_panic: (word >> dreq::RX_PANIC_SHIFT) & dreq::LEVEL_MASK,
            tx_request: (word >> dreq::TX_SHIFT) & dreq::LEVEL_MASK,
            rx_request: (word >> dreq::RX_SHIFT) & dreq::LEVEL_MASK,
        }
    }
}

// ── Clock bank ───────────────────────────────────────────────────────────────

/// Clock generator fields.
pub mod clk {
    /// Write password, required in bits 31..24 of every write.
    pub const PASSWD: u32 = 0x5a00_0000;
    /// Password field.
    pub const PASSWD_MASK: u32 = 0xff00_0000;
    /// MASH filter shift.
    pub const MASH_SHIFT: u32 = 9;
    /// MASH filter field.
    pub const MASH_MASK: u32 = 0b11 << MASH_SHIFT;
    /// Invert the generator output.
    pub const FLIP: u32 = 1 << 8;
    /// Generator running (read-only).
    pub const BUSY: u32 = 1 << 7;
    /// Stop and reset the generator immediately.
    pub const KILL: u32 = 1 << 5;
    /// Enable the generator.
    pub const ENAB: u32 = 1 << 4;
    /// Clock source field.
    pub const SRC_MASK: u32 = 0xf;
    /// Integer divisor shift.
    pub const DIVI_SHIFT: u32 = 12;
    /// Integer divisor field.
    pub const DIVI_MASK: u32 = 0xfff << DIVI_SHIFT;
    /// Fractional divisor field.
    pub const DIVF_MASK: u32 = 0xfff;
}

/// CLK_DIV word, password included.
pub const fn encode_divider(divider: ClockDivider) -> u32 {
    clk::PASSWD
        | ((divider.integer_part << clk::DIVI_SHIFT) & clk::DIVI_MASK)
        | (divider.fractional_part & clk::DIVF_MASK)
}

/// Split a CLK_DIV word.
pub const fn decode_divider(word: u32) -> ClockDivider {
    ClockDivider {
        integer_part: (word & clk::DIVI_MASK) >> clk::DIVI_SHIFT,
        fractional_part: word & clk::DIVF_MASK,
    }
}

/// CLK_CTL word selecting `source` and `mash` with the generator disabled.
pub const fn encode_clock_control(source: ClockSource, mash: MashStage) -> u32 {
    clk::PASSWD | ((mash.code() << clk::MASH_SHIFT) & clk::MASH_MASK) | (source.code() & clk::SRC_MASK)
}

/// Source and MASH stage of a CLK_CTL word. `None` for unknown encodings.
pub const fn decode_clock_control(word: u32) -> Option<(ClockSource, MashStage)> {
    let source = match ClockSource::from_code(word & clk::SRC_MASK) {
        Some(source) => source,
        None => return None,
    };
    match MashStage::from_code((word & clk::MASH_MASK) >> clk::MASH_SHIFT) {
        Some(mash) => Some((source, mash)),
        None => None,
    }
}

/// Run-enable bits for `dirs`.
pub fn run_bits(dirs: &[Direction]) -> u32 {
    dirs.iter().fold(0, |acc, &dir| acc | cs::run_bit(dir))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dreq_levels_match_tuning() {
        let word = DreqLevels::TUNED.encode();
        assert_eq!(word, 0x1030_3020);
        assert_eq!(DreqLevels::decode(word), DreqLevels::TUNED);
    }

    #[test]
    fn threshold_bits_select_level_one() {
        let (mask, value) = dma_threshold_bits();
        assert_eq!(value, (1 << 7) | (1 << 5) | (1 << 9));
        assert_eq!(value & !mask, 0);
    }

    #[test]
    fn divider_word_carries_password() {
        let word = encode_divider(ClockDivider { integer_part: 177, fractional_part: 643 });
        assert_eq!(word & clk::PASSWD_MASK, clk::PASSWD);
        assert_eq!(decode_divider(word), ClockDivider { integer_part: 177, fractional_part: 643 });
    }

    #[test]
    fn clock_control_never_enables() {
        let word = encode_clock_control(ClockSource::PllD, MashStage::Stage1);
        assert_eq!(word & clk::ENAB, 0);
        assert_eq!(word & clk::SRC_MASK, 6);
        assert_eq!((word & clk::MASH_MASK) >> clk::MASH_SHIFT, 1);
        assert_eq!(decode_clock_control(word), Some((ClockSource::PllD, MashStage::Stage1)));
    }

    #[test]
    fn unknown_clock_source_does_not_decode() {
        assert_eq!(decode_clock_control(clk::PASSWD | 0xf), None);
    }

    #[test]
    fn stereo_16_bit_channel_word() {
        let slots = [
            ChannelSlot { slot_position: 1, slot_width_code: 8, wide_extension: false, enabled: true },
            ChannelSlot { slot_position: 17, slot_width_code: 8, wide_extension: false, enabled: true },
        ];
        let word = encode_channels(slots);
        assert_eq!(word >> 16, chan::CHEN | (1 << 4) | 8);
        assert_eq!(word & 0xffff, chan::CHEN | (17 << 4) | 8);
        assert_eq!(decode_channels(word), slots);
    }

    #[test]
    fn mode_word_stores_length_minus_one() {
        let word = (63 << mode::FLEN_SHIFT) | 32 | mode::CLKI | mode::FSI;
        let fields = decode_mode(word);
        assert_eq!(fields.frame_length, 64);
        assert_eq!(fields.frame_sync_length, 32);
        assert!(fields.bclk_inverted && fields.fsync_inverted);
        assert!(!fields.bclk_slave && !fields.frame_slave && !fields.packed);
    }

    #[test]
    fn frame_length_field_limit() {
        assert_eq!(MAX_FRAME_LENGTH, 1024);
    }

    #[test]
    fn run_bits_cover_both_directions() {
        assert_eq!(run_bits(&[Direction::Playback, Direction::Capture]), cs::TXON | cs::RXON);
        assert_eq!(run_bits(&[]), 0);
    }

    #[test]
    fn regmaps_mark_fifo_precious() {
        assert!(CONTROL_REGMAP.is_precious(FIFO_A));
        assert!(CONTROL_REGMAP.is_volatile(CS_A));
        assert!(!CONTROL_REGMAP.is_volatile(MODE_A));
        assert!(CLOCK_REGMAP.is_volatile(CLK_CTL));
        assert!(!CLOCK_REGMAP.is_valid(0x08));
    }
}
