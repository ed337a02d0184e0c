//! Frame geometry: where each channel sits inside a frame, how long the
//! frame and its sync pulse are, and which side drives the clocks.
//!
//! ```text
//!          |<------------- frame_length (bclk_ratio) ------------->|
//! FS   ____/‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾\____________________________/‾‾
//!          |<-- frame_sync_length --->|
//! DATA  x  | ch1 (pos = delay) ...    x  | ch2 (pos = ratio/2 + delay) ...
//! ```
//!
//! Only standard I2S (one bit clock of data delay) and stereo frames are
//! supported.

use platform::SampleWidth;

use crate::error::ConfigError;
use crate::registers::MAX_FRAME_LENGTH;

/// Serial frame protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameProtocol {
    /// Philips I2S: data starts one bit clock after the frame edge.
    I2s,
    /// Left-justified.
    LeftJustified,
    /// Right-justified.
    RightJustified,
    /// DSP mode A.
    DspA,
    /// DSP mode B.
    DspB,
}

impl FrameProtocol {
    /// Bit clocks between frame edge and first data bit, if supported.
    pub const fn data_delay(self) -> Option<u32> {
        match self {
            Self::I2s => Some(1),
            Self::LeftJustified | Self::RightJustified | Self::DspA | Self::DspB => None,
        }
    }
}

/// Who drives the bit clock and the frame sync, from the peripheral's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FormatRole {
    /// Peripheral drives both.
    BclkMasterFrameMaster,
    /// Peripheral drives the bit clock; the codec drives frame sync.
    BclkMasterFrameSlave,
    /// Codec drives the bit clock; the peripheral drives frame sync.
    BclkSlaveFrameMaster,
    /// Codec drives both.
    BclkSlaveFrameSlave,
}

impl FormatRole {
    /// Peripheral generates the bit clock.
    pub const fn is_bclk_master(self) -> bool {
        matches!(self, Self::BclkMasterFrameMaster | Self::BclkMasterFrameSlave)
    }

    /// Peripheral generates the frame sync.
    pub const fn is_frame_master(self) -> bool {
        matches!(self, Self::BclkMasterFrameMaster | Self::BclkSlaveFrameMaster)
    }

    /// Peripheral generates both clocks.
    pub const fn is_full_master(self) -> bool {
        self.is_bclk_master() && self.is_frame_master()
    }
}

/// Interface format negotiated with the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DaiFormat {
    /// Frame protocol.
    pub protocol: FrameProtocol,
    /// Clock ownership.
    pub role: FormatRole,
    /// Sample on the falling bit-clock edge instead of the rising one.
    pub invert_bclk: bool,
    /// Frame sync active high instead of low.
    pub invert_fsync: bool,
    /// Keep the bit clock running while no stream is active.
    pub continue_clock_on_idle: bool,
}

impl DaiFormat {
    /// Standard I2S with normal polarities and the clock stopped when idle.
    pub const fn i2s(role: FormatRole) -> Self {
        Self {
            protocol: FrameProtocol::I2s,
            role,
            invert_bclk: false,
            invert_fsync: false,
            continue_clock_on_idle: false,
        }
    }
}

/// Per-device configuration held between streams.
///
/// `protocol` and `role` stay `None` until the codec link sets a format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceConfig {
    /// Frame protocol.
    pub protocol: Option<FrameProtocol>,
    /// Clock ownership.
    pub role: Option<FormatRole>,
    /// Normal-polarity bit-clock inversion request.
    pub invert_bclk: bool,
    /// Normal-polarity frame-sync inversion request.
    pub invert_fsync: bool,
    /// Keep the bit clock running while no stream is active.
    pub continue_clock_on_idle: bool,
    /// Bit clocks per frame forced by the machine driver.
    pub requested_bclk_ratio: Option<u32>,
}

impl DeviceConfig {
    /// Apply a negotiated interface format. The requested ratio is kept.
    pub fn apply_format(&mut self, format: DaiFormat) {
        self.protocol = Some(format.protocol);
        self.role = Some(format.role);
        self.invert_bclk = format.invert_bclk;
        self.invert_fsync = format.invert_fsync;
        self.continue_clock_on_idle = format.continue_clock_on_idle;
    }

    /// Peripheral generates the bit clock. `false` while no role is set.
    pub fn is_bclk_master(&self) -> bool {
        self.role.is_some_and(FormatRole::is_bclk_master)
    }

    /// Peripheral generates both clocks. `false` while no role is set.
    pub fn is_full_master(&self) -> bool {
        self.role.is_some_and(FormatRole::is_full_master)
    }
}

/// Placement of one channel inside the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelSlot {
    /// First bit clock of the slot, counted from the frame edge.
    pub slot_position: u32,
    /// Low four bits of `sample_bits - 8`.
    pub slot_width_code: u32,
    /// Adds 16 to the encoded width (samples of 24 bits and up).
    pub wide_extension: bool,
    /// Slot carries data.
    pub enabled: bool,
}

impl ChannelSlot {
    /// Enabled slot at `position` holding `sample_bits`-wide samples.
    pub const fn new(position: u32, sample_bits: u32) -> Self {
        Self {
            slot_position: position,
            slot_width_code: sample_bits.saturating_sub(8) & 0xf,
            wide_extension: sample_bits >= 24,
            enabled: true,
        }
    }

    /// Sample width the slot encodes.
    pub const fn sample_bits(self) -> u32 {
        let extension = if self.wide_extension { 16 } else { 0 };
        self.slot_width_code.saturating_add(8).saturating_add(extension)
    }
}

/// Everything the MODE and channel-format registers need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameGeometry {
    /// Bit clocks per frame.
    pub frame_length: u32,
    /// Frame sync pulse length in bit clocks.
    pub frame_sync_length: u32,
    /// Bit clocks between frame edge and first data bit.
    pub data_delay: u32,
    /// Channel 1 and channel 2, in that order.
    pub channel_slots: [ChannelSlot; 2],
    /// Two 16-bit samples per FIFO word.
    pub packed: bool,
    /// Hardware CLKI bit. The block's sense is opposite to the I2S
    /// convention, so this is set when no inversion was requested.
    pub bclk_inverted: bool,
    /// Hardware FSI bit, with the same opposite sense as `bclk_inverted`.
    pub fsync_inverted: bool,
    /// Bit clock is an input.
    pub bclk_slave: bool,
    /// Frame sync is an input.
    pub frame_slave: bool,
}

/// Frame geometry calculator.
pub struct FrameFormat;

impl FrameFormat {
    /// Supported channel count.
    pub const CHANNELS: u32 = 2;

    /// Compute the frame geometry for one stream.
    ///
    /// Checks run in order: sample width (16, 24 or 32), protocol, channel
    /// count, role, bit-clock ratio.
    #[allow(clippy::arithmetic_side_effects)] // ratio / 2: constant non-zero divisor
    pub fn compute(
        sample_bits: u32,
        channels: u32,
        bclk_ratio: u32,
        config: &DeviceConfig,
    ) -> Result<FrameGeometry, ConfigError> {
        SampleWidth::from_bits(sample_bits).ok_or(ConfigError::UnsupportedSampleWidth(sample_bits))?;

        let data_delay = config
            .protocol
            .and_then(FrameProtocol::data_delay)
            .ok_or(ConfigError::UnsupportedFrameFormat)?;

        if channels != Self::CHANNELS {
            return Err(ConfigError::UnsupportedChannelCount(channels));
        }

        let role = config.role.ok_or(ConfigError::UnsupportedMasterRole)?;

        if !(2..=MAX_FRAME_LENGTH).contains(&bclk_ratio) {
            return Err(ConfigError::UnsupportedBclkRatio(bclk_ratio));
        }

        let half = bclk_ratio / 2;
        let channel_slots = [
            ChannelSlot::new(data_delay, sample_bits),
            ChannelSlot::new(half.saturating_add(data_delay), sample_bits),
        ];

        Ok(FrameGeometry {
            frame_length: bclk_ratio,
            frame_sync_length: half,
            data_delay,
            channel_slots,
            packed: sample_bits <= 16,
            bclk_inverted: !config.invert_bclk,
            fsync_inverted: !config.invert_fsync,
            bclk_slave: !role.is_bclk_master(),
            frame_slave: !role.is_frame_master(),
        })
    }
}
