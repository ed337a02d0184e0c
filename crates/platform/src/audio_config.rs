//! Fixed audio serial port configuration.
//!
//! Values here are operational constants of the PCM/I2S block, not derived
//! from stream parameters. They are written once per stream configuration.
//!
//! # DMA request levels
//!
//! ```text
//! DREQ register
//!   TX_PANIC [30:24] = 0x10   panic request when TX FIFO drops below 16
//!   RX_PANIC [22:16] = 0x30   panic request when RX FIFO rises above 48
//!   TX       [14:8]  = 0x30   DMA request when TX FIFO drops below 48
//!   RX       [6:0]   = 0x20   DMA request when RX FIFO rises above 32
//! ```
//!
//! The control/status register additionally selects FIFO thresholds
//! (`RXTHR`/`TXTHR` = 1) and enables the DMA request lines.

use crate::audio_types::SampleWidth;

/// DMA threshold and panic levels for the PCM block.
pub struct I2sTuning;

impl I2sTuning {
    /// RX FIFO threshold selector (CS.RXTHR).
    pub const RX_THRESHOLD: u32 = 1;
    /// TX FIFO threshold selector (CS.TXTHR).
    pub const TX_THRESHOLD: u32 = 1;
    /// TX panic level (DREQ.TX_PANIC).
    pub const TX_PANIC: u32 = 0x10;
    /// RX panic level (DREQ.RX_PANIC).
    pub const RX_PANIC: u32 = 0x30;
    /// TX DMA request level (DREQ.TX).
    pub const TX_REQUEST: u32 = 0x30;
    /// RX DMA request level (DREQ.RX).
    pub const RX_REQUEST: u32 = 0x20;
    /// Retry budget for every bounded hardware poll (clock busy, FIFO sync).
    pub const POLL_ATTEMPTS: u32 = 1000;
}

/// Stream capabilities advertised by the serial port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaiCapabilities {
    /// Minimum channel count.
    pub channels_min: u32,
    /// Maximum channel count.
    pub channels_max: u32,
    /// Lowest sample rate (Hz).
    pub rate_min_hz: u32,
    /// Highest sample rate (Hz).
    pub rate_max_hz: u32,
    /// Accepted sample widths.
    pub widths: &'static [SampleWidth],
    /// Playback and capture must run at the same rate.
    pub symmetric_rates: bool,
}

impl DaiCapabilities {
    /// Returns `true` if the stream parameters are inside the advertised set.
    pub fn accepts(&self, width: SampleWidth, channels: u32, rate_hz: u32) -> bool {
        self.widths.contains(&width)
            && (self.channels_min..=self.channels_max).contains(&channels)
            && (self.rate_min_hz..=self.rate_max_hz).contains(&rate_hz)
    }
}

/// Capabilities of the PCM/I2S block (identical for playback and capture).
pub const PCM_I2S_CAPABILITIES: DaiCapabilities = DaiCapabilities {
    channels_min: 2,
    channels_max: 2,
    rate_min_hz: 8_000,
    rate_max_hz: 384_000,
    widths: &SampleWidth::ALL,
    symmetric_rates: true,
};

/// Memory page size used to express buffer limits.
pub const PAGE_SIZE: usize = 4096;

/// Buffer geometry limits for the DMA-backed PCM stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmHardware {
    /// Smallest period in bytes.
    pub period_bytes_min: usize,
    /// Largest period in bytes.
    pub period_bytes_max: usize,
    /// Fewest periods per buffer.
    pub periods_min: usize,
    /// Most periods per buffer.
    pub periods_max: usize,
    /// Largest ring buffer in bytes.
    pub buffer_bytes_max: usize,
    /// Buffer preallocated at registration.
    pub prealloc_bytes: usize,
}

/// Buffer limits of the PCM/I2S stream.
pub const PCM_I2S_HARDWARE: PcmHardware = PcmHardware {
    period_bytes_min: 32,
    period_bytes_max: 64 * PAGE_SIZE,
    periods_min: 2,
    periods_max: 255,
    buffer_bytes_max: 128 * PAGE_SIZE,
    prealloc_bytes: 256 * PAGE_SIZE,
};
