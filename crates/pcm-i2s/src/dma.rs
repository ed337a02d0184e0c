//! DMA endpoint description for the FIFO data port.
//!
//! Both directions share the FIFO register; the DMA controller tells them
//! apart by request line.

use platform::audio_config::{PcmHardware, PCM_I2S_HARDWARE};
use platform::Direction;

use crate::registers::FIFO_A;

/// Bus address of the PCM/I2S register block as seen by the DMA engine.
pub const PCM_BUS_BASE: u32 = 0x7e20_3000;

/// Bus address of the FIFO data port.
pub const FIFO_BUS_ADDR: u32 = PCM_BUS_BASE | FIFO_A;

/// DMA request line pacing transmit transfers.
pub const DREQ_TX: u8 = 2;

/// DMA request line pacing receive transfers.
pub const DREQ_RX: u8 = 3;

/// Parameters a DMA engine needs to move samples through the FIFO.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DmaEndpoint {
    /// Bus address of the data port.
    pub addr: u32,
    /// Peripheral request line.
    pub dreq: u8,
    /// Width of one bus access in bytes.
    pub bus_width_bytes: u8,
    /// Maximum accesses per burst.
    pub max_burst: u8,
}

impl DmaEndpoint {
    /// Ring-buffer limits a stream on this endpoint must respect.
    pub const BUFFER_LIMITS: PcmHardware = PCM_I2S_HARDWARE;

    /// Bytes moved by one full burst.
    pub const fn burst_bytes(&self) -> usize {
        (self.bus_width_bytes as usize).saturating_mul(self.max_burst as usize)
    }

    /// FIFO endpoint for `dir`: 32-bit accesses, bursts of two.
    pub const fn for_direction(dir: Direction) -> Self {
        let dreq = match dir {
            Direction::Playback => DREQ_TX,
            Direction::Capture => DREQ_RX,
        };
        Self { addr: FIFO_BUS_ADDR, dreq, bus_width_bytes: 4, max_burst: 2 }
    }
}
