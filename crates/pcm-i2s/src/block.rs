//! The PCM/I2S register block and its clock generator, behind a
//! [`RegisterPort`].
//!
//! [`I2sBlock`] owns the transport, the poll delay and the poll policy.
//! Its methods are single hardware steps; sequencing lives in
//! [`StreamController`](crate::controller::StreamController). The clock
//! protocol is in `clock.rs` and the FIFO sync handshake in `sync.rs`.

use embedded_hal::delay::DelayNs;
use platform::{Bank, Direction, RegisterPort};

use crate::clock_plan::ClockPlan;
use crate::frame_format::FrameGeometry;
use crate::poll::{NoDelay, PollPolicy};
use crate::registers::{
    self, cs, DreqLevels, CLK_CTL, CLK_DIV, CS_A, DREQ_A, MODE_A, RXC_A, TXC_A,
};

/// PCM/I2S peripheral registers.
pub struct I2sBlock<P, D = NoDelay> {
    pub(crate) port: P,
    pub(crate) delay: D,
    pub(crate) policy: PollPolicy,
}

impl<P: RegisterPort> I2sBlock<P, NoDelay> {
    /// Block polled back to back with the default budget.
    pub fn new(port: P) -> Self {
        Self { port, delay: NoDelay, policy: PollPolicy::default() }
    }
}

impl<P: RegisterPort, D: DelayNs> I2sBlock<P, D> {
    /// Block with an explicit poll delay and policy.
    pub fn with_delay(port: P, delay: D, policy: PollPolicy) -> Self {
        Self { port, delay, policy }
    }

    /// Poll policy for the clock and sync handshakes.
    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    /// Shared access to the transport.
    pub fn port(&self) -> &P {
        &self.port
    }

    /// Exclusive access to the transport.
    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    /// Release the transport and delay.
    pub fn into_parts(self) -> (P, D) {
        (self.port, self.delay)
    }

    /// Current CS_A value.
    pub fn status(&mut self) -> Result<u32, P::Error> {
        self.port.read(Bank::Control, CS_A)
    }

    /// Set or clear the run enable for `dir`.
    pub fn set_running(&mut self, dir: Direction, on: bool) -> Result<(), P::Error> {
        let bit = cs::run_bit(dir);
        self.port.update_bits(Bank::Control, CS_A, bit, if on { bit } else { 0 })
    }

    /// Set or clear the block enable.
    pub fn set_enabled(&mut self, on: bool) -> Result<(), P::Error> {
        self.port.update_bits(Bank::Control, CS_A, cs::EN, if on { cs::EN } else { 0 })
    }

    /// Take the FIFO RAMs out of standby.
    pub fn release_standby(&mut self) -> Result<(), P::Error> {
        self.port.update_bits(Bank::Control, CS_A, cs::STBY, cs::STBY)
    }

    /// Put the FIFO RAMs back into standby.
    pub fn enter_standby(&mut self) -> Result<(), P::Error> {
        self.port.update_bits(Bank::Control, CS_A, cs::STBY, 0)
    }

    /// Load divider, source and MASH stage with the generator disabled.
    ///
    /// Writing CLK_CTL without ENAB stops a running generator.
    pub fn program_clock(&mut self, plan: &ClockPlan) -> Result<(), P::Error> {
        self.port.write(Bank::Clock, CLK_DIV, registers::encode_divider(plan.divider))?;
        self.port.write(
            Bank::Clock,
            CLK_CTL,
            registers::encode_clock_control(plan.source, plan.mash),
        )
    }

    /// Write both channel-format registers, the mode register, the DMA
    /// thresholds and the DMA request levels.
    ///
    /// Receive and transmit always share one format; the frame length is
    /// common to both directions.
    pub fn write_frame(&mut self, geometry: &FrameGeometry) -> Result<(), P::Error> {
        let format = registers::encode_channels(geometry.channel_slots);
        self.port.write(Bank::Control, RXC_A, format)?;
        self.port.write(Bank::Control, TXC_A, format)?;
        self.port.write(Bank::Control, MODE_A, registers::encode_mode(geometry))?;

        let (mask, value) = registers::dma_threshold_bits();
        self.port.update_bits(Bank::Control, CS_A, mask, value)?;
        self.port.update_bits(
            Bank::Control,
            DREQ_A,
            registers::dreq::ALL_MASK,
            DreqLevels::TUNED.encode(),
        )
    }
}
