//! Simulated PCM/I2S block for host tests.
//!
//! [`MockI2sBlock`] implements [`RegisterPort`] and models the hardware
//! behaviour the driver depends on:
//!
//! - clock-bank writes without the password are ignored and counted
//! - `BUSY` follows `ENAB` and drops a configurable number of reads after
//!   the generator is disabled, or never (a stuck generator)
//! - `KILL` drops `BUSY` immediately
//! - a `SYNC` toggle is echoed a configurable number of `CS_A` reads later,
//!   and only while the clock runs
//! - `TXCLR` / `RXCLR` self-clear and empty the FIFOs while the clock runs
//! - FIFO status flags are read-only, set through test helpers
//!
//! Every write that reaches the mock is recorded, including rejected ones.

use heapless::Vec;
use platform::{Bank, RegisterPort};

use crate::registers::{clk, cs, CLK_CTL, CLK_DIV, CS_A, FIFO_A, GRAY};

/// Writes kept in the log before further ones are only counted.
pub const WRITE_LOG_CAPACITY: usize = 256;

const CONTROL_WORDS: usize = 9;
const CLOCK_WORDS: usize = 2;

/// One register write as seen on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegWrite {
    /// Target bank.
    pub bank: Bank,
    /// Byte offset.
    pub offset: u32,
    /// Raw value written.
    pub value: u32,
}

/// Transport failure injected with [`MockI2sBlock::fail_bus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockBusError;

/// Simulated register block.
pub struct MockI2sBlock {
    control: [u32; CONTROL_WORDS],
    clock: [u32; CLOCK_WORDS],
    sync_latency: Option<u32>,
    busy_latency: Option<u32>,
    pending_sync: Option<(u32, u32)>,
    busy_countdown: Option<u32>,
    writes: Vec<RegWrite, WRITE_LOG_CAPACITY>,
    dropped_writes: usize,
    reads: usize,
    rejected_clock_writes: usize,
    fail_bus: bool,
}

impl Default for MockI2sBlock {
    fn default() -> Self {
        Self::new()
    }
}

impl MockI2sBlock {
    /// Block at reset: FIFOs empty, clock stopped, two-read sync and busy latency.
    pub fn new() -> Self {
        Self {
            control: [cs::TXE | cs::TXD, 0, 0, 0, 0, 0, 0, 0, 0],
            clock: [0; CLOCK_WORDS],
            sync_latency: Some(2),
            busy_latency: Some(2),
            pending_sync: None,
            busy_countdown: None,
            writes: Vec::new(),
            dropped_writes: 0,
            reads: 0,
            rejected_clock_writes: 0,
            fail_bus: false,
        }
    }

    /// `CS_A` reads before a sync toggle is visible. `None` never echoes,
    /// like an absent external bit clock.
    pub fn with_sync_latency(mut self, reads: Option<u32>) -> Self {
        self.sync_latency = reads;
        self
    }

    /// `CLK_CTL` reads before `BUSY` drops after disable. `None` never drops.
    pub fn with_busy_latency(mut self, reads: Option<u32>) -> Self {
        self.busy_latency = reads;
        self
    }

    /// Change the busy latency of a block already in use.
    pub fn set_busy_latency(&mut self, reads: Option<u32>) {
        self.busy_latency = reads;
    }

    /// Make every subsequent access fail.
    pub fn fail_bus(&mut self, fail: bool) {
        self.fail_bus = fail;
    }

    /// Current register content, without recording a read.
    pub fn register(&self, bank: Bank, offset: u32) -> u32 {
        self.slot(bank, offset).map_or(0, |index| match bank {
            Bank::Control => self.control.get(index).copied().unwrap_or(0),
            Bank::Clock => self.clock.get(index).copied().unwrap_or(0),
        })
    }

    /// Overwrite a register directly, bypassing the log and side effects.
    pub fn set_register(&mut self, bank: Bank, offset: u32, value: u32) {
        if let Some(word) = self.word_mut(bank, offset) {
            *word = value;
        }
    }

    /// Drive the transmit-FIFO-empty flag.
    pub fn set_tx_fifo_empty(&mut self, empty: bool) {
        self.set_status(cs::TXE | cs::TXD, empty);
    }

    /// Drive the receive-data-available flag.
    pub fn set_rx_data(&mut self, available: bool) {
        self.set_status(cs::RXD, available);
    }

    /// Recorded writes, oldest first.
    pub fn writes(&self) -> &[RegWrite] {
        &self.writes
    }

    /// Writes seen since construction or the last [`clear_log`](Self::clear_log).
    pub fn write_count(&self) -> usize {
        self.writes.len().saturating_add(self.dropped_writes)
    }

    /// Register reads seen since construction or the last clear.
    pub fn read_count(&self) -> usize {
        self.reads
    }

    /// Clock writes ignored for a missing password.
    pub fn rejected_clock_writes(&self) -> usize {
        self.rejected_clock_writes
    }

    /// Forget recorded accesses.
    pub fn clear_log(&mut self) {
        self.writes.clear();
        self.dropped_writes = 0;
        self.reads = 0;
    }

    /// Generator enabled.
    pub fn clock_enabled(&self) -> bool {
        self.register(Bank::Clock, CLK_CTL) & clk::ENAB != 0
    }

    #[allow(clippy::arithmetic_side_effects)] // constant non-zero stride
    fn slot(&self, bank: Bank, offset: u32) -> Option<usize> {
        let max = match bank {
            Bank::Control => GRAY,
            Bank::Clock => CLK_DIV,
        };
        if offset % 4 != 0 || offset > max {
            return None;
        }
        usize::try_from(offset / 4).ok()
    }

    fn word_mut(&mut self, bank: Bank, offset: u32) -> Option<&mut u32> {
        let index = self.slot(bank, offset)?;
        match bank {
            Bank::Control => self.control.get_mut(index),
            Bank::Clock => self.clock.get_mut(index),
        }
    }

    fn set_status(&mut self, bits: u32, on: bool) {
        if let Some(word) = self.word_mut(Bank::Control, CS_A) {
            if on {
                *word |= bits;
            } else {
                *word &= !bits;
            }
        }
    }

    fn record(&mut self, bank: Bank, offset: u32, value: u32) {
        if self.writes.push(RegWrite { bank, offset, value }).is_err() {
            self.dropped_writes = self.dropped_writes.saturating_add(1);
        }
    }

    fn write_clock_control(&mut self, value: u32) {
        let old = self.register(Bank::Clock, CLK_CTL);
        let mut new = value & !(clk::PASSWD_MASK | clk::BUSY);

        if new & clk::KILL != 0 {
            self.busy_countdown = None;
        } else if new & clk::ENAB != 0 {
            new |= clk::BUSY;
            self.busy_countdown = None;
        } else if old & clk::BUSY != 0 {
            new |= clk::BUSY;
            self.busy_countdown = self.busy_latency;
        }
        self.set_register(Bank::Clock, CLK_CTL, new);
    }

    fn write_control_status(&mut self, value: u32) {
        let old = self.register(Bank::Control, CS_A);
        let owned = cs::STATUS_MASK | cs::SYNC | cs::TXCLR | cs::RXCLR;
        let mut new = (value & !owned) | (old & (cs::STATUS_MASK | cs::SYNC));

        if value & cs::SYNC != old & cs::SYNC && self.clock_enabled() {
            self.pending_sync = self.sync_latency.map(|reads| (value & cs::SYNC, reads));
        }
        if self.clock_enabled() {
            if value & cs::TXCLR != 0 {
                new = (new & !cs::TXW) | cs::TXE | cs::TXD;
            }
            if value & cs::RXCLR != 0 {
                new &= !(cs::RXD | cs::RXR | cs::RXF);
            }
        }
        self.set_register(Bank::Control, CS_A, new);
    }

    fn advance_sync(&mut self) {
        if let Some((target, remaining)) = self.pending_sync {
            if remaining <= 1 {
                let cs_word = self.register(Bank::Control, CS_A);
                self.set_register(Bank::Control, CS_A, (cs_word & !cs::SYNC) | target);
                self.pending_sync = None;
            } else {
                self.pending_sync = Some((target, remaining.saturating_sub(1)));
            }
        }
    }

    fn advance_busy(&mut self) {
        if let Some(remaining) = self.busy_countdown {
            if remaining <= 1 {
                let ctl = self.register(Bank::Clock, CLK_CTL);
                self.set_register(Bank::Clock, CLK_CTL, ctl & !clk::BUSY);
                self.busy_countdown = None;
            } else {
                self.busy_countdown = Some(remaining.saturating_sub(1));
            }
        }
    }
}

impl RegisterPort for MockI2sBlock {
    type Error = MockBusError;

    fn read(&mut self, bank: Bank, offset: u32) -> Result<u32, Self::Error> {
        if self.fail_bus {
            return Err(MockBusError);
        }
        self.reads = self.reads.saturating_add(1);
        match (bank, offset) {
            (Bank::Control, CS_A) => self.advance_sync(),
            (Bank::Clock, CLK_CTL) => self.advance_busy(),
            (Bank::Control, FIFO_A) => return Ok(0),
            _ => {}
        }
        Ok(self.register(bank, offset))
    }

    fn write(&mut self, bank: Bank, offset: u32, value: u32) -> Result<(), Self::Error> {
        if self.fail_bus {
            return Err(MockBusError);
        }
        self.record(bank, offset, value);
        match (bank, offset) {
            (Bank::Clock, _) if value & clk::PASSWD_MASK != clk::PASSWD => {
                self.rejected_clock_writes = self.rejected_clock_writes.saturating_add(1);
            }
            (Bank::Clock, CLK_CTL) => self.write_clock_control(value),
            (Bank::Clock, _) => self.set_register(bank, offset, value & !clk::PASSWD_MASK),
            (Bank::Control, CS_A) => self.write_control_status(value),
            (Bank::Control, FIFO_A) => self.set_tx_fifo_empty(false),
            (Bank::Control, _) => self.set_register(bank, offset, value),
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn enable_clock(mock: &mut MockI2sBlock) {
        mock.write(Bank::Clock, CLK_CTL, clk::PASSWD | clk::ENAB).unwrap();
    }

    #[test]
    fn clock_write_without_password_is_ignored() {
        let mut mock = MockI2sBlock::new();
        mock.write(Bank::Clock, CLK_CTL, clk::ENAB).unwrap();
        assert!(!mock.clock_enabled());
        assert_eq!(mock.rejected_clock_writes(), 1);
        assert_eq!(mock.write_count(), 1);
    }

    #[test]
    fn password_is_not_stored() {
        let mut mock = MockI2sBlock::new();
        mock.write(Bank::Clock, CLK_DIV, clk::PASSWD | (8 << 12)).unwrap();
        assert_eq!(mock.register(Bank::Clock, CLK_DIV), 8 << 12);
    }

    #[test]
    fn busy_drops_after_latency() {
        let mut mock = MockI2sBlock::new();
        enable_clock(&mut mock);
        assert_ne!(mock.read(Bank::Clock, CLK_CTL).unwrap() & clk::BUSY, 0);
        mock.write(Bank::Clock, CLK_CTL, clk::PASSWD).unwrap();
        assert_ne!(mock.read(Bank::Clock, CLK_CTL).unwrap() & clk::BUSY, 0);
        assert_eq!(mock.read(Bank::Clock, CLK_CTL).unwrap() & clk::BUSY, 0);
    }

    #[test]
    fn kill_drops_stuck_busy() {
        let mut mock = MockI2sBlock::new().with_busy_latency(None);
        enable_clock(&mut mock);
        mock.write(Bank::Clock, CLK_CTL, clk::PASSWD).unwrap();
        for _ in 0..10 {
            assert_ne!(mock.read(Bank::Clock, CLK_CTL).unwrap() & clk::BUSY, 0);
        }
        mock.write(Bank::Clock, CLK_CTL, clk::PASSWD | clk::KILL).unwrap();
        assert_eq!(mock.read(Bank::Clock, CLK_CTL).unwrap() & clk::BUSY, 0);
    }

    #[test]
    fn sync_echo_needs_running_clock() {
        let mut mock = MockI2sBlock::new();
        mock.write(Bank::Control, CS_A, cs::SYNC).unwrap();
        for _ in 0..5 {
            assert_eq!(mock.read(Bank::Control, CS_A).unwrap() & cs::SYNC, 0);
        }

        enable_clock(&mut mock);
        mock.write(Bank::Control, CS_A, cs::SYNC).unwrap();
        assert_eq!(mock.read(Bank::Control, CS_A).unwrap() & cs::SYNC, 0);
        assert_eq!(mock.read(Bank::Control, CS_A).unwrap() & cs::SYNC, cs::SYNC);
    }

    #[test]
    fn clear_bits_self_clear_and_empty_fifos() {
        let mut mock = MockI2sBlock::new();
        enable_clock(&mut mock);
        mock.set_tx_fifo_empty(false);
        mock.set_rx_data(true);
        mock.write(Bank::Control, CS_A, cs::TXCLR | cs::RXCLR | cs::EN).unwrap();
        let status = mock.read(Bank::Control, CS_A).unwrap();
        assert_eq!(status & (cs::TXCLR | cs::RXCLR), 0);
        assert_ne!(status & cs::TXE, 0);
        assert_eq!(status & cs::RXD, 0);
        assert_ne!(status & cs::EN, 0);
    }

    #[test]
    fn status_flags_are_read_only() {
        let mut mock = MockI2sBlock::new();
        mock.write(Bank::Control, CS_A, 0).unwrap();
        assert_ne!(mock.register(Bank::Control, CS_A) & cs::TXE, 0);
    }

    #[test]
    fn log_overflow_is_counted() {
        let mut mock = MockI2sBlock::new();
        for value in 0..300 {
            mock.write(Bank::Control, crate::registers::GRAY, value).unwrap();
        }
        assert_eq!(mock.writes().len(), WRITE_LOG_CAPACITY);
        assert_eq!(mock.write_count(), 300);
    }

    #[test]
    fn injected_bus_failure() {
        let mut mock = MockI2sBlock::new();
        mock.fail_bus(true);
        assert_eq!(mock.read(Bank::Control, CS_A), Err(MockBusError));
        assert_eq!(mock.write(Bank::Control, CS_A, 0), Err(MockBusError));
    }
}
