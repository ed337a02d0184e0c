//! FIFO clear with the two-clock SYNC handshake.
//!
//! Clearing a FIFO takes effect two bit-clock cycles after the clear bit is
//! written. The block offers no completion flag, but SYNC echoes a written
//! value after the same two cycles, so toggling SYNC and waiting for the
//! echo brackets the clear:
//!
//! ```text
//! snapshot TXON/RXON, clock ENAB
//! clock off?           -> start it (the handshake needs bit clocks)
//! clear run enables    (for the FIFOs being cleared)
//! set TXCLR/RXCLR
//! SYNC := !SYNC, poll until SYNC reads back flipped
//! clock started here?  -> stop it again
//! restore TXON/RXON    (from the snapshot)
//! ```
//!
//! The run enables and the clock are restored whether or not the echo
//! arrived.

use embedded_hal::delay::DelayNs;
use platform::{Bank, Direction, RegisterPort};

use crate::block::I2sBlock;
use crate::error::SyncTimeout;
use crate::poll::{poll_until, PollOutcome};
use crate::registers::{cs, CS_A};

/// Which FIFOs to clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Fifos {
    /// Transmit FIFO only.
    Tx,
    /// Receive FIFO only.
    Rx,
    /// Both FIFOs.
    Both,
}

impl Fifos {
    /// FIFO serving `dir`.
    pub const fn for_direction(dir: Direction) -> Self {
        match dir {
            Direction::Playback => Self::Tx,
            Direction::Capture => Self::Rx,
        }
    }

    /// Run-enable bits of the selected FIFOs.
    pub const fn run_mask(self) -> u32 {
        match self {
            Self::Tx => cs::TXON,
            Self::Rx => cs::RXON,
            Self::Both => cs::TXON | cs::RXON,
        }
    }

    /// Clear bits of the selected FIFOs.
    pub const fn clear_mask(self) -> u32 {
        match self {
            Self::Tx => cs::TXCLR,
            Self::Rx => cs::RXCLR,
            Self::Both => cs::TXCLR | cs::RXCLR,
        }
    }
}

impl<P: RegisterPort, D: DelayNs> I2sBlock<P, D> {
    /// Clear the selected FIFOs and wait for the SYNC echo.
    ///
    /// The outer `Result` carries transport errors. The inner one reports
    /// a handshake timeout, after which the FIFOs are cleared on a best
    /// effort basis; run enables and the clock are restored either way.
    pub fn clear_fifos(&mut self, which: Fifos) -> Result<Result<(), SyncTimeout>, P::Error> {
        let running = self.port.read(Bank::Control, CS_A)? & (cs::TXON | cs::RXON);
        let clock_was_running = self.clock_enabled()?;

        if !clock_was_running {
            self.start_clock()?;
        }

        self.port.update_bits(Bank::Control, CS_A, which.run_mask(), 0)?;
        self.port.update_bits(Bank::Control, CS_A, which.clear_mask(), which.clear_mask())?;

        let sync = self.port.read(Bank::Control, CS_A)? & cs::SYNC;
        self.port.update_bits(Bank::Control, CS_A, cs::SYNC, !sync)?;

        let port = &mut self.port;
        let outcome = poll_until::<_, P::Error, _>(self.policy, &mut self.delay, || {
            Ok(port.read(Bank::Control, CS_A)? & cs::SYNC != sync)
        })?;

        let result = match outcome {
            PollOutcome::Ready { attempts } => {
                trace!("FIFO sync after {} polls", attempts);
                Ok(())
            }
            PollOutcome::Exhausted { attempts } => {
                warn!("FIFO sync timeout after {} polls, bit clock missing?", attempts);
                Err(SyncTimeout { attempts })
            }
        };

        if !clock_was_running {
            // A forced stop is logged inside stop_clock and still leaves the clock off.
            let _ = self.stop_clock()?;
        }

        self.port.update_bits(Bank::Control, CS_A, cs::TXON | cs::RXON, running)?;
        Ok(result)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mock::MockI2sBlock;
    use crate::poll::{NoDelay, PollPolicy};
    use crate::registers::{clk, CLK_CTL};

    #[test]
    fn fifo_masks() {
        assert_eq!(Fifos::Both.run_mask(), cs::TXON | cs::RXON);
        assert_eq!(Fifos::for_direction(Direction::Capture), Fifos::Rx);
        assert_eq!(Fifos::Tx.clear_mask(), cs::TXCLR);
    }

    #[test]
    fn clears_and_toggles_sync() {
        let mut block = I2sBlock::new(MockI2sBlock::new());
        block.port_mut().set_tx_fifo_empty(false);
        block.port_mut().set_rx_data(true);

        assert_eq!(block.clear_fifos(Fifos::Both).unwrap(), Ok(()));

        let status = block.port().register(Bank::Control, CS_A);
        assert_ne!(status & cs::SYNC, 0);
        assert_ne!(status & cs::TXE, 0);
        assert_eq!(status & cs::RXD, 0);
    }

    #[test]
    fn temporary_clock_is_stopped_again() {
        let mut block = I2sBlock::new(MockI2sBlock::new());
        block.clear_fifos(Fifos::Tx).unwrap().unwrap();
        assert!(!block.port().clock_enabled());
    }

    #[test]
    fn running_clock_is_left_running() {
        let mut block = I2sBlock::new(MockI2sBlock::new());
        block.start_clock().unwrap();
        block.clear_fifos(Fifos::Tx).unwrap().unwrap();
        assert!(block.port().clock_enabled());
    }

    #[test]
    fn only_selected_direction_is_paused() {
        let mut block = I2sBlock::new(MockI2sBlock::new());
        block.start_clock().unwrap();
        block.set_running(Direction::Playback, true).unwrap();
        block.set_running(Direction::Capture, true).unwrap();
        block.port_mut().clear_log();

        block.clear_fifos(Fifos::Rx).unwrap().unwrap();

        let cs_writes: Vec<u32> = block
            .port()
            .writes()
            .iter()
            .filter(|w| w.bank == Bank::Control && w.offset == CS_A)
            .map(|w| w.value)
            .collect();
        assert!(cs_writes.iter().all(|value| value & cs::TXON != 0));
        assert!(cs_writes.iter().any(|value| value & cs::RXON == 0));
        let status = block.port().register(Bank::Control, CS_A);
        assert_eq!(status & (cs::TXON | cs::RXON), cs::TXON | cs::RXON);
    }

    #[test]
    fn timeout_restores_enables_and_clock() {
        let policy = PollPolicy { max_attempts: 50, delay_ns: 0 };
        let mock = MockI2sBlock::new().with_sync_latency(None);
        let mut block = I2sBlock::with_delay(mock, NoDelay, policy);
        block.start_clock().unwrap();
        block.set_running(Direction::Playback, true).unwrap();

        let outcome = block.clear_fifos(Fifos::Both).unwrap();
        assert_eq!(outcome, Err(SyncTimeout { attempts: 50 }));

        let status = block.port().register(Bank::Control, CS_A);
        assert_eq!(status & (cs::TXON | cs::RXON), cs::TXON);
        assert_ne!(block.port().register(Bank::Clock, CLK_CTL) & clk::ENAB, 0);
    }

    #[test]
    fn transport_error_propagates() {
        let mut block = I2sBlock::new(MockI2sBlock::new());
        block.port_mut().fail_bus(true);
        assert!(block.clear_fifos(Fifos::Both).is_err());
    }
}
