//! Clock generator start / stop.
//!
//! Stopping is a two-step protocol: clear ENAB, then wait for BUSY to drop.
//! A generator that never goes idle is killed, which always stops it but
//! may leave a glitch on the bit-clock line.

use embedded_hal::delay::DelayNs;
use platform::{Bank, RegisterPort};

use crate::block::I2sBlock;
use crate::error::ClockStopTimeout;
use crate::poll::{poll_until, PollOutcome};
use crate::registers::{clk, CLK_CTL};

impl<P: RegisterPort, D: DelayNs> I2sBlock<P, D> {
    /// Generator enable bit as currently programmed.
    pub fn clock_enabled(&mut self) -> Result<bool, P::Error> {
        Ok(self.port.read(Bank::Clock, CLK_CTL)? & clk::ENAB != 0)
    }

    /// Enable the generator. Clears a KILL left by an earlier forced stop.
    pub fn start_clock(&mut self) -> Result<(), P::Error> {
        self.port.update_bits(
            Bank::Clock,
            CLK_CTL,
            clk::PASSWD_MASK | clk::ENAB | clk::KILL,
            clk::PASSWD | clk::ENAB,
        )
    }

    /// Disable the generator and wait for it to go idle.
    ///
    /// The outer `Result` carries transport errors. The inner one reports a
    /// forced stop: BUSY never dropped within the poll budget and the
    /// generator was killed.
    pub fn stop_clock(&mut self) -> Result<Result<(), ClockStopTimeout>, P::Error> {
        self.port.update_bits(Bank::Clock, CLK_CTL, clk::PASSWD_MASK | clk::ENAB, clk::PASSWD)?;

        let port = &mut self.port;
        let outcome = poll_until::<_, P::Error, _>(self.policy, &mut self.delay, || {
            Ok(port.read(Bank::Clock, CLK_CTL)? & clk::BUSY == 0)
        })?;

        match outcome {
            PollOutcome::Ready { attempts } => {
                trace!("clock idle after {} polls", attempts);
                Ok(Ok(()))
            }
            PollOutcome::Exhausted { attempts } => {
                error!("clock still busy after {} polls, killing generator", attempts);
                self.port.update_bits(
                    Bank::Clock,
                    CLK_CTL,
                    clk::KILL | clk::PASSWD_MASK,
                    clk::KILL | clk::PASSWD,
                )?;
                Ok(Err(ClockStopTimeout { attempts }))
            }
        }
    }
}
