//! Stream lifecycle for one PCM/I2S interface.
//!
//! Playback and capture share the block: one clock generator, one frame
//! format, one MODE register. The controller sequences the shared
//! resources so that either direction can be opened, configured, started,
//! stopped and closed while the other one runs.
//!
//! # Lifecycle
//!
//! ```text
//!  Idle ──open──► ClockArmed ──configure──► ConfiguredUnarmed ──trigger(Start)──► Running
//!   ▲                                          ▲     │                             │
//!   │                                          │  prepare                   trigger(Stop)
//!   │                                       prepare  (start clock,               │
//!   │                                          │      clear dirty FIFO)          ▼
//!   └────────────────── close (last direction) ┴────────────────────────────── Stopping
//! ```
//!
//! Register writes made by `configure` affect both directions, so it is a
//! no-op while either run enable is set in hardware. The parameters the
//! running direction negotiated stay in effect.

use embedded_hal::delay::DelayNs;
use platform::audio_config::PCM_I2S_CAPABILITIES;
use platform::{DaiCapabilities, Direction, RegisterPort, SampleRateHz, SampleWidth};

use crate::block::I2sBlock;
use crate::clock_plan::ClockPlan;
use crate::error::{ConfigError, I2sError};
use crate::frame_format::{DaiFormat, DeviceConfig, FrameFormat, FrameGeometry};
use crate::poll::NoDelay;
use crate::registers::cs;
use crate::sync::Fifos;

/// Stream parameters from the audio framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StreamParams {
    /// Bits per sample.
    pub sample_bits: u32,
    /// Channels per frame.
    pub channels: u32,
    /// Frames per second.
    pub rate_hz: u32,
}

/// Trigger commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Trigger {
    /// Start transferring.
    Start,
    /// Stop transferring.
    Stop,
    /// Resume after system suspend.
    Resume,
    /// Stop for system suspend.
    Suspend,
    /// Leave pause.
    PauseRelease,
    /// Enter pause.
    PausePush,
}

impl Trigger {
    /// Commands that start the direction.
    pub const fn is_start(self) -> bool {
        matches!(self, Self::Start | Self::Resume | Self::PauseRelease)
    }
}

/// Driver-side view of the shared hardware.
///
/// The default matches a block out of reset: disabled, RAMs in standby.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RuntimeState {
    /// Clock generator enabled by the controller.
    pub clock_running: bool,
    /// Block enable (EN) set.
    pub module_enabled: bool,
    /// FIFO RAMs in standby (STBY clear).
    pub standby: bool,
    /// Transmit run enable set.
    pub tx_active: bool,
    /// Receive run enable set.
    pub rx_active: bool,
    /// Playback direction opened.
    pub tx_open: bool,
    /// Capture direction opened.
    pub rx_open: bool,
}

impl Default for RuntimeState {
    fn default() -> Self {
        Self {
            clock_running: false,
            module_enabled: false,
            standby: true,
            tx_active: false,
            rx_active: false,
            tx_open: false,
            rx_open: false,
        }
    }
}

impl RuntimeState {
    /// Run enable of `dir` set.
    pub const fn is_active(&self, dir: Direction) -> bool {
        match dir {
            Direction::Playback => self.tx_active,
            Direction::Capture => self.rx_active,
        }
    }

    /// `dir` opened.
    pub const fn is_open(&self, dir: Direction) -> bool {
        match dir {
            Direction::Playback => self.tx_open,
            Direction::Capture => self.rx_open,
        }
    }

    /// Either direction running.
    pub const fn any_active(&self) -> bool {
        self.tx_active || self.rx_active
    }

    /// Either direction opened.
    pub const fn any_open(&self) -> bool {
        self.tx_open || self.rx_open
    }

    fn set_active(&mut self, dir: Direction, on: bool) {
        match dir {
            Direction::Playback => self.tx_active = on,
            Direction::Capture => self.rx_active = on,
        }
    }

    fn set_open(&mut self, dir: Direction, on: bool) {
        match dir {
            Direction::Playback => self.tx_open = on,
            Direction::Capture => self.rx_open = on,
        }
    }
}

/// Lifecycle phase of the interface as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StreamPhase {
    /// Nothing open.
    Idle,
    /// Opened; block enabled with the clock forced off.
    ClockArmed,
    /// Registers programmed, no direction running.
    ConfiguredUnarmed,
    /// At least one direction running.
    Running,
    /// Last running direction stopped; awaiting prepare or close.
    Stopping,
}

/// Validated clock plan and frame geometry for one configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StreamSetup {
    /// Sample width.
    pub width: SampleWidth,
    /// Sample rate.
    pub rate: SampleRateHz,
    /// Bit-clock plan.
    pub plan: ClockPlan,
    /// Frame layout.
    pub geometry: FrameGeometry,
}

impl StreamSetup {
    /// Stream parameters the interface advertises to the audio framework.
    pub const CAPABILITIES: DaiCapabilities = PCM_I2S_CAPABILITIES;

    /// Validate `params` against `config` and derive everything the
    /// registers need. Pure; nothing is written.
    pub fn negotiate(config: &DeviceConfig, params: StreamParams) -> Result<Self, ConfigError> {
        let rate = SampleRateHz::new(params.rate_hz)
            .map_err(|err| ConfigError::UnsupportedSampleRate(err.value))?;
        let width = SampleWidth::from_bits(params.sample_bits)
            .ok_or(ConfigError::UnsupportedSampleWidth(params.sample_bits))?;

        let plan = ClockPlan::for_stream(width, rate, config.requested_bclk_ratio, config.is_full_master());
        let geometry = FrameFormat::compute(width.bits(), params.channels, plan.bclk_ratio, config)?;

        if config.is_bclk_master() && !plan.divider.fits_register() {
            return Err(ConfigError::UnreachableBitClock(plan.target_hz));
        }

        Ok(Self { width, rate, plan, geometry })
    }
}

/// Lifecycle controller for one PCM/I2S interface.
pub struct StreamController<P, D = NoDelay> {
    block: I2sBlock<P, D>,
    config: DeviceConfig,
    state: RuntimeState,
    phase: StreamPhase,
    setup: Option<StreamSetup>,
}

impl<P: RegisterPort, D: DelayNs> StreamController<P, D> {
    /// Attach to a block. Nothing is written until the first `open`.
    pub fn new(block: I2sBlock<P, D>) -> Self {
        Self {
            block,
            config: DeviceConfig::default(),
            state: RuntimeState::default(),
            phase: StreamPhase::Idle,
            setup: None,
        }
    }

    /// Store the codec link format. Takes effect at the next `configure`.
    pub fn set_format(&mut self, format: DaiFormat) {
        self.config.apply_format(format);
    }

    /// Force the bit clocks per frame. 0 restores the width default.
    pub fn set_bclk_ratio(&mut self, ratio: u32) {
        self.config.requested_bclk_ratio = (ratio != 0).then_some(ratio);
    }

    /// Current device configuration.
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Driver-side hardware state.
    pub fn state(&self) -> RuntimeState {
        self.state
    }

    /// Lifecycle phase.
    pub fn phase(&self) -> StreamPhase {
        self.phase
    }

    /// Setup programmed by the last effective `configure`.
    pub fn setup(&self) -> Option<&StreamSetup> {
        self.setup.as_ref()
    }

    /// Underlying register block.
    pub fn block(&self) -> &I2sBlock<P, D> {
        &self.block
    }

    /// Mutable access to the register block.
    pub fn block_mut(&mut self) -> &mut I2sBlock<P, D> {
        &mut self.block
    }

    /// Open `dir`. The first open enables the block with the clock off.
    pub fn open(&mut self, dir: Direction) -> Result<(), I2sError<P::Error>> {
        if !self.state.any_open() {
            self.stop_clock()?;
            self.block.set_enabled(true).map_err(I2sError::Bus)?;
            self.state.module_enabled = true;
            self.block.release_standby().map_err(I2sError::Bus)?;
            self.state.standby = false;
            self.phase = StreamPhase::ClockArmed;
            info!("PCM block enabled");
        }
        self.state.set_open(dir, true);
        Ok(())
    }

    /// Program clock, frame format and DMA levels for `params`.
    ///
    /// Succeeds without touching any register while either direction runs.
    /// Otherwise everything is validated before the first write.
    pub fn configure(&mut self, dir: Direction, params: StreamParams) -> Result<(), I2sError<P::Error>> {
        let status = self.block.status().map_err(I2sError::Bus)?;
        if status & (cs::TXON | cs::RXON) != 0 {
            debug!("configure while running, keeping current format");
            return Ok(());
        }

        let setup = StreamSetup::negotiate(&self.config, params)?;
        debug!(
            "configure: {} Hz x {} bit, ratio {}, divider {}.{}",
            setup.rate.get(),
            setup.width.bits(),
            setup.plan.bclk_ratio,
            setup.plan.divider.integer_part,
            setup.plan.divider.fractional_part,
        );

        if self.config.is_bclk_master() {
            self.block.program_clock(&setup.plan).map_err(I2sError::Bus)?;
            self.state.clock_running = false;
        }
        self.block.write_frame(&setup.geometry).map_err(I2sError::Bus)?;

        // Timeout already logged; configuration stands.
        let _ = self.block.clear_fifos(Fifos::Both).map_err(I2sError::Bus)?;

        self.setup = Some(setup);
        if !self.state.any_active() {
            self.phase = StreamPhase::ConfiguredUnarmed;
        }
        trace!("configured for {}", dir_name(dir));
        Ok(())
    }

    /// Start the clock and drop stale samples left in `dir`'s FIFO.
    pub fn prepare(&mut self, dir: Direction) -> Result<(), I2sError<P::Error>> {
        self.start_clock()?;

        let status = self.block.status().map_err(I2sError::Bus)?;
        let dirty = match dir {
            Direction::Playback => status & cs::TXE == 0,
            Direction::Capture => status & cs::RXD != 0,
        };
        if dirty {
            debug!("clearing stale {} FIFO", dir_name(dir));
            let _ = self.block.clear_fifos(Fifos::for_direction(dir)).map_err(I2sError::Bus)?;
        }

        if self.phase == StreamPhase::Stopping {
            self.phase = StreamPhase::ConfiguredUnarmed;
        }
        Ok(())
    }

    /// Start or stop `dir`.
    pub fn trigger(&mut self, dir: Direction, command: Trigger) -> Result<(), I2sError<P::Error>> {
        if command.is_start() {
            self.start_clock()?;
            self.block.set_running(dir, true).map_err(I2sError::Bus)?;
            self.state.set_active(dir, true);
            self.phase = StreamPhase::Running;
            Ok(())
        } else {
            self.stop_direction(dir)
        }
    }

    /// Close `dir`. The last close disables the block and stops the clock.
    pub fn close(&mut self, dir: Direction) -> Result<(), I2sError<P::Error>> {
        self.stop_direction(dir)?;
        self.state.set_open(dir, false);

        if !self.state.any_open() {
            self.block.set_enabled(false).map_err(I2sError::Bus)?;
            self.state.module_enabled = false;
            self.block.enter_standby().map_err(I2sError::Bus)?;
            self.state.standby = true;
            self.stop_clock()?;
            self.setup = None;
            self.phase = StreamPhase::Idle;
            info!("PCM block disabled");
        }
        Ok(())
    }

    /// Return the block to its detached state regardless of open streams.
    pub fn detach(&mut self) -> Result<(), I2sError<P::Error>> {
        self.block.set_running(Direction::Playback, false).map_err(I2sError::Bus)?;
        self.block.set_running(Direction::Capture, false).map_err(I2sError::Bus)?;
        self.block.set_enabled(false).map_err(I2sError::Bus)?;
        self.block.enter_standby().map_err(I2sError::Bus)?;
        self.stop_clock()?;
        self.state = RuntimeState::default();
        self.setup = None;
        self.phase = StreamPhase::Idle;
        Ok(())
    }

    /// Release the register block.
    pub fn into_block(self) -> I2sBlock<P, D> {
        self.block
    }

    fn stop_direction(&mut self, dir: Direction) -> Result<(), I2sError<P::Error>> {
        self.block.set_running(dir, false).map_err(I2sError::Bus)?;
        self.state.set_active(dir, false);

        if !self.state.any_active() {
            if self.phase == StreamPhase::Running {
                self.phase = StreamPhase::Stopping;
            }
            if !self.config.continue_clock_on_idle {
                self.stop_clock()?;
            }
        }
        Ok(())
    }

    fn start_clock(&mut self) -> Result<(), I2sError<P::Error>> {
        if self.config.is_bclk_master() {
            self.block.start_clock().map_err(I2sError::Bus)?;
            self.state.clock_running = true;
        }
        Ok(())
    }

    fn stop_clock(&mut self) -> Result<(), I2sError<P::Error>> {
        // A forced stop is logged by the block; the clock is off either way.
        let _ = self.block.stop_clock().map_err(I2sError::Bus)?;
        self.state.clock_running = false;
        Ok(())
    }
}

fn dir_name(dir: Direction) -> &'static str {
    match dir {
        Direction::Playback => "playback",
        Direction::Capture => "capture",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::frame_format::FormatRole;
    use crate::mock::MockI2sBlock;
    use crate::registers::{clk, CLK_CTL, CS_A};
    use platform::Bank;

    fn controller(role: FormatRole) -> StreamController<MockI2sBlock> {
        let mut controller = StreamController::new(I2sBlock::new(MockI2sBlock::new()));
        controller.set_format(DaiFormat::i2s(role));
        controller
    }

    const CD_QUALITY: StreamParams = StreamParams { sample_bits: 16, channels: 2, rate_hz: 48_000 };

    #[test]
    fn trigger_aliases() {
        assert!(Trigger::Resume.is_start());
        assert!(Trigger::PauseRelease.is_start());
        assert!(!Trigger::Suspend.is_start());
        assert!(!Trigger::PausePush.is_start());
    }

    #[test]
    fn negotiate_rejects_before_planning() {
        let config = *controller(FormatRole::BclkMasterFrameMaster).config();
        let err = StreamSetup::negotiate(&config, StreamParams { sample_bits: 20, ..CD_QUALITY });
        assert_eq!(err, Err(ConfigError::UnsupportedSampleWidth(20)));
        let err = StreamSetup::negotiate(&config, StreamParams { rate_hz: 4_000, ..CD_QUALITY });
        assert_eq!(err, Err(ConfigError::UnsupportedSampleRate(4_000)));
    }

    #[test]
    fn advertised_capabilities_always_negotiate() {
        let config = *controller(FormatRole::BclkMasterFrameMaster).config();
        let caps = StreamSetup::CAPABILITIES;
        for width in caps.widths {
            for rate_hz in [caps.rate_min_hz, 44_100, 48_000, 192_000, caps.rate_max_hz] {
                let params = StreamParams { sample_bits: width.bits(), channels: caps.channels_max, rate_hz };
                assert!(caps.accepts(*width, params.channels, rate_hz));
                let setup = StreamSetup::negotiate(&config, params).unwrap();
                assert!(setup.plan.divider.fits_register(), "{rate_hz} Hz / {width:?}");
            }
        }
        assert!(!caps.accepts(SampleWidth::S16, 1, 48_000));
    }

    #[test]
    fn open_enables_block_and_releases_standby() {
        let mut controller = controller(FormatRole::BclkMasterFrameMaster);
        controller.open(Direction::Playback).unwrap();
        let status = controller.block().port().register(Bank::Control, CS_A);
        assert_ne!(status & cs::EN, 0);
        assert_ne!(status & cs::STBY, 0);
        assert_eq!(controller.phase(), StreamPhase::ClockArmed);
        assert!(controller.state().module_enabled);
        assert!(!controller.state().standby);
    }

    #[test]
    fn last_close_returns_rams_to_standby() {
        let mut controller = controller(FormatRole::BclkMasterFrameMaster);
        assert!(controller.state().standby);
        controller.open(Direction::Playback).unwrap();
        controller.open(Direction::Capture).unwrap();

        controller.close(Direction::Playback).unwrap();
        assert!(!controller.state().standby);
        assert_ne!(controller.block().port().register(Bank::Control, CS_A) & cs::STBY, 0);

        controller.close(Direction::Capture).unwrap();
        assert!(controller.state().standby);
        assert_eq!(controller.block().port().register(Bank::Control, CS_A) & cs::STBY, 0);
    }

    #[test]
    fn slave_role_never_starts_clock() {
        let mut controller = controller(FormatRole::BclkSlaveFrameSlave);
        controller.open(Direction::Playback).unwrap();
        controller.configure(Direction::Playback, CD_QUALITY).unwrap();
        controller.prepare(Direction::Playback).unwrap();
        controller.trigger(Direction::Playback, Trigger::Start).unwrap();
        assert!(!controller.state().clock_running);
        assert_eq!(controller.block().port().register(Bank::Clock, CLK_CTL) & clk::ENAB, 0);
    }

    #[test]
    fn phases_follow_lifecycle() {
        let mut controller = controller(FormatRole::BclkMasterFrameMaster);
        assert_eq!(controller.phase(), StreamPhase::Idle);
        controller.open(Direction::Playback).unwrap();
        controller.configure(Direction::Playback, CD_QUALITY).unwrap();
        assert_eq!(controller.phase(), StreamPhase::ConfiguredUnarmed);
        controller.prepare(Direction::Playback).unwrap();
        controller.trigger(Direction::Playback, Trigger::Start).unwrap();
        assert_eq!(controller.phase(), StreamPhase::Running);
        controller.trigger(Direction::Playback, Trigger::Stop).unwrap();
        assert_eq!(controller.phase(), StreamPhase::Stopping);
        controller.prepare(Direction::Playback).unwrap();
        assert_eq!(controller.phase(), StreamPhase::ConfiguredUnarmed);
        controller.close(Direction::Playback).unwrap();
        assert_eq!(controller.phase(), StreamPhase::Idle);
        assert!(controller.setup().is_none());
    }

    #[test]
    fn bclk_ratio_zero_restores_default() {
        let mut controller = controller(FormatRole::BclkMasterFrameMaster);
        controller.set_bclk_ratio(64);
        assert_eq!(controller.config().requested_bclk_ratio, Some(64));
        controller.set_bclk_ratio(0);
        assert_eq!(controller.config().requested_bclk_ratio, None);
    }

    #[test]
    fn detach_resets_everything() {
        let mut controller = controller(FormatRole::BclkMasterFrameMaster);
        controller.open(Direction::Capture).unwrap();
        controller.configure(Direction::Capture, CD_QUALITY).unwrap();
        controller.trigger(Direction::Capture, Trigger::Start).unwrap();
        controller.detach().unwrap();

        assert_eq!(controller.state(), RuntimeState::default());
        assert_eq!(controller.phase(), StreamPhase::Idle);
        let status = controller.block().port().register(Bank::Control, CS_A);
        assert_eq!(status & (cs::EN | cs::STBY | cs::RXON | cs::TXON), 0);
        assert!(controller.state().standby);
        assert!(!controller.block().port().clock_enabled());
    }

    #[test]
    fn bus_error_surfaces() {
        let mut controller = controller(FormatRole::BclkMasterFrameMaster);
        controller.block_mut().port_mut().fail_bus(true);
        assert!(matches!(controller.open(Direction::Playback), Err(I2sError::Bus(_))));
    }
}
