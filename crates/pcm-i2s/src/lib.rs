//! Driver for the PCM/I2S audio serial port and its clock generator.
//!
//! The crate turns stream parameters (rate, width, channels) and a codec
//! link format into register programming, and sequences the block through
//! its stream lifecycle. Register access goes through
//! [`platform::RegisterPort`], so the same code drives memory-mapped
//! hardware and the [`mock::MockI2sBlock`] used by the tests.
//!
//! # Layers
//!
//! ```text
//! StreamController     open / configure / prepare / trigger / close
//!        ↓
//! I2sBlock             start_clock / stop_clock / clear_fifos / write_frame
//!        ↓
//! ClockPlan, FrameFormat, registers   (pure calculation and encoding)
//!        ↓
//! RegisterPort         (platform crate)
//! ```
//!
//! # Example
//!
//! ```
//! use pcm_i2s::{DaiFormat, FormatRole, I2sBlock, StreamController, StreamParams, Trigger};
//! use pcm_i2s::mock::MockI2sBlock;
//! use platform::Direction;
//!
//! let mut i2s = StreamController::new(I2sBlock::new(MockI2sBlock::new()));
//! i2s.set_format(DaiFormat::i2s(FormatRole::BclkMasterFrameMaster));
//!
//! let params = StreamParams { sample_bits: 16, channels: 2, rate_hz: 48_000 };
//! i2s.open(Direction::Playback)?;
//! i2s.configure(Direction::Playback, params)?;
//! i2s.prepare(Direction::Playback)?;
//! i2s.trigger(Direction::Playback, Trigger::Start)?;
//! # Ok::<(), pcm_i2s::I2sError<pcm_i2s::mock::MockBusError>>(())
//! ```
//!
//! # Features
//!
//! - `defmt`: log through defmt and derive `defmt::Format` (hardware builds)
//! - `tracing`: log through tracing (host builds)
//! - `std`: standard library support in `platform`

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(clippy::unreachable)] // no unreachable!() that isn't documented
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
#![allow(clippy::doc_markdown)] // register names in doc comments
#![allow(clippy::must_use_candidate)] // register accessors: callers decide
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

// Declared before the log macros: `error!` would shadow the derive attribute.
pub mod error;

#[macro_use]
mod fmt;

pub mod block;
mod clock;
pub mod clock_plan;
pub mod controller;
pub mod dma;
pub mod frame_format;
pub mod mock;
pub mod pins;
pub mod poll;
pub mod registers;
pub mod sync;

pub use block::I2sBlock;
pub use clock_plan::{ClockDivider, ClockPlan, MashStage};
pub use controller::{RuntimeState, StreamController, StreamParams, StreamPhase, StreamSetup, Trigger};
pub use dma::DmaEndpoint;
pub use error::{ClockStopTimeout, ConfigError, I2sError, SyncTimeout};
pub use frame_format::{
    ChannelSlot, DaiFormat, DeviceConfig, FormatRole, FrameFormat, FrameGeometry, FrameProtocol,
};
pub use pins::{BoardRevision, PinBank, PinLayout};
pub use poll::{NoDelay, PollOutcome, PollPolicy};
pub use sync::Fifos;
