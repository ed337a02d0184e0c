//! Hardware Abstraction Layer (HAL) for the PCM/I2S audio serial port
//!
//! This crate provides the trait-based seams and domain types that the
//! driver crate (`pcm-i2s`) consumes, enabling development and testing
//! without physical hardware.
//!
//! # Architecture Layers
//!
//! ```text
//! Audio stream framework (caller)
//!         ↓
//! Driver (pcm-i2s: clock plan, frame format, FIFO sync, lifecycle)
//!         ↓
//! Platform HAL (this crate - trait abstractions + fixed constants)
//!         ↓
//! Hardware Layer (MMIO transport, GPIO block)
//! ```
//!
//! # Modules
//!
//! - [`regmap`] - Register-bank access ([`RegisterPort`]) and a write-through cache
//! - [`gpio`] - Pin function multiplexing ([`PinMux`])
//! - [`clock_config`] - Clock-generator source catalog
//! - [`audio_config`] - DMA thresholds, stream capabilities, buffer limits
//! - [`audio_types`] - Sample rate / width / direction newtypes
//!
//! # Features
//!
//! - `std`: Enable standard library support (for testing)
//! - `defmt`: Enable defmt logging derives
//!
//! # Example
//!
//! ```
//! use platform::{Bank, RegisterPort};
//!
//! fn enable<P: RegisterPort>(port: &mut P) -> Result<(), P::Error> {
//!     port.update_bits(Bank::Control, 0x00, 1, 1)
//! }
//! ```

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
#![deny(unsafe_op_in_unsafe_fn)] // unsafe fn body is not implicitly unsafe block
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
// Pedantic lints suppressed for this hardware HAL crate:
#![allow(clippy::doc_markdown)] // register names in doc comments
#![allow(clippy::must_use_candidate)] // hardware accessors: callers decide
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod audio_config;
pub mod audio_types;
pub mod clock_config;
pub mod gpio;
pub mod regmap;

// Re-export the collaborator traits
pub use gpio::{PinFunction, PinMux};
pub use regmap::{Bank, RegisterCache, RegisterPort, RegmapConfig, RegmapError};

// Re-export domain types
pub use audio_config::{DaiCapabilities, I2sTuning, PcmHardware};
pub use audio_types::{Direction, OutOfRangeError, SampleRateHz, SampleWidth};
pub use clock_config::ClockSource;
