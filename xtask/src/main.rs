// Desktop tooling crate: unwrap/expect/panic acceptable in non-embedded code.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod check;
mod doc;
mod plan;
mod step;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "PCM/I2S driver development tasks", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the driver for bare-metal and host builds, then lint
    Check,
    /// Run all tests (unit, integration, doc)
    Test {
        /// Run only unit tests
        #[arg(long)]
        unit: bool,
        /// Run only integration tests
        #[arg(long)]
        integration: bool,
        /// Cases per proptest property (PROPTEST_CASES)
        #[arg(long)]
        cases: Option<u32>,
    },
    /// Build and optionally open documentation
    Doc {
        /// Open documentation in browser
        #[arg(long)]
        open: bool,
    },
    /// Print the clock plan and register words for a stream
    Plan {
        /// Sample rate in Hz
        #[arg(long, default_value_t = 48_000)]
        rate: u32,
        /// Sample width in bits (16, 24 or 32)
        #[arg(long, default_value_t = 16)]
        bits: u32,
        /// Fixed bit-clock ratio (bit clocks per frame)
        #[arg(long)]
        ratio: Option<u32>,
        /// Which side drives the clocks
        #[arg(long, value_enum, default_value_t = plan::Role::Master)]
        role: plan::Role,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => check::run(),
        Commands::Test { unit, integration, cases } => test::run(unit, integration, cases),
        Commands::Doc { open } => doc::run(open),
        Commands::Plan { rate, bits, ratio, role } => plan::run(rate, bits, ratio, role),
    }
}
