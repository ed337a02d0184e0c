use anyhow::Result;
use colored::Colorize;
use std::time::Instant;

use crate::step::{self, Gate};

/// Bare-metal target the driver must keep building for.
const BARE_METAL_TARGET: &str = "aarch64-unknown-none";

pub fn run() -> Result<()> {
    println!();
    println!("{}", "🔍 Checking driver builds...".cyan().bold());
    println!();

    let total_start = Instant::now();

    // no_std with defmt logging, as on hardware
    step::cargo(
        "Checking pcm-i2s (no_std, defmt)",
        &["check", "-p", "pcm-i2s", "--target", BARE_METAL_TARGET, "--features", "defmt"],
        Gate::Fail,
    )?;

    step::cargo(
        "Checking platform crate (no_std)",
        &["check", "-p", "platform", "--target", BARE_METAL_TARGET, "--no-default-features"],
        Gate::Fail,
    )?;

    // Host build with tracing, as used by simulators and tests
    step::cargo(
        "Checking pcm-i2s (host, tracing)",
        &["check", "-p", "pcm-i2s", "--features", "tracing,std"],
        Gate::Fail,
    )?;

    step::cargo(
        "Running clippy lints",
        &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
        Gate::Warn,
    )?;

    if step::cargo("Checking code formatting", &["fmt", "--all", "--check"], Gate::Warn)?.is_none() {
        eprintln!("     Run 'cargo fmt --all' to fix");
    }

    step::finish("All checks", total_start);
    Ok(())
}
