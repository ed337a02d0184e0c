//! `xtask plan`: show what the driver would program for a stream, without
//! touching hardware.

use anyhow::{Context, Result};
use clap::ValueEnum;
use colored::Colorize;

use pcm_i2s::registers::{self, DreqLevels};
use pcm_i2s::{DaiFormat, DeviceConfig, FormatRole, StreamParams, StreamSetup};

/// Clock ownership, as seen from the PCM block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Role {
    /// Block drives bit clock and frame sync.
    Master,
    /// Block drives the bit clock only.
    BclkMaster,
    /// Block drives the frame sync only.
    FrameMaster,
    /// Codec drives both clocks.
    Slave,
}

impl From<Role> for FormatRole {
    fn from(role: Role) -> Self {
        match role {
            Role::Master => FormatRole::BclkMasterFrameMaster,
            Role::BclkMaster => FormatRole::BclkMasterFrameSlave,
            Role::FrameMaster => FormatRole::BclkSlaveFrameMaster,
            Role::Slave => FormatRole::BclkSlaveFrameSlave,
        }
    }
}

pub fn run(rate: u32, bits: u32, ratio: Option<u32>, role: Role) -> Result<()> {
    let mut config = DeviceConfig::default();
    config.apply_format(DaiFormat::i2s(role.into()));
    config.requested_bclk_ratio = ratio;

    let params = StreamParams { sample_bits: bits, channels: 2, rate_hz: rate };
    let setup = StreamSetup::negotiate(&config, params)
        .map_err(|err| anyhow::anyhow!("{err}"))
        .with_context(|| format!("{bits}-bit stream at {rate} Hz is not supported"))?;

    let plan = &setup.plan;
    println!();
    println!("{}", format!("⏱  {bits}-bit stereo at {rate} Hz ({role:?})").cyan().bold());
    println!("  bit clock      {} Hz ({} per frame)", plan.target_hz, plan.bclk_ratio);
    if config.is_bclk_master() {
        println!(
            "  source         {:?} / ({} + {}/4096) ({:?})",
            plan.source, plan.divider.integer_part, plan.divider.fractional_part, plan.mash
        );
        let achieved = plan.reconstructed_hz();
        let line = format!("  achieved       {achieved} Hz");
        if plan.is_exact() {
            println!("{}", line.green());
        } else {
            println!("{}", line.yellow());
        }
    } else {
        println!("{}", "  source         external (codec drives BCLK)".dimmed());
    }

    let geometry = &setup.geometry;
    println!();
    println!("  MODE_A         {:#010x}", registers::encode_mode(geometry));
    println!("  TXC_A / RXC_A  {:#010x}", registers::encode_channels(geometry.channel_slots));
    println!("  DREQ_A         {:#010x}", DreqLevels::TUNED.encode());
    if config.is_bclk_master() {
        println!("  CLK_CTL        {:#010x}", registers::encode_clock_control(plan.source, plan.mash));
        println!("  CLK_DIV        {:#010x}", registers::encode_divider(plan.divider));
    }
    println!();
    Ok(())
}
