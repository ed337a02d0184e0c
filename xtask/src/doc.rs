use anyhow::Result;
use colored::Colorize;
use std::time::Instant;

use crate::step::{self, Gate};

pub fn run(open: bool) -> Result<()> {
    println!();
    println!("{}", "📚 Building documentation...".cyan().bold());
    println!();

    let start = Instant::now();

    let mut args = vec!["doc", "--workspace", "--no-deps", "--document-private-items"];
    if open {
        args.push("--open");
    }
    step::cargo("Documentation build", &args, Gate::Fail)?;

    if !open {
        println!("   {}", "Open target/doc/pcm_i2s/index.html in your browser".dimmed());
        println!("   {}", "Or run 'cargo run -p xtask -- doc --open'".dimmed());
        println!();
    }

    step::finish("Documentation", start);
    Ok(())
}
