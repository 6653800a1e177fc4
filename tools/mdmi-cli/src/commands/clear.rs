//! Clear command - reset one program slot

use anyhow::Result;
use clap::Args;

use super::Context;

/// Arguments for the clear-preset command
#[derive(Args)]
pub struct ClearArgs {
    /// Program slot to clear (0-127)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=127))]
    pub program: u8,
}

/// Execute the clear-preset command
pub fn execute(args: ClearArgs, context: &Context) -> Result<()> {
    let mut session = context.open()?;
    session.clear_preset(args.program)?;
    session.close()?;
    println!("Successfully cleared preset {}", args.program);
    Ok(())
}
