//! Clear-all command - reset every program slot

use std::io::{BufRead, Write};

use anyhow::{Context as _, Result, bail};
use clap::Args;

use super::Context;

/// Arguments for the clear-all-presets command
#[derive(Args)]
pub struct ClearAllArgs {
    /// Skip the confirmation prompt
    #[arg(long)]
    pub confirm: bool,
}

/// Execute the clear-all-presets command
pub fn execute(args: ClearAllArgs, context: &Context) -> Result<()> {
    if !args.confirm {
        let stdin = std::io::stdin();
        if !confirm(&mut stdin.lock(), &mut std::io::stdout())? {
            bail!("Operation cancelled");
        }
    }

    let mut session = context.open()?;
    session.clear_all_presets()?;
    session.close()?;
    println!("Successfully cleared all presets");
    Ok(())
}

/// Ask before wiping the device; only `y`/`yes` proceeds
fn confirm(input: &mut impl BufRead, output: &mut impl Write) -> Result<bool> {
    write!(output, "This will clear ALL presets. Are you sure? [y/N]: ")?;
    output.flush()?;

    let mut answer = String::new();
    input
        .read_line(&mut answer)
        .context("Failed to read confirmation")?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::dry_run_context;

    #[test]
    fn test_confirm_answers() {
        for (answer, expected) in [("y\n", true), ("YES\n", true), ("n\n", false), ("\n", false), ("", false)] {
            let mut output = Vec::new();
            assert_eq!(confirm(&mut answer.as_bytes(), &mut output).unwrap(), expected);
            assert!(String::from_utf8(output).unwrap().contains("clear ALL presets"));
        }
    }

    #[test]
    fn test_clear_all_confirmed() {
        execute(ClearAllArgs { confirm: true }, &dry_run_context()).unwrap();
    }
}
