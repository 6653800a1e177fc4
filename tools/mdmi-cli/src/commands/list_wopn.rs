//! List-wopn command - show the banks and instruments of a WOPN file

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, bail};
use clap::Args;
use mdmi_preset::{BankListing, PresetFormat, WopnListing, detect_format, list_wopn_contents};

/// Instruments shown per bank without `--full`
const PREVIEW_COUNT: usize = 10;

/// Arguments for the list-wopn command
#[derive(Args)]
pub struct ListWopnArgs {
    /// WOPN bank file
    pub file: PathBuf,

    /// Show every instrument instead of the first 10 per bank
    #[arg(long)]
    pub full: bool,

    /// Print the listing as JSON
    #[arg(long)]
    pub json: bool,
}

/// Execute the list-wopn command
pub fn execute(args: ListWopnArgs) -> Result<()> {
    let listing = read_listing(&args.file)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&listing)?);
    } else {
        print!("{}", format_listing(&listing, &args.file, args.full));
    }
    Ok(())
}

fn read_listing(path: &Path) -> Result<WopnListing> {
    let data =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    if detect_format(&data) != PresetFormat::Wopn {
        bail!("File is not a valid WOPN file");
    }
    list_wopn_contents(&data).with_context(|| format!("Failed to parse {}", path.display()))
}

pub(crate) fn format_listing(listing: &WopnListing, path: &Path, full: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "WOPN File: {}", path.display());
    let _ = writeln!(out, "{}", "=".repeat(50));

    for (title, banks) in [
        ("Melody Banks", &listing.melody_banks),
        ("Percussion Banks", &listing.percussion_banks),
    ] {
        if banks.is_empty() {
            continue;
        }
        let _ = writeln!(out, "\n{title}:");
        for bank in banks {
            format_bank(&mut out, bank, full);
        }
    }
    out
}

fn format_bank(out: &mut String, bank: &BankListing, full: bool) {
    let _ = writeln!(out, "  Bank {}: {}", bank.index, bank.name);
    let shown = if full {
        bank.instruments.len()
    } else {
        bank.instruments.len().min(PREVIEW_COUNT)
    };
    for instrument in &bank.instruments[..shown] {
        let _ = writeln!(out, "    {:3}: {}", instrument.index, instrument.name);
    }
    let hidden = bank.instruments.len() - shown;
    if hidden > 0 {
        let _ = writeln!(out, "    ... and {hidden} more (use --full to see all)");
    }
}
