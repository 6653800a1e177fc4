//! List-ports command - show the MIDI ports the system offers

use anyhow::Result;
use clap::Args;

use crate::midi::{PortList, list_ports};

/// Arguments for the list-ports command
#[derive(Args)]
pub struct ListPortsArgs {}

/// Execute the list-ports command
pub fn execute(_args: ListPortsArgs) -> Result<()> {
    let ports = list_ports()?;
    print!("{}", format_ports(&ports));
    Ok(())
}

fn format_ports(ports: &PortList) -> String {
    let mut out = String::from("Available MIDI ports:\n\n");
    for (title, names, empty) in [
        (
            "Output ports (for sending to MDMI):",
            &ports.outputs,
            "(No MIDI output ports found)",
        ),
        (
            "Input ports (for receiving from MDMI):",
            &ports.inputs,
            "(No MIDI input ports found)",
        ),
    ] {
        out.push_str(title);
        out.push('\n');
        if names.is_empty() {
            out.push_str(&format!("  {empty}\n"));
        }
        for name in names {
            out.push_str(&format!("  - {name}\n"));
        }
        out.push('\n');
    }
    out.push_str("Environment variables:\n");
    out.push_str("  MDMI_MIDI_PORT       - Default output port\n");
    out.push_str("  MDMI_MIDI_INPUT_PORT - Default input port\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_ports() {
        let ports = PortList {
            outputs: vec!["MDMI Out".to_string()],
            inputs: Vec::new(),
        };
        let text = format_ports(&ports);
        assert!(text.contains("Output ports (for sending to MDMI):\n  - MDMI Out\n"));
        assert!(text.contains("(No MIDI input ports found)"));
        assert!(text.contains("MDMI_MIDI_INPUT_PORT"));
    }
}
