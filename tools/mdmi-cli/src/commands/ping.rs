//! Ping command - measure one round trip to the device

use std::time::Duration;

use anyhow::{Result, bail};
use clap::Args;
use mdmi_sysex::{FakeTransport, Hex, Outcome, Session, Transport, pong};

use super::Context;

/// Arguments for the ping command
#[derive(Args)]
pub struct PingArgs {
    /// Seconds to wait for the pong
    #[arg(long)]
    pub timeout: Option<f64>,

    /// Dry run only: make the fake device stay silent
    #[arg(long, hide = true)]
    pub no_response: bool,
}

/// Rough rating of a round-trip latency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatencyBand {
    Excellent,
    Good,
    Acceptable,
    High,
}

impl LatencyBand {
    pub fn from_ms(ms: f64) -> Self {
        if ms < 5.0 {
            LatencyBand::Excellent
        } else if ms < 10.0 {
            LatencyBand::Good
        } else if ms < 20.0 {
            LatencyBand::Acceptable
        } else {
            LatencyBand::High
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            LatencyBand::Excellent => "Excellent latency",
            LatencyBand::Good => "Good latency",
            LatencyBand::Acceptable => "Acceptable latency",
            LatencyBand::High => "High latency - check connections",
        }
    }
}

/// Execute the ping command
pub fn execute(args: PingArgs, context: &Context) -> Result<()> {
    let timeout = context.dump_timeout(args.timeout)?;
    let mut fake = FakeTransport::new().with_response_delay(Duration::from_millis(10));
    if args.no_response {
        fake = fake.without_responses();
    }

    let mut session = context.open_with(fake)?;
    let result = run(timeout, &mut session);
    session.close()?;
    result
}

pub(crate) fn run<T: Transport>(timeout: Duration, session: &mut Session<T>) -> Result<()> {
    let transport = session.transport();
    println!("Sending ping to {}...", transport.port_name());
    if let Some(input) = transport.input_port_name()
        && input != transport.port_name()
    {
        println!("Listening for pong on {input}...");
    }
    println!("Waiting for pong response (timeout: {}s)...", timeout.as_secs_f64());

    match session.ping(timeout)? {
        Outcome::Matched { elapsed, .. } => {
            let ms = elapsed.as_secs_f64() * 1000.0;
            println!("Pong received!");
            println!("Round-trip latency: {ms:.2} ms");
            println!("{}", LatencyBand::from_ms(ms).description());
            Ok(())
        }
        Outcome::TimedOut { timeout } => {
            println!("This could mean:");
            println!("  - MDMI is not connected or powered");
            println!("  - MIDI cables are not properly connected");
            println!("  - MIDI interface doesn't support input");
            bail!(
                "No pong response received within {} seconds",
                timeout.as_secs_f64()
            )
        }
        Outcome::Malformed { raw, .. } => {
            println!("Expected pong: {}", pong());
            bail!("Unexpected response: {}", Hex(&raw))
        }
    }
}
