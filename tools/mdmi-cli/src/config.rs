//! Persistent CLI settings
//!
//! Read from `config.toml` in the platform configuration directory. Every
//! field is optional; command-line flags and environment variables take
//! precedence over anything set here.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Top-level configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub midi: MidiConfig,
    pub perf: PerfSection,
}

/// Port selection and dump timeout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MidiConfig {
    /// Output port used when neither `--port` nor `MDMI_MIDI_PORT` is set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_port: Option<String>,
    /// Input port used when neither `--input-port` nor `MDMI_MIDI_INPUT_PORT` is set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_port: Option<String>,
    /// Default dump timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: f64,
}

fn default_timeout_secs() -> f64 {
    5.0
}

impl Default for MidiConfig {
    fn default() -> Self {
        Self {
            output_port: None,
            input_port: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Defaults for `perf-test`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerfSection {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: f64,
    #[serde(default = "default_perf_timeout_secs")]
    pub timeout_secs: f64,
}

fn default_interval_secs() -> f64 {
    0.05
}

fn default_perf_timeout_secs() -> f64 {
    2.0
}

impl Default for PerfSection {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            timeout_secs: default_perf_timeout_secs(),
        }
    }
}

/// Returns the platform-specific configuration directory.
///
/// On Linux: `~/.config/mdmi`
/// Returns `None` if the home directory cannot be determined.
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("io", "mdmi", "mdmi").map(|dirs| dirs.config_dir().to_path_buf())
}

pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Loads the configuration from disk.
///
/// Returns default values if the file doesn't exist. A file that exists but
/// cannot be parsed is reported and ignored.
pub fn load() -> Config {
    let Some(path) = config_path() else {
        return Config::default();
    };
    let Ok(content) = std::fs::read_to_string(&path) else {
        return Config::default();
    };
    parse(&content).unwrap_or_else(|e| {
        warn!(path = %path.display(), "Ignoring invalid config file: {e}");
        Config::default()
    })
}

pub fn parse(content: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(content)
}

/// Converts a seconds value from a flag or config file to a [`Duration`].
///
/// Negative and non-finite values are rejected.
pub fn secs(value: f64) -> anyhow::Result<Duration> {
    Duration::try_from_secs_f64(value)
        .map_err(|_| anyhow::anyhow!("Invalid duration: {value} seconds"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.midi.output_port, None);
        assert_eq!(config.midi.input_port, None);
        assert_eq!(config.midi.timeout_secs, 5.0);
        assert_eq!(config.perf.interval_secs, 0.05);
        assert_eq!(config.perf.timeout_secs, 2.0);
    }

    #[test]
    fn test_parse_empty_file() {
        assert_eq!(parse("").unwrap(), Config::default());
    }

    #[test]
    fn test_parse_partial_file() {
        let config = parse(
            r#"
[midi]
output_port = "MDMI:MDMI MIDI 1 20:0"
timeout_secs = 1.5
"#,
        )
        .unwrap();
        assert_eq!(config.midi.output_port.as_deref(), Some("MDMI:MDMI MIDI 1 20:0"));
        assert_eq!(config.midi.input_port, None);
        assert_eq!(config.midi.timeout_secs, 1.5);
        assert_eq!(config.perf, PerfSection::default());
    }

    #[test]
    fn test_parse_rejects_wrong_types() {
        assert!(parse("[perf]\ninterval_secs = \"fast\"\n").is_err());
    }

    #[test]
    fn test_round_trip_through_toml() {
        let mut config = Config::default();
        config.midi.input_port = Some("MDMI In".to_string());
        config.perf.interval_secs = 0.1;
        let text = toml::to_string_pretty(&config).unwrap();
        assert_eq!(parse(&text).unwrap(), config);
    }

    #[test]
    fn test_secs() {
        assert_eq!(secs(0.05).unwrap(), Duration::from_millis(50));
        assert_eq!(secs(0.0).unwrap(), Duration::ZERO);
        assert!(secs(-1.0).is_err());
        assert!(secs(f64::NAN).is_err());
    }
}
