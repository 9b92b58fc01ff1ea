use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid command line flag")]
    InvalidFlag,
    #[error("Invalid command line flag value")]
    InvalidFlagValue,
}

/// Engine settings.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Number of sibling databases reachable through SELECT.
    pub databases: usize,
    /// Period of the active expiry sweep.
    pub sweep_interval: Duration,
    /// Default COUNT for SCAN and HSCAN.
    pub scan_count: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            databases: 16,
            sweep_interval: Duration::from_millis(100),
            scan_count: 10,
        }
    }
}

impl EngineConfig {
    /// Builds a config from `argv`-style arguments. The first item is the
    /// program name and is skipped.
    pub fn from_args<I: IntoIterator<Item = String>>(args: I) -> Result<Self, ConfigError> {
        let mut iter = args.into_iter().skip(1);
        let mut config = EngineConfig::default();

        while let Some(arg) = iter.next() {
            tracing::debug!(flag = %arg, "parsing engine flag");
            match arg.as_str() {
                "--databases" => {
                    let databases = parse_positive(iter.next())?;
                    config.databases = databases as usize;
                }
                "--sweep-interval-ms" => {
                    let millis = parse_positive(iter.next())?;
                    config.sweep_interval = Duration::from_millis(millis);
                }
                "--scan-count" => {
                    let count = parse_positive(iter.next())?;
                    config.scan_count = count as usize;
                }
                _ => return Err(ConfigError::InvalidFlag),
            }
        }

        Ok(config)
    }
}

fn parse_positive(value: Option<String>) -> Result<u64, ConfigError> {
    let Some(value) = value else {
        return Err(ConfigError::InvalidFlagValue);
    };

    match value.parse::<u64>() {
        Ok(number) if number > 0 => Ok(number),
        _ => Err(ConfigError::InvalidFlagValue),
    }
}
