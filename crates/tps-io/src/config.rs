//! Builder configuration (`tps.toml`).

use anyhow::{anyhow, Context, Result};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

use crate::case::{ComplexValue, LatticeSpec};

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct TpsConfig {
    /// Line model used by segments that do not specify one
    #[serde(default)]
    pub lattice: LatticeConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Default per-kilometre line parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LatticeConfig {
    /// Series impedance of every track, ohm/km
    #[serde(default = "default_series_impedance")]
    pub series_impedance: ComplexValue,
    /// Shunt admittance of every track, S/km
    #[serde(default = "default_shunt_admittance")]
    pub shunt_admittance: ComplexValue,
    /// Mutual impedance between any two tracks, ohm/km. No coupling when absent.
    #[serde(default)]
    pub mutual_impedance: Option<ComplexValue>,
}

impl Default for LatticeConfig {
    fn default() -> Self {
        Self {
            series_impedance: default_series_impedance(),
            shunt_admittance: default_shunt_admittance(),
            mutual_impedance: None,
        }
    }
}

impl LatticeConfig {
    pub fn to_spec(&self) -> LatticeSpec {
        LatticeSpec::Track {
            series_impedance: self.series_impedance,
            shunt_admittance: self.shunt_admittance,
            mutual_impedance: self.mutual_impedance,
            track_impedance: Default::default(),
        }
    }
}

fn default_series_impedance() -> ComplexValue {
    ComplexValue::from(Complex64::new(0.15, 0.65))
}

fn default_shunt_admittance() -> ComplexValue {
    ComplexValue::from(Complex64::new(0.0, 3.0e-6))
}

/// Output format of `tps build`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Dot,
}

impl FromStr for ExportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "dot" | "graphviz" => Ok(Self::Dot),
            other => Err(anyhow!("unsupported export format '{other}'")),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Dot => write!(f, "dot"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportConfig {
    #[serde(default)]
    pub format: ExportFormat,
    #[serde(default = "default_pretty")]
    pub pretty: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: ExportFormat::default(),
            pretty: default_pretty(),
        }
    }
}

fn default_pretty() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Read a configuration file.
pub fn load_config(path: &Path) -> Result<TpsConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading config '{}'", path.display()))?;
    toml::from_str(&contents).with_context(|| format!("parsing config '{}'", path.display()))
}

/// Read the configuration at `path`, or the defaults when no path is given.
pub fn load_config_or_default(path: Option<&Path>) -> Result<TpsConfig> {
    match path {
        Some(path) => load_config(path),
        None => Ok(TpsConfig::default()),
    }
}

/// Write a configuration file, creating parent directories.
pub fn save_config(path: &Path, config: &TpsConfig) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating config directory '{}'", dir.display()))?;
    }
    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents).with_context(|| format!("writing config '{}'", path.display()))?;
    Ok(())
}
