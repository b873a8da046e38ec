//! Hinter configuration

use serde::{Deserialize, Serialize};

use rtp_hint_lib::{HintOptions, PacketFlags};

use crate::error::{CliError, Result};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Resolved configuration for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HinterConfig {
    /// Options handed to the planner
    pub hint: HintOptions,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    pub log_format: LogFormat,
}

impl Default for HinterConfig {
    fn default() -> Self {
        Self {
            hint: HintOptions::default(),
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl HinterConfig {
    /// Default tracing filter directive for this tool and its library
    pub fn log_filter(&self) -> String {
        format!(
            "rtp_hinter={level},rtp_hint_lib={level}",
            level = self.log_level
        )
    }
}

/// Parse packing flag names (`SIGNAL_RAP`, `signal-rap`, ...) into a flag set
pub fn parse_flags<S: AsRef<str>>(names: &[S]) -> Result<PacketFlags> {
    let mut flags = PacketFlags::empty();
    for name in names {
        let normalized = name.as_ref().trim().to_ascii_uppercase().replace('-', "_");
        let flag = PacketFlags::from_name(&normalized)
            .ok_or_else(|| CliError::UnknownFlag(name.as_ref().to_string()))?;
        flags |= flag;
    }
    Ok(flags)
}

/// Names of the flags set in `flags`, in declaration order
pub fn flag_names(flags: PacketFlags) -> Vec<String> {
    flags
        .iter_names()
        .map(|(name, _)| name.to_string())
        .collect()
}
