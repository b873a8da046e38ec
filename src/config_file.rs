//! Configuration file support
//!
//! Loads hinter configuration from TOML files.

use serde::{Deserialize, Serialize};
use std::path::Path;

use rtp_hint_lib::HintOptions;

use crate::config::{flag_names, parse_flags, HinterConfig, LogFormat};
use crate::error::Result;

/// Configuration file format
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Hinting settings
    pub hint: Option<HintSettings>,
    /// Logging settings
    pub logging: Option<LoggingSettings>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HintSettings {
    /// Maximum RTP packet size in bytes
    pub mtu: Option<u32>,
    /// Maximum packet duration in milliseconds
    pub max_ptime: Option<u32>,
    /// RTP clock rate
    pub rtp_rate: Option<u32>,
    /// Packing flag names applied to every track
    pub flags: Option<Vec<String>>,
    pub copy_data: Option<bool>,
    pub interleave: Option<bool>,
    /// Regular object descriptor profile
    pub regular_iod: Option<bool>,
    pub single_group: Option<bool>,
    /// Rewrite clock references to the root track
    pub force_ocr: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty)
    pub format: Option<LogFormat>,
}

impl ConfigFile {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: ConfigFile = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// Generate default configuration file
    pub fn default_config() -> Self {
        let defaults = HintOptions::default();
        Self {
            hint: Some(HintSettings {
                mtu: Some(defaults.mtu),
                max_ptime: Some(defaults.max_ptime),
                rtp_rate: Some(defaults.rtp_rate),
                flags: Some(flag_names(defaults.base_flags)),
                copy_data: Some(defaults.copy_data),
                interleave: Some(defaults.interleave),
                regular_iod: Some(defaults.regular_iod),
                single_group: Some(defaults.single_group),
                force_ocr: Some(defaults.force_ocr),
            }),
            logging: Some(LoggingSettings {
                level: "info".to_string(),
                format: Some(LogFormat::Pretty),
            }),
        }
    }

    /// Convert to HinterConfig. Unset values keep their defaults.
    pub fn into_hinter_config(self) -> Result<HinterConfig> {
        let mut config = HinterConfig::default();

        if let Some(hint) = self.hint {
            let options = &mut config.hint;
            options.mtu = hint.mtu.unwrap_or(options.mtu);
            options.max_ptime = hint.max_ptime.unwrap_or(options.max_ptime);
            options.rtp_rate = hint.rtp_rate.unwrap_or(options.rtp_rate);
            if let Some(names) = &hint.flags {
                options.base_flags = parse_flags(names)?;
            }
            options.copy_data = hint.copy_data.unwrap_or(options.copy_data);
            options.interleave = hint.interleave.unwrap_or(options.interleave);
            options.regular_iod = hint.regular_iod.unwrap_or(options.regular_iod);
            options.single_group = hint.single_group.unwrap_or(options.single_group);
            options.force_ocr = hint.force_ocr.unwrap_or(options.force_ocr);
        }

        if let Some(logging) = self.logging {
            config.log_level = logging.level;
            config.log_format = logging.format.unwrap_or_default();
        }
        Ok(config)
    }
}

/// Generate default configuration file at the specified path
pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
    let config = ConfigFile::default_config();
    config.to_file(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CliError;
    use rtp_hint_lib::PacketFlags;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = ConfigFile::default_config();
        assert_eq!(config.hint.as_ref().unwrap().mtu, Some(1450));
        assert_eq!(config.logging.as_ref().unwrap().level, "info");
    }

    #[test]
    fn test_config_file_roundtrip() {
        let config = ConfigFile::default_config();

        let temp_file = NamedTempFile::new().unwrap();
        config.to_file(temp_file.path()).unwrap();

        let loaded = ConfigFile::from_file(temp_file.path()).unwrap();
        assert_eq!(
            loaded.into_hinter_config().unwrap(),
            config.into_hinter_config().unwrap()
        );
    }

    #[test]
    fn test_into_hinter_config() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(
            temp_file,
            r#"
[hint]
mtu = 1200
flags = ["SIGNAL_RAP", "auto-carousel"]
interleave = true

[logging]
level = "debug"
format = "json"
"#
        )
        .unwrap();

        let config = ConfigFile::from_file(temp_file.path())
            .unwrap()
            .into_hinter_config()
            .unwrap();
        assert_eq!(config.hint.mtu, 1200);
        assert_eq!(
            config.hint.base_flags,
            PacketFlags::SIGNAL_RAP | PacketFlags::AUTO_CAROUSEL
        );
        assert!(config.hint.interleave);
        assert!(!config.hint.copy_data);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let temp_file = NamedTempFile::new().unwrap();
        let config = ConfigFile::from_file(temp_file.path())
            .unwrap()
            .into_hinter_config()
            .unwrap();
        assert_eq!(config, HinterConfig::default());
    }

    #[test]
    fn test_unknown_flag_is_rejected() {
        let file = ConfigFile {
            hint: Some(HintSettings {
                flags: Some(vec!["TURBO".to_string()]),
                ..Default::default()
            }),
            logging: None,
        };
        assert!(matches!(
            file.into_hinter_config(),
            Err(CliError::UnknownFlag(_))
        ));
    }
}
