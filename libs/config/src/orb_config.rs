//! ORB Configuration Module
//!
//! Settings the framing layer consumes: the highest GIOP version spoken,
//! the java serialization extension flag, the addressing policy applied to
//! GIOP 1.2 target addresses, the request partitioning range, outbound byte
//! order, the inbound message size cap, frame read and write timeouts and
//! logging.
//!
//! Loading layers a TOML file under `GIOP_` environment overrides.

use crate::defaults;
use anyhow::{bail, Context, Result};
use config_crate::{Config, Environment, File, FileFormat};
use giop_types::{AddressingDisposition, ByteOrder, GiopVersion};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Main configuration structure
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct OrbConfig {
    pub giop: GiopSettings,
    pub addressing: AddressingSettings,
    pub partitioning: PartitioningSettings,
    pub timeouts: TimeoutSettings,
    pub logging: LoggingSettings,
}

/// Protocol-level settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct GiopSettings {
    /// Highest version accepted inbound and used by default outbound
    pub max_version: GiopVersion,
    /// Recognize the `0x0D` java serialization marker in the version bytes
    pub java_serialization: bool,
    /// Byte order for locally originated messages
    pub byte_order: ByteOrder,
    /// Maximum frame size before outbound messages are split into fragments
    pub fragment_size: u32,
    /// Inbound frames announcing more than this are rejected before the
    /// body is read
    pub max_message_size: u32,
}

impl Default for GiopSettings {
    fn default() -> Self {
        Self {
            max_version: GiopVersion::V1_2,
            java_serialization: false,
            byte_order: ByteOrder::BigEndian,
            fragment_size: defaults::giop::FRAGMENT_SIZE,
            max_message_size: defaults::giop::MAX_MESSAGE_SIZE,
        }
    }
}

/// How GIOP 1.2 target addresses are accepted
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AddressingPolicy {
    /// Only `KeyAddr` targets are accepted
    #[default]
    KeyAddr,
    ProfileAddr,
    ReferenceAddr,
    /// Any disposition is accepted
    HandleAll,
}

impl AddressingPolicy {
    /// The single disposition this policy insists on, `None` for `HandleAll`
    pub fn required_disposition(self) -> Option<AddressingDisposition> {
        match self {
            AddressingPolicy::KeyAddr => Some(AddressingDisposition::KeyAddr),
            AddressingPolicy::ProfileAddr => Some(AddressingDisposition::ProfileAddr),
            AddressingPolicy::ReferenceAddr => Some(AddressingDisposition::ReferenceAddr),
            AddressingPolicy::HandleAll => None,
        }
    }

    pub fn accepts(self, disposition: AddressingDisposition) -> bool {
        self.required_disposition()
            .map_or(true, |required| required == disposition)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AddressingSettings {
    pub policy: AddressingPolicy,
}

/// Proprietary request partitioning (thread pool id in header flag bits)
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct PartitioningSettings {
    /// When disabled outbound requests always carry the default id
    pub enabled: bool,
    pub min_id: u8,
    pub max_id: u8,
    /// Id used when the target profile carries no partitioning component
    pub default_id: u8,
}

impl Default for PartitioningSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            min_id: defaults::partitioning::MIN_ID,
            max_id: defaults::partitioning::MAX_ID,
            default_id: defaults::partitioning::DEFAULT_ID,
        }
    }
}

impl PartitioningSettings {
    pub fn contains(&self, id: i64) -> bool {
        id >= i64::from(self.min_id) && id <= i64::from(self.max_id)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct TimeoutSettings {
    pub header_read_ms: u64,
    pub body_read_ms: u64,
    pub write_ms: u64,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            header_read_ms: defaults::timeouts::HEADER_READ_MS,
            body_read_ms: defaults::timeouts::BODY_READ_MS,
            write_ms: defaults::timeouts::WRITE_MS,
        }
    }
}

impl TimeoutSettings {
    pub fn header_read(&self) -> Duration {
        Duration::from_millis(self.header_read_ms)
    }

    pub fn body_read(&self) -> Duration {
        Duration::from_millis(self.body_read_ms)
    }

    pub fn write(&self) -> Duration {
        Duration::from_millis(self.write_ms)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is not set
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: defaults::logging::LEVEL.to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl OrbConfig {
    /// Load configuration from a TOML file with `GIOP_` environment overrides
    ///
    /// Nested keys use a double underscore: `GIOP_TIMEOUTS__BODY_READ_MS=60000`.
    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading ORB configuration: {:?}", path);

        let config = Config::builder()
            .add_source(File::from(path).required(true))
            .add_source(
                Environment::with_prefix(defaults::ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let orb_config: OrbConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        orb_config.validate()?;
        debug!(max_version = %orb_config.giop.max_version, "ORB configuration loaded");
        Ok(orb_config)
    }

    /// Parse configuration from TOML text (no environment overrides)
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from_str(text, FileFormat::Toml))
            .build()
            .context("Failed to parse configuration")?;

        let orb_config: OrbConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        orb_config.validate()?;
        Ok(orb_config)
    }

    /// Render the configuration as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }

    /// Reject settings the framing layer cannot honor
    pub fn validate(&self) -> Result<()> {
        if self.giop.max_version.revision().is_none() {
            bail!(
                "Unsupported max GIOP version {} (supported: 1.0, 1.1, 1.2)",
                self.giop.max_version
            );
        }

        let fragment_size = self.giop.fragment_size;
        if fragment_size < defaults::giop::MIN_FRAGMENT_SIZE
            || fragment_size % defaults::giop::FRAGMENT_SIZE_MULTIPLE != 0
        {
            bail!(
                "Invalid fragment size {}: must be at least {} and a multiple of {}",
                fragment_size,
                defaults::giop::MIN_FRAGMENT_SIZE,
                defaults::giop::FRAGMENT_SIZE_MULTIPLE
            );
        }

        if self.giop.max_message_size < fragment_size {
            bail!(
                "Max message size {} is smaller than the fragment size {}",
                self.giop.max_message_size,
                fragment_size
            );
        }

        let p = &self.partitioning;
        if p.min_id > p.max_id || p.max_id > defaults::partitioning::MAX_ID {
            bail!(
                "Invalid request partitioning range [{}, {}]: need 0 <= min <= max <= {}",
                p.min_id,
                p.max_id,
                defaults::partitioning::MAX_ID
            );
        }
        if !p.contains(i64::from(p.default_id)) {
            bail!(
                "Default request partitioning id {} outside [{}, {}]",
                p.default_id,
                p.min_id,
                p.max_id
            );
        }

        let t = &self.timeouts;
        if t.header_read_ms == 0 || t.body_read_ms == 0 || t.write_ms == 0 {
            bail!("Frame read and write timeouts must be non-zero");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = OrbConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.giop.max_version, GiopVersion::V1_2);
        assert!(!config.giop.java_serialization);
        assert_eq!(config.addressing.policy, AddressingPolicy::KeyAddr);
        assert_eq!(config.partitioning.max_id, 63);
        assert_eq!(config.timeouts.header_read(), Duration::from_secs(5));
    }

    #[test]
    fn test_addressing_policy_accepts() {
        assert!(AddressingPolicy::HandleAll.accepts(AddressingDisposition::ReferenceAddr));
        assert!(AddressingPolicy::KeyAddr.accepts(AddressingDisposition::KeyAddr));
        assert!(!AddressingPolicy::KeyAddr.accepts(AddressingDisposition::ProfileAddr));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = OrbConfig::from_toml_str(
            r#"
[giop]
max_version = "1.1"
byte_order = "little_endian"

[addressing]
policy = "handle_all"
"#,
        )
        .unwrap();

        assert_eq!(config.giop.max_version, GiopVersion::V1_1);
        assert_eq!(config.giop.byte_order, ByteOrder::LittleEndian);
        assert_eq!(config.addressing.policy, AddressingPolicy::HandleAll);
        assert_eq!(config.timeouts, TimeoutSettings::default());
    }

    #[test]
    fn test_validate_rejects_bad_partitioning_range() {
        let mut config = OrbConfig::default();
        config.partitioning.min_id = 10;
        config.partitioning.max_id = 5;
        assert!(config.validate().is_err());

        config.partitioning.min_id = 0;
        config.partitioning.max_id = 64;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unsupported_version_and_zero_timeout() {
        let mut config = OrbConfig::default();
        config.giop.max_version = GiopVersion::new(1, 3);
        assert!(config.validate().is_err());

        let mut config = OrbConfig::default();
        config.timeouts.body_read_ms = 0;
        assert!(config.validate().is_err());

        let mut config = OrbConfig::default();
        config.timeouts.write_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_message_cap_below_fragment_size() {
        let mut config = OrbConfig::default();
        assert_eq!(config.giop.max_message_size, 16 * 1024 * 1024);
        config.giop.max_message_size = 512;
        assert!(config.validate().is_err());
        config.giop.max_message_size = 1024;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_unaligned_fragment_size() {
        let mut config = OrbConfig::default();
        config.giop.fragment_size = 100;
        assert!(config.validate().is_err());
        config.giop.fragment_size = 24;
        assert!(config.validate().is_err());
        config.giop.fragment_size = 64;
        assert!(config.validate().is_ok());
    }
}
