//! NULL-file compression setting and status query

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Environment variable read by GRASS when writing a raster's NULL file
pub const COMPRESS_NULLS_VAR: &str = "GRASS_COMPRESS_NULLS";

/// Whether GRASS should compress the NULL (no-data) bitmap it writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NullCompression {
    Enabled,
    #[default]
    Disabled,
}

impl NullCompression {
    /// Strict parse of `"1"` or `"0"`
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim() {
            "1" => Ok(Self::Enabled),
            "0" => Ok(Self::Disabled),
            other => Err(Error::InvalidParameter {
                name: COMPRESS_NULLS_VAR,
                value: other.to_string(),
                reason: "expected 0 or 1".to_string(),
            }),
        }
    }

    /// Interpret an environment value: only `"0"` disables, unset disables,
    /// anything else enables.
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("0") => Self::Disabled,
            Some(_) => Self::Enabled,
        }
    }

    /// Read the setting from this process's environment
    pub fn from_process_env() -> Self {
        Self::from_env_value(std::env::var(COMPRESS_NULLS_VAR).ok().as_deref())
    }

    pub fn as_env_value(self) -> &'static str {
        match self {
            Self::Enabled => "1",
            Self::Disabled => "0",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Enabled => Self::Disabled,
            Self::Disabled => Self::Enabled,
        }
    }
}

impl fmt::Display for NullCompression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enabled => write!(f, "enabled"),
            Self::Disabled => write!(f, "disabled"),
        }
    }
}

/// NULL-file compression state of one raster map, as reported by
/// `r.compress -g`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NullFileStatus {
    pub map: String,
    /// Last `|`-separated field of the report
    pub raw: String,
    pub compressed: bool,
}

impl NullFileStatus {
    /// Parse the shell-style report `name|type|compression|null_compression`.
    ///
    /// Only the last field of the last non-empty line is interpreted.
    pub fn parse(map: &str, stdout: &str) -> Result<Self> {
        let parse_err = || Error::Parse {
            what: "NULL file compression status",
            input: stdout.to_string(),
        };

        let line = stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .last()
            .ok_or_else(parse_err)?;
        let raw = line.rsplit('|').next().unwrap_or(line).trim();

        let compressed = match raw.to_ascii_uppercase().as_str() {
            "1" | "YES" => true,
            "0" | "NO" => false,
            _ => return Err(parse_err()),
        };

        Ok(Self {
            map: map.to_string(),
            raw: raw.to_string(),
            compressed,
        })
    }
}
