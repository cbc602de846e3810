//! Suite configuration

use serde::{Deserialize, Serialize};
use std::path::Path;

use nullcheck_core::{Bounds, EngineOptions, Error, NullCompression, Result, DEFAULT_PRECISION};

/// Names of the rasters created for each case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixtureMaps {
    /// Constant raster built in the small region
    pub without_nulls: String,
    /// Copy of `without_nulls` in the reference region, NULL outside the small extent
    pub map_a: String,
    /// Second, independently written copy
    pub map_b: String,
    /// `map_a + map_b`
    pub map_ab: String,
}

impl Default for FixtureMaps {
    fn default() -> Self {
        Self {
            without_nulls: "map_without_NULL".to_string(),
            map_a: "map_a_with_NULL".to_string(),
            map_b: "map_b_with_NULL".to_string(),
            map_ab: "maps_ab_with_NULL".to_string(),
        }
    }
}

impl FixtureMaps {
    /// All fixture names, in removal order
    pub fn all(&self) -> [&str; 4] {
        [&self.without_nulls, &self.map_a, &self.map_b, &self.map_ab]
    }
}

/// Everything the suite needs to know about the target mapset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Raster whose region serves as the larger reference extent
    pub reference_raster: String,
    /// Extent of the constant base raster
    pub small_region: Bounds,
    /// Tolerance for comparing statistics
    pub precision: f64,
    pub maps: FixtureMaps,
    /// Compression setting each case starts from
    pub initial_compression: NullCompression,
    pub engine: EngineOptions,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            reference_raster: "elevation".to_string(),
            small_region: Bounds {
                west: 637500.0,
                east: 637600.0,
                south: 221750.0,
                north: 221850.0,
            },
            precision: DEFAULT_PRECISION,
            maps: FixtureMaps::default(),
            initial_compression: NullCompression::from_process_env(),
            engine: EngineOptions::default(),
        }
    }
}

impl SuiteConfig {
    /// Load a JSON config file; omitted fields take their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.small_region.validate()?;

        validate_precision(self.precision)?;

        if self.reference_raster.trim().is_empty() {
            return Err(Error::InvalidParameter {
                name: "reference_raster",
                value: self.reference_raster.clone(),
                reason: "must not be empty".to_string(),
            });
        }

        let names = self.maps.all();
        for (i, name) in names.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(Error::InvalidParameter {
                    name: "maps",
                    value: format!("{:?}", self.maps),
                    reason: "map names must not be empty".to_string(),
                });
            }
            if names[..i].contains(name) {
                return Err(Error::InvalidParameter {
                    name: "maps",
                    value: name.to_string(),
                    reason: "map names must be distinct".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Reject tolerances that no statistic could ever fit
pub fn validate_precision(precision: f64) -> Result<()> {
    if !(precision.is_finite() && precision >= 0.0) {
        return Err(Error::InvalidParameter {
            name: "precision",
            value: precision.to_string(),
            reason: "must be a non-negative finite number".to_string(),
        });
    }
    Ok(())
}
