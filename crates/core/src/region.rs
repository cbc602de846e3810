//! Computational region handling
//!
//! GRASS modules compute on the "current region". Instead of saving and
//! restoring the user's region, a [`TempRegion`] names a private region file
//! that is selected per call through `WIND_OVERRIDE`.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{Error, Result};
use crate::module::ModuleCall;

/// Environment variable selecting a named region for a single module run
pub const WIND_OVERRIDE_VAR: &str = "WIND_OVERRIDE";

/// Region extent in map units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub west: f64,
    pub east: f64,
    pub south: f64,
    pub north: f64,
}

impl Bounds {
    /// Create validated bounds
    pub fn new(west: f64, east: f64, south: f64, north: f64) -> Result<Self> {
        let bounds = Self { west, east, south, north };
        bounds.validate()?;
        Ok(bounds)
    }

    pub fn validate(&self) -> Result<()> {
        let all = [self.west, self.east, self.south, self.north];
        if all.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidParameter {
                name: "bounds",
                value: format!("{self:?}"),
                reason: "coordinates must be finite".to_string(),
            });
        }
        if self.west >= self.east {
            return Err(Error::InvalidParameter {
                name: "bounds",
                value: format!("w={} e={}", self.west, self.east),
                reason: "west must be less than east".to_string(),
            });
        }
        if self.south >= self.north {
            return Err(Error::InvalidParameter {
                name: "bounds",
                value: format!("s={} n={}", self.south, self.north),
                reason: "south must be less than north".to_string(),
            });
        }
        Ok(())
    }

    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    pub fn height(&self) -> f64 {
        self.north - self.south
    }
}

/// How to set the region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionSpec {
    /// Explicit extent, keeping the current resolution
    Bounds(Bounds),
    /// Extent and resolution of an existing raster map
    Raster(String),
}

impl RegionSpec {
    /// `g.region` call applying this spec
    pub fn to_call(&self) -> ModuleCall {
        let call = ModuleCall::new("g.region");
        match self {
            RegionSpec::Bounds(b) => call
                .param("w", b.west)
                .param("e", b.east)
                .param("s", b.south)
                .param("n", b.north),
            RegionSpec::Raster(name) => call.param("raster", name),
        }
    }
}

static TEMP_REGION_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Name of a private region file for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TempRegion {
    name: String,
}

impl TempRegion {
    /// Unique name within this process
    pub fn generate() -> Self {
        let n = TEMP_REGION_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self {
            name: format!("tmp.nullcheck_{}_{}", std::process::id(), n),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Copy the current region into the temporary region file
    pub fn save_call(&self) -> ModuleCall {
        ModuleCall::new("g.region")
            .param("save", &self.name)
            .overwrite(true)
    }

    /// Delete the temporary region file
    pub fn remove_call(&self) -> ModuleCall {
        ModuleCall::new("g.remove")
            .flag('f')
            .param("type", "region")
            .param("name", &self.name)
            .quiet(true)
    }
}
