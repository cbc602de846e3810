//! # Nullcheck Core
//!
//! Client-side building blocks for driving GRASS raster modules.
//!
//! This crate provides:
//! - `ModuleCall` / `ModuleOutput`: one module invocation and its captured output
//! - `Engine`: the trait that runs modules, with `ProcessEngine` for real GRASS
//! - `Session`: explicit context carrying the region and NULL-file compression setting
//! - `Univariate`: parsed `r.univar -g` summaries with tolerance comparison
//! - `NullCompression` / `NullFileStatus`: the compression flag and its on-disk status

pub mod compression;
pub mod engine;
pub mod error;
pub mod module;
pub mod region;
pub mod session;
pub mod univar;

pub use compression::{NullCompression, NullFileStatus, COMPRESS_NULLS_VAR};
pub use engine::{Engine, EngineOptions, ProcessEngine};
pub use error::{Error, KeyMismatch, Result};
pub use module::{ModuleCall, ModuleOutput};
pub use region::{Bounds, RegionSpec, TempRegion, WIND_OVERRIDE_VAR};
pub use session::Session;
pub use univar::{Univariate, UnivarValue, DEFAULT_PRECISION};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::compression::NullCompression;
    pub use crate::engine::{Engine, EngineOptions, ProcessEngine};
    pub use crate::error::{Error, Result};
    pub use crate::module::{ModuleCall, ModuleOutput};
    pub use crate::region::{Bounds, RegionSpec};
    pub use crate::session::Session;
    pub use crate::univar::Univariate;
}
