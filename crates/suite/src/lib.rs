//! # Nullcheck Suite
//!
//! Checks that GRASS NULL-file compression (`GRASS_COMPRESS_NULLS`) never
//! changes the logical content of a raster.
//!
//! ## Cases
//!
//! - **null_file_compression_on_single_map**: rewrite one map's NULL file
//!   under the opposite setting and compare `r.univar` output
//! - **null_file_compression_on_mapcalc_addition**: recompute `a + b` under
//!   the opposite setting and compare

pub mod cases;
pub mod config;
pub mod fixture;
pub mod runner;

pub use cases::{assert_raster_fits_univar, Case};
pub use config::{validate_precision, FixtureMaps, SuiteConfig};
pub use fixture::Fixture;
pub use runner::{CaseReport, Outcome, SuiteReport, SuiteRunner};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::cases::Case;
    pub use crate::config::SuiteConfig;
    pub use crate::runner::{Outcome, SuiteReport, SuiteRunner};
    pub use nullcheck_core::prelude::*;
}
