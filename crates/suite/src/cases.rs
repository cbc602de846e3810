//! Compression-invariance cases
//!
//! Each case records univariate statistics, flips the NULL-file compression
//! setting, makes GRASS write the NULL file again and checks that the
//! statistics still fit the first summary. A mismatch means compression
//! changed the logical content of a raster.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::info;

use nullcheck_core::{Engine, Error, Result, Session, Univariate};

use crate::config::SuiteConfig;

/// The available cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Case {
    /// Rewrite the NULL file of one map in place
    #[serde(rename = "null_file_compression_on_single_map")]
    SingleMap,
    /// Recompute `a + b` under the flipped setting
    #[serde(rename = "null_file_compression_on_mapcalc_addition")]
    MapcalcAddition,
}

impl Case {
    pub const ALL: [Case; 2] = [Case::SingleMap, Case::MapcalcAddition];

    pub fn name(self) -> &'static str {
        match self {
            Case::SingleMap => "null_file_compression_on_single_map",
            Case::MapcalcAddition => "null_file_compression_on_mapcalc_addition",
        }
    }

    /// Run the case against fixtures already created by [`crate::Fixture::set_up`]
    pub fn run<E: Engine>(self, session: &mut Session<E>, config: &SuiteConfig) -> Result<()> {
        match self {
            Case::SingleMap => null_file_compression_on_single_map(session, config),
            Case::MapcalcAddition => null_file_compression_on_mapcalc_addition(session, config),
        }
    }
}

impl fmt::Display for Case {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Case {
    type Err = Error;

    /// Accepts the full case name or the short forms `single-map` and
    /// `mapcalc-addition`.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "single_map" | "null_file_compression_on_single_map" => Ok(Case::SingleMap),
            "mapcalc_addition" | "null_file_compression_on_mapcalc_addition" => {
                Ok(Case::MapcalcAddition)
            }
            _ => Err(Error::InvalidParameter {
                name: "case",
                value: s.to_string(),
                reason: "use single-map or mapcalc-addition".to_string(),
            }),
        }
    }
}

/// Check that the statistics of `raster` fit `reference` within `precision`.
pub fn assert_raster_fits_univar<E: Engine>(
    session: &Session<E>,
    raster: &str,
    reference: &str,
    precision: f64,
) -> Result<()> {
    let reference_stats = Univariate::parse(reference)?;
    let actual_text = session.univar_text(raster)?;
    let actual = Univariate::parse(&actual_text)?;

    let mismatches = actual.mismatches(&reference_stats, precision);
    if mismatches.is_empty() {
        return Ok(());
    }
    Err(Error::StatisticsMismatch {
        raster: raster.to_string(),
        reference: reference.trim_end().to_string(),
        actual: actual_text.trim_end().to_string(),
        mismatches,
    })
}

/// Rewrite only the NULL file of map A under the flipped setting.
pub fn null_file_compression_on_single_map<E: Engine>(
    session: &mut Session<E>,
    config: &SuiteConfig,
) -> Result<()> {
    let map = &config.maps.map_a;

    let reference = session.univar_text(map)?;
    session.toggle_compression();
    session.recreate_null_file(map)?;

    assert_raster_fits_univar(session, map, &reference, config.precision)?;
    info!(map = %map, "statistics unchanged after NULL file rewrite");
    Ok(())
}

/// Compute `ab = a + b`, flip the setting, recompute `ab` and compare.
pub fn null_file_compression_on_mapcalc_addition<E: Engine>(
    session: &mut Session<E>,
    config: &SuiteConfig,
) -> Result<()> {
    let maps = &config.maps;
    let expression = format!("{} = {} + {}", maps.map_ab, maps.map_a, maps.map_b);

    session.mapcalc(&expression, true)?;
    let reference = session.univar_text(&maps.map_ab)?;

    session.toggle_compression();
    session.mapcalc(&expression, true)?;

    assert_raster_fits_univar(session, &maps.map_ab, &reference, config.precision)?;
    info!(map = %maps.map_ab, "statistics unchanged after recomputation");
    Ok(())
}
