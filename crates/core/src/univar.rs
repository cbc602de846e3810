//! Univariate raster statistics
//!
//! Parses the shell-style output of `r.univar -g`:
//!
//! ```text
//! n=2500
//! null_cells=6500
//! cells=9000
//! min=1
//! max=1
//! mean=1
//! ...
//! ```
//!
//! and compares two summaries key by key within a numeric tolerance.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, KeyMismatch, Result};

/// Tolerance used when comparing statistics
pub const DEFAULT_PRECISION: f64 = 0.0001;

/// A single statistic value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UnivarValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl UnivarValue {
    /// Integer if possible, then float, otherwise raw text
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if let Ok(i) = raw.parse::<i64>() {
            return Self::Int(i);
        }
        match raw.parse::<f64>() {
            Ok(f) => Self::Float(f),
            Err(_) => Self::Text(raw.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::Text(_) => None,
        }
    }

    /// Equality under `precision`.
    ///
    /// Two integers compare exactly unless the precision is at least 1.
    /// NaN matches NaN so empty maps compare equal to themselves.
    pub fn approx_eq(&self, other: &Self, precision: f64) -> bool {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => {
                if precision >= 1.0 {
                    a.abs_diff(*b) as f64 <= precision
                } else {
                    a == b
                }
            }
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Text(_), _) | (_, Self::Text(_)) => false,
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) if x.is_nan() || y.is_nan() => x.is_nan() && y.is_nan(),
                (Some(x), Some(y)) => (x - y).abs() <= precision,
                _ => false,
            },
        }
    }
}

impl fmt::Display for UnivarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Ordered `key=value` summary of a raster's non-NULL cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Univariate {
    entries: Vec<(String, UnivarValue)>,
}

impl Univariate {
    /// Parse `key=value` lines. Blank lines are skipped; any other line
    /// without `=` is an error.
    pub fn parse(text: &str) -> Result<Self> {
        let mut entries: Vec<(String, UnivarValue)> = Vec::new();
        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let (key, value) = line.split_once('=').ok_or_else(|| Error::Parse {
                what: "univariate statistics",
                input: line.to_string(),
            })?;
            let key = key.trim().to_string();
            let value = UnivarValue::parse(value);
            match entries.iter_mut().find(|(k, _)| *k == key) {
                Some(slot) => slot.1 = value,
                None => entries.push((key, value)),
            }
        }
        Ok(Self { entries })
    }

    pub fn get(&self, key: &str) -> Option<&UnivarValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &UnivarValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Keys of `reference` whose value is missing here or differs by more
    /// than `precision`. Keys present only in `self` are ignored.
    pub fn mismatches(&self, reference: &Univariate, precision: f64) -> Vec<KeyMismatch> {
        reference
            .iter()
            .filter_map(|(key, expected)| match self.get(key) {
                Some(actual) if actual.approx_eq(expected, precision) => None,
                actual => Some(KeyMismatch {
                    key: key.to_string(),
                    reference: expected.to_string(),
                    actual: actual.map(ToString::to_string),
                }),
            })
            .collect()
    }

    /// True when every reference key matches within `precision`
    pub fn fits(&self, reference: &Univariate, precision: f64) -> bool {
        self.mismatches(reference, precision).is_empty()
    }
}

impl fmt::Display for Univariate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.entries {
            writeln!(f, "{key}={value}")?;
        }
        Ok(())
    }
}
