//! Suite runner
//!
//! Mirrors a test class: a private region for the whole run, and for every
//! case a fresh fixture, the case itself, and an unconditional teardown.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{error, info};

use nullcheck_core::{Engine, RegionSpec, Result, Session};

use crate::cases::Case;
use crate::config::SuiteConfig;
use crate::fixture::{self, Fixture};

/// How a case ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "message", rename_all = "lowercase")]
pub enum Outcome {
    Passed,
    /// Statistics changed after toggling compression
    Failed(String),
    /// Setup or a module failed before the comparison
    Error(String),
}

impl Outcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, Outcome::Passed)
    }
}

/// Result of one case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseReport {
    pub case: Case,
    pub outcome: Outcome,
    pub elapsed: Duration,
}

/// Result of a whole run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuiteReport {
    pub cases: Vec<CaseReport>,
}

impl SuiteReport {
    pub fn passed(&self) -> bool {
        self.cases.iter().all(|c| c.outcome.is_passed())
    }

    pub fn failures(&self) -> impl Iterator<Item = &CaseReport> {
        self.cases.iter().filter(|c| !c.outcome.is_passed())
    }
}

/// Runs cases against one GRASS mapset.
pub struct SuiteRunner<E: Engine> {
    session: Session<E>,
    config: SuiteConfig,
}

impl<E: Engine> SuiteRunner<E> {
    pub fn new(engine: E, config: SuiteConfig) -> Result<Self> {
        config.validate()?;
        let session = Session::new(engine, config.initial_compression);
        Ok(Self { session, config })
    }

    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    pub fn session(&self) -> &Session<E> {
        &self.session
    }

    /// Run the given cases in order.
    ///
    /// Returns `Err` only if the class-level region setup fails; case
    /// failures are recorded in the report.
    pub fn run(&mut self, cases: &[Case]) -> Result<SuiteReport> {
        self.run_with(cases, |_| {})
    }

    /// Like [`run`](Self::run), calling `on_case` before each case starts.
    pub fn run_with<F: FnMut(Case)>(&mut self, cases: &[Case], mut on_case: F) -> Result<SuiteReport> {
        self.set_up_class()?;

        let mut report = SuiteReport::default();
        for &case in cases {
            on_case(case);
            report.cases.push(self.run_case(case));
        }

        self.tear_down_class();
        Ok(report)
    }

    fn set_up_class(&mut self) -> Result<()> {
        self.session.use_temp_region()?;
        let result = self
            .session
            .set_region(&RegionSpec::Raster(self.config.reference_raster.clone()));
        if result.is_err() {
            self.tear_down_class();
        }
        result
    }

    fn tear_down_class(&mut self) {
        if let Err(e) = self.session.del_temp_region() {
            error!(error = %e, "failed to remove temporary region");
        }
        self.session.set_compression(self.config.initial_compression);
    }

    fn run_case(&mut self, case: Case) -> CaseReport {
        let start = Instant::now();
        self.session.set_compression(self.config.initial_compression);
        info!(case = %case, compression = %self.session.compression(), "starting case");

        let outcome = match Fixture::set_up(&self.session, &self.config) {
            Ok(fixture) => {
                let result = case.run(&mut self.session, &self.config);
                fixture.tear_down(&self.session);
                outcome_of(result)
            }
            Err(e) => {
                fixture::remove_all(&self.session, &self.config.maps.all());
                Outcome::Error(format!("setup failed: {e}"))
            }
        };

        match &outcome {
            Outcome::Passed => info!(case = %case, "passed"),
            Outcome::Failed(msg) | Outcome::Error(msg) => error!(case = %case, "{msg}"),
        }

        CaseReport {
            case,
            outcome,
            elapsed: start.elapsed(),
        }
    }
}

fn outcome_of(result: Result<()>) -> Outcome {
    match result {
        Ok(()) => Outcome::Passed,
        Err(e @ nullcheck_core::Error::StatisticsMismatch { .. }) => Outcome::Failed(e.to_string()),
        Err(e) => Outcome::Error(e.to_string()),
    }
}
