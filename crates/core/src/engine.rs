//! Execution of GRASS modules.
//!
//! [`Engine`] is the seam between the suite and the raster toolkit. The
//! environment of every call is passed in explicitly, so the compression
//! setting and the active region never leak through process-global state.

use serde::{Deserialize, Serialize};
use std::process::{Command, Stdio};
use tracing::debug;

use crate::error::{Error, Result};
use crate::module::{ModuleCall, ModuleOutput};

/// Trait for running GRASS modules.
///
/// Implementations must apply `env` to this call only.
pub trait Engine: Send + Sync {
    /// Run a module to completion and capture its output.
    ///
    /// A non-zero exit status is not an error here; callers decide.
    fn execute(&self, call: &ModuleCall, env: &[(String, String)]) -> Result<ModuleOutput>;
}

impl<E: Engine + ?Sized> Engine for &E {
    fn execute(&self, call: &ModuleCall, env: &[(String, String)]) -> Result<ModuleOutput> {
        (**self).execute(call, env)
    }
}

impl<E: Engine + ?Sized> Engine for Box<E> {
    fn execute(&self, call: &ModuleCall, env: &[(String, String)]) -> Result<ModuleOutput> {
        (**self).execute(call, env)
    }
}

/// Options for [`ProcessEngine`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Command prepended to every module, e.g.
    /// `["grass", "/data/grassdb/nc_spm_08/user1", "--exec"]`.
    /// Empty when already running inside a GRASS session.
    pub launcher: Vec<String>,
    /// Variables applied to every call before the per-call environment
    pub extra_env: Vec<(String, String)>,
}

impl EngineOptions {
    /// Launch modules through `grass <mapset> --exec`
    pub fn grass_exec(executable: impl Into<String>, mapset: impl Into<String>) -> Self {
        Self {
            launcher: vec![executable.into(), mapset.into(), "--exec".to_string()],
            extra_env: Vec::new(),
        }
    }
}

/// Runs modules as child processes.
#[derive(Debug, Clone, Default)]
pub struct ProcessEngine {
    options: EngineOptions,
}

impl ProcessEngine {
    pub fn new(options: EngineOptions) -> Self {
        Self { options }
    }

    /// Program and leading arguments for a call
    fn command_line(&self, call: &ModuleCall) -> (String, Vec<String>) {
        let mut argv: Vec<String> = self.options.launcher.clone();
        argv.push(call.module().to_string());
        argv.extend(call.args());
        let program = argv.remove(0);
        (program, argv)
    }
}

impl Engine for ProcessEngine {
    fn execute(&self, call: &ModuleCall, env: &[(String, String)]) -> Result<ModuleOutput> {
        let (program, args) = self.command_line(call);
        debug!(command = %call, ?env, "running module");

        let mut cmd = Command::new(&program);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for (key, value) in self.options.extra_env.iter().chain(env.iter()) {
            cmd.env(key, value);
        }

        let output = cmd.output().map_err(|source| Error::Spawn {
            program: program.clone(),
            source,
        })?;

        let result = ModuleOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        debug!(module = call.module(), status = %result.status_label(), "module finished");
        Ok(result)
    }
}
