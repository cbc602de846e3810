//! GRASS module invocations
//!
//! A [`ModuleCall`] describes one run of a GRASS module (`r.mapcalc`,
//! `g.region`, ...) and renders it to the argv the module expects:
//!
//! ```text
//! r.univar -g map=elevation --quiet
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// One invocation of a GRASS module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleCall {
    module: String,
    flags: Vec<char>,
    params: Vec<(String, String)>,
    overwrite: bool,
    quiet: bool,
}

impl ModuleCall {
    /// Create a call for the named module with no options
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            flags: Vec::new(),
            params: Vec::new(),
            overwrite: false,
            quiet: false,
        }
    }

    /// Add a single-letter flag (`-g`). Repeated flags are kept once.
    pub fn flag(mut self, flag: char) -> Self {
        if !self.flags.contains(&flag) {
            self.flags.push(flag);
        }
        self
    }

    /// Add a `key=value` parameter. A repeated key replaces the earlier value.
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        let key = key.into();
        let value = value.to_string();
        match self.params.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.params.push((key, value)),
        }
        self
    }

    /// Allow the module to replace existing maps (`--overwrite`)
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Suppress informational module output (`--quiet`)
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn flags(&self) -> &[char] {
        &self.flags
    }

    /// Value of a parameter, if set
    pub fn get_param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_overwrite(&self) -> bool {
        self.overwrite
    }

    /// Arguments passed after the module name
    pub fn args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(self.params.len() + 3);
        if !self.flags.is_empty() {
            let mut flags = String::from("-");
            flags.extend(self.flags.iter());
            args.push(flags);
        }
        args.extend(self.params.iter().map(|(k, v)| format!("{k}={v}")));
        if self.overwrite {
            args.push("--overwrite".to_string());
        }
        if self.quiet {
            args.push("--quiet".to_string());
        }
        args
    }
}

impl fmt::Display for ModuleCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.module)?;
        for arg in self.args() {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Captured result of a finished module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleOutput {
    /// Exit code; `None` if the process was terminated by a signal
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ModuleOutput {
    /// Successful output with the given stdout
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            status: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed output with the given exit code and stderr
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            status: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// Exit status rendered for error messages
    pub fn status_label(&self) -> String {
        match self.status {
            Some(code) => code.to_string(),
            None => "signal".to_string(),
        }
    }
}
