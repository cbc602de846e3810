//! Explicit GRASS session context
//!
//! A [`Session`] owns the two pieces of state that GRASS normally reads from
//! the process environment: the NULL-file compression setting and the active
//! region. Both are handed to the engine on every call.

use tracing::{debug, info, warn};

use crate::compression::{NullCompression, NullFileStatus, COMPRESS_NULLS_VAR};
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::module::{ModuleCall, ModuleOutput};
use crate::region::{RegionSpec, TempRegion, WIND_OVERRIDE_VAR};
use crate::univar::Univariate;

/// Context threaded through every module invocation.
pub struct Session<E: Engine> {
    engine: E,
    compression: NullCompression,
    region: Option<TempRegion>,
}

impl<E: Engine> Session<E> {
    pub fn new(engine: E, compression: NullCompression) -> Self {
        Self {
            engine,
            compression,
            region: None,
        }
    }

    pub fn compression(&self) -> NullCompression {
        self.compression
    }

    pub fn set_compression(&mut self, compression: NullCompression) {
        self.compression = compression;
    }

    /// Flip the compression setting for subsequent calls and return the
    /// new value.
    pub fn toggle_compression(&mut self) -> NullCompression {
        self.compression = self.compression.toggled();
        info!("'{}' set to: {}", COMPRESS_NULLS_VAR, self.compression);
        self.compression
    }

    /// Name of the private region, if one is active
    pub fn temp_region(&self) -> Option<&str> {
        self.region.as_ref().map(TempRegion::name)
    }

    /// Environment for one call
    fn call_env(&self) -> Vec<(String, String)> {
        let mut env = vec![(
            COMPRESS_NULLS_VAR.to_string(),
            self.compression.as_env_value().to_string(),
        )];
        if let Some(region) = &self.region {
            env.push((WIND_OVERRIDE_VAR.to_string(), region.name().to_string()));
        }
        env
    }

    /// Run a module without checking its exit status
    pub fn run_unchecked(&self, call: &ModuleCall) -> Result<ModuleOutput> {
        self.engine.execute(call, &self.call_env())
    }

    /// Run a module; a non-zero exit status becomes [`Error::ModuleFailed`]
    pub fn run(&self, call: &ModuleCall) -> Result<ModuleOutput> {
        let output = self.run_unchecked(call)?;
        if !output.success() {
            return Err(Error::ModuleFailed {
                module: call.to_string(),
                status: output.status_label(),
                stderr: output.stderr.trim().to_string(),
            });
        }
        Ok(output)
    }

    /// Switch to a private copy of the current region.
    ///
    /// Later region changes go to the copy only. Calling this twice keeps
    /// the existing copy.
    pub fn use_temp_region(&mut self) -> Result<()> {
        if self.region.is_some() {
            return Ok(());
        }
        let region = TempRegion::generate();
        // Saved without the override so it copies the user's region
        self.run(&region.save_call())?;
        debug!(region = region.name(), "using temporary region");
        self.region = Some(region);
        Ok(())
    }

    /// Drop the private region and delete its file
    pub fn del_temp_region(&mut self) -> Result<()> {
        if let Some(region) = self.region.take() {
            let call = region.remove_call();
            let output = self.run_unchecked(&call)?;
            if !output.success() {
                warn!(region = region.name(), stderr = %output.stderr.trim(), "failed to remove temporary region");
            }
        }
        Ok(())
    }

    pub fn set_region(&self, spec: &RegionSpec) -> Result<()> {
        self.run(&spec.to_call())?;
        Ok(())
    }

    /// Evaluate a raster algebra expression (`result = expression`)
    pub fn mapcalc(&self, expression: &str, overwrite: bool) -> Result<()> {
        let call = ModuleCall::new("r.mapcalc")
            .param("expression", expression)
            .overwrite(overwrite);
        self.run(&call)?;
        Ok(())
    }

    /// Forced removal of a raster map. A missing map is not an error.
    pub fn remove_raster(&self, name: &str) -> Result<()> {
        let call = ModuleCall::new("g.remove")
            .flag('f')
            .param("type", "raster")
            .param("name", name)
            .quiet(true);
        self.run(&call)?;
        Ok(())
    }

    /// Rewrite only the NULL file of a raster using the current setting
    pub fn recreate_null_file(&self, map: &str) -> Result<()> {
        let call = ModuleCall::new("r.null")
            .flag('z')
            .param("map", map)
            .quiet(true);
        self.run(&call)?;
        Ok(())
    }

    /// Report whether a raster's NULL file is compressed
    pub fn null_file_status(&self, map: &str) -> Result<NullFileStatus> {
        let call = ModuleCall::new("r.compress").flag('g').param("map", map);
        let output = self.run(&call)?;
        let status = NullFileStatus::parse(map, &output.stdout)?;
        debug!("NULL file compression for <{}>: {}", map, status.raw);
        Ok(status)
    }

    /// Raw `r.univar -g` output
    pub fn univar_text(&self, map: &str) -> Result<String> {
        let call = ModuleCall::new("r.univar").flag('g').param("map", map);
        let output = self.run(&call)?;
        debug!("> Univariate statistics of <{}>\n{}", map, output.stdout);
        Ok(output.stdout)
    }

    pub fn univar(&self, map: &str) -> Result<Univariate> {
        Univariate::parse(&self.univar_text(map)?)
    }
}
