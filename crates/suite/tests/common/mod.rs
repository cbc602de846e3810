//! In-memory stand-in for a GRASS mapset.
//!
//! Understands just enough of `g.region`, `r.mapcalc`, `r.null`,
//! `r.compress`, `r.univar` and `g.remove` to run the suite, honouring
//! `WIND_OVERRIDE` and `GRASS_COMPRESS_NULLS` from the per-call environment.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use nullcheck_core::{Engine, ModuleCall, ModuleOutput, Result};

pub const RES: f64 = 10.0;

/// Extent of the simulated `elevation` raster: 40 x 30 cells
pub const ELEVATION: Region = Region {
    west: 637400.0,
    east: 637800.0,
    south: 221650.0,
    north: 221950.0,
    res: RES,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub west: f64,
    pub east: f64,
    pub south: f64,
    pub north: f64,
    pub res: f64,
}

impl Region {
    pub fn rows(&self) -> usize {
        ((self.north - self.south) / self.res).round() as usize
    }

    pub fn cols(&self) -> usize {
        ((self.east - self.west) / self.res).round() as usize
    }

    fn cell_center(&self, row: usize, col: usize) -> (f64, f64) {
        (
            self.west + (col as f64 + 0.5) * self.res,
            self.north - (row as f64 + 0.5) * self.res,
        )
    }
}

#[derive(Debug, Clone)]
pub struct SimRaster {
    pub region: Region,
    pub cells: Vec<Option<f64>>,
    pub null_compressed: bool,
}

impl SimRaster {
    fn sample(&self, x: f64, y: f64) -> Option<f64> {
        let r = &self.region;
        if x < r.west || x >= r.east || y <= r.south || y > r.north {
            return None;
        }
        let col = ((x - r.west) / r.res).floor() as usize;
        let row = ((r.north - y) / r.res).floor() as usize;
        if row >= r.rows() || col >= r.cols() {
            return None;
        }
        self.cells[row * r.cols() + col]
    }
}

/// Faults to inject into the simulated engine.
#[derive(Debug, Clone, Default)]
pub struct Faults {
    /// Writing a compressed NULL file turns the first NULL cell into 0
    pub corrupt_compressed_nulls: bool,
    /// Every call to this module exits with status 1
    pub failing_module: Option<String>,
    /// Every call whose command line contains this text exits with status 1
    pub failing_command: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Invocation {
    pub command: String,
    pub env: Vec<(String, String)>,
}

impl Invocation {
    pub fn env(&self, key: &str) -> Option<&str> {
        self.env.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn module(&self) -> &str {
        self.command.split_whitespace().next().unwrap_or("")
    }
}

#[derive(Debug)]
struct State {
    current: Region,
    saved: HashMap<String, Region>,
    rasters: HashMap<String, SimRaster>,
    log: Vec<Invocation>,
}

pub struct SimGrass {
    state: Mutex<State>,
    faults: Faults,
}

impl SimGrass {
    /// Mapset holding an `elevation` raster, with the region set to it
    pub fn new() -> Self {
        Self::with_faults(Faults::default())
    }

    pub fn with_faults(faults: Faults) -> Self {
        let mut cells = Vec::with_capacity(ELEVATION.rows() * ELEVATION.cols());
        for row in 0..ELEVATION.rows() {
            for col in 0..ELEVATION.cols() {
                cells.push(Some(100.0 + row as f64 + 0.5 * col as f64));
            }
        }
        let mut rasters = HashMap::new();
        rasters.insert(
            "elevation".to_string(),
            SimRaster {
                region: ELEVATION,
                cells,
                null_compressed: false,
            },
        );
        Self {
            state: Mutex::new(State {
                current: ELEVATION,
                saved: HashMap::new(),
                rasters,
                log: Vec::new(),
            }),
            faults,
        }
    }

    /// Replace the user's current region
    pub fn set_current_region(&self, region: Region) {
        self.state.lock().unwrap().current = region;
    }

    pub fn log(&self) -> Vec<Invocation> {
        self.state.lock().unwrap().log.clone()
    }

    pub fn raster(&self, name: &str) -> Option<SimRaster> {
        self.state.lock().unwrap().rasters.get(name).cloned()
    }

    pub fn raster_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.lock().unwrap().rasters.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn current_region(&self) -> Region {
        self.state.lock().unwrap().current
    }

    pub fn saved_regions(&self) -> Vec<String> {
        self.state.lock().unwrap().saved.keys().cloned().collect()
    }
}

type Outcome = std::result::Result<String, String>;

impl Engine for SimGrass {
    fn execute(&self, call: &ModuleCall, env: &[(String, String)]) -> Result<ModuleOutput> {
        let mut state = self.state.lock().unwrap();
        state.log.push(Invocation {
            command: call.to_string(),
            env: env.to_vec(),
        });

        let command = call.to_string();
        let module_fails = self.faults.failing_module.as_deref() == Some(call.module());
        let command_fails = self
            .faults
            .failing_command
            .as_deref()
            .is_some_and(|pattern| command.contains(pattern));
        if module_fails || command_fails {
            return Ok(ModuleOutput::failed(1, format!("ERROR: {} failed", call.module())));
        }

        let env_get = |key: &str| env.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone());
        let ctx = CallEnv {
            wind_override: env_get("WIND_OVERRIDE"),
            compress_nulls: env_get("GRASS_COMPRESS_NULLS").as_deref() == Some("1"),
            corrupt: self.faults.corrupt_compressed_nulls,
        };

        let outcome = match call.module() {
            "g.region" => g_region(&mut state, call, &ctx),
            "r.mapcalc" => r_mapcalc(&mut state, call, &ctx),
            "r.null" => r_null(&mut state, call, &ctx),
            "r.compress" => r_compress(&state, call),
            "r.univar" => r_univar(&state, call, &ctx),
            "g.remove" => g_remove(&mut state, call),
            other => Err(format!("ERROR: unknown module {other}")),
        };

        Ok(match outcome {
            Ok(stdout) => ModuleOutput::ok(stdout),
            Err(stderr) => ModuleOutput::failed(1, stderr),
        })
    }
}

struct CallEnv {
    wind_override: Option<String>,
    compress_nulls: bool,
    corrupt: bool,
}

fn active_region(state: &State, ctx: &CallEnv) -> std::result::Result<Region, String> {
    match &ctx.wind_override {
        Some(name) => state
            .saved
            .get(name)
            .copied()
            .ok_or_else(|| format!("ERROR: region <{name}> not found")),
        None => Ok(state.current),
    }
}

fn required<'a>(call: &'a ModuleCall, key: &str) -> std::result::Result<&'a str, String> {
    call.get_param(key)
        .ok_or_else(|| format!("ERROR: Required parameter <{key}> not set"))
}

fn g_region(state: &mut State, call: &ModuleCall, ctx: &CallEnv) -> Outcome {
    let mut region = active_region(state, ctx)?;

    if let Some(name) = call.get_param("raster") {
        let raster = state
            .rasters
            .get(name)
            .ok_or_else(|| format!("ERROR: Raster map <{name}> not found"))?;
        region = raster.region;
    }
    for (key, slot) in [
        ("w", &mut region.west),
        ("e", &mut region.east),
        ("s", &mut region.south),
        ("n", &mut region.north),
    ] {
        if let Some(v) = call.get_param(key) {
            *slot = v.parse().map_err(|_| format!("ERROR: invalid {key}={v}"))?;
        }
    }

    if let Some(name) = call.get_param("save") {
        if state.saved.contains_key(name) && !call.is_overwrite() {
            return Err(format!("ERROR: region <{name}> already exists"));
        }
        state.saved.insert(name.to_string(), region);
        return Ok(String::new());
    }

    match &ctx.wind_override {
        Some(name) => {
            state.saved.insert(name.clone(), region);
        }
        None => state.current = region,
    }
    Ok(String::new())
}

/// Replace the first NULL by 0 when a compressed NULL file is written
fn write_nulls(cells: &mut [Option<f64>], ctx: &CallEnv) -> bool {
    if ctx.compress_nulls && ctx.corrupt {
        if let Some(cell) = cells.iter_mut().find(|c| c.is_none()) {
            *cell = Some(0.0);
        }
    }
    ctx.compress_nulls
}

fn r_mapcalc(state: &mut State, call: &ModuleCall, ctx: &CallEnv) -> Outcome {
    let expression = required(call, "expression")?;
    let (target, rhs) = expression
        .split_once('=')
        .ok_or_else(|| format!("ERROR: syntax error in <{expression}>"))?;
    let target = target.trim();

    if state.rasters.contains_key(target) && !call.is_overwrite() {
        return Err(format!("ERROR: option <output>: <{target}> exists."));
    }

    enum Term<'a> {
        Const(f64),
        Map(&'a SimRaster),
    }
    let mut terms = Vec::new();
    for token in rhs.split('+').map(str::trim) {
        match token.parse::<f64>() {
            Ok(v) => terms.push(Term::Const(v)),
            Err(_) => {
                let raster = state
                    .rasters
                    .get(token)
                    .ok_or_else(|| format!("ERROR: Raster map <{token}> not found"))?;
                terms.push(Term::Map(raster));
            }
        }
    }

    let region = active_region(state, ctx)?;
    let mut cells = Vec::with_capacity(region.rows() * region.cols());
    for row in 0..region.rows() {
        for col in 0..region.cols() {
            let (x, y) = region.cell_center(row, col);
            let value = terms.iter().try_fold(0.0, |acc, term| match term {
                Term::Const(v) => Some(acc + v),
                Term::Map(r) => r.sample(x, y).map(|v| acc + v),
            });
            cells.push(value);
        }
    }

    let null_compressed = write_nulls(&mut cells, ctx);
    state.rasters.insert(
        target.to_string(),
        SimRaster {
            region,
            cells,
            null_compressed,
        },
    );
    Ok(String::new())
}

fn r_null(state: &mut State, call: &ModuleCall, ctx: &CallEnv) -> Outcome {
    let map = required(call, "map")?;
    let raster = state
        .rasters
        .get_mut(map)
        .ok_or_else(|| format!("ERROR: Raster map <{map}> not found"))?;
    if call.flags().contains(&'z') {
        raster.null_compressed = write_nulls(&mut raster.cells, ctx);
    }
    Ok(String::new())
}

fn r_compress(state: &State, call: &ModuleCall) -> Outcome {
    let map = required(call, "map")?;
    let raster = state
        .rasters
        .get(map)
        .ok_or_else(|| format!("ERROR: Raster map <{map}> not found"))?;
    Ok(format!(
        "{}|DCELL|ZSTD|{}\n",
        map,
        if raster.null_compressed { 1 } else { 0 }
    ))
}

fn r_univar(state: &State, call: &ModuleCall, ctx: &CallEnv) -> Outcome {
    let map = required(call, "map")?;
    let raster = state
        .rasters
        .get(map)
        .ok_or_else(|| format!("ERROR: Raster map <{map}> not found"))?;
    let region = active_region(state, ctx)?;

    let mut values = Vec::new();
    let mut null_cells = 0usize;
    for row in 0..region.rows() {
        for col in 0..region.cols() {
            let (x, y) = region.cell_center(row, col);
            match raster.sample(x, y) {
                Some(v) => values.push(v),
                None => null_cells += 1,
            }
        }
    }

    let n = values.len();
    let cells = n + null_cells;
    if n == 0 {
        return Ok(format!("n=0\nnull_cells={null_cells}\ncells={cells}\n"));
    }
    let nf = n as f64;
    let sum: f64 = values.iter().sum();
    let mean = sum / nf;
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean_of_abs = values.iter().map(|v| v.abs()).sum::<f64>() / nf;
    let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / nf;
    let stddev = variance.sqrt();
    let coeff_var = if mean != 0.0 { 100.0 * stddev / mean } else { f64::NAN };

    Ok(format!(
        "n={n}\nnull_cells={null_cells}\ncells={cells}\nmin={min}\nmax={max}\nrange={}\n\
         mean={mean}\nmean_of_abs={mean_of_abs}\nstddev={stddev}\nvariance={variance}\n\
         coeff_var={coeff_var}\nsum={sum}\n",
        max - min
    ))
}

fn g_remove(state: &mut State, call: &ModuleCall) -> Outcome {
    if !call.flags().contains(&'f') {
        return Ok(String::new());
    }
    let name = required(call, "name")?;
    let removed = match required(call, "type")? {
        "raster" => state.rasters.remove(name).is_some(),
        "region" => state.saved.remove(name).is_some(),
        other => return Err(format!("ERROR: unsupported type <{other}>")),
    };
    if !removed {
        // GRASS only warns about missing elements
        return Ok(String::new());
    }
    Ok(format!("Removing {name}\n"))
}
