use foamrun_analysis::{Dimensions, DEFAULT_RATIO};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap, fs, fs::File, io::Error, os::unix::fs::MetadataExt, path::Path,
    path::PathBuf,
};
use thiserror::Error;
use tracing::{error, info, warn};

// check if a file is executable
pub fn check_executable(path: &Path) -> Result<bool, ConfigErrors> {
    if !path.is_file() {
        Err(ConfigErrors::FileNotFound(path.to_path_buf()))
    } else {
        match File::open(path).map(|file| file.metadata()) {
            Ok(Ok(metadata)) => Ok((metadata.mode() & 0o111) != 0),
            Ok(Err(e)) | Err(e) => Err(ConfigErrors::MetadataNotFound(e)),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigErrors {
    #[error("Executor not supported: {0}")]
    UnsupportedExecutor(String),
    #[error("Invalid executor parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },
    #[error("File not found: {0:?}")]
    FileNotFound(PathBuf),
    #[error("Metadata not found or unreadable")]
    MetadataNotFound(#[from] Error),
    #[error("Failed to read case config {path:?}")]
    Read { path: PathBuf, source: Error },
    #[error("Failed to parse case config")]
    Parse(#[from] serde_yaml::Error),
    #[error("Case config failed the preflight checks")]
    Preflight,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct CaseConfig {
    #[serde(default)]
    pub executor: ExecutorConfig,
    #[serde(default)]
    pub decomposition: DecompositionConfig,
    #[serde(default)]
    pub balance: BalanceConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct ExecutorConfig {
    // Name of the selected executor, see Executors::load for the selection proccess
    #[serde(default = "default_executor")]
    pub name: String,
    // parameters for the executor, e.g. `launcher` and `timeout`
    #[serde(default)]
    pub parameter: BTreeMap<String, serde_yaml::Value>,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct DecompositionConfig {
    #[serde(default = "default_dims")]
    pub dims: Dimensions,
    #[serde(default = "default_ratio")]
    pub ratio: f64,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default = "default_decompose_template")]
    pub template: PathBuf,
    #[serde(default = "default_decompose_target")]
    pub target: PathBuf,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct BalanceConfig {
    #[serde(default = "default_balance_template")]
    pub template: PathBuf,
    #[serde(default = "default_balance_target")]
    pub target: PathBuf,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct MonitorConfig {
    // solver log that is tailed for progress
    #[serde(default = "default_log")]
    pub log: PathBuf,
    // dictionary holding `endTime`
    #[serde(default = "default_control")]
    pub control: PathBuf,
    #[serde(default = "default_interval")]
    pub interval_ms: u64,
    #[serde(default = "default_tail")]
    pub tail: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            name: default_executor(),
            parameter: BTreeMap::new(),
        }
    }
}

impl Default for DecompositionConfig {
    fn default() -> Self {
        Self {
            dims: default_dims(),
            ratio: default_ratio(),
            method: default_method(),
            template: default_decompose_template(),
            target: default_decompose_target(),
        }
    }
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            template: default_balance_template(),
            target: default_balance_target(),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            log: default_log(),
            control: default_control(),
            interval_ms: default_interval(),
            tail: default_tail(),
        }
    }
}

impl CaseConfig {
    /// load the case config from `path`, a missing file falls back to the defaults
    pub fn load(path: &Path) -> Result<Self, ConfigErrors> {
        if !path.exists() {
            info!(path = ?path, "No case config found, using defaults");

            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigErrors::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_yaml::from_str(&content)?;
        info!(path = ?path, "Loaded case config");

        Ok(config)
    }

    /// attempt to catch all errors instead of piece-by-piece to make debugging easier for
    /// users, returns true if any error was found
    pub fn preflight_checks(&self, case: &Path) -> bool {
        let mut contains_error = false;

        let ratio = self.decomposition.ratio;
        if !ratio.is_finite() || ratio <= 0.0 {
            error!("decomposition.ratio must be a positive number, got {ratio}");
            contains_error = true;
        }

        if self.decomposition.dims == Dimensions::Spatial && ratio != DEFAULT_RATIO {
            warn!("decomposition.ratio is ignored for 3D decompositions");
        }

        if self.decomposition.method.trim().is_empty() {
            error!("decomposition.method cannot be empty");
            contains_error = true;
        }

        for (name, template) in [
            ("decomposition.template", &self.decomposition.template),
            ("balance.template", &self.balance.template),
        ] {
            if !case.join(template).is_file() {
                warn!(
                    "{name} ({}) was not found, writing it will fail",
                    template.to_string_lossy()
                );
            }
        }

        if self.monitor.interval_ms == 0 {
            error!("monitor.interval_ms cannot be 0, the monitor would spin");
            contains_error = true;
        }

        if self.monitor.tail == 0 {
            error!("monitor.tail cannot be 0, no progress could ever be read");
            contains_error = true;
        }

        match self.executor.parameter.get("launcher").map(|value| value.as_str()) {
            Some(None) => {
                error!("executor.parameter.launcher must be a string");
                contains_error = true;
            }
            // launchers given as a bare name are resolved through PATH at launch
            Some(Some(launcher)) if launcher.contains('/') => {
                match check_executable(Path::new(launcher)) {
                    Ok(true) => {}
                    Ok(false) => {
                        error!("executor.parameter.launcher ({launcher}) is not executable");
                        contains_error = true;
                    }
                    Err(e) => {
                        error!("Failed to determine if executor.parameter.launcher ({launcher}) is an executable: {e}");
                        contains_error = true;
                    }
                }
            }
            _ => {}
        }

        contains_error
    }
}

fn default_executor() -> String {
    String::from("local")
}

fn default_dims() -> Dimensions {
    Dimensions::Planar
}

fn default_ratio() -> f64 {
    DEFAULT_RATIO
}

fn default_method() -> String {
    String::from("simple")
}

fn default_decompose_template() -> PathBuf {
    PathBuf::from("system/decomposeParDict.org")
}

fn default_decompose_target() -> PathBuf {
    PathBuf::from("system/decomposeParDict")
}

fn default_balance_template() -> PathBuf {
    PathBuf::from("system/balanceParDict.org")
}

fn default_balance_target() -> PathBuf {
    PathBuf::from("system/balanceParDict")
}

fn default_log() -> PathBuf {
    PathBuf::from("output.log")
}

fn default_control() -> PathBuf {
    PathBuf::from("system/controlDict")
}

fn default_interval() -> u64 {
    1000
}

fn default_tail() -> usize {
    50
}
