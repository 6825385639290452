mod local;

pub use local::LocalExecutor;

use crate::config::{ConfigErrors, ExecutorConfig};
use std::{
    io,
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("Failed to spawn {program}")]
    Spawn { program: String, source: io::Error },
    #[error("Failed to handle solver output")]
    Io(#[from] io::Error),
    #[error("{program} ran into the timeout of {timeout:?}")]
    Timeout { program: String, timeout: Duration },
    #[error("{program} exited unsuccessfully (status {status:?})")]
    Failed { program: String, status: Option<i32> },
}

#[derive(Debug, Clone)]
/// a single solver or utility run, serial for one worker and MPI parallel otherwise
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub workers: u64,
    // log file name relative to the case, defaults to `log.<program>`
    pub log: Option<PathBuf>,
    // echo the output to the terminal in addition to the log
    pub show: bool,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            workers: 1,
            log: None,
            show: false,
        }
    }

    pub fn log_path(&self, case: &Path) -> PathBuf {
        case.join(
            self.log
                .clone()
                .unwrap_or_else(|| PathBuf::from(format!("log.{}", self.program))),
        )
    }
}

#[derive(Debug, Clone)]
/// container for information extracted from running a program
pub struct RunOutput {
    pub runtime: Duration,
    pub status: Option<i32>,
    pub log: PathBuf,
}

impl RunOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

#[derive(Clone, Debug)]
pub enum Executors {
    Local(LocalExecutor),
}

impl Executors {
    pub fn load(config: &ExecutorConfig) -> Result<Self, ConfigErrors> {
        match config.name.to_lowercase().as_str() {
            "local" => Ok(Self::Local(LocalExecutor::load(config)?)),
            _ => Err(ConfigErrors::UnsupportedExecutor(config.name.clone())),
        }
    }

    pub fn execute(&self, case: &Path, invocation: &Invocation) -> Result<RunOutput, ExecutorError> {
        match self {
            Self::Local(executor) => executor.execute(case, invocation),
        }
    }
}
