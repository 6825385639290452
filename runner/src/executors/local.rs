use super::{ExecutorError, Invocation, RunOutput};
use crate::config::{ConfigErrors, ExecutorConfig};
use std::{
    ffi::OsString,
    fs::File,
    io::{self, Read, Write},
    path::Path,
    process::{Child, ChildStdout, Command, Stdio},
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};
use tracing::{debug, info, instrument, warn};
use wait_timeout::ChildExt;

const DEFAULT_LAUNCHER: &str = "mpirun";

/// Executor that runs programs as child processes of this machine
#[derive(Clone, Debug)]
pub struct LocalExecutor {
    // MPI launcher used for runs with more than one worker
    launcher: OsString,
    timeout: Option<Duration>,
}

impl LocalExecutor {
    pub fn new(launcher: impl Into<OsString>, timeout: Option<Duration>) -> Self {
        Self {
            launcher: launcher.into(),
            timeout,
        }
    }

    pub fn load(config: &ExecutorConfig) -> Result<Self, ConfigErrors> {
        let launcher = match config.parameter.get("launcher") {
            Some(value) => match value.as_str() {
                Some(launcher) => launcher,
                None => {
                    warn!("Executor launcher must be a string");
                    return Err(ConfigErrors::InvalidParameter {
                        name: "launcher".into(),
                        reason: "not a string".into(),
                    });
                }
            },
            None => DEFAULT_LAUNCHER,
        };

        let timeout = match config.parameter.get("timeout") {
            Some(value) => match value.as_u64() {
                Some(seconds) => Some(Duration::from_secs(seconds)),
                None => {
                    warn!("Executor timeout must be a natural number of seconds");
                    return Err(ConfigErrors::InvalidParameter {
                        name: "timeout".into(),
                        reason: "not a natural number".into(),
                    });
                }
            },
            None => None,
        };

        Ok(Self::new(launcher, timeout))
    }

    /// `<launcher> -np <workers> <program> -parallel <args>` or `<program> <args>`
    pub fn command(&self, case: &Path, invocation: &Invocation) -> Command {
        let mut command = if invocation.workers > 1 {
            let mut command = Command::new(&self.launcher);
            command
                .arg("-np")
                .arg(invocation.workers.to_string())
                .arg(&invocation.program)
                .arg("-parallel");
            command
        } else {
            Command::new(&invocation.program)
        };

        command.args(&invocation.args).current_dir(case);
        command
    }

    #[instrument(skip(self), level = "info")]
    pub fn execute(&self, case: &Path, invocation: &Invocation) -> Result<RunOutput, ExecutorError> {
        let log_path = invocation.log_path(case);
        let log = File::create(&log_path)?;
        let mut command = self.command(case, invocation);

        // with `show` the output is copied to the log by a tee thread, otherwise the log
        // is handed to the child directly
        let (stdout, tee_log) = if invocation.show {
            (Stdio::piped(), Some(log))
        } else {
            (Stdio::from(log), None)
        };

        info!("Running command: {command:?}");

        let start = Instant::now();
        let mut child = command
            .stdout(stdout)
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| ExecutorError::Spawn {
                program: invocation.program.clone(),
                source,
            })?;

        let tee = match (child.stdout.take(), tee_log) {
            (Some(output), Some(log)) => Some(thread::spawn(move || tee(output, log))),
            _ => None,
        };

        let status = match self.timeout {
            Some(timeout) => match child.wait_timeout(timeout)? {
                Some(status) => status,
                None => {
                    warn!(pid = child.id(), "Child ran into timeout, killing it");
                    kill(&mut child)?;
                    join(tee)?;

                    return Err(ExecutorError::Timeout {
                        program: invocation.program.clone(),
                        timeout,
                    });
                }
            },
            None => child.wait()?,
        };

        join(tee)?;

        let runtime = start.elapsed();
        debug!(
            "Finished in {} ms | status: {}",
            runtime.as_millis(),
            status.success()
        );

        Ok(RunOutput {
            runtime,
            status: status.code(),
            log: log_path,
        })
    }
}

fn kill(child: &mut Child) -> io::Result<()> {
    child.kill()?;
    child.wait().map(drop)
}

fn join(tee: Option<JoinHandle<io::Result<()>>>) -> Result<(), ExecutorError> {
    match tee.map(JoinHandle::join) {
        Some(Ok(result)) => Ok(result?),
        Some(Err(_)) => {
            warn!("Output thread panicked, the log might be incomplete");
            Ok(())
        }
        None => Ok(()),
    }
}

/// copy the child's output into the log and to our stdout
fn tee(mut output: ChildStdout, mut log: File) -> io::Result<()> {
    let mut terminal = io::stdout();
    let mut buffer = [0; 8192];

    loop {
        let read = match output.read(&mut buffer) {
            Ok(0) => break,
            Ok(read) => read,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };

        log.write_all(&buffer[..read])?;
        terminal.write_all(&buffer[..read])?;
        terminal.flush()?;
    }

    log.flush()
}
