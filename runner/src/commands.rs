use crate::{
    config::{CaseConfig, ConfigErrors},
    executors::{ExecutorError, Executors, Invocation},
    progress::{ProgressError, ProgressMonitor},
    resume::{preserve_log_files, Launch, ResumeError},
    template::{
        balance_substitutions, decomposition_substitutions, write_from_template, TemplateError,
    },
};
use clap::{Args, Parser, Subcommand};
use foamrun_analysis::{
    field_history, imbalance, list_time_steps, list_worker_directories, plan, worker_count,
    worker_root, written_time_steps, DecomposeError, Decomposition, Dimensions, FieldError,
    ProbeError,
};
use itertools::Itertools;
use serde::Serialize;
use std::{
    io,
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;
use tracing::{info, instrument, warn};

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error(transparent)]
    Config(#[from] ConfigErrors),
    #[error(transparent)]
    Decompose(#[from] DecomposeError),
    #[error(transparent)]
    Probe(#[from] ProbeError),
    #[error(transparent)]
    Field(#[from] FieldError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Executor(#[from] ExecutorError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    Resume(#[from] ResumeError),
    #[error("Failed to print result")]
    Print(#[from] serde_yaml::Error),
}

#[derive(Parser, Debug)]
#[command(name = "foamrun", version, about = "Prepare, run and monitor decomposed solver cases")]
pub struct Cli {
    /// case config, relative paths are resolved against the case
    #[arg(long, default_value = "foamrun.yaml")]
    config: PathBuf,

    /// case directory holding `system/`, `constant/` and the worker directories
    #[arg(long, default_value = ".")]
    case: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the worker grid for a worker count
    Plan(PlanArgs),
    /// Write the decomposition dictionary for a worker count
    Decompose(PlanArgs),
    /// Write the load balancing dictionary for a worker count
    Balance { workers: u64 },
    /// Run a solver or utility, in parallel for more than one worker
    Run(RunArgs),
    /// Draw a progress bar from the solver log until the solver ends
    Monitor {
        /// log to follow instead of the configured `monitor.log`
        #[arg(long)]
        log: Option<PathBuf>,
    },
    /// Report how evenly the latest output is spread over the workers
    Imbalance {
        #[arg(long)]
        workers: Option<usize>,
    },
    /// List the worker directories of the case
    Workers,
    /// List the time steps of a worker, or of the case itself
    Times {
        #[arg(long)]
        worker: Option<usize>,
        /// leave out the initial conditions
        #[arg(long)]
        written: bool,
    },
    /// Print the uniform field values of every written time step
    Fields {
        #[arg(long)]
        worker: Option<usize>,
    },
}

#[derive(Args, Debug)]
struct PlanArgs {
    workers: i64,
    /// 2 or 3, overrides `decomposition.dims`
    #[arg(long)]
    dims: Option<u8>,
    /// wanted x/y ratio of 2D grids, overrides `decomposition.ratio`
    #[arg(long)]
    ratio: Option<f64>,
    /// decomposition method label, overrides `decomposition.method`
    #[arg(long)]
    method: Option<String>,
}

#[derive(Args, Debug)]
struct RunArgs {
    program: String,
    /// worker count or `resume` to continue with the existing worker directories
    #[arg(short = 'n', long, default_value = "1")]
    workers: Launch,
    /// echo the output to the terminal as well
    #[arg(long)]
    show: bool,
    /// log file, defaults to `log.<program>`
    #[arg(long)]
    log: Option<PathBuf>,
    /// write the decomposition and balancing dictionaries before a parallel run
    #[arg(long)]
    decompose: bool,
    /// arguments handed to the program
    #[arg(last = true)]
    args: Vec<String>,
}

fn print_yaml<T: Serialize>(value: &T) -> Result<(), RunnerError> {
    print!("{}", serde_yaml::to_string(value)?);

    Ok(())
}

fn worker_or_case(case: &Path, worker: Option<usize>) -> PathBuf {
    worker.map_or_else(|| case.to_path_buf(), |index| worker_root(case, index))
}

fn plan_from(config: &CaseConfig, args: &PlanArgs) -> Result<Decomposition, RunnerError> {
    let dims = match args.dims {
        Some(dims) => Dimensions::try_from(dims)?,
        None => config.decomposition.dims,
    };

    Ok(plan(
        args.workers,
        dims,
        args.ratio.unwrap_or(config.decomposition.ratio),
        args.method.as_deref().unwrap_or(&config.decomposition.method),
    )?)
}

fn write_decomposition(
    case: &Path,
    config: &CaseConfig,
    decomposition: &Decomposition,
) -> Result<(), RunnerError> {
    write_from_template(
        &case.join(&config.decomposition.template),
        &case.join(&config.decomposition.target),
        &decomposition_substitutions(decomposition),
    )?;

    Ok(())
}

fn write_balance(case: &Path, config: &CaseConfig, workers: u64) -> Result<(), RunnerError> {
    write_from_template(
        &case.join(&config.balance.template),
        &case.join(&config.balance.target),
        &balance_substitutions(workers),
    )?;

    Ok(())
}

#[instrument(skip(config), level = "info")]
fn run_program(case: &Path, config: &CaseConfig, args: RunArgs) -> Result<(), RunnerError> {
    let workers = match args.workers {
        Launch::Workers(workers) => workers,
        Launch::Resume => {
            let workers = worker_count(case)?;
            let preserved = preserve_log_files(case, workers)?;
            info!(workers, preserved = preserved.len(), "Resuming run");

            workers as u64
        }
    };

    if args.decompose {
        if workers > 1 {
            let decomposition = plan(
                workers as i64,
                config.decomposition.dims,
                config.decomposition.ratio,
                &config.decomposition.method,
            )?;
            write_decomposition(case, config, &decomposition)?;
            write_balance(case, config, workers)?;
        } else {
            warn!("Serial runs are not decomposed, skipping the dictionaries");
        }
    }

    let executor = Executors::load(&config.executor)?;
    let invocation = Invocation {
        args: args.args,
        workers,
        log: args.log,
        show: args.show,
        ..Invocation::new(args.program)
    };

    let output = executor.execute(case, &invocation)?;
    info!(
        runtime_ms = output.runtime.as_millis() as u64,
        log = ?output.log,
        "Finished {}",
        invocation.program
    );

    if output.success() {
        Ok(())
    } else {
        Err(ExecutorError::Failed {
            program: invocation.program,
            status: output.status,
        }
        .into())
    }
}

fn print_fields(root: &Path) -> Result<(), RunnerError> {
    let history = field_history(root)?;

    let Some(first) = history.first() else {
        warn!(root = ?root, "No written time steps found");

        return Ok(());
    };

    println!(
        "Time\t{}",
        first.values.iter().map(|(name, _)| name).join("\t")
    );

    for sample in &history {
        // non-uniform fields have no single value and are shown as 0
        println!(
            "{}\t{}",
            sample.time.name,
            sample
                .values
                .iter()
                .map(|(_, value)| value.unwrap_or(0.0))
                .join("\t")
        );
    }

    Ok(())
}

pub fn run(cli: Cli) -> Result<(), RunnerError> {
    let case = cli.case;
    let config = CaseConfig::load(&case.join(&cli.config))?;

    if config.preflight_checks(&case) {
        return Err(ConfigErrors::Preflight.into());
    }

    match cli.command {
        Commands::Plan(args) => print_yaml(&plan_from(&config, &args)?),
        Commands::Decompose(args) => {
            let decomposition = plan_from(&config, &args)?;
            write_decomposition(&case, &config, &decomposition)
        }
        Commands::Balance { workers } => write_balance(&case, &config, workers),
        Commands::Run(args) => run_program(&case, &config, args),
        Commands::Monitor { log } => {
            let monitor = ProgressMonitor::new(
                case.join(log.unwrap_or_else(|| config.monitor.log.clone())),
                &case.join(&config.monitor.control),
                Duration::from_millis(config.monitor.interval_ms),
                config.monitor.tail,
            )?;

            monitor.watch(&mut io::stdout())?;

            Ok(())
        }
        Commands::Imbalance { workers } => print_yaml(&imbalance(&case, workers)?),
        Commands::Workers => print_yaml(&list_worker_directories(&case)?),
        Commands::Times { worker, written } => {
            let root = worker_or_case(&case, worker);
            let steps = if written {
                written_time_steps(&root)?
            } else {
                list_time_steps(&root)?
            };

            print_yaml(&steps)
        }
        Commands::Fields { worker } => print_fields(&worker_or_case(&case, worker)),
    }
}

#[cfg(test)]
mod commands_test;
