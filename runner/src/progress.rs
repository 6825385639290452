//! Progress of a running solver, read from the tail of its log.

use std::{
    fs::{self, File},
    io::{self, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
    thread,
    time::Duration,
};
use thiserror::Error;
use tracing::{debug, info, trace};

const BAR_WIDTH: usize = 100;
const TAIL_WINDOW: u64 = 64 * 1024;

#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("Failed to read {path:?}")]
    Read { path: PathBuf, source: io::Error },
    #[error("No endTime entry in {0:?}")]
    MissingEndTime(PathBuf),
    #[error("Invalid endTime {value:?} in {path:?}")]
    InvalidEndTime { path: PathBuf, value: String },
    #[error("Failed to draw progress")]
    Draw(#[from] io::Error),
}

/// Latest state reported by the solver log
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Progress {
    pub time: f64,
    pub temperature: Option<f64>,
    pub delta_t: Option<f64>,
    pub finished: bool,
}

impl Progress {
    /// percentage of `end_time` reached, clamped to 0..=100
    pub fn percent(&self, end_time: f64) -> u8 {
        if end_time <= 0.0 {
            return if self.finished { 100 } else { 0 };
        }

        (100.0 * self.time / end_time).clamp(0.0, 100.0) as u8
    }
}

/// `endTime` of a control dictionary
pub fn read_end_time(control: &Path) -> Result<f64, ProgressError> {
    let content = fs::read_to_string(control).map_err(|source| ProgressError::Read {
        path: control.to_path_buf(),
        source,
    })?;

    let value = content
        .lines()
        .filter(|line| line.starts_with("endTime"))
        .last()
        .and_then(|line| line.split_whitespace().nth(1))
        .ok_or_else(|| ProgressError::MissingEndTime(control.to_path_buf()))?;

    value
        .trim_end_matches(';')
        .parse()
        .map_err(|_| ProgressError::InvalidEndTime {
            path: control.to_path_buf(),
            value: value.to_owned(),
        })
}

fn value_after(line: &str, marker: &str) -> Option<f64> {
    let (_, rest) = line.split_once(marker)?;

    rest.split_whitespace()
        .next()?
        .trim_end_matches(|c: char| c == ',' || c == ';')
        .parse()
        .ok()
}

/// Extract the latest progress from solver log lines, unparsable values count as unset
pub fn parse_progress<S: AsRef<str>>(lines: &[S]) -> Progress {
    let mut progress = Progress::default();

    for line in lines.iter().map(AsRef::as_ref) {
        if line.starts_with("Time = ") {
            progress.time = value_after(line, "Time = ").unwrap_or(0.0);
        } else if line.starts_with("deltaT = ") {
            progress.delta_t = value_after(line, "deltaT = ");
        }

        if line.contains(" T = ") {
            progress.temperature = value_after(line, " T = ");
        }

        if line.contains("End") {
            progress.finished = true;
        }
    }

    progress
}

/// `2e-06` style: no decimals, signed exponent of at least two digits
fn scientific(value: f64) -> String {
    let formatted = format!("{value:.0e}");

    match formatted.split_once('e') {
        Some((mantissa, exponent)) => match exponent.parse::<i32>() {
            Ok(exponent) => {
                let sign = if exponent < 0 { '-' } else { '+' };
                format!("{mantissa}e{sign}{:02}", exponent.abs())
            }
            Err(_) => formatted,
        },
        None => formatted,
    }
}

/// `[====>    ] 42 %`, with temperature and time step once both are known
pub fn render_bar(percent: u8, temperature: Option<f64>, delta_t: Option<f64>) -> String {
    let done = usize::from(percent.min(100));
    let mut bar = format!(
        "[{}>{}] {percent} %",
        "=".repeat(done),
        " ".repeat(BAR_WIDTH - done)
    );

    if let (Some(temperature), Some(delta_t)) = (temperature, delta_t) {
        bar.push_str(&format!(
            " (T = {} K, dT = {} s)",
            temperature as i64,
            scientific(delta_t)
        ));
    }

    bar
}

/// last `count` lines of `path`, a log that does not exist yet has no lines
///
/// Only a window at the end of the file is read, widened until it holds `count` full
/// lines. Bytes that are not UTF-8 are replaced.
fn tail(path: &Path, count: usize) -> Result<Vec<String>, ProgressError> {
    let read_error = |source| ProgressError::Read {
        path: path.to_path_buf(),
        source,
    };

    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            trace!(path = ?path, "Log not written yet");
            return Ok(Vec::new());
        }
        Err(source) => return Err(read_error(source)),
    };
    let len = file.metadata().map_err(read_error)?.len();

    let mut window = TAIL_WINDOW;
    loop {
        let start = len.saturating_sub(window);
        let mut bytes = Vec::new();
        file.seek(SeekFrom::Start(start)).map_err(read_error)?;
        (&mut file)
            .take(len - start)
            .read_to_end(&mut bytes)
            .map_err(read_error)?;

        let content = String::from_utf8_lossy(&bytes);
        let mut lines: Vec<&str> = content.lines().collect();
        if start > 0 {
            // the window starts inside a line
            if lines.len() <= count {
                window = window.saturating_mul(2);
                continue;
            }
            lines.remove(0);
        }

        let first = lines.len().saturating_sub(count);

        return Ok(lines[first..].iter().map(|line| line.to_string()).collect());
    }
}

#[derive(Debug, Clone)]
pub struct ProgressMonitor {
    pub log: PathBuf,
    pub end_time: f64,
    pub interval: Duration,
    pub tail: usize,
}

impl ProgressMonitor {
    pub fn new(log: PathBuf, control: &Path, interval: Duration, tail: usize) -> Result<Self, ProgressError> {
        let end_time = read_end_time(control)?;
        debug!(end_time, "Read end time");

        Ok(Self {
            log,
            end_time,
            interval,
            tail,
        })
    }

    pub fn poll(&self) -> Result<Progress, ProgressError> {
        Ok(parse_progress(&tail(&self.log, self.tail)?))
    }

    /// Redraw the progress bar into `out` until the solver reports its end
    pub fn watch<W: Write>(&self, out: &mut W) -> Result<Progress, ProgressError> {
        loop {
            let progress = self.poll()?;
            let bar = render_bar(
                progress.percent(self.end_time),
                progress.temperature,
                progress.delta_t,
            );

            write!(out, "\r   {bar}")?;
            out.flush()?;

            if progress.finished {
                writeln!(out)?;
                info!(time = progress.time, "Solver finished");

                return Ok(progress);
            }

            thread::sleep(self.interval);
        }
    }
}

#[cfg(test)]
mod progress_test;
