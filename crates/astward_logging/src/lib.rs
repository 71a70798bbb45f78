//! Logging setup for hosts embedding the Astward job runner.
//!
//! Events go to two sinks: a size-capped job log under `$ASTWARD_HOME/logs`
//! and stderr. The filter comes from `RUST_LOG` when set.

use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_LOG_FILTER: &str = "astward=info";

/// How much history a job log keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retention {
    /// Live file plus archives.
    pub files: usize,
    pub bytes_per_file: u64,
}

impl Default for Retention {
    fn default() -> Self {
        Self {
            files: 5,
            bytes_per_file: 10 * 1024 * 1024,
        }
    }
}

/// Logging configuration for one host process.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log file stem. Characters outside `[A-Za-z0-9_-]` become `_`.
    pub job_name: String,
    /// Mirror the file filter on stderr instead of warnings only.
    pub verbose: bool,
    /// Overrides `$ASTWARD_HOME/logs`.
    pub log_dir: Option<PathBuf>,
    pub retention: Retention,
}

impl LogConfig {
    pub fn new(job_name: impl Into<String>) -> Self {
        Self {
            job_name: job_name.into(),
            verbose: false,
            log_dir: None,
            retention: Retention::default(),
        }
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    pub fn with_retention(mut self, retention: Retention) -> Self {
        self.retention = retention;
        self
    }
}

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Install the global subscriber and return the live log file path.
/// Fails if a subscriber is already installed.
pub fn init_logging(config: LogConfig) -> Result<PathBuf> {
    let dir = match config.log_dir {
        Some(dir) => dir,
        None => logs_dir()?,
    };
    let job_log = JobLog::open(&dir, &config.job_name, config.retention)
        .with_context(|| format!("Failed to open job log in {}", dir.display()))?;
    let live = job_log.live_path();

    let stderr_filter = if config.verbose {
        filter()
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(job_log))
                .with_ansi(false)
                .with_filter(filter()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_filter(stderr_filter),
        )
        .try_init()
        .context("Global tracing subscriber already installed")?;

    Ok(live)
}

/// Astward home directory: `$ASTWARD_HOME` or `~/.astward`.
pub fn astward_home() -> Result<PathBuf> {
    if let Ok(home) = std::env::var("ASTWARD_HOME") {
        return Ok(PathBuf::from(home));
    }
    dirs::home_dir()
        .map(|home| home.join(".astward"))
        .context("Could not determine home directory")
}

pub fn logs_dir() -> Result<PathBuf> {
    Ok(astward_home()?.join("logs"))
}

/// Append-only `<job>.log`. Once a write would push it past the byte cap it
/// is archived as `<job>.1.log`, older archives move up one slot and the
/// oldest beyond the retention is dropped.
struct JobLog {
    dir: PathBuf,
    stem: String,
    retention: Retention,
    live: Option<File>,
    size: u64,
}

impl JobLog {
    fn open(dir: &Path, job_name: &str, retention: Retention) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let mut log = Self {
            dir: dir.to_path_buf(),
            stem: file_stem(job_name),
            retention: Retention {
                files: retention.files.max(1),
                ..retention
            },
            live: None,
            size: 0,
        };
        log.open_live()?;
        if log.size > log.retention.bytes_per_file {
            log.archive()?;
        }
        Ok(log)
    }

    fn live_path(&self) -> PathBuf {
        self.slot(0)
    }

    /// Slot 0 is the live file; archives count up from 1.
    fn slot(&self, n: usize) -> PathBuf {
        match n {
            0 => self.dir.join(format!("{}.log", self.stem)),
            n => self.dir.join(format!("{}.{}.log", self.stem, n)),
        }
    }

    fn open_live(&mut self) -> io::Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.live_path())?;
        self.size = file.metadata()?.len();
        self.live = Some(file);
        Ok(())
    }

    fn archive(&mut self) -> io::Result<()> {
        if let Some(mut live) = self.live.take() {
            live.flush()?;
        }
        let last = self.retention.files - 1;
        remove_if_present(&self.slot(last))?;
        for n in (0..last).rev() {
            let from = self.slot(n);
            if from.exists() {
                fs::rename(&from, self.slot(n + 1))?;
            }
        }
        self.open_live()
    }
}

fn remove_if_present(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
        _ => Ok(()),
    }
}

impl Write for JobLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.size > 0 && self.size + buf.len() as u64 > self.retention.bytes_per_file {
            self.archive()?;
        }
        let Some(live) = self.live.as_mut() else {
            return Err(io::Error::new(io::ErrorKind::Other, "job log is closed"));
        };
        let written = live.write(buf)?;
        self.size += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.live.as_mut().map_or(Ok(()), |live| live.flush())
    }
}

fn file_stem(job_name: &str) -> String {
    let stem: String = job_name
        .chars()
        .map(|ch| match ch {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' => ch,
            _ => '_',
        })
        .collect();
    if stem.is_empty() {
        "astward".to_string()
    } else {
        stem
    }
}
