use crate::config::TelemetryConfig;
use chrono::Local;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
pub enum TelemetryError {
    EnvFilter { value: String, source: ParseError },
    Subscriber(Box<dyn std::error::Error + Send + Sync>),
    LogFile { path: PathBuf, source: io::Error },
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::EnvFilter { value, .. } => {
                write!(
                    f,
                    "invalid log level/filter '{}': unable to build EnvFilter",
                    value
                )
            }
            TelemetryError::Subscriber(err) => write!(f, "telemetry error: {err}"),
            TelemetryError::LogFile { path, .. } => {
                write!(f, "unable to create log file {}", path.display())
            }
        }
    }
}

impl std::error::Error for TelemetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TelemetryError::EnvFilter { source, .. } => Some(source),
            TelemetryError::Subscriber(err) => Some(&**err),
            TelemetryError::LogFile { source, .. } => Some(source),
        }
    }
}

/// Duplicates every log line to stdout and the per-run log file.
#[derive(Clone)]
struct TeeMakeWriter {
    file: Arc<Mutex<File>>,
}

struct TeeWriter {
    file: Arc<Mutex<File>>,
}

impl<'a> MakeWriter<'a> for TeeMakeWriter {
    type Writer = TeeWriter;

    fn make_writer(&'a self) -> Self::Writer {
        TeeWriter {
            file: Arc::clone(&self.file),
        }
    }
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stdout().write_all(buf)?;
        if let Ok(mut file) = self.file.lock() {
            file.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stdout().flush()?;
        if let Ok(mut file) = self.file.lock() {
            file.flush()?;
        }
        Ok(())
    }
}

/// Initialise logging: env-filtered, compact, written to stdout and to a
/// timestamped file under `log_dir`. Returns the log file path.
pub fn init(config: &TelemetryConfig, log_dir: &Path) -> Result<PathBuf, TelemetryError> {
    fs::create_dir_all(log_dir).map_err(|source| TelemetryError::LogFile {
        path: log_dir.to_path_buf(),
        source,
    })?;
    let log_path = log_dir.join(format!(
        "populate_{}.log",
        Local::now().format("%Y-%m-%d_%H-%M-%S")
    ));
    let file = File::create(&log_path).map_err(|source| TelemetryError::LogFile {
        path: log_path.clone(),
        source,
    })?;

    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => {
            EnvFilter::try_new(&config.log_level).map_err(|source| TelemetryError::EnvFilter {
                value: config.log_level.clone(),
                source,
            })?
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .with_ansi(false)
        .with_writer(TeeMakeWriter {
            file: Arc::new(Mutex::new(file)),
        })
        .try_init()
        .map_err(TelemetryError::Subscriber)?;

    Ok(log_path)
}
