//! Tracing setup. Logs go to stderr by default and stay quiet below `warn`
//! unless `RUST_LOG` says otherwise, so a normal run prints only the answer.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const DEFAULT_LOG_FILTER: &str = "warn";
const DEFAULT_LOG_FILE_NAME: &str = "helpp.log";

const ENV_LOG_FORMAT: &str = "HELPP_LOG_FORMAT";
const ENV_LOG_OUTPUT: &str = "HELPP_LOG_OUTPUT";
const ENV_LOG_FILE: &str = "HELPP_LOG_FILE";

static LOG_GUARD: Mutex<Option<WorkerGuard>> = Mutex::new(None);

type InitResult = Result<(), Box<dyn std::error::Error + Send + Sync + 'static>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn parse(raw: Option<&str>) -> Self {
        match raw.map(|value| value.trim().to_ascii_lowercase()).as_deref() {
            Some("json") => Self::Json,
            _ => Self::Pretty,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LogOutput {
    Stderr,
    File,
    Both,
}

impl LogOutput {
    fn parse(raw: Option<&str>) -> Self {
        match raw.map(|value| value.trim().to_ascii_lowercase()).as_deref() {
            Some("file") => Self::File,
            Some("both") => Self::Both,
            _ => Self::Stderr,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Stderr => "stderr",
            Self::File => "file",
            Self::Both => "both",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct LogSettings {
    format: LogFormat,
    output: LogOutput,
    file_path: PathBuf,
}

impl LogSettings {
    fn from_env() -> Self {
        Self::from_env_with(|key| env::var(key).ok())
    }

    fn from_env_with(mut get_var: impl FnMut(&str) -> Option<String>) -> Self {
        Self {
            format: LogFormat::parse(get_var(ENV_LOG_FORMAT).as_deref()),
            output: LogOutput::parse(get_var(ENV_LOG_OUTPUT).as_deref()),
            file_path: get_var(ENV_LOG_FILE)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(default_log_file_path),
        }
    }
}

fn default_log_file_path() -> PathBuf {
    env::temp_dir().join("helpp").join(DEFAULT_LOG_FILE_NAME)
}

/// Daily-rotated file writer; the file name becomes the rotation prefix.
fn build_file_writer(path: &Path) -> std::io::Result<(NonBlocking, WorkerGuard)> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| std::ffi::OsStr::new(DEFAULT_LOG_FILE_NAME));

    fs::create_dir_all(dir)?;
    let appender = tracing_appender::rolling::daily(dir, file_name);
    Ok(tracing_appender::non_blocking(appender))
}

fn install(format: LogFormat, writer: BoxMakeWriter, ansi: bool) -> InitResult {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(ansi);
    let fmt_layer = match format {
        LogFormat::Pretty => fmt_layer.boxed(),
        LogFormat::Json => fmt_layer.json().boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()?;
    Ok(())
}

fn install_stderr(format: LogFormat) -> InitResult {
    install(format, BoxMakeWriter::new(std::io::stderr), true)
}

/// File or file+stderr output. Falls back to stderr alone when the file
/// writer cannot be created.
fn install_with_file(settings: &LogSettings) -> InitResult {
    let (file_writer, guard) = match build_file_writer(&settings.file_path) {
        Ok(parts) => parts,
        Err(err) => {
            let fallback = match settings.output {
                LogOutput::Both => "using stderr only",
                _ => "using stderr instead",
            };
            eprintln!(
                "helpp: failed to initialize {}={} at '{}': {}; {}",
                ENV_LOG_OUTPUT,
                settings.output.as_str(),
                settings.file_path.display(),
                err,
                fallback
            );
            return install_stderr(settings.format);
        }
    };

    let writer = match settings.output {
        LogOutput::Both => BoxMakeWriter::new(std::io::stderr.and(file_writer)),
        _ => BoxMakeWriter::new(file_writer),
    };
    install(settings.format, writer, false)?;

    if let Ok(mut slot) = LOG_GUARD.lock() {
        *slot = Some(guard);
    }
    Ok(())
}

/// Installs the global subscriber. Later calls are no-ops.
pub fn init() {
    let settings = LogSettings::from_env();
    let _ = match settings.output {
        LogOutput::Stderr => install_stderr(settings.format),
        LogOutput::File | LogOutput::Both => install_with_file(&settings),
    };
}

/// Flushes buffered file output. Call before the process exits.
pub fn shutdown() {
    if let Ok(mut slot) = LOG_GUARD.lock() {
        slot.take();
    }
}
