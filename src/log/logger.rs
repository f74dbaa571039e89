use crate::{
    config::Config,
    log::{log_msg::LogMsg, logger_handle::LoggerHandle},
};

use std::{
    fs::{self, OpenOptions},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
    sync::{
        Arc,
        mpsc::{self, TrySendError},
    },
    thread,
    time::{SystemTime, UNIX_EPOCH},
};

/// Flush to disk every 100 lines if debugging/tracing (to see crashes near real-time).
#[cfg(feature = "log-debug")]
const FLUSH_BATCH_SIZE: u32 = 100;

/// Flush to disk every 1000 lines in production/default (to save I/O & CPU).
#[cfg(not(feature = "log-debug"))]
const FLUSH_BATCH_SIZE: u32 = 1_000;

/// Bounded, non-blocking logger that writes to a per-process log file.
///
/// A dedicated worker thread consumes log messages from a bounded channel and
/// writes them to a file, flushing every `FLUSH_BATCH_SIZE` lines. Producers
/// call `try_log` and never block; when the queue is full the message is
/// dropped.
pub struct Logger {
    handle: LoggerHandle,
    _thread: Option<thread::JoinHandle<()>>,
    file_path: PathBuf,
}

impl Logger {
    /// Starts the logger using `[logging]` keys from the configuration
    /// (`log_path`, `log_filename`), falling back to a `logs/` directory next
    /// to the executable.
    #[must_use]
    pub fn start_from_config(cap: usize, config: &Arc<Config>) -> Self {
        let app_name = config.get_non_empty("logging", "log_filename");
        if let Some(dir) = config.get_non_empty("logging", "log_path") {
            Self::start_in_dir(PathBuf::from(dir), app_name, cap)
        } else {
            Self::start_default(app_name, cap)
        }
    }

    /// Creates a `logs/` directory next to the executable and starts the logger there.
    #[must_use]
    pub fn start_default(app_name: Option<&str>, cap: usize) -> Self {
        let base = exe_dir_fallback_cwd().join("logs");
        Self::start_in_dir(base, app_name, cap)
    }

    /// Starts the logger in a specific directory, creating it if missing. The
    /// filename carries a timestamp and the process id so concurrent runs
    /// never collide.
    pub fn start_in_dir<D: AsRef<Path>>(dir: D, app_name: Option<&str>, cap: usize) -> Self {
        let dir = dir.as_ref().to_path_buf();
        let _ = fs::create_dir_all(&dir);

        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let pid = std::process::id();
        let fname = match app_name {
            Some(name) => format!("{name}-{secs}-pid{pid}.log"),
            None => format!("callsig-{secs}-pid{pid}.log"),
        };
        let file_path = dir.join(&fname);

        let (tx, rx) = mpsc::sync_channel::<LogMsg>(cap);
        let file_path_clone = file_path.clone();

        let _thread = thread::Builder::new()
            .name("logger-worker".into())
            .spawn(move || {
                // Try target file -> temp file -> sink (never panic).
                let writer: Box<dyn Write + Send> = if let Ok(f) = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&file_path_clone)
                {
                    Box::new(f)
                } else {
                    let fallback = std::env::temp_dir().join("callsig-fallback.log");
                    match OpenOptions::new().create(true).append(true).open(&fallback) {
                        Ok(f) => Box::new(f),
                        Err(_) => Box::new(io::sink()),
                    }
                };

                let mut out: BufWriter<Box<dyn Write + Send>> = BufWriter::new(writer);
                let mut lines_written: u32 = 0;

                while let Ok(m) = rx.recv() {
                    let _ = writeln!(
                        &mut out,
                        "[{:?}] {} {} | {}",
                        m.level, m.ts_ms, m.target, m.text
                    );
                    lines_written = lines_written.wrapping_add(1);
                    if lines_written.is_multiple_of(FLUSH_BATCH_SIZE) {
                        let _ = out.flush();
                    }
                }
                let _ = out.flush();
            })
            .ok();

        Self {
            handle: LoggerHandle { tx },
            _thread,
            file_path,
        }
    }

    /// Attempts to enqueue a log message without blocking the current thread.
    ///
    /// # Errors
    /// Returns a [`TrySendError<LogMsg>`] if the internal queue is full or the
    /// worker has stopped; the message is dropped in either case.
    pub fn try_log<S: Into<String>>(
        &self,
        level: crate::log::log_level::LogLevel,
        text: S,
        target: &'static str,
    ) -> Result<(), TrySendError<LogMsg>> {
        self.handle.try_log(level, text, target)
    }

    /// Returns a cloneable handle to the logger sink.
    #[must_use]
    pub fn handle(&self) -> LoggerHandle {
        self.handle.clone()
    }

    /// Returns the path of the active log file.
    #[must_use]
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }
}

/// Locates the directory next to the executable, or falls back to the current
/// working directory on error.
fn exe_dir_fallback_cwd() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}
