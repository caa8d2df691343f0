//! Config handling

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use chrono::Local;
use simple_logger::SimpleLogger;
use tracing::log::{self, LevelFilter, Log, Metadata, Record};

fn console_logger(debug: bool) -> SimpleLogger {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut logger = SimpleLogger::new().with_level(level);
    if !debug {
        logger = logger
            .with_module_level("tracing", LevelFilter::Warn)
            .with_module_level("tower_http", LevelFilter::Warn)
            .with_module_level("reqwest", LevelFilter::Warn)
            .with_module_level("rustls", LevelFilter::Info)
            .with_module_level("hyper_util", LevelFilter::Info)
            .with_module_level("h2", LevelFilter::Info);
    }
    logger
}

/// Sends every record the console logger accepts to a text file as well.
pub struct TeeLogger {
    console: SimpleLogger,
    file: Mutex<File>,
}

impl TeeLogger {
    /// Wraps `console`, appending to (and creating if needed) `path`.
    pub fn new(console: SimpleLogger, path: &Path) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            console,
            file: Mutex::new(file),
        })
    }

    fn max_level(&self) -> LevelFilter {
        self.console.max_level()
    }
}

impl Log for TeeLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.console.enabled(metadata)
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        self.console.log(record);
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(
                file,
                "{} - {} - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S,%3f"),
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        self.console.flush();
        if let Ok(mut file) = self.file.lock() {
            let _ = file.flush();
        }
    }
}

/// Sets up logging based on the debug flag, mirroring to `log_file` when given.
///
/// Call once at startup; the logger is process-wide.
pub fn setup_logging(debug: bool, log_file: Option<&Path>) -> Result<(), Box<std::io::Error>> {
    let console = console_logger(debug);
    let Some(path) = log_file else {
        return console.init().map_err(|err| {
            eprintln!("Failed to initialize logger: {}", err);
            Box::new(std::io::Error::other(err))
        });
    };

    let logger = TeeLogger::new(console, path).map_err(|err| {
        eprintln!("Failed to open log file {}: {}", path.display(), err);
        Box::new(err)
    })?;
    let level = logger.max_level();
    log::set_boxed_logger(Box::new(logger)).map_err(|err| {
        eprintln!("Failed to initialize logger: {}", err);
        Box::new(std::io::Error::other(err))
    })?;
    log::set_max_level(level);
    Ok(())
}
