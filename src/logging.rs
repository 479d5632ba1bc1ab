/// Diagnostic log setup.
///
/// The terminal is in raw mode on the alternate screen while the card is up,
/// so log lines go to a file instead of stderr.
///
///   HONGBAO_LOG       tracing filter (default `hongbao=info`)
///   HONGBAO_LOG_FILE  log path (default `hongbao.log` in the temp dir)

use std::env;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub fn log_path() -> PathBuf {
    env::var_os("HONGBAO_LOG_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|| env::temp_dir().join("hongbao.log"))
}

/// Install the global subscriber. Failing to open the log file leaves
/// logging off; the card itself still runs.
pub fn init() {
    let path = log_path();
    let file = match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: could not open log file {}: {e}", path.display());
            return;
        }
    };

    let filter = EnvFilter::try_from_env("HONGBAO_LOG")
        .unwrap_or_else(|_| EnvFilter::new("hongbao=info"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        .try_init();
}
