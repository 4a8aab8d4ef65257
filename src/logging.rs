use std::fs::{self, OpenOptions};
use std::path::Path;

use env_logger::{Builder, Env, Target};

use crate::app_dirs::AppDirs;

/// Environment variable holding the log filter, e.g. `PINYIN_DRILL_LOG=debug`
pub const LOG_ENV: &str = "PINYIN_DRILL_LOG";

/// Route `log` output to the state directory so it never paints over the TUI.
///
/// Best effort: returns false when the file cannot be opened or a logger is already set.
pub fn init() -> bool {
    match AppDirs::log_path() {
        Some(path) => init_with_path(&path),
        None => false,
    }
}

pub fn init_with_path(path: &Path) -> bool {
    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return false;
        }
    }

    let file = match OpenOptions::new().create(true).append(true).open(path) {
        Ok(f) => f,
        Err(_) => return false,
    };

    Builder::from_env(Env::new().filter_or(LOG_ENV, "warn"))
        .target(Target::Pipe(Box::new(file)))
        .format_timestamp_secs()
        .try_init()
        .is_ok()
}
