use env_logger::{Env, Target};
use std::fs::{self, OpenOptions};
use std::path::Path;

use crate::error::{FlinchError, Result};

/// Send log records to `path`. The terminal belongs to the UI, so nothing is
/// written to stderr. Level comes from `FLINCH_LOG`, default `info`.
pub fn init_file_logger(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    env_logger::Builder::from_env(Env::new().filter_or("FLINCH_LOG", "info"))
        .target(Target::Pipe(Box::new(file)))
        .format_timestamp_millis()
        .try_init()
        .map_err(|e| FlinchError::Logging(e.to_string()))
}
