//! Data-file locations.

use std::path::PathBuf;

const DATA_DIR_ENV: &str = "DOW_STATS_DATA_DIR";
const MATCH_DATA_FILE: &str = "match_data.json";
const ALIAS_FILE: &str = "player_aliases.json";

/// Snapshot directory, overridable via `DOW_STATS_DATA_DIR`. Defaults to the
/// working directory.
pub fn data_dir() -> PathBuf {
    match std::env::var(DATA_DIR_ENV) {
        Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
        _ => PathBuf::from("."),
    }
}

pub fn match_data_path() -> PathBuf {
    data_dir().join(MATCH_DATA_FILE)
}

pub fn alias_path() -> PathBuf {
    data_dir().join(ALIAS_FILE)
}
