//! Deduplicated match store.
//!
//! Owns the canonical match map and the processed-id set. The two are only
//! mutated through [`MatchStore::insert`], which updates them together, so
//! the set always matches the map's key set.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// One side of a stored match.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerSlot {
    pub steam_id: String,
    /// Alias at match time; may be stale relative to the directory.
    pub alias: String,
    pub race: String,
    pub old_rating: i64,
    pub new_rating: i64,
}

/// Immutable record of one completed ranked 1v1 game.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchRecord {
    pub match_id: String,
    pub map_name: String,
    pub start_time: i64,
    pub completion_time: i64,
    pub players: [PlayerSlot; 2],
    pub winner_steam_id: String,
    pub winner_race: String,
}

impl MatchRecord {
    pub fn features_player(&self, steam_id: &str) -> bool {
        self.players.iter().any(|p| p.steam_id == steam_id)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct MatchFile {
    #[serde(default)]
    stored_matches: HashMap<String, MatchRecord>,
    #[serde(default)]
    processed_match_ids: Vec<String>,
}

#[derive(Debug, Default)]
pub struct MatchStore {
    matches: HashMap<String, MatchRecord>,
    processed: HashSet<String>,
    path: PathBuf,
}

impl MatchStore {
    /// Load the snapshot at `path`. Missing or corrupt files start empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut store = Self {
            path,
            ..Self::default()
        };
        if let Some(file) = load_match_file(&store.path) {
            store.processed = file.processed_match_ids.into_iter().collect();
            // The set must cover every stored key even if the snapshot
            // somehow drifted.
            store.processed.extend(file.stored_matches.keys().cloned());
            store.matches = file.stored_matches;
            info!(
                "loaded {} matches, {} processed ids from {}",
                store.matches.len(),
                store.processed.len(),
                store.path.display()
            );
        }
        store
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn is_processed(&self, match_id: &str) -> bool {
        self.processed.contains(match_id)
    }

    /// Insert a match, updating the map and the processed set together.
    /// A duplicate id is a no-op returning false.
    pub fn insert(&mut self, record: MatchRecord) -> bool {
        if self.processed.contains(&record.match_id) {
            return false;
        }
        self.processed.insert(record.match_id.clone());
        self.matches.insert(record.match_id.clone(), record);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &MatchRecord> {
        self.matches.values()
    }

    /// Matches featuring the player, most recently completed first.
    pub fn matches_by_player(&self, steam_id: &str, limit: usize) -> Vec<&MatchRecord> {
        let mut found: Vec<&MatchRecord> = self
            .matches
            .values()
            .filter(|m| m.features_player(steam_id))
            .collect();
        found.sort_by(|a, b| {
            b.completion_time
                .cmp(&a.completion_time)
                .then_with(|| a.match_id.cmp(&b.match_id))
        });
        found.truncate(limit);
        found
    }

    /// Matches where both players' pre-match ratings fall inside the
    /// inclusive range. A one-sided range constrains only that side; no
    /// bounds returns everything.
    pub fn filter_by_elo_range(&self, min: Option<i64>, max: Option<i64>) -> Vec<&MatchRecord> {
        if min.is_none() && max.is_none() {
            return self.matches.values().collect();
        }
        self.matches
            .values()
            .filter(|m| {
                m.players.iter().all(|p| {
                    min.is_none_or(|lo| p.old_rating >= lo)
                        && max.is_none_or(|hi| p.old_rating <= hi)
                })
            })
            .collect()
    }

    /// Write the snapshot. Failures are logged and skipped; the store is
    /// rebuildable from a rescan.
    pub fn save(&self) {
        let file = MatchFile {
            stored_matches: self.matches.clone(),
            processed_match_ids: self.processed.iter().cloned().collect(),
        };
        if let Err(err) = write_snapshot(&self.path, &file) {
            warn!(
                "failed to save match data to {}: {err:#}",
                self.path.display()
            );
        }
    }
}

fn load_match_file(path: &Path) -> Option<MatchFile> {
    let raw = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&raw) {
        Ok(file) => Some(file),
        Err(err) => {
            warn!("corrupt match file {}: {err}", path.display());
            None
        }
    }
}

fn write_snapshot(path: &Path, file: &MatchFile) -> anyhow::Result<()> {
    use anyhow::Context;

    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir).context("create data dir")?;
        }
    }
    let json = serde_json::to_string(file).context("serialize match data")?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).context("write match snapshot")?;
    fs::rename(&tmp, path).context("swap match snapshot")?;
    Ok(())
}
