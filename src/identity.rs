//! Steam-ID-to-alias directory.
//!
//! The directory is append/update-only from the ingestion path: entries are
//! inserted or refreshed when a different alias is observed, never deleted.
//! It persists as a whole-file JSON snapshot alongside the match data.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::relic_api::{RawProfile, steam_id_from_name};

pub const UNKNOWN_PLAYER: &str = "Unknown Player";

const STEAM_ID_LEN: usize = 17;
const VALIDATION_CACHE_CAP: usize = 64;
const MAX_SUGGESTIONS: usize = 5;
const MAX_SUBSTRING_CANDIDATES: usize = 50;

static VALIDATION_CACHE: Lazy<Mutex<HashMap<String, bool>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// True iff `id` is exactly 17 ASCII digits. Memoized through a small
/// fixed-capacity cache; the input domain is narrow enough that entries are
/// simply not added once the cache is full.
pub fn validate_steam_id(id: &str) -> bool {
    if let Ok(cache) = VALIDATION_CACHE.lock() {
        if let Some(hit) = cache.get(id) {
            return *hit;
        }
    }
    let valid = id.len() == STEAM_ID_LEN && id.bytes().all(|b| b.is_ascii_digit());
    if let Ok(mut cache) = VALIDATION_CACHE.lock() {
        if cache.len() < VALIDATION_CACHE_CAP {
            cache.insert(id.to_string(), valid);
        }
    }
    valid
}

/// Outcome of resolving a user-supplied identifier. Zero-match and ambiguity
/// both come back with `steam_id: None`; ambiguity carries suggestions.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub steam_id: Option<String>,
    pub alias: String,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct AliasFile {
    #[serde(default)]
    player_aliases: HashMap<String, String>,
    #[serde(default)]
    last_updated: String,
    #[serde(default)]
    total_aliases: usize,
}

#[derive(Debug, Default)]
pub struct AliasDirectory {
    aliases: HashMap<String, String>,
    path: PathBuf,
}

impl AliasDirectory {
    /// Load the directory from `path`. A missing or corrupt file is a normal
    /// cold start and yields an empty directory.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let aliases = match load_alias_file(&path) {
            Some(file) => {
                info!(
                    "loaded {} aliases from {} (last updated: {})",
                    file.player_aliases.len(),
                    path.display(),
                    if file.last_updated.is_empty() {
                        "unknown"
                    } else {
                        &file.last_updated
                    }
                );
                file.player_aliases
            }
            None => HashMap::new(),
        };
        Self { aliases, path }
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    pub fn contains(&self, steam_id: &str) -> bool {
        self.aliases.contains_key(steam_id)
    }

    pub fn alias_for(&self, steam_id: &str) -> String {
        self.aliases
            .get(steam_id)
            .cloned()
            .unwrap_or_else(|| UNKNOWN_PLAYER.to_string())
    }

    /// Insert or refresh an alias. Invalid ids, empty aliases and the
    /// placeholder are no-ops; returns whether the directory changed.
    pub fn store(&mut self, steam_id: &str, alias: &str) -> bool {
        if !validate_steam_id(steam_id) || alias.is_empty() || alias == UNKNOWN_PLAYER {
            return false;
        }
        if self.aliases.get(steam_id).is_some_and(|known| known == alias) {
            return false;
        }
        self.aliases.insert(steam_id.to_string(), alias.to_string());
        true
    }

    /// Harvest aliases from a profile list that arrived alongside some other
    /// payload. Returns the number of entries actually changed.
    pub fn batch_store_from_profiles(&mut self, profiles: &[RawProfile]) -> usize {
        let mut stored = 0;
        for profile in profiles {
            let Some(steam_id) = steam_id_from_name(&profile.name) else {
                continue;
            };
            let steam_id = steam_id.to_string();
            if self.store(&steam_id, &profile.alias) {
                stored += 1;
            }
        }
        stored
    }

    /// Exact case-insensitive alias match wins outright; otherwise a
    /// substring search resolves only when it is unambiguous.
    pub fn find_steam_id_by_alias(&self, alias: &str) -> Option<String> {
        let needle = alias.to_lowercase();

        for (steam_id, known) in &self.aliases {
            if known.to_lowercase() == needle {
                return Some(steam_id.clone());
            }
        }

        let mut candidates = Vec::new();
        for (steam_id, known) in &self.aliases {
            if known.to_lowercase().contains(&needle) {
                candidates.push(steam_id.clone());
                if candidates.len() >= MAX_SUBSTRING_CANDIDATES {
                    break;
                }
            }
        }

        if candidates.len() == 1 {
            candidates.pop()
        } else {
            None
        }
    }

    pub fn resolve(&self, identifier: &str) -> Resolution {
        if validate_steam_id(identifier) {
            return Resolution {
                steam_id: Some(identifier.to_string()),
                alias: self.alias_for(identifier),
                suggestions: Vec::new(),
            };
        }

        if let Some(steam_id) = self.find_steam_id_by_alias(identifier) {
            let alias = self.alias_for(&steam_id);
            return Resolution {
                steam_id: Some(steam_id),
                alias,
                suggestions: Vec::new(),
            };
        }

        let needle = identifier.to_lowercase();
        let mut suggestions = Vec::new();
        for known in self.aliases.values() {
            if known.to_lowercase().contains(&needle) {
                suggestions.push(known.clone());
                if suggestions.len() >= MAX_SUGGESTIONS {
                    break;
                }
            }
        }

        Resolution {
            steam_id: None,
            alias: identifier.to_string(),
            suggestions,
        }
    }

    /// Write the snapshot. Failures are logged and skipped; the directory is
    /// rebuildable from a rescan.
    pub fn save(&self) {
        let file = AliasFile {
            player_aliases: self.aliases.clone(),
            last_updated: Utc::now().to_rfc3339(),
            total_aliases: self.aliases.len(),
        };
        if let Err(err) = write_snapshot(&self.path, &file) {
            warn!("failed to save aliases to {}: {err:#}", self.path.display());
        }
    }
}

fn load_alias_file(path: &Path) -> Option<AliasFile> {
    let raw = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&raw) {
        Ok(file) => Some(file),
        Err(err) => {
            warn!("corrupt alias file {}: {err}", path.display());
            None
        }
    }
}

fn write_snapshot(path: &Path, file: &AliasFile) -> anyhow::Result<()> {
    use anyhow::Context;

    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir).context("create data dir")?;
        }
    }
    let json = serde_json::to_string(file).context("serialize aliases")?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).context("write alias snapshot")?;
    fs::rename(&tmp, path).context("swap alias snapshot")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_ID: &str = "76561198356992755";
    const OTHER_ID: &str = "76561198000000001";

    fn directory() -> AliasDirectory {
        AliasDirectory::default()
    }

    #[test]
    fn validates_seventeen_digit_ids_only() {
        assert!(validate_steam_id(VALID_ID));
        assert!(!validate_steam_id("12345"));
        assert!(!validate_steam_id("abc12345678901234"));
        assert!(!validate_steam_id("765611983569927556"));
        assert!(!validate_steam_id(""));
    }

    #[test]
    fn store_reports_changes_only() {
        let mut dir = directory();
        assert!(dir.store(VALID_ID, "FirstBlood"));
        assert!(!dir.store(VALID_ID, "FirstBlood"));
        assert!(dir.store(VALID_ID, "Renamed"));
        assert_eq!(dir.alias_for(VALID_ID), "Renamed");
    }

    #[test]
    fn store_rejects_invalid_ids_and_placeholder() {
        let mut dir = directory();
        assert!(!dir.store("12345", "Someone"));
        assert!(!dir.store(VALID_ID, UNKNOWN_PLAYER));
        assert!(!dir.store(VALID_ID, ""));
        assert!(dir.is_empty());
    }

    #[test]
    fn exact_alias_match_beats_substring() {
        let mut dir = directory();
        dir.store(VALID_ID, "Khorne");
        dir.store(OTHER_ID, "KhorneFlakes");
        assert_eq!(dir.find_steam_id_by_alias("khorne"), Some(VALID_ID.to_string()));
    }

    #[test]
    fn ambiguous_substring_yields_suggestions_without_id() {
        let mut dir = directory();
        dir.store(VALID_ID, "AngryMarine");
        dir.store(OTHER_ID, "SadMarine");
        let res = dir.resolve("marine");
        assert!(res.steam_id.is_none());
        assert_eq!(res.suggestions.len(), 2);
    }

    #[test]
    fn zero_match_yields_no_suggestions() {
        let dir = directory();
        let res = dir.resolve("nobody");
        assert!(res.steam_id.is_none());
        assert!(res.suggestions.is_empty());
    }

    #[test]
    fn id_identifier_resolves_directly() {
        let mut dir = directory();
        dir.store(VALID_ID, "Macha");
        let res = dir.resolve(VALID_ID);
        assert_eq!(res.steam_id.as_deref(), Some(VALID_ID));
        assert_eq!(res.alias, "Macha");
    }

    #[test]
    fn unknown_id_resolves_with_placeholder_alias() {
        let dir = directory();
        let res = dir.resolve(OTHER_ID);
        assert_eq!(res.steam_id.as_deref(), Some(OTHER_ID));
        assert_eq!(res.alias, UNKNOWN_PLAYER);
    }

    #[test]
    fn batch_store_skips_non_steam_profiles() {
        let mut dir = directory();
        let profiles = vec![
            RawProfile {
                profile_id: 1,
                name: format!("/steam/{VALID_ID}"),
                alias: "Gorgutz".to_string(),
            },
            RawProfile {
                profile_id: 2,
                name: "/xbox/999".to_string(),
                alias: "Ignored".to_string(),
            },
            RawProfile {
                profile_id: 3,
                name: "/steam/badid".to_string(),
                alias: "AlsoIgnored".to_string(),
            },
        ];
        assert_eq!(dir.batch_store_from_profiles(&profiles), 1);
        assert_eq!(dir.len(), 1);
    }
}
