//! Full repopulation scan across all nine faction leaderboards.
//!
//! Fetches run sequentially with deliberate pacing; the scan trades
//! throughput for staying polite to the upstream API. Failures are isolated
//! per match and per player, and both snapshots are written once at the end
//! rather than per player.

use std::thread;
use std::time::Duration;

use tracing::info;

use crate::identity::{AliasDirectory, validate_steam_id};
use crate::normalize::ingest_matches;
use crate::races::FACTIONS;
use crate::relic_api::{
    MatchHistoryResponse, fetch_leaderboard_page, fetch_match_history_by_steam_id,
    steam_id_from_name,
};
use crate::store::MatchStore;

/// Players requested per leaderboard page.
pub const PAGE_SIZE: u32 = 200;
/// Pagination safety cap per leaderboard.
const SCAN_START_CAP: u32 = 1000;
const PLAYER_PACING: Duration = Duration::from_millis(50);
const LEADERBOARD_PACING: Duration = Duration::from_millis(100);

#[derive(Debug, Default)]
pub struct ScanSummary {
    pub players_processed: u32,
    /// Players not previously in the alias directory.
    pub new_players: u32,
    pub matches_added: u32,
    pub aliases_stored: u32,
    /// Ranked 1v1s rejected by validation during the scan.
    pub errors: u32,
    /// Players processed per faction, in scan order.
    pub per_leaderboard: Vec<(String, u32)>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PlayerIngest {
    pub matches_added: usize,
    pub aliases_stored: usize,
    pub anomalies: usize,
}

/// Fetch one player's recent history and run every match through
/// normalization. Also harvests aliases from the accompanying profile list.
pub fn ingest_player_history(
    steam_id: &str,
    store: &mut MatchStore,
    aliases: &mut AliasDirectory,
) -> PlayerIngest {
    let response = fetch_match_history_by_steam_id(steam_id);
    ingest_history_response(steam_id, &response, store, aliases)
}

/// Pure ingestion of an already-fetched history payload.
pub fn ingest_history_response(
    steam_id: &str,
    response: &MatchHistoryResponse,
    store: &mut MatchStore,
    aliases: &mut AliasDirectory,
) -> PlayerIngest {
    let mut result = PlayerIngest::default();

    let own_name = format!("/steam/{steam_id}");
    if let Some(profile) = response.profiles.iter().find(|p| p.name == own_name) {
        if aliases.store(steam_id, &profile.alias) {
            result.aliases_stored += 1;
        }
    }

    let tally = ingest_matches(&response.match_history, &response.profiles, store, aliases);
    result.matches_added = tally.added;
    result.anomalies = tally.anomalies;
    result.aliases_stored += aliases.batch_store_from_profiles(&response.profiles);
    result
}

/// Repopulate the store from every faction ladder. `progress` is invoked
/// once per leaderboard; no failure short of the process dying aborts the
/// scan.
pub fn bulk_scan(
    store: &mut MatchStore,
    aliases: &mut AliasDirectory,
    mut progress: impl FnMut(&str),
) -> ScanSummary {
    let mut summary = ScanSummary::default();
    progress(&format!(
        "scanning {} leaderboards for match data",
        FACTIONS.len()
    ));

    for (index, (leaderboard_id, faction)) in FACTIONS.iter().enumerate() {
        progress(&format!(
            "scanning {faction} ({}/{})",
            index + 1,
            FACTIONS.len()
        ));
        let players = scan_leaderboard(*leaderboard_id, store, aliases, &mut summary);
        summary
            .per_leaderboard
            .push(((*faction).to_string(), players));
        progress(&format!("{faction}: processed {players} players"));
        thread::sleep(LEADERBOARD_PACING);
    }

    // One snapshot pass at the end; per-player writes would thrash the disk
    // across a multi-thousand-player scan.
    store.save();
    aliases.save();
    info!(
        "scan complete: {} players, {} matches added, {} validation rejects",
        summary.players_processed, summary.matches_added, summary.errors
    );
    summary
}

fn scan_leaderboard(
    leaderboard_id: u32,
    store: &mut MatchStore,
    aliases: &mut AliasDirectory,
    summary: &mut ScanSummary,
) -> u32 {
    let mut players_processed = 0;
    let mut start = 1;

    loop {
        let page = fetch_leaderboard_page(leaderboard_id, start, PAGE_SIZE);
        if page.stat_groups.is_empty() {
            break;
        }

        for group in &page.stat_groups {
            let Some(member) = group.members.first() else {
                continue;
            };
            let Some(steam_id) = steam_id_from_name(&member.name) else {
                continue;
            };
            if !validate_steam_id(steam_id) {
                continue;
            }

            if !aliases.contains(steam_id) {
                summary.new_players += 1;
            }
            if aliases.store(steam_id, &member.alias) {
                summary.aliases_stored += 1;
            }

            let ingest = ingest_player_history(steam_id, store, aliases);
            summary.matches_added += ingest.matches_added as u32;
            summary.aliases_stored += ingest.aliases_stored as u32;
            summary.errors += ingest.anomalies as u32;
            summary.players_processed += 1;
            players_processed += 1;

            thread::sleep(PLAYER_PACING);
        }

        match next_page_start(page.stat_groups.len(), start) {
            Some(next) => start = next,
            None => break,
        }
    }

    players_processed
}

/// A short page is the end of the ladder and stops pagination without a
/// further fetch; a full page continues only while under the safety cap.
fn next_page_start(page_len: usize, start: u32) -> Option<u32> {
    if (page_len as u32) < PAGE_SIZE {
        return None;
    }
    let next = start + PAGE_SIZE;
    (next <= SCAN_START_CAP).then_some(next)
}
