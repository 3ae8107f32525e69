//! Live leaderboard views fetched from upstream.
//!
//! Unlike the store-backed aggregations these read the current ladder state
//! directly; only observed ranks and ratings are reported, nothing is
//! recomputed locally. Rank and identity rows arrive as two parallel lists
//! joined by statgroup id.

use std::collections::HashMap;

use tracing::debug;

use crate::identity::validate_steam_id;
use crate::races::{FACTIONS, faction_name};
use crate::relic_api::{LeaderboardResponse, fetch_leaderboard_page, steam_id_from_name};
use crate::stats::{WinLoss, effective_losses};

const TOP_ELO_PAGE_SIZE: u32 = 100;
/// Only entries inside the fetched rank window qualify for the top-ELO view.
const TOP_ELO_MAX_RANK: i64 = 100;

#[derive(Debug, Clone)]
pub struct LeaderboardEntry {
    pub steam_id: String,
    pub alias: String,
    /// Positive ranks only; unranked entries sort last.
    pub rank: Option<i64>,
    pub rating: i64,
    pub tally: WinLoss,
    pub streak: i64,
}

#[derive(Debug, Clone)]
pub struct TopEloEntry {
    pub steam_id: String,
    pub alias: String,
    pub faction: &'static str,
    pub leaderboard_id: u32,
    pub rank: i64,
    pub rating: i64,
    pub tally: WinLoss,
    /// Leaderboard ids where this player currently holds rank 1.
    pub led_factions: Vec<u32>,
}

impl TopEloEntry {
    pub fn is_faction_leader(&self) -> bool {
        !self.led_factions.is_empty()
    }
}

/// One faction ladder, sorted ascending by rank with unranked entries last.
pub fn faction_leaderboard(leaderboard_id: u32, start: u32, count: u32) -> Vec<LeaderboardEntry> {
    let response = fetch_leaderboard_page(leaderboard_id, start, count);
    build_faction_entries(&response, leaderboard_id)
}

/// Pure join of one leaderboard response, exposed for fixture tests.
pub fn build_faction_entries(
    response: &LeaderboardResponse,
    leaderboard_id: u32,
) -> Vec<LeaderboardEntry> {
    let players = player_lookup(response);

    let mut entries = Vec::new();
    for stat in &response.leaderboard_stats {
        if stat.leaderboard_id != leaderboard_id {
            continue;
        }
        let Some((steam_id, alias)) = players.get(&stat.statgroup_id) else {
            debug!("no identity row for statgroup {}", stat.statgroup_id);
            continue;
        };
        entries.push(LeaderboardEntry {
            steam_id: steam_id.clone(),
            alias: alias.clone(),
            rank: (stat.rank > 0).then_some(stat.rank),
            rating: stat.rating,
            tally: WinLoss {
                wins: stat.wins,
                losses: effective_losses(stat.losses, stat.drops),
            },
            streak: stat.streak,
        });
    }

    entries.sort_by_key(|e| e.rank.unwrap_or(i64::MAX));
    entries
}

/// Merge all faction ladders into one cross-faction view: each player keeps
/// only their highest-rated faction entry, rank-1 holders are flagged as
/// faction leaders, and the result is sorted descending by rating.
pub fn top_elo(limit: usize, min_games: u32) -> Vec<TopEloEntry> {
    let pages: Vec<(u32, LeaderboardResponse)> = FACTIONS
        .iter()
        .map(|(id, _)| (*id, fetch_leaderboard_page(*id, 1, TOP_ELO_PAGE_SIZE)))
        .collect();
    top_elo_from_pages(&pages, limit, min_games)
}

/// Pure merge of already-fetched faction pages, exposed for fixture tests.
pub fn top_elo_from_pages(
    pages: &[(u32, LeaderboardResponse)],
    limit: usize,
    min_games: u32,
) -> Vec<TopEloEntry> {
    let mut best: HashMap<String, TopEloEntry> = HashMap::new();
    let mut leaders: HashMap<String, Vec<u32>> = HashMap::new();

    for (leaderboard_id, response) in pages {
        let Some(faction) = faction_name(*leaderboard_id) else {
            continue;
        };
        let players = player_lookup(response);

        for stat in &response.leaderboard_stats {
            if stat.leaderboard_id != *leaderboard_id {
                continue;
            }
            let Some((steam_id, alias)) = players.get(&stat.statgroup_id) else {
                continue;
            };
            if stat.rank <= 0 || stat.rank > TOP_ELO_MAX_RANK {
                continue;
            }
            let tally = WinLoss {
                wins: stat.wins,
                losses: effective_losses(stat.losses, stat.drops),
            };
            if tally.total() < min_games {
                continue;
            }

            if stat.rank == 1 {
                leaders
                    .entry(steam_id.clone())
                    .or_default()
                    .push(*leaderboard_id);
            }

            let candidate = TopEloEntry {
                steam_id: steam_id.clone(),
                alias: alias.clone(),
                faction,
                leaderboard_id: *leaderboard_id,
                rank: stat.rank,
                rating: stat.rating,
                tally,
                led_factions: Vec::new(),
            };
            match best.get(steam_id) {
                Some(held) if held.rating >= candidate.rating => {}
                _ => {
                    best.insert(steam_id.clone(), candidate);
                }
            }
        }
    }

    let mut merged: Vec<TopEloEntry> = best.into_values().collect();
    for entry in &mut merged {
        if let Some(led) = leaders.get(&entry.steam_id) {
            entry.led_factions = led.clone();
            entry.led_factions.sort_unstable();
        }
    }

    merged.sort_by(|a, b| {
        b.rating
            .cmp(&a.rating)
            .then_with(|| a.steam_id.cmp(&b.steam_id))
    });
    merged.truncate(limit);
    merged
}

/// Identity rows keyed by statgroup id, Steam accounts only.
fn player_lookup(response: &LeaderboardResponse) -> HashMap<u64, (String, String)> {
    let mut players = HashMap::new();
    for group in &response.stat_groups {
        let Some(member) = group.members.first() else {
            continue;
        };
        let Some(steam_id) = steam_id_from_name(&member.name) else {
            continue;
        };
        if group.id == 0 || !validate_steam_id(steam_id) {
            continue;
        }
        players.insert(group.id, (steam_id.to_string(), member.alias.clone()));
    }
    players
}
