//! Aggregate views over the match store and over personal leaderboard stats.
//!
//! Everything here is derived on demand; recomputing over the same store
//! contents yields identical results. Store-backed aggregations always go
//! through the ELO range filter, never the raw map.

use std::collections::BTreeMap;

use crate::races::{FACTIONS, faction_name, race_names};
use crate::relic_api::LeaderboardStat;
use crate::store::MatchStore;

/// Win/loss tally with the shared win-rate convention: percentage in
/// [0, 100], exactly 0.0 when no games were played.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WinLoss {
    pub wins: u32,
    pub losses: u32,
}

impl WinLoss {
    pub fn total(&self) -> u32 {
        self.wins + self.losses
    }

    pub fn win_rate(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            f64::from(self.wins) / f64::from(total) * 100.0
        }
    }
}

/// Reported losses minus drops, floored at zero. Disconnects never count as
/// effective losses.
pub fn effective_losses(losses: u32, drops: u32) -> u32 {
    losses.saturating_sub(drops)
}

#[derive(Debug, Clone)]
pub struct MapRaceStats {
    pub map_name: String,
    pub total_matches: u32,
    /// Every known race appears, zero-count races included.
    pub races: BTreeMap<String, WinLoss>,
}

/// Per-race performance on one map, over the ELO-filtered store.
pub fn map_race_statistics(
    store: &MatchStore,
    map_name: &str,
    min_elo: Option<i64>,
    max_elo: Option<i64>,
) -> MapRaceStats {
    let mut races: BTreeMap<String, WinLoss> = race_names()
        .map(|race| (race.to_string(), WinLoss::default()))
        .collect();
    let mut total_matches = 0;

    for m in store.filter_by_elo_range(min_elo, max_elo) {
        if m.map_name != map_name {
            continue;
        }
        total_matches += 1;

        let winner_race = &m.winner_race;
        let loser_race = if m.players[0].race == *winner_race {
            &m.players[1].race
        } else {
            &m.players[0].race
        };

        // Synthetic race labels are counted in the match total but get no
        // table row of their own.
        if let Some(entry) = races.get_mut(winner_race) {
            entry.wins += 1;
        }
        if let Some(entry) = races.get_mut(loser_race) {
            entry.losses += 1;
        }
    }

    MapRaceStats {
        map_name: map_name.to_string(),
        total_matches,
        races,
    }
}

#[derive(Debug, Clone)]
pub struct RaceMatchups {
    pub race: String,
    /// Matches featuring the race at all, mirrors included.
    pub total_matches: u32,
    pub totals: WinLoss,
    /// One row per opposing race, zero-count opponents included.
    pub matchups: BTreeMap<String, WinLoss>,
}

/// Matchup table for one race against each opponent, over the ELO-filtered
/// store. Mirror matches count toward `total_matches` only; they have no
/// meaningful winner side for this view.
pub fn race_matchups(
    store: &MatchStore,
    target_race: &str,
    min_elo: Option<i64>,
    max_elo: Option<i64>,
) -> RaceMatchups {
    let mut matchups: BTreeMap<String, WinLoss> = race_names()
        .filter(|race| *race != target_race)
        .map(|race| (race.to_string(), WinLoss::default()))
        .collect();
    let mut totals = WinLoss::default();
    let mut total_matches = 0;

    for m in store.filter_by_elo_range(min_elo, max_elo) {
        let [p1, p2] = &m.players;
        let opponent_race = if p1.race == target_race {
            &p2.race
        } else if p2.race == target_race {
            &p1.race
        } else {
            continue;
        };
        total_matches += 1;

        let Some(entry) = matchups.get_mut(opponent_race) else {
            continue;
        };
        if m.winner_race == target_race {
            totals.wins += 1;
            entry.wins += 1;
        } else {
            totals.losses += 1;
            entry.losses += 1;
        }
    }

    RaceMatchups {
        race: target_race.to_string(),
        total_matches,
        totals,
        matchups,
    }
}

#[derive(Debug, Clone)]
pub struct MatchupEntry {
    /// Lexicographically first race of the pair; win counts are relative to
    /// this side regardless of the participants' slot order.
    pub race1: String,
    pub race2: String,
    pub race1_wins: u32,
    pub race2_wins: u32,
    pub total_matches: u32,
}

impl MatchupEntry {
    pub fn race1_win_rate(&self) -> f64 {
        share(self.race1_wins, self.total_matches)
    }

    pub fn race2_win_rate(&self) -> f64 {
        share(self.race2_wins, self.total_matches)
    }
}

fn share(wins: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        f64::from(wins) / f64::from(total) * 100.0
    }
}

/// Canonical key for an unordered race pair; `(A, B)` and `(B, A)` address
/// the same entry.
pub fn matchup_key(race_a: &str, race_b: &str) -> String {
    if race_a <= race_b {
        format!("{race_a} vs {race_b}")
    } else {
        format!("{race_b} vs {race_a}")
    }
}

/// Every unordered race pair, mirrors included, over the ELO-filtered store.
pub fn all_race_matchups(
    store: &MatchStore,
    min_elo: Option<i64>,
    max_elo: Option<i64>,
) -> BTreeMap<String, MatchupEntry> {
    let mut table: BTreeMap<String, MatchupEntry> = BTreeMap::new();
    let races: Vec<&str> = race_names().collect();
    for (i, race1) in races.iter().enumerate() {
        for race2 in &races[i..] {
            table.insert(
                matchup_key(race1, race2),
                MatchupEntry {
                    race1: (*race1.min(race2)).to_string(),
                    race2: (*race1.max(race2)).to_string(),
                    race1_wins: 0,
                    race2_wins: 0,
                    total_matches: 0,
                },
            );
        }
    }

    for m in store.filter_by_elo_range(min_elo, max_elo) {
        let key = matchup_key(&m.players[0].race, &m.players[1].race);
        let Some(entry) = table.get_mut(&key) else {
            // Pairs involving synthetic race labels are not tracked.
            continue;
        };
        entry.total_matches += 1;
        if m.winner_race == entry.race1 {
            entry.race1_wins += 1;
        } else if m.winner_race == entry.race2 {
            entry.race2_wins += 1;
        }
    }

    table
}

/// One faction's slice of a player's personal leaderboard stats.
#[derive(Debug, Clone)]
pub struct FactionRecord {
    pub leaderboard_id: u32,
    pub faction: &'static str,
    pub tally: WinLoss,
    /// Positive ranks only; unranked entries carry no rank.
    pub rank: Option<i64>,
    pub rating: i64,
}

/// Break personal leaderboard stats down per 1v1 faction board.
pub fn process_leaderboard_stats(stats: &[LeaderboardStat]) -> BTreeMap<u32, FactionRecord> {
    let mut by_faction = BTreeMap::new();
    for stat in stats {
        let Some(faction) = faction_name(stat.leaderboard_id) else {
            continue;
        };
        by_faction.insert(
            stat.leaderboard_id,
            FactionRecord {
                leaderboard_id: stat.leaderboard_id,
                faction,
                tally: WinLoss {
                    wins: stat.wins,
                    losses: effective_losses(stat.losses, stat.drops),
                },
                rank: (stat.rank > 0).then_some(stat.rank),
                rating: stat.rating,
            },
        );
    }
    by_faction
}

/// Aggregate 1v1 record across every faction board.
pub fn calculate_winrate_stats(stats: &[LeaderboardStat]) -> WinLoss {
    let known: Vec<u32> = FACTIONS.iter().map(|(id, _)| *id).collect();
    let mut tally = WinLoss::default();
    for stat in stats {
        if known.contains(&stat.leaderboard_id) {
            tally.wins += stat.wins;
            tally.losses += effective_losses(stat.losses, stat.drops);
        }
    }
    tally
}
