//! Raw match eligibility and canonicalization.
//!
//! Checks run in a fixed order and the first failure wins; a rejected match
//! leaves no side effects. Only an accepted match touches the alias
//! directory.

use crate::identity::{AliasDirectory, UNKNOWN_PLAYER, validate_steam_id};
use crate::races::race_name;
use crate::relic_api::{RawMatch, RawProfile, steam_id_from_name};
use crate::store::{MatchRecord, MatchStore, PlayerSlot};

/// Upstream match type code for ranked 1v1.
pub const RANKED_1V1_MATCHTYPE: u32 = 1;

const WIN_RESULT: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Id already in the processed set; not an anomaly, just already known.
    AlreadyProcessed,
    NotRanked1v1,
    WrongPlayerCount,
    /// A participant's profile could not be resolved to a valid Steam id.
    UnresolvedPlayer,
    /// Zero or two win results; the outcome cannot be trusted.
    NoDeterminateWinner,
}

#[derive(Debug)]
pub enum Outcome {
    Accepted(MatchRecord),
    Rejected(RejectReason),
}

struct Participant {
    steam_id: String,
    alias: String,
    race: String,
    old_rating: i64,
    new_rating: i64,
    won: bool,
}

/// Validate one raw match against the store and build its canonical record.
/// Both participants' aliases are offered to the directory on acceptance.
pub fn normalize(
    raw: &RawMatch,
    profiles: &[RawProfile],
    store: &MatchStore,
    aliases: &mut AliasDirectory,
) -> Outcome {
    let match_id = raw.id.to_string();
    if store.is_processed(&match_id) {
        return Outcome::Rejected(RejectReason::AlreadyProcessed);
    }

    if raw.matchtype_id != RANKED_1V1_MATCHTYPE {
        return Outcome::Rejected(RejectReason::NotRanked1v1);
    }

    if raw.matchhistorymember.len() != 2 {
        return Outcome::Rejected(RejectReason::WrongPlayerCount);
    }

    let mut participants = Vec::with_capacity(2);
    for member in &raw.matchhistorymember {
        let Some((steam_id, alias)) = resolve_member(member.profile_id, profiles) else {
            return Outcome::Rejected(RejectReason::UnresolvedPlayer);
        };
        let won = raw
            .matchhistoryreportresults
            .iter()
            .find(|r| r.profile_id == member.profile_id)
            .is_some_and(|r| r.resulttype == WIN_RESULT);
        participants.push(Participant {
            steam_id,
            alias,
            race: race_name(member.race_id),
            old_rating: member.oldrating,
            new_rating: member.newrating,
            won,
        });
    }

    let winners = participants.iter().filter(|p| p.won).count();
    if winners != 1 {
        return Outcome::Rejected(RejectReason::NoDeterminateWinner);
    }
    let winner = participants
        .iter()
        .find(|p| p.won)
        .map(|p| (p.steam_id.clone(), p.race.clone()))
        .unwrap_or_default();

    for p in &participants {
        aliases.store(&p.steam_id, &p.alias);
    }

    let [p1, p2]: [Participant; 2] = match participants.try_into() {
        Ok(pair) => pair,
        Err(_) => return Outcome::Rejected(RejectReason::WrongPlayerCount),
    };

    Outcome::Accepted(MatchRecord {
        match_id,
        map_name: if raw.mapname.is_empty() {
            "Unknown Map".to_string()
        } else {
            raw.mapname.clone()
        },
        start_time: raw.startgametime,
        completion_time: raw.completiontime,
        players: [slot(p1), slot(p2)],
        winner_steam_id: winner.0,
        winner_race: winner.1,
    })
}

#[derive(Debug, Default, Clone, Copy)]
pub struct IngestTally {
    /// Matches newly stored.
    pub added: usize,
    /// Ranked 1v1s that failed validation: participant count, identity
    /// resolution, or winner determination.
    pub anomalies: usize,
}

/// Normalize and insert every match in a history payload. Rejections are
/// silent here; the bulk path surfaces the anomaly count in its summary
/// instead of logging per record.
pub fn ingest_matches(
    matches: &[RawMatch],
    profiles: &[RawProfile],
    store: &mut MatchStore,
    aliases: &mut AliasDirectory,
) -> IngestTally {
    let mut tally = IngestTally::default();
    for raw in matches {
        match normalize(raw, profiles, store, aliases) {
            Outcome::Accepted(record) => {
                if store.insert(record) {
                    tally.added += 1;
                }
            }
            Outcome::Rejected(
                RejectReason::WrongPlayerCount
                | RejectReason::UnresolvedPlayer
                | RejectReason::NoDeterminateWinner,
            ) => tally.anomalies += 1,
            Outcome::Rejected(_) => {}
        }
    }
    tally
}

fn resolve_member(profile_id: u64, profiles: &[RawProfile]) -> Option<(String, String)> {
    let profile = profiles.iter().find(|p| p.profile_id == profile_id)?;
    let steam_id = steam_id_from_name(&profile.name)?;
    if !validate_steam_id(steam_id) {
        return None;
    }
    let alias = if profile.alias.is_empty() {
        UNKNOWN_PLAYER.to_string()
    } else {
        profile.alias.clone()
    };
    Some((steam_id.to_string(), alias))
}

fn slot(p: Participant) -> PlayerSlot {
    PlayerSlot {
        steam_id: p.steam_id,
        alias: p.alias,
        race: p.race,
        old_rating: p.old_rating,
        new_rating: p.new_rating,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relic_api::{MatchMember, MatchReportResult};

    const STEAM_A: &str = "76561198000000001";
    const STEAM_B: &str = "76561198000000002";

    fn profiles() -> Vec<RawProfile> {
        vec![
            RawProfile {
                profile_id: 10,
                name: format!("/steam/{STEAM_A}"),
                alias: "Boss".to_string(),
            },
            RawProfile {
                profile_id: 20,
                name: format!("/steam/{STEAM_B}"),
                alias: "Farseer".to_string(),
            },
        ]
    }

    fn raw_match(result_a: i64, result_b: i64) -> RawMatch {
        RawMatch {
            id: 555,
            matchtype_id: RANKED_1V1_MATCHTYPE,
            mapname: "Fata Morgana".to_string(),
            startgametime: 1_700_000_000,
            completiontime: 1_700_000_900,
            matchhistorymember: vec![
                MatchMember {
                    profile_id: 10,
                    race_id: 5,
                    oldrating: 1400,
                    newrating: 1415,
                },
                MatchMember {
                    profile_id: 20,
                    race_id: 2,
                    oldrating: 1380,
                    newrating: 1365,
                },
            ],
            matchhistoryreportresults: vec![
                MatchReportResult {
                    profile_id: 10,
                    resulttype: result_a,
                },
                MatchReportResult {
                    profile_id: 20,
                    resulttype: result_b,
                },
            ],
        }
    }

    #[test]
    fn accepts_clean_match_with_single_winner() {
        let store = MatchStore::default();
        let mut aliases = AliasDirectory::default();
        match normalize(&raw_match(1, 0), &profiles(), &store, &mut aliases) {
            Outcome::Accepted(record) => {
                assert_eq!(record.match_id, "555");
                assert_eq!(record.winner_steam_id, STEAM_A);
                assert_eq!(record.winner_race, "Orks");
                assert_eq!(record.players[1].race, "Eldar");
            }
            Outcome::Rejected(reason) => panic!("unexpected rejection: {reason:?}"),
        }
        // Aliases harvested on acceptance.
        assert_eq!(aliases.alias_for(STEAM_A), "Boss");
        assert_eq!(aliases.alias_for(STEAM_B), "Farseer");
    }

    #[test]
    fn rejects_when_no_winner() {
        let mut store = MatchStore::default();
        let mut aliases = AliasDirectory::default();
        let raw = raw_match(0, 0);
        match normalize(&raw, &profiles(), &store, &mut aliases) {
            Outcome::Rejected(RejectReason::NoDeterminateWinner) => {}
            other => panic!("expected NoDeterminateWinner, got {other:?}"),
        }
        let tally = ingest_matches(&[raw], &profiles(), &mut store, &mut aliases);
        assert_eq!(tally.added, 0);
        assert_eq!(tally.anomalies, 1);
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn rejects_when_both_report_wins() {
        let store = MatchStore::default();
        let mut aliases = AliasDirectory::default();
        match normalize(&raw_match(1, 1), &profiles(), &store, &mut aliases) {
            Outcome::Rejected(RejectReason::NoDeterminateWinner) => {}
            other => panic!("expected NoDeterminateWinner, got {other:?}"),
        }
        // Rejection has no side effects.
        assert!(aliases.is_empty());
    }

    #[test]
    fn rejects_wrong_match_type() {
        let store = MatchStore::default();
        let mut aliases = AliasDirectory::default();
        let mut raw = raw_match(1, 0);
        raw.matchtype_id = 4;
        match normalize(&raw, &profiles(), &store, &mut aliases) {
            Outcome::Rejected(RejectReason::NotRanked1v1) => {}
            other => panic!("expected NotRanked1v1, got {other:?}"),
        }
    }

    #[test]
    fn rejects_unresolvable_participant() {
        let store = MatchStore::default();
        let mut aliases = AliasDirectory::default();
        let mut profiles = profiles();
        profiles[1].name = "/steam/notdigits".to_string();
        match normalize(&raw_match(1, 0), &profiles, &store, &mut aliases) {
            Outcome::Rejected(RejectReason::UnresolvedPlayer) => {}
            other => panic!("expected UnresolvedPlayer, got {other:?}"),
        }
        assert!(aliases.is_empty());
    }

    #[test]
    fn rejects_already_processed_before_other_checks() {
        let mut store = MatchStore::default();
        let mut aliases = AliasDirectory::default();
        let raw = raw_match(1, 0);
        let tally = ingest_matches(
            std::slice::from_ref(&raw),
            &profiles(),
            &mut store,
            &mut aliases,
        );
        assert_eq!(tally.added, 1);
        assert_eq!(tally.anomalies, 0);
        match normalize(&raw, &profiles(), &store, &mut aliases) {
            Outcome::Rejected(RejectReason::AlreadyProcessed) => {}
            other => panic!("expected AlreadyProcessed, got {other:?}"),
        }
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn unknown_race_code_still_accepted() {
        let store = MatchStore::default();
        let mut aliases = AliasDirectory::default();
        let mut raw = raw_match(1, 0);
        raw.matchhistorymember[0].race_id = 42;
        match normalize(&raw, &profiles(), &store, &mut aliases) {
            Outcome::Accepted(record) => {
                assert_eq!(record.players[0].race, "Race 42");
                assert_eq!(record.winner_race, "Race 42");
            }
            Outcome::Rejected(reason) => panic!("unexpected rejection: {reason:?}"),
        }
    }
}
