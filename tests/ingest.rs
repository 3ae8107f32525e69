use std::fs;
use std::path::PathBuf;

use dow_stats::identity::AliasDirectory;
use dow_stats::leaderboard::build_faction_entries;
use dow_stats::relic_api::{parse_leaderboard_json, parse_match_history_json};
use dow_stats::scanner::ingest_history_response;
use dow_stats::stats::WinLoss;
use dow_stats::store::MatchStore;

const BOSS: &str = "76561198356992755";
const MACHA: &str = "76561198111111111";

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn fixture_history_ingests_only_the_clean_ranked_match() {
    let response =
        parse_match_history_json(&read_fixture("match_history.json")).expect("fixture should parse");
    let mut store = MatchStore::default();
    let mut aliases = AliasDirectory::default();

    let result = ingest_history_response(BOSS, &response, &mut store, &mut aliases);

    // 9001 is stored; 9002 has no winner; 9003 is a team game.
    assert_eq!(result.matches_added, 1);
    assert_eq!(result.anomalies, 1);
    assert_eq!(store.len(), 1);
    assert!(store.is_processed("9001"));
    assert!(!store.is_processed("9002"));

    let stored = store.iter().next().expect("one match should be stored");
    assert_eq!(stored.map_name, "Battle Marshes");
    assert_eq!(stored.winner_steam_id, BOSS);
    assert_eq!(stored.winner_race, "Orks");
    assert_eq!(stored.players[0].old_rating, 1510);
    assert_eq!(stored.players[1].race, "Eldar");

    // Both identities were harvested along the way.
    assert_eq!(aliases.alias_for(BOSS), "Boss");
    assert_eq!(aliases.alias_for(MACHA), "Macha");
}

#[test]
fn fixture_history_reingest_is_idempotent() {
    let response =
        parse_match_history_json(&read_fixture("match_history.json")).expect("fixture should parse");
    let mut store = MatchStore::default();
    let mut aliases = AliasDirectory::default();

    ingest_history_response(BOSS, &response, &mut store, &mut aliases);
    let second = ingest_history_response(BOSS, &response, &mut store, &mut aliases);

    assert_eq!(second.matches_added, 0);
    assert_eq!(second.aliases_stored, 0);
    assert_eq!(store.len(), 1);
}

#[test]
fn fixture_leaderboard_joins_steam_identities_by_rank() {
    let response =
        parse_leaderboard_json(&read_fixture("leaderboard.json")).expect("fixture should parse");
    let entries = build_faction_entries(&response, 5);

    // The xbox statgroup has no steam identity and is dropped.
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].alias, "Boss");
    assert_eq!(entries[0].rank, Some(1));
    assert_eq!(entries[0].rating, 1651);
    // 60 losses minus 5 drops.
    assert_eq!(
        entries[0].tally,
        WinLoss {
            wins: 120,
            losses: 55
        }
    );
    assert_eq!(entries[1].steam_id, MACHA);
    assert_eq!(entries[1].rank, Some(2));
}
