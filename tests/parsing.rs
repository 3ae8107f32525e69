use std::fs;
use std::path::PathBuf;

use dow_stats::relic_api::{
    extract_player_info, parse_leaderboard_json, parse_match_history_json,
    parse_personal_stats_json, steam_id_from_name,
};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn parses_match_history_fixture() {
    let raw = read_fixture("match_history.json");
    let response = parse_match_history_json(&raw).expect("fixture should parse");
    assert_eq!(response.result.code, 0);
    assert_eq!(response.profiles.len(), 2);
    assert_eq!(response.match_history.len(), 3);

    let first = &response.match_history[0];
    assert_eq!(first.id, 9001);
    assert_eq!(first.matchtype_id, 1);
    assert_eq!(first.mapname, "Battle Marshes");
    assert_eq!(first.matchhistorymember.len(), 2);
    assert_eq!(first.matchhistorymember[0].oldrating, 1510);
    assert_eq!(first.matchhistorymember[0].newrating, 1523);
    assert_eq!(first.matchhistoryreportresults[0].resulttype, 1);
    assert_eq!(first.matchhistoryreportresults[1].resulttype, 0);

    assert_eq!(
        steam_id_from_name(&response.profiles[0].name),
        Some("76561198356992755")
    );
}

#[test]
fn parses_leaderboard_fixture() {
    let raw = read_fixture("leaderboard.json");
    let response = parse_leaderboard_json(&raw).expect("fixture should parse");
    assert_eq!(response.stat_groups.len(), 3);
    assert_eq!(response.leaderboard_stats.len(), 3);

    let top = response
        .leaderboard_stats
        .iter()
        .find(|s| s.rank == 1)
        .expect("rank 1 row should exist");
    assert_eq!(top.statgroup_id, 7001);
    assert_eq!(top.leaderboard_id, 5);
    assert_eq!(top.rating, 1651);
    assert_eq!(top.wins, 120);
    assert_eq!(top.losses, 60);
    assert_eq!(top.drops, 5);
}

#[test]
fn personal_stats_shares_the_leaderboard_shape() {
    let raw = read_fixture("leaderboard.json");
    let response = parse_personal_stats_json(&raw).expect("fixture should parse");
    let (steam_id, alias) =
        extract_player_info(&response.stat_groups).expect("steam identity should resolve");
    assert_eq!(steam_id, "76561198356992755");
    assert_eq!(alias, "Boss");
}

#[test]
fn missing_fields_default_instead_of_failing() {
    let raw = r#"{"result":{"code":0},"matchHistoryStats":[{"id":7}]}"#;
    let response = parse_match_history_json(raw).expect("sparse payload should parse");
    let only = &response.match_history[0];
    assert_eq!(only.id, 7);
    assert_eq!(only.matchtype_id, 0);
    assert!(only.mapname.is_empty());
    assert!(only.matchhistorymember.is_empty());
}

#[test]
fn null_and_empty_bodies_are_empty_responses() {
    for raw in ["", "  ", "null"] {
        let history = parse_match_history_json(raw).expect("degenerate body should parse");
        assert!(history.match_history.is_empty());
        assert!(history.profiles.is_empty());

        let board = parse_leaderboard_json(raw).expect("degenerate body should parse");
        assert!(board.leaderboard_stats.is_empty());

        let personal = parse_personal_stats_json(raw).expect("degenerate body should parse");
        assert!(personal.stat_groups.is_empty());
    }
}

#[test]
fn malformed_body_is_an_error() {
    assert!(parse_match_history_json("{not json").is_err());
    assert!(parse_leaderboard_json("[1,2").is_err());
}
