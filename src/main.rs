//! Thin CLI over the ingestion and statistics engine. All numeric inputs
//! are clamped here again even though callers are expected to bounds-check.

use std::env;
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use dow_stats::config;
use dow_stats::identity::AliasDirectory;
use dow_stats::leaderboard::{faction_leaderboard, top_elo};
use dow_stats::races::faction_name;
use dow_stats::relic_api::{
    extract_player_info, fetch_match_history_by_alias, fetch_personal_stats_by_alias,
    fetch_personal_stats_by_steam_id,
};
use dow_stats::scanner::{bulk_scan, ingest_history_response, ingest_player_history};
use dow_stats::stats::{
    all_race_matchups, calculate_winrate_stats, map_race_statistics, process_leaderboard_stats,
    race_matchups,
};
use dow_stats::store::MatchStore;

const USAGE: &str = "usage: dow-stats <command> [args]

commands:
  scan                              repopulate the store from all leaderboards
  player <id-or-alias>              resolve a player identifier
  history <id-or-alias> [limit]     recent stored matches for a player
  mapstats <map> [min] [max]        race win rates on a map
  matchups <race> [min] [max]       one race against each opponent
  allmatchups [min] [max]           every race pair
  factions <id-or-alias>            per-faction personal stats
  winrate <id-or-alias>             aggregate 1v1 record
  leaderboard <id> [start] [count]  live faction ladder
  topelo [limit] [min-games]        best rating per player across factions";

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(command) = args.first() else {
        eprintln!("{USAGE}");
        return ExitCode::FAILURE;
    };

    let mut store = MatchStore::open(config::match_data_path());
    let mut aliases = AliasDirectory::open(config::alias_path());

    match command.as_str() {
        "scan" => {
            let summary = bulk_scan(&mut store, &mut aliases, |msg| println!("{msg}"));
            println!(
                "done: {} players processed ({} new), {} matches added, {} aliases stored, {} rejects",
                summary.players_processed,
                summary.new_players,
                summary.matches_added,
                summary.aliases_stored,
                summary.errors
            );
            for (faction, players) in &summary.per_leaderboard {
                println!("  {faction}: {players} players");
            }
        }
        "player" => {
            let Some(identifier) = args.get(1) else {
                eprintln!("{USAGE}");
                return ExitCode::FAILURE;
            };
            match resolve_player(identifier, &mut store, &mut aliases) {
                Some((steam_id, alias)) => println!("{alias} ({steam_id})"),
                None => {
                    let res = aliases.resolve(identifier);
                    if res.suggestions.is_empty() {
                        println!("no player found for '{identifier}'");
                    } else {
                        println!("no exact match for '{identifier}', did you mean:");
                        for suggestion in res.suggestions {
                            println!("  {suggestion}");
                        }
                    }
                }
            }
        }
        "history" => {
            let Some(identifier) = args.get(1) else {
                eprintln!("{USAGE}");
                return ExitCode::FAILURE;
            };
            let limit = parse_num(args.get(2), 5).clamp(1, 10) as usize;
            let Some((steam_id, alias)) = resolve_player(identifier, &mut store, &mut aliases)
            else {
                println!("no player found for '{identifier}'");
                return ExitCode::SUCCESS;
            };
            // Pull their latest games first so the stored view is fresh.
            ingest_player_history(&steam_id, &mut store, &mut aliases);
            store.save();
            aliases.save();

            println!("{alias} ({steam_id}), last {limit} stored matches:");
            for m in store.matches_by_player(&steam_id, limit) {
                let outcome = if m.winner_steam_id == steam_id { "W" } else { "L" };
                let [p1, p2] = &m.players;
                println!(
                    "  [{outcome}] {} | {} ({}) {} -> {} vs {} ({}) {} -> {}",
                    m.map_name,
                    p1.alias,
                    p1.race,
                    p1.old_rating,
                    p1.new_rating,
                    p2.alias,
                    p2.race,
                    p2.old_rating,
                    p2.new_rating,
                );
            }
        }
        "mapstats" => {
            let Some(map_name) = args.get(1) else {
                eprintln!("{USAGE}");
                return ExitCode::FAILURE;
            };
            let (min, max) = elo_range(&args, 2);
            let stats = map_race_statistics(&store, map_name, min, max);
            println!("{}: {} matches", stats.map_name, stats.total_matches);
            for (race, tally) in &stats.races {
                if tally.total() > 0 {
                    println!(
                        "  {race}: {:.1}% ({}-{}, {} games)",
                        tally.win_rate(),
                        tally.wins,
                        tally.losses,
                        tally.total()
                    );
                }
            }
        }
        "matchups" => {
            let Some(race) = args.get(1) else {
                eprintln!("{USAGE}");
                return ExitCode::FAILURE;
            };
            let (min, max) = elo_range(&args, 2);
            let table = race_matchups(&store, race, min, max);
            println!(
                "{}: {} matches, {:.1}% overall",
                table.race,
                table.total_matches,
                table.totals.win_rate()
            );
            for (opponent, tally) in &table.matchups {
                if tally.total() > 0 {
                    println!(
                        "  vs {opponent}: {}-{} ({:.1}%)",
                        tally.wins,
                        tally.losses,
                        tally.win_rate()
                    );
                }
            }
        }
        "allmatchups" => {
            let (min, max) = elo_range(&args, 1);
            for entry in all_race_matchups(&store, min, max).values() {
                if entry.total_matches > 0 {
                    println!(
                        "{} vs {}: {:.0}%-{:.0}% ({} games)",
                        entry.race1,
                        entry.race2,
                        entry.race1_win_rate(),
                        entry.race2_win_rate(),
                        entry.total_matches
                    );
                }
            }
        }
        "factions" => {
            let Some(identifier) = args.get(1) else {
                eprintln!("{USAGE}");
                return ExitCode::FAILURE;
            };
            let Some((steam_id, alias)) = resolve_player(identifier, &mut store, &mut aliases)
            else {
                println!("no player found for '{identifier}'");
                return ExitCode::SUCCESS;
            };
            let response = fetch_personal_stats_by_steam_id(&steam_id);
            println!("{alias} ({steam_id}):");
            for record in process_leaderboard_stats(&response.leaderboard_stats).values() {
                let rank = record
                    .rank
                    .map(|r| format!("#{r}"))
                    .unwrap_or_else(|| "unranked".to_string());
                println!(
                    "  {}: {} elo, {rank}, {}-{} ({:.1}%)",
                    record.faction,
                    record.rating,
                    record.tally.wins,
                    record.tally.losses,
                    record.tally.win_rate()
                );
            }
        }
        "winrate" => {
            let Some(identifier) = args.get(1) else {
                eprintln!("{USAGE}");
                return ExitCode::FAILURE;
            };
            let Some((steam_id, alias)) = resolve_player(identifier, &mut store, &mut aliases)
            else {
                println!("no player found for '{identifier}'");
                return ExitCode::SUCCESS;
            };
            let response = fetch_personal_stats_by_steam_id(&steam_id);
            let tally = calculate_winrate_stats(&response.leaderboard_stats);
            println!(
                "{alias}: {}-{} over {} 1v1 games ({:.1}%)",
                tally.wins,
                tally.losses,
                tally.total(),
                tally.win_rate()
            );
        }
        "leaderboard" => {
            let Some(id) = args.get(1).and_then(|raw| raw.parse::<u32>().ok()) else {
                eprintln!("{USAGE}");
                return ExitCode::FAILURE;
            };
            let Some(faction) = faction_name(id) else {
                eprintln!("unknown leaderboard id {id}; valid ids are 1-9");
                return ExitCode::FAILURE;
            };
            let start = parse_num(args.get(2), 1).max(1) as u32;
            let count = parse_num(args.get(3), 50).clamp(1, 200) as u32;
            println!("{faction} ladder:");
            for entry in faction_leaderboard(id, start, count) {
                let rank = entry
                    .rank
                    .map(|r| format!("#{r}"))
                    .unwrap_or_else(|| "--".to_string());
                println!(
                    "  {rank} {} ({}) {} elo, {}-{} ({:.1}%), streak {}",
                    entry.alias,
                    entry.steam_id,
                    entry.rating,
                    entry.tally.wins,
                    entry.tally.losses,
                    entry.tally.win_rate(),
                    entry.streak
                );
            }
        }
        "topelo" => {
            let limit = parse_num(args.get(1), 10).clamp(1, 50) as usize;
            let min_games = parse_num(args.get(2), 10).max(0) as u32;
            for entry in top_elo(limit, min_games) {
                let crown = if entry.is_faction_leader() { " *" } else { "" };
                println!(
                    "  {} elo {} ({}) #{} {}{crown}",
                    entry.rating, entry.alias, entry.faction, entry.rank, entry.steam_id
                );
            }
        }
        _ => {
            eprintln!("{USAGE}");
            return ExitCode::FAILURE;
        }
    }

    ExitCode::SUCCESS
}

/// Resolve through the directory first; an unknown alias falls back to the
/// personal-stats endpoint so newly-seen players still resolve. Anything
/// learned along the way is kept.
fn resolve_player(
    identifier: &str,
    store: &mut MatchStore,
    aliases: &mut AliasDirectory,
) -> Option<(String, String)> {
    let local = aliases.resolve(identifier);
    if let Some(steam_id) = local.steam_id {
        return Some((steam_id, local.alias));
    }

    let response = fetch_personal_stats_by_alias(identifier);
    if let Some((steam_id, alias)) = extract_player_info(&response.stat_groups) {
        aliases.store(&steam_id, &alias);
        aliases.save();
        return Some((steam_id, alias));
    }

    // Last resort: a history lookup by alias also reveals identity.
    let history = fetch_match_history_by_alias(identifier);
    if let Some(profile) = history
        .profiles
        .iter()
        .find(|p| p.alias.eq_ignore_ascii_case(identifier))
    {
        if let Some((steam_id, alias)) = extract_player_info_from_profile(profile) {
            ingest_history_response(&steam_id, &history, store, aliases);
            store.save();
            aliases.save();
            return Some((steam_id, alias));
        }
    }
    None
}

fn extract_player_info_from_profile(
    profile: &dow_stats::relic_api::RawProfile,
) -> Option<(String, String)> {
    let steam_id = dow_stats::relic_api::steam_id_from_name(&profile.name)?;
    Some((steam_id.to_string(), profile.alias.clone()))
}

fn parse_num(arg: Option<&String>, default: i64) -> i64 {
    arg.and_then(|raw| raw.parse::<i64>().ok())
        .unwrap_or(default)
}

/// Optional inclusive ELO bounds from positional args; negatives are treated
/// as absent rather than errors.
fn elo_range(args: &[String], from: usize) -> (Option<i64>, Option<i64>) {
    let parse = |idx: usize| {
        args.get(idx)
            .and_then(|raw| raw.parse::<i64>().ok())
            .filter(|v| *v >= 0)
    };
    (parse(from), parse(from + 1))
}
