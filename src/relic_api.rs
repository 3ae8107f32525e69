//! Typed views of the Relic community leaderboard API.
//!
//! Every consumed payload shape gets an explicit struct with defaults on all
//! fields, so an absent or null field decodes to its zero value instead of
//! failing the whole response. A response is only trusted when
//! `result.code == 0`; anything else is treated as empty.

use anyhow::{Context, Result};
use reqwest::Url;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::http_client::fetch_json;

pub const BASE_URL: &str = "https://dow-api.reliclink.com/community/leaderboard";
pub const GAME_TITLE: &str = "dow1-de";

const STEAM_NAME_PREFIX: &str = "/steam/";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiResult {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroupMember {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub alias: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatGroup {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub members: Vec<GroupMember>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeaderboardStat {
    #[serde(default)]
    pub leaderboard_id: u32,
    #[serde(default)]
    pub statgroup_id: u64,
    /// Upstream reports -1 (or 0) for unranked entries.
    #[serde(default)]
    pub rank: i64,
    #[serde(default)]
    pub rating: i64,
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub losses: u32,
    #[serde(default)]
    pub drops: u32,
    #[serde(default)]
    pub streak: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawProfile {
    #[serde(default)]
    pub profile_id: u64,
    /// Platform path, `/steam/<17-digit-id>` for Steam accounts.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub alias: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatchMember {
    #[serde(default)]
    pub profile_id: u64,
    #[serde(default)]
    pub race_id: u32,
    #[serde(default)]
    pub oldrating: i64,
    #[serde(default)]
    pub newrating: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatchReportResult {
    #[serde(default)]
    pub profile_id: u64,
    /// 1 is a win, 0 a loss; other codes show up for drops and unknowns.
    #[serde(default = "default_resulttype")]
    pub resulttype: i64,
}

fn default_resulttype() -> i64 {
    -1
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMatch {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub matchtype_id: u32,
    #[serde(default)]
    pub mapname: String,
    #[serde(default)]
    pub startgametime: i64,
    #[serde(default)]
    pub completiontime: i64,
    #[serde(default)]
    pub matchhistorymember: Vec<MatchMember>,
    #[serde(default)]
    pub matchhistoryreportresults: Vec<MatchReportResult>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeaderboardResponse {
    #[serde(default)]
    pub result: ApiResult,
    #[serde(rename = "statGroups", default)]
    pub stat_groups: Vec<StatGroup>,
    #[serde(rename = "leaderboardStats", default)]
    pub leaderboard_stats: Vec<LeaderboardStat>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatchHistoryResponse {
    #[serde(default)]
    pub result: ApiResult,
    #[serde(default)]
    pub profiles: Vec<RawProfile>,
    #[serde(rename = "matchHistoryStats", default)]
    pub match_history: Vec<RawMatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PersonalStatsResponse {
    #[serde(default)]
    pub result: ApiResult,
    #[serde(rename = "statGroups", default)]
    pub stat_groups: Vec<StatGroup>,
    #[serde(rename = "leaderboardStats", default)]
    pub leaderboard_stats: Vec<LeaderboardStat>,
}

/// Steam id portion of a `/steam/<id>` member or profile name.
pub fn steam_id_from_name(name: &str) -> Option<&str> {
    name.strip_prefix(STEAM_NAME_PREFIX)
}

/// First Steam identity found in a stat-group list, as (steam id, alias).
pub fn extract_player_info(stat_groups: &[StatGroup]) -> Option<(String, String)> {
    for group in stat_groups {
        for member in &group.members {
            if let Some(steam_id) = steam_id_from_name(&member.name) {
                return Some((steam_id.to_string(), member.alias.clone()));
            }
        }
    }
    None
}

pub fn fetch_leaderboard_page(leaderboard_id: u32, start: u32, count: u32) -> LeaderboardResponse {
    let url = format!(
        "{BASE_URL}/getleaderboard2?count={count}&leaderboard_id={leaderboard_id}&start={start}&sortBy=1&title={GAME_TITLE}"
    );
    gate(decode(fetch_json(&url), "leaderboard"))
}

pub fn fetch_match_history_by_steam_id(steam_id: &str) -> MatchHistoryResponse {
    let url = format!(
        "{BASE_URL}/getRecentMatchHistory?title={GAME_TITLE}&profile_names=[\"{STEAM_NAME_PREFIX}{steam_id}\"]"
    );
    gate(decode(fetch_json(&url), "match history"))
}

pub fn fetch_match_history_by_alias(alias: &str) -> MatchHistoryResponse {
    let Some(url) = aliased_url("getRecentMatchHistory", alias) else {
        return MatchHistoryResponse::default();
    };
    gate(decode(fetch_json(&url), "match history"))
}

pub fn fetch_personal_stats_by_steam_id(steam_id: &str) -> PersonalStatsResponse {
    let url = format!(
        "{BASE_URL}/getPersonalStat?title={GAME_TITLE}&profile_names=[\"{STEAM_NAME_PREFIX}{steam_id}\"]"
    );
    gate(decode(fetch_json(&url), "personal stats"))
}

pub fn fetch_personal_stats_by_alias(alias: &str) -> PersonalStatsResponse {
    let Some(url) = aliased_url("getPersonalStat", alias) else {
        return PersonalStatsResponse::default();
    };
    gate(decode(fetch_json(&url), "personal stats"))
}

pub fn parse_leaderboard_json(raw: &str) -> Result<LeaderboardResponse> {
    parse_response(raw).context("invalid leaderboard json")
}

pub fn parse_match_history_json(raw: &str) -> Result<MatchHistoryResponse> {
    parse_response(raw).context("invalid match history json")
}

pub fn parse_personal_stats_json(raw: &str) -> Result<PersonalStatsResponse> {
    parse_response(raw).context("invalid personal stats json")
}

fn parse_response<T: DeserializeOwned + Default>(raw: &str) -> Result<T> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(T::default());
    }
    Ok(serde_json::from_str(trimmed)?)
}

fn decode<T: DeserializeOwned + Default>(value: Value, what: &str) -> T {
    match serde_json::from_value(value) {
        Ok(decoded) => decoded,
        Err(err) => {
            warn!("unexpected {what} payload shape: {err}");
            T::default()
        }
    }
}

/// Aliases carry user-chosen text, so the query value goes through proper
/// percent encoding instead of naive formatting.
fn aliased_url(endpoint: &str, alias: &str) -> Option<String> {
    let mut url = Url::parse(&format!("{BASE_URL}/{endpoint}")).ok()?;
    url.query_pairs_mut()
        .append_pair("title", GAME_TITLE)
        .append_pair("aliases", &format!("[\"{alias}\"]"));
    Some(url.to_string())
}

trait Gated {
    fn result_code(&self) -> i64;
}

impl Gated for LeaderboardResponse {
    fn result_code(&self) -> i64 {
        self.result.code
    }
}

impl Gated for MatchHistoryResponse {
    fn result_code(&self) -> i64 {
        self.result.code
    }
}

impl Gated for PersonalStatsResponse {
    fn result_code(&self) -> i64 {
        self.result.code
    }
}

fn gate<T: Gated + Default>(response: T) -> T {
    if response.result_code() == 0 {
        response
    } else {
        T::default()
    }
}
