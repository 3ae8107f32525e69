//! Match ingestion and statistics engine for Dawn of War: Definitive Edition
//! ranked 1v1 play, built on the Relic community leaderboard API.
//!
//! The write path runs `relic_api` fetches through `normalize` into the
//! `store`; `scanner` drives that path across every faction leaderboard.
//! `stats` and `leaderboard` derive read-only views from the accumulated
//! data. `identity` keeps the Steam-ID-to-alias directory both paths share.

pub mod config;
pub mod http_client;
pub mod identity;
pub mod leaderboard;
pub mod normalize;
pub mod races;
pub mod relic_api;
pub mod scanner;
pub mod stats;
pub mod store;
