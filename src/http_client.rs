use std::time::Duration;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;
use serde_json::Value;
use tracing::warn;

const CONNECT_TIMEOUT_SECS: u64 = 10;
const REQUEST_TIMEOUT_SECS: u64 = 30;
const MAX_IDLE_PER_HOST: usize = 5;

static CLIENT: OnceCell<Client> = OnceCell::new();

pub fn http_client() -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .pool_max_idle_per_host(MAX_IDLE_PER_HOST)
            .user_agent("dow-stats/0.1")
            .build()
            .context("failed to build http client")
    })
}

/// Fetch a JSON document from `url`. Transport errors, non-200 statuses and
/// malformed bodies all degrade to an empty object with a logged warning;
/// callers that need resilience layer their own pacing on top.
pub fn fetch_json(url: &str) -> Value {
    let client = match http_client() {
        Ok(client) => client,
        Err(err) => {
            warn!("http client unavailable: {err:#}");
            return empty_object();
        }
    };

    let resp = match client.get(url).send() {
        Ok(resp) => resp,
        Err(err) => {
            warn!("request failed for {url}: {err}");
            return empty_object();
        }
    };

    let status = resp.status();
    if !status.is_success() {
        warn!("http {status} for {url}");
        return empty_object();
    }

    match resp.json::<Value>() {
        Ok(value) => value,
        Err(err) => {
            warn!("malformed json from {url}: {err}");
            empty_object()
        }
    }
}

pub fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}
