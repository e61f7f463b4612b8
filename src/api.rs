use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;
use tracing::warn;

use crate::domain::EntityId;
use crate::error::GatherError;

const API_BASE: &str = "http://transparencydata.com/api/1.0";

pub fn entity_url(entity_id: &EntityId, api_key: &str) -> String {
    format!("{API_BASE}/entities/{entity_id}.json?apikey={api_key}")
}

pub fn fec_summary_url(entity_id: &EntityId, api_key: &str) -> String {
    format!("{API_BASE}/aggregates/pol/{entity_id}/fec_summary.json?apikey={api_key}")
}

pub fn industries_url(entity_id: &EntityId, api_key: &str) -> String {
    format!("{API_BASE}/aggregates/pol/{entity_id}/contributors/industries.json?apikey={api_key}")
}

/// Transport seam for the campaign-finance API. A transport failure is an
/// absent result, not an error; malformed JSON in a successful response is.
pub trait ApiClient: Send + Sync {
    fn get_json(&self, url: &str) -> Result<Option<Value>, GatherError>;
}

#[derive(Clone)]
pub struct HttpApiClient {
    client: Client,
}

impl HttpApiClient {
    pub fn new() -> Result<Self, GatherError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("race-gatherer/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| GatherError::ApiHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|err| GatherError::ApiHttp(err.to_string()))?;
        Ok(Self { client })
    }
}

impl ApiClient for HttpApiClient {
    fn get_json(&self, url: &str) -> Result<Option<Value>, GatherError> {
        let response = match self.client.get(url).send() {
            Ok(response) => response,
            Err(err) => {
                warn!("error fetching {url}: {err}");
                return Ok(None);
            }
        };
        if !response.status().is_success() {
            warn!("error fetching {url}: status {}", response.status());
            return Ok(None);
        }
        let body = match response.text() {
            Ok(body) => body,
            Err(err) => {
                warn!("error fetching {url}: {err}");
                return Ok(None);
            }
        };
        let value = serde_json::from_str(&body).map_err(|err| GatherError::ApiJson {
            url: url.to_string(),
            message: err.to_string(),
        })?;
        Ok(Some(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_urls() {
        let id: EntityId = "aabb01".parse().unwrap();
        assert_eq!(
            entity_url(&id, "k"),
            "http://transparencydata.com/api/1.0/entities/aabb01.json?apikey=k"
        );
        assert_eq!(
            fec_summary_url(&id, "k"),
            "http://transparencydata.com/api/1.0/aggregates/pol/aabb01/fec_summary.json?apikey=k"
        );
        assert_eq!(
            industries_url(&id, "k"),
            "http://transparencydata.com/api/1.0/aggregates/pol/aabb01/contributors/industries.json?apikey=k"
        );
    }
}
