use async_trait::async_trait;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::external::ticker_resolver::{ResolveError, TickerResolver};

const MAPPING_URL: &str = "https://api.openfigi.com/v2/mapping";

/// ISIN-to-ticker resolution through the OpenFIGI mapping API. Works
/// without an API key at a much lower rate limit, so the key is optional
/// and injected from configuration.
pub struct OpenFigiResolver {
    client: reqwest::Client,
    api_key: Option<String>,
}

impl OpenFigiResolver {
    pub fn new(api_key: Option<String>) -> Self {
        if api_key.is_none() {
            warn!("⚠️ OPENFIGI_API_KEY not set - mapping requests run at the anonymous rate limit");
        }
        Self {
            client: reqwest::Client::new(),
            api_key,
        }
    }
}

#[derive(Debug, Serialize)]
struct MappingQuery<'a> {
    #[serde(rename = "idType")]
    id_type: &'a str,
    #[serde(rename = "idValue")]
    id_value: &'a str,
}

#[derive(Debug, Deserialize)]
struct MappingResult {
    data: Option<Vec<MappingEntry>>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MappingEntry {
    ticker: Option<String>,
}

// The response carries one result per query, each holding either matches
// or an error string such as "No identifier found.".
fn first_ticker(results: Vec<MappingResult>) -> Option<String> {
    let result = results.into_iter().next()?;
    if let Some(reason) = result.error {
        debug!("Mapping API returned no match: {}", reason);
        return None;
    }
    result
        .data?
        .into_iter()
        .next()
        .and_then(|entry| entry.ticker)
}

#[async_trait]
impl TickerResolver for OpenFigiResolver {
    async fn resolve(&self, isin: &str) -> Result<Option<String>, ResolveError> {
        let queries = [MappingQuery {
            id_type: "ID_ISIN",
            id_value: isin,
        }];
        let mut request = self.client.post(MAPPING_URL).json(&queries);
        if let Some(key) = &self.api_key {
            request = request.header("X-OPENFIGI-APIKEY", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ResolveError::Network(e.to_string()))?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(ResolveError::RateLimited);
        }
        if !response.status().is_success() {
            return Err(ResolveError::BadResponse(format!(
                "mapping API returned {}",
                response.status()
            )));
        }

        let results: Vec<MappingResult> = response
            .json()
            .await
            .map_err(|e| ResolveError::BadResponse(e.to_string()))?;
        Ok(first_ticker(results))
    }
}
