//! War status API client.
//!
//! Fetches the list of active war seasons, then each season's planet
//! status. Per-season failures are logged and skipped; there is no retry.

use crate::error::FetchError;
use crate::models::{CampaignId, EntityRecord};
use futures::future::join_all;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Source of war status data.
pub trait StatusFetcher {
    /// List the active campaign identifiers.
    fn fetch_campaign_ids(&self) -> impl Future<Output = Result<Vec<CampaignId>, FetchError>> + Send;

    /// Fetch the planet records for one campaign.
    fn fetch_campaign(
        &self,
        id: &CampaignId,
    ) -> impl Future<Output = Result<Vec<EntityRecord>, FetchError>> + Send;
}

/// Records gathered in one cycle, plus the campaigns that failed.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub records: Vec<EntityRecord>,
    pub failures: Vec<(CampaignId, FetchError)>,
}

/// Fetch every campaign concurrently and join the results.
///
/// Records are concatenated in listing order regardless of which request
/// finishes first. The cycle only fails when the listing fails or when
/// every listed campaign fails.
pub async fn fetch_all<F: StatusFetcher>(fetcher: &F) -> Result<FetchOutcome, FetchError> {
    let ids = fetcher.fetch_campaign_ids().await?;
    info!("Active campaigns: {:?}", ids.iter().map(|id| id.0.as_str()).collect::<Vec<_>>());

    let results = join_all(ids.iter().map(|id| fetcher.fetch_campaign(id))).await;

    let mut outcome = FetchOutcome::default();
    let mut succeeded = 0;
    for (id, result) in ids.into_iter().zip(results) {
        match result {
            Ok(records) => {
                debug!("Campaign {}: {} planets", id, records.len());
                succeeded += 1;
                outcome.records.extend(records);
            }
            Err(e) => {
                warn!("Error fetching war status for campaign {}: {}", id, e);
                outcome.failures.push((id, e));
            }
        }
    }

    if succeeded == 0 && !outcome.failures.is_empty() {
        if outcome.failures.iter().any(|(_, e)| e.is_rate_limited()) {
            return Err(FetchError::RateLimited);
        }
        return Err(FetchError::AllCampaignsFailed(outcome.failures.len()));
    }

    Ok(outcome)
}

/// Listing endpoint response.
#[derive(Debug, Deserialize)]
struct SeasonsResponse {
    seasons: Vec<RawId>,
}

/// Season ids come back as numbers, but accept strings too.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(u64),
    Text(String),
}

impl From<RawId> for CampaignId {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Number(n) => CampaignId(n.to_string()),
            RawId::Text(s) => CampaignId(s),
        }
    }
}

/// Per-season status response.
#[derive(Debug, Deserialize)]
struct StatusResponse {
    planet_status: Vec<PlanetStatus>,
}

#[derive(Debug, Deserialize)]
struct PlanetStatus {
    planet: PlanetInfo,
    players: u64,
    liberation: f64,
}

#[derive(Debug, Deserialize)]
struct PlanetInfo {
    name: String,
}

/// Parse the listing endpoint body.
pub fn parse_campaign_ids(body: &str) -> Result<Vec<CampaignId>, FetchError> {
    let response: SeasonsResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))?;
    Ok(response.seasons.into_iter().map(CampaignId::from).collect())
}

/// Parse a status endpoint body into records.
pub fn parse_campaign_status(body: &str) -> Result<Vec<EntityRecord>, FetchError> {
    let response: StatusResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))?;
    Ok(response
        .planet_status
        .into_iter()
        .map(|p| EntityRecord::new(p.planet.name, p.players, p.liberation))
        .collect())
}

/// HTTP implementation of [`StatusFetcher`].
#[derive(Debug, Clone)]
pub struct HttpStatusFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl HttpStatusFetcher {
    /// Create a fetcher for the API at `base_url`.
    pub fn new(base_url: &str, timeout_seconds: u64) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .user_agent(concat!("seafbot/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Network(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;

        if let Some(err) = FetchError::from_status(response.status().as_u16()) {
            return Err(err);
        }

        Ok(response.text().await?)
    }

    fn listing_url(&self) -> String {
        format!("{}/api", self.base_url)
    }

    fn status_url(&self, id: &CampaignId) -> String {
        format!("{}/api/{}/status", self.base_url, id)
    }
}

impl StatusFetcher for HttpStatusFetcher {
    async fn fetch_campaign_ids(&self) -> Result<Vec<CampaignId>, FetchError> {
        let body = self.get_text(&self.listing_url()).await?;
        parse_campaign_ids(&body)
    }

    async fn fetch_campaign(&self, id: &CampaignId) -> Result<Vec<EntityRecord>, FetchError> {
        info!("Requesting war status for campaign {}", id);
        let body = self.get_text(&self.status_url(id)).await?;
        parse_campaign_status(&body)
    }
}
