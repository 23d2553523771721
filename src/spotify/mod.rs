// Spotify Web API - client-credentials token exchange + track search
// A fresh token is fetched for every search; there is no token cache.

mod model;

pub use model::TrackCandidate;

use crate::config::SpotifyConfig;
use model::{SearchResponse, TokenResponse};
use reqwest::StatusCode;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Most results a single search returns.
pub const SEARCH_LIMIT: usize = 10;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Spotify credentials missing (set SPOTIFY_CLIENT_ID and SPOTIFY_CLIENT_SECRET)")]
    MissingCredentials,
    #[error("Spotify rejected the credentials ({status}): {body}")]
    Auth { status: StatusCode, body: String },
    #[error("Spotify search failed ({status}): {body}")]
    Http { status: StatusCode, body: String },
    #[error("Spotify unreachable: {0}")]
    Unreachable(#[from] reqwest::Error),
    #[error("unexpected Spotify response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Anything that can turn free text into a ranked list of candidates.
#[allow(async_fn_in_trait)]
pub trait TrackSearch {
    /// `Ok(vec![])` means the catalog had nothing; errors mean we never found out.
    async fn search(&self, query: &str) -> Result<Vec<TrackCandidate>, SearchError>;
}

#[derive(Debug, Clone)]
struct Credentials {
    client_id: String,
    client_secret: String,
}

#[derive(Debug, Clone)]
pub struct SpotifyClient {
    http: reqwest::Client,
    credentials: Option<Credentials>,
    token_url: String,
    api_base: String,
}

impl SpotifyClient {
    pub fn new(config: &SpotifyConfig, timeout: Duration) -> Result<Self, SearchError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        let credentials = match (&config.client_id, &config.client_secret) {
            (Some(id), Some(secret)) if config.has_credentials() => Some(Credentials {
                client_id: id.clone(),
                client_secret: secret.clone(),
            }),
            _ => None,
        };

        Ok(Self {
            http,
            credentials,
            token_url: config.token_url.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    async fn fetch_token(&self, credentials: &Credentials) -> Result<String, SearchError> {
        let response = self
            .http
            .post(&self.token_url)
            .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(SearchError::Auth { status, body });
        }

        let token: TokenResponse = serde_json::from_str(&body)?;
        Ok(token.access_token)
    }

    pub async fn search_tracks(&self, query: &str) -> Result<Vec<TrackCandidate>, SearchError> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(SearchError::MissingCredentials)?;

        let started = Instant::now();
        let token = self.fetch_token(credentials).await?;
        debug!("Spotify token acquired in {:?}", started.elapsed());

        let limit = SEARCH_LIMIT.to_string();
        let response = self
            .http
            .get(format!("{}/search", self.api_base))
            .bearer_auth(&token)
            .query(&[("q", query), ("type", "track"), ("limit", limit.as_str())])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(SearchError::Http { status, body });
        }

        let parsed: SearchResponse = serde_json::from_str(&body)?;
        let candidates = parsed.into_candidates(SEARCH_LIMIT);
        info!(
            "Spotify search '{}' returned {} tracks in {:?}",
            query,
            candidates.len(),
            started.elapsed()
        );
        Ok(candidates)
    }
}

impl TrackSearch for SpotifyClient {
    async fn search(&self, query: &str) -> Result<Vec<TrackCandidate>, SearchError> {
        self.search_tracks(query).await.inspect_err(|e| {
            warn!("Spotify search for '{}' failed: {}", query, e);
        })
    }
}
