//! Station directory client.
//!
//! One GET against a country-scoped radio-browser endpoint, decoded into
//! [`Station`]s and sorted by popularity.  Every request runs under a
//! [`CancellationToken`] handed out by a [`RequestSlot`]; issuing a new request
//! cancels the previous one so only the latest result is ever applied.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::DirectoryConfig;
use crate::error::DirectoryError;
use crate::station::{sort_by_popularity, Station};

#[derive(Clone)]
pub struct DirectoryClient {
    http: reqwest::Client,
    url: String,
}

impl DirectoryClient {
    pub fn new(config: &DirectoryConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            url: config.url.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch and sort the station list.  Returns `Cancelled` as soon as
    /// `token` fires, whichever await point the request is parked on.
    pub async fn fetch_stations(
        &self,
        token: &CancellationToken,
    ) -> Result<Vec<Station>, DirectoryError> {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!("[directory] request cancelled");
                Err(DirectoryError::Cancelled)
            }
            res = self.fetch_inner() => res,
        }
    }

    async fn fetch_inner(&self) -> Result<Vec<Station>, DirectoryError> {
        info!("[directory] GET {}", self.url);
        let resp = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(DirectoryError::Network)?;

        let status = resp.status();
        if !status.is_success() {
            warn!("[directory] {} returned {}", self.url, status);
            return Err(DirectoryError::Status(status));
        }

        let mut stations: Vec<Station> = resp.json().await.map_err(DirectoryError::Decode)?;
        let before = stations.len();
        stations.retain(|s| !s.id().trim().is_empty());
        if stations.len() < before {
            debug!("[directory] dropped {} entries without an id", before - stations.len());
        }
        sort_by_popularity(&mut stations);
        info!("[directory] loaded {} stations", stations.len());
        Ok(stations)
    }
}

/// A request's identity: the token it runs under plus the slot generation
/// it was issued at.
#[derive(Debug, Clone)]
pub struct RequestTicket {
    pub generation: u64,
    pub token: CancellationToken,
}

/// Owns the cancellation token of the single outstanding request.
#[derive(Debug, Default)]
pub struct RequestSlot {
    generation: u64,
    current: Option<CancellationToken>,
}

impl RequestSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel whatever is in flight and hand out a ticket for a new request.
    pub fn issue(&mut self) -> RequestTicket {
        self.cancel();
        self.generation += 1;
        let token = CancellationToken::new();
        self.current = Some(token.clone());
        RequestTicket {
            generation: self.generation,
            token,
        }
    }

    pub fn cancel(&mut self) {
        if let Some(prev) = self.current.take() {
            prev.cancel();
        }
    }

    /// True while `ticket` is the newest request and has not been cancelled.
    pub fn is_current(&self, ticket: &RequestTicket) -> bool {
        ticket.generation == self.generation
            && !ticket.token.is_cancelled()
            && self.current.is_some()
    }

    /// Release the slot once the current request has finished.
    pub fn complete(&mut self, ticket: &RequestTicket) {
        if ticket.generation == self.generation {
            self.current = None;
        }
    }
}

/// Loading flag and error banner for the station list.
#[derive(Debug, Default, Clone)]
pub struct DirectoryFeed {
    pub loading: bool,
    pub error: Option<String>,
}

impl DirectoryFeed {
    pub fn begin(&mut self) {
        self.loading = true;
        self.error = None;
    }

    /// Apply a finished request.  Returns the stations to show on success;
    /// cancellations leave the feed untouched because a newer request owns it.
    pub fn finish(
        &mut self,
        result: Result<Vec<Station>, DirectoryError>,
    ) -> Option<Vec<Station>> {
        match result {
            Ok(stations) => {
                self.loading = false;
                Some(stations)
            }
            Err(e) if e.is_cancelled() => None,
            Err(e) => {
                self.loading = false;
                self.error = Some(e.to_string());
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_cancels_previous_request() {
        let mut slot = RequestSlot::new();
        let first = slot.issue();
        assert!(slot.is_current(&first));

        let second = slot.issue();
        assert!(first.token.is_cancelled());
        assert!(!slot.is_current(&first));
        assert!(slot.is_current(&second));
        assert!(!second.token.is_cancelled());
    }

    #[test]
    fn test_cancel_releases_slot() {
        let mut slot = RequestSlot::new();
        let ticket = slot.issue();
        slot.cancel();
        assert!(ticket.token.is_cancelled());
        assert!(!slot.is_current(&ticket));
    }

    #[test]
    fn test_complete_ignores_stale_ticket() {
        let mut slot = RequestSlot::new();
        let stale = slot.issue();
        let fresh = slot.issue();
        slot.complete(&stale);
        assert!(slot.is_current(&fresh));
        slot.complete(&fresh);
        assert!(!slot.is_current(&fresh));
    }

    #[test]
    fn test_feed_success_clears_loading() {
        let mut feed = DirectoryFeed::default();
        feed.begin();
        assert!(feed.loading);
        let stations = feed.finish(Ok(vec![Station::default()]));
        assert_eq!(stations.map(|s| s.len()), Some(1));
        assert!(!feed.loading);
        assert!(feed.error.is_none());
    }

    #[test]
    fn test_feed_status_error_sets_banner() {
        let mut feed = DirectoryFeed::default();
        feed.begin();
        let out = feed.finish(Err(DirectoryError::Status(
            reqwest::StatusCode::SERVICE_UNAVAILABLE,
        )));
        assert!(out.is_none());
        assert!(!feed.loading);
        assert_eq!(
            feed.error.as_deref(),
            Some("Failed to fetch stations (HTTP 503 Service Unavailable)")
        );
    }

    #[test]
    fn test_feed_ignores_cancellation() {
        let mut feed = DirectoryFeed::default();
        feed.begin();
        assert!(feed.finish(Err(DirectoryError::Cancelled)).is_none());
        assert!(feed.loading);
        assert!(feed.error.is_none());
    }

    #[test]
    fn test_begin_clears_previous_error() {
        let mut feed = DirectoryFeed {
            loading: false,
            error: Some("boom".into()),
        };
        feed.begin();
        assert!(feed.error.is_none());
    }
}
