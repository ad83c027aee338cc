//! Dashboard feeds: mission history, pipeline, patterns, evidence and Mizzi.
//!
//! Each feed tries the live endpoint first and falls back to bundled sample
//! data when the backend is unreachable or answers with an error, so the
//! dashboard views always have something to show.

use serde::de::DeserializeOwned;
use tracing::warn;

use crate::client::ApiClient;
use crate::samples;
use crate::types::{
    EvidenceRecord, MissionSummary, MizziEvent, MizziStatus, Pattern, PipelineBoard,
};

/// Where a feed's data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedSource {
    Live,
    Sample,
}

/// Feed data tagged with its source.
#[derive(Debug, Clone)]
pub struct Feed<T> {
    pub data: T,
    pub source: FeedSource,
}

impl<T> Feed<T> {
    pub fn is_live(&self) -> bool {
        self.source == FeedSource::Live
    }
}

/// Read-only dashboard views over an [`ApiClient`].
pub struct Dashboard<'a> {
    client: &'a ApiClient,
}

impl<'a> Dashboard<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    async fn fetch_or<T, F>(&self, path: &str, fallback: F) -> Feed<T>
    where
        T: DeserializeOwned,
        F: FnOnce() -> T,
    {
        match self.client.get_json::<T>(path).await {
            Ok(data) => Feed {
                data,
                source: FeedSource::Live,
            },
            Err(e) => {
                warn!(%path, error = %e, "Using sample data");
                Feed {
                    data: fallback(),
                    source: FeedSource::Sample,
                }
            }
        }
    }

    pub async fn mission_history(&self) -> Feed<Vec<MissionSummary>> {
        self.fetch_or("/missions/history", samples::mission_history)
            .await
    }

    pub async fn pipeline(&self) -> Feed<PipelineBoard> {
        self.fetch_or("/missions/pipeline", || {
            PipelineBoard::from_missions(samples::pipeline_missions())
        })
        .await
    }

    pub async fn patterns(&self) -> Feed<Vec<Pattern>> {
        self.fetch_or("/patterns", samples::patterns).await
    }

    pub async fn evidence(&self) -> Feed<Vec<EvidenceRecord>> {
        self.fetch_or("/evidence", samples::evidence).await
    }

    pub async fn mizzi_status(&self) -> Feed<MizziStatus> {
        self.fetch_or("/mizzi/status", samples::mizzi_status).await
    }

    pub async fn mizzi_events(&self) -> Feed<Vec<MizziEvent>> {
        self.fetch_or("/mizzi/events", samples::mizzi_events).await
    }
}
