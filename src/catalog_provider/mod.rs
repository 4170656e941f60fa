//! External music catalog provider.
//!
//! The provider resolves an artist name into a catalog record. It is
//! treated as slow and unreliable: callers wrap lookups in a timeout and
//! fall back to synthetic data when it is unavailable.

mod http_client;
mod null_provider;

pub use http_client::HttpCatalogProvider;
pub use null_provider::NullCatalogProvider;

use crate::momentum::models::{
    ArtistProfile, EngagementRecord, PlaylistPlacement, StreamingRecord, TrackSummary,
    ViralContentItem,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Everything the catalog knows about an artist.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct CatalogRecord {
    pub artist: ArtistProfile,
    #[serde(default)]
    pub top_tracks: Vec<TrackSummary>,
    #[serde(default)]
    pub playlists: Vec<PlaylistPlacement>,
    #[serde(default)]
    pub streaming_history: Vec<StreamingRecord>,
    #[serde(default)]
    pub engagement_history: Vec<EngagementRecord>,
    #[serde(default)]
    pub viral_content: Vec<ViralContentItem>,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProviderError {
    #[error("No catalog entry for '{0}'")]
    NotFound(String),

    #[error("Catalog provider unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Look up an artist by display name.
    async fn lookup_artist(&self, name: &str) -> Result<CatalogRecord, ProviderError>;
}
