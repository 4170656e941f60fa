//! Fixture catalog providers
//!
//! `FixtureProvider` serves a tiny in-memory catalog and counts lookups.
//! Its behavior can be switched to always-unavailable or never-answering,
//! and lookups can be held behind a gate the test opens explicitly.

use super::constants::*;
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use momentum_server::catalog_provider::{CatalogProvider, CatalogRecord, ProviderError};
use momentum_server::momentum::models::{
    ArtistProfile, EngagementRecord, PlaylistPlacement, StreamingRecord, ViralContentItem,
};
use momentum_server::momentum::{CompositeScorer, MomentumPipeline, Synthesizer};
use momentum_server::{CacheSettings, FileCacheStore, MomentumCache};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProviderBehavior {
    /// Answer from the fixture catalog, NotFound for anyone else
    Serve,
    /// Always report the catalog as unavailable
    Unavailable,
    /// Never answer
    Stall,
}

pub struct FixtureProvider {
    behavior: ProviderBehavior,
    calls: AtomicUsize,
    gate: Option<Arc<Semaphore>>,
}

impl FixtureProvider {
    pub fn new(behavior: ProviderBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            calls: AtomicUsize::new(0),
            gate: None,
        })
    }

    pub fn serving() -> Arc<Self> {
        Self::new(ProviderBehavior::Serve)
    }

    pub fn unavailable() -> Arc<Self> {
        Self::new(ProviderBehavior::Unavailable)
    }

    pub fn stalling() -> Arc<Self> {
        Self::new(ProviderBehavior::Stall)
    }

    /// A serving provider whose lookups block until `open_gate` is called.
    pub fn gated() -> (Arc<Self>, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let provider = Arc::new(Self {
            behavior: ProviderBehavior::Serve,
            calls: AtomicUsize::new(0),
            gate: Some(gate.clone()),
        });
        (provider, gate)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Lets every current and future lookup behind `gate` through.
pub fn open_gate(gate: &Semaphore) {
    gate.add_permits(1);
}

#[async_trait]
impl CatalogProvider for FixtureProvider {
    fn name(&self) -> &'static str {
        "fixture"
    }

    async fn lookup_artist(&self, name: &str) -> Result<CatalogRecord, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            // The permit goes back on drop, so one permit opens the gate for good.
            let _permit = gate
                .acquire()
                .await
                .map_err(|_| ProviderError::Unavailable("gate closed".to_string()))?;
        }

        match self.behavior {
            ProviderBehavior::Serve => fixture_record(name, today())
                .ok_or_else(|| ProviderError::NotFound(name.to_string())),
            ProviderBehavior::Unavailable => Err(ProviderError::Unavailable(
                "fixture catalog is down".to_string(),
            )),
            ProviderBehavior::Stall => futures::future::pending().await,
        }
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Catalog record for one of the fixture artists, with history ending the
/// day before `end_date`.
pub fn fixture_record(name: &str, end_date: NaiveDate) -> Option<CatalogRecord> {
    let normalized = name.trim().to_lowercase();
    if normalized == RISING_ARTIST.to_lowercase() {
        Some(rising_artist_record(end_date))
    } else if normalized == FADING_ARTIST.to_lowercase() {
        Some(fading_artist_record(end_date))
    } else {
        None
    }
}

fn day(end_date: NaiveDate, index: usize) -> NaiveDate {
    end_date - ChronoDuration::days((FIXTURE_HISTORY_DAYS - index) as i64)
}

fn profile(id: &str, name: &str, popularity: u8) -> ArtistProfile {
    ArtistProfile {
        id: id.to_string(),
        name: name.to_string(),
        popularity,
        followers: 50_000,
        genres: BTreeSet::from(["pop".to_string(), "dance".to_string()]),
        image_url: None,
    }
}

fn placements(count: usize) -> Vec<PlaylistPlacement> {
    (1..=count)
        .map(|i| PlaylistPlacement {
            id: format!("playlist{}", i),
            name: format!("Playlist {}", i),
            owner: format!("User {}", i),
            tracks_total: 50,
            image_url: None,
        })
        .collect()
}

pub fn rising_artist_record(end_date: NaiveDate) -> CatalogRecord {
    CatalogRecord {
        artist: profile(RISING_ARTIST_ID, RISING_ARTIST, RISING_ARTIST_POPULARITY),
        top_tracks: vec![],
        playlists: placements(RISING_ARTIST_PLAYLISTS),
        streaming_history: (0..FIXTURE_HISTORY_DAYS)
            .map(|i| StreamingRecord {
                date: day(end_date, i),
                streams: 1000 + i as u64 * 100,
            })
            .collect(),
        engagement_history: (0..FIXTURE_HISTORY_DAYS)
            .map(|i| {
                let likes = 500 + i as u64 * 50;
                EngagementRecord::new(
                    day(end_date, i),
                    likes,
                    50 + i as u64 * 5,
                    20 + i as u64 * 2,
                    likes * 5,
                    likes / 10,
                )
            })
            .collect(),
        viral_content: vec![ViralContentItem {
            id: "content1".to_string(),
            content_type: "dance".to_string(),
            title: "Viral Dance".to_string(),
            creator: "Creator 1".to_string(),
            likes: 500_000,
            shares: 100_000,
            comments: 50_000,
            views: 2_000_000,
            created_at: end_date - ChronoDuration::days(7),
        }],
    }
}

pub fn fading_artist_record(end_date: NaiveDate) -> CatalogRecord {
    CatalogRecord {
        artist: profile(FADING_ARTIST_ID, FADING_ARTIST, 35),
        top_tracks: vec![],
        playlists: placements(1),
        streaming_history: (0..FIXTURE_HISTORY_DAYS)
            .map(|i| StreamingRecord {
                date: day(end_date, i),
                streams: 5000 - i as u64 * 100,
            })
            .collect(),
        engagement_history: (0..FIXTURE_HISTORY_DAYS)
            .map(|i| {
                let likes = 2000 - i as u64 * 50;
                EngagementRecord::new(day(end_date, i), likes, 100, 40, likes * 4, 5)
            })
            .collect(),
        viral_content: vec![ViralContentItem {
            id: "content2".to_string(),
            content_type: "cover".to_string(),
            title: "Old Cover".to_string(),
            creator: "Creator 2".to_string(),
            likes: 1_000,
            shares: 10,
            comments: 5,
            views: 9_000,
            created_at: end_date - ChronoDuration::days(25),
        }],
    }
}

/// Pipeline over `provider` with the test seed and default scoring.
pub fn test_pipeline(provider: Arc<dyn CatalogProvider>) -> MomentumPipeline {
    MomentumPipeline::new(
        provider,
        Synthesizer::new(TEST_SEED),
        CompositeScorer::default(),
    )
}

/// In-memory cache over `provider`.
pub fn test_cache(provider: Arc<dyn CatalogProvider>, settings: CacheSettings) -> MomentumCache {
    MomentumCache::new(test_pipeline(provider), settings)
}

/// Cache over `provider` that persists its entries under `dir`.
pub fn test_cache_with_store(
    provider: Arc<dyn CatalogProvider>,
    settings: CacheSettings,
    dir: &Path,
) -> MomentumCache {
    let store = FileCacheStore::new(dir).expect("Failed to open cache store");
    MomentumCache::with_store(test_pipeline(provider), settings, store)
}

/// Polls `condition` until it holds.
///
/// # Panics
///
/// Panics if the condition doesn't hold within `CONDITION_TIMEOUT_MS`.
pub async fn wait_until<F: Fn() -> bool>(condition: F) {
    let start = std::time::Instant::now();
    while !condition() {
        if start.elapsed() > Duration::from_millis(CONDITION_TIMEOUT_MS) {
            panic!("Condition not met within {}ms", CONDITION_TIMEOUT_MS);
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
