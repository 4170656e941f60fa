//! Momentum pipeline.
//!
//! Fetches the catalog record for an artist, fills in any missing daily
//! series with synthetic data, and scores the result. When the provider is
//! unreachable the cache layer asks [`MomentumPipeline::synthetic`] for a
//! fully synthesized result instead.

use super::error::{validate_window_days, MomentumError, MAX_WINDOW_DAYS};
use super::models::{
    normalize_series, sort_viral_content, ArtistSnapshot, MomentumResult, TrendingHashtag,
    MAX_POPULARITY,
};
use super::scorer::CompositeScorer;
use super::synthesizer::Synthesizer;
use crate::catalog_provider::{CatalogProvider, CatalogRecord, ProviderError};
use crate::server::metrics;
use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub const DEFAULT_HISTORY_DAYS: usize = 30;
/// Upper bound on synthesized history: two of the longest windows.
pub const MAX_HISTORY_DAYS: usize = 2 * MAX_WINDOW_DAYS;
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

pub struct MomentumPipeline {
    provider: Arc<dyn CatalogProvider>,
    synthesizer: Synthesizer,
    scorer: CompositeScorer,
    fetch_timeout: Duration,
    history_days: usize,
}

impl MomentumPipeline {
    pub fn new(
        provider: Arc<dyn CatalogProvider>,
        synthesizer: Synthesizer,
        scorer: CompositeScorer,
    ) -> Self {
        Self {
            provider,
            synthesizer,
            scorer,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            history_days: DEFAULT_HISTORY_DAYS,
        }
    }

    pub fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    pub fn with_history_days(mut self, history_days: usize) -> Self {
        self.history_days = history_days;
        self
    }

    pub fn scorer(&self) -> &CompositeScorer {
        &self.scorer
    }

    /// Computes momentum from the catalog provider's record.
    ///
    /// Provider timeouts and failures come back as `UpstreamUnavailable`;
    /// deciding what to do with them is up to the caller.
    pub async fn compute(
        &self,
        artist_name: &str,
        window_days: usize,
    ) -> Result<MomentumResult, MomentumError> {
        validate_window_days(window_days)?;
        let mut record = self.fetch(artist_name).await?;
        if record.artist.popularity > MAX_POPULARITY {
            warn!(
                "Catalog reported popularity {} for '{}', clamping to {}",
                record.artist.popularity, record.artist.id, MAX_POPULARITY
            );
            record.artist = record.artist.with_bounded_popularity();
        }
        let trending_hashtags = self.complete_record(&mut record, window_days, today());
        Ok(self.assemble(record, trending_hashtags, window_days, false))
    }

    /// Fully synthetic result for `artist_name`, deterministic for a given
    /// seed, name and day.
    pub fn synthetic(&self, artist_name: &str, window_days: usize) -> MomentumResult {
        self.synthetic_at(artist_name, window_days, today())
    }

    pub fn synthetic_at(
        &self,
        artist_name: &str,
        window_days: usize,
        end_date: NaiveDate,
    ) -> MomentumResult {
        let mut rng = self.synthesizer.rng_for(&artist_name.trim().to_lowercase());
        let artist = self.synthesizer.profile(artist_name, &mut rng);
        let top_tracks = self.synthesizer.tracks(&artist, &mut rng);
        let series = self.synthesizer.synthesize(
            &artist,
            self.history_len(window_days),
            end_date,
            &mut rng,
        );

        let record = CatalogRecord {
            artist,
            top_tracks,
            playlists: series.playlists,
            streaming_history: series.streaming_history,
            engagement_history: series.engagement_history,
            viral_content: series.viral_content,
        };
        self.assemble(record, series.trending_hashtags, window_days, true)
    }

    async fn fetch(&self, artist_name: &str) -> Result<CatalogRecord, MomentumError> {
        #[cfg(feature = "slowdown")]
        tokio::time::sleep(Duration::from_millis(500)).await;

        let start = Instant::now();
        let outcome = tokio::time::timeout(
            self.fetch_timeout,
            self.provider.lookup_artist(artist_name),
        )
        .await;
        metrics::record_catalog_fetch(self.provider.name(), start.elapsed());

        match outcome {
            Ok(Ok(record)) => {
                debug!(
                    "Fetched catalog record for '{}' (id: {})",
                    artist_name, record.artist.id
                );
                Ok(record)
            }
            Ok(Err(ProviderError::NotFound(name))) => {
                info!("Artist '{}' not found in catalog", name);
                Err(MomentumError::NotFound(name))
            }
            Ok(Err(ProviderError::Unavailable(reason))) => {
                Err(MomentumError::UpstreamUnavailable(reason))
            }
            Err(_) => {
                warn!(
                    "Catalog lookup for '{}' timed out after {:?}",
                    artist_name, self.fetch_timeout
                );
                Err(MomentumError::UpstreamUnavailable(format!(
                    "lookup timed out after {:?}",
                    self.fetch_timeout
                )))
            }
        }
    }

    /// Enough history for two full windows, and never less than configured.
    fn history_len(&self, window_days: usize) -> usize {
        self.history_days
            .max(window_days.saturating_mul(2))
            .min(MAX_HISTORY_DAYS)
    }

    /// Fills empty series of a provider record with synthetic ones.
    /// Hashtags are never supplied by the catalog, so they always come
    /// from the synthesizer.
    fn complete_record(
        &self,
        record: &mut CatalogRecord,
        window_days: usize,
        end_date: NaiveDate,
    ) -> Vec<TrendingHashtag> {
        let mut rng = self.synthesizer.rng_for(&record.artist.id);
        let popularity = record.artist.popularity.min(MAX_POPULARITY);
        let days = self.history_len(window_days);

        if record.streaming_history.is_empty() {
            debug!("No streaming history for '{}', synthesizing", record.artist.id);
            record.streaming_history =
                self.synthesizer
                    .streaming_history(popularity, days, end_date, &mut rng);
        }
        if record.engagement_history.is_empty() {
            debug!("No engagement history for '{}', synthesizing", record.artist.id);
            record.engagement_history =
                self.synthesizer
                    .engagement_history(popularity, days, end_date, &mut rng);
        }
        if record.viral_content.is_empty() {
            record.viral_content = self.synthesizer.viral_content(
                &record.artist.name,
                popularity,
                end_date,
                &mut rng,
            );
        }
        self.synthesizer
            .trending_hashtags(&record.artist.name, popularity, &mut rng)
    }

    fn assemble(
        &self,
        record: CatalogRecord,
        trending_hashtags: Vec<TrendingHashtag>,
        window_days: usize,
        is_synthetic: bool,
    ) -> MomentumResult {
        let CatalogRecord {
            artist,
            top_tracks,
            playlists,
            mut streaming_history,
            mut engagement_history,
            mut viral_content,
        } = record;

        normalize_series(&mut streaming_history, |r| r.date);
        normalize_series(&mut engagement_history, |r| r.date());
        sort_viral_content(&mut viral_content);

        let breakdown = self.scorer.score(
            &streaming_history,
            &engagement_history,
            &playlists,
            &viral_content,
            window_days,
        );

        MomentumResult {
            momentum_score: breakdown.momentum_score,
            raw_momentum_score: breakdown.raw_momentum_score,
            components: breakdown.components,
            insights: breakdown.insights,
            window_days,
            raw_data: ArtistSnapshot {
                artist: artist.clone(),
                tracks: top_tracks,
                playlists,
                streaming_history,
                engagement_history,
                trending_hashtags,
                viral_content,
            },
            artist,
            generated_at: Utc::now(),
            is_synthetic,
        }
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}
