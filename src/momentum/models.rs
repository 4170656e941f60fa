//! Data model for momentum scoring.
//!
//! Series records are per-day and kept in ascending date order. The
//! engagement ratio of an [`EngagementRecord`] is derived from its counters
//! and is recomputed whenever a record is built or deserialized.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Upper bound for every popularity value (artist and track).
pub const MAX_POPULARITY: u8 = 100;

/// An artist as known to the catalog.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct ArtistProfile {
    pub id: String,
    pub name: String,
    /// 0..=100
    pub popularity: u8,
    pub followers: u64,
    #[serde(default)]
    pub genres: BTreeSet<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl ArtistProfile {
    /// Returns a copy whose popularity is clamped into `0..=100`.
    pub fn with_bounded_popularity(mut self) -> Self {
        self.popularity = self.popularity.min(MAX_POPULARITY);
        self
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct TrackSummary {
    pub id: String,
    pub name: String,
    pub popularity: u8,
    pub album: String,
    pub release_date: String,
    #[serde(default)]
    pub preview_url: Option<String>,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct PlaylistPlacement {
    pub id: String,
    pub name: String,
    pub owner: String,
    pub tracks_total: u32,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct StreamingRecord {
    pub date: NaiveDate,
    pub streams: u64,
}

/// Daily social engagement counters.
///
/// Fields are private so the engagement ratio can never disagree with the
/// counters it is derived from.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(from = "EngagementRecordData")]
pub struct EngagementRecord {
    date: NaiveDate,
    likes: u64,
    shares: u64,
    comments: u64,
    views: u64,
    mentions: u64,
    engagement_ratio: f64,
}

/// Wire shape of an engagement record. Any stored ratio is ignored.
#[derive(Deserialize)]
struct EngagementRecordData {
    date: NaiveDate,
    likes: u64,
    shares: u64,
    comments: u64,
    views: u64,
    mentions: u64,
}

impl From<EngagementRecordData> for EngagementRecord {
    fn from(data: EngagementRecordData) -> Self {
        EngagementRecord::new(
            data.date,
            data.likes,
            data.shares,
            data.comments,
            data.views,
            data.mentions,
        )
    }
}

impl EngagementRecord {
    pub fn new(
        date: NaiveDate,
        likes: u64,
        shares: u64,
        comments: u64,
        views: u64,
        mentions: u64,
    ) -> Self {
        let interactions = likes.saturating_add(shares).saturating_add(comments);
        let engagement_ratio = if views > 0 {
            round_to(interactions as f64 / views as f64, 4)
        } else {
            0.0
        };
        Self {
            date,
            likes,
            shares,
            comments,
            views,
            mentions,
            engagement_ratio,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn likes(&self) -> u64 {
        self.likes
    }

    pub fn shares(&self) -> u64 {
        self.shares
    }

    pub fn comments(&self) -> u64 {
        self.comments
    }

    pub fn views(&self) -> u64 {
        self.views
    }

    pub fn mentions(&self) -> u64 {
        self.mentions
    }

    /// (likes + shares + comments) / views, rounded to 4 decimals.
    pub fn engagement_ratio(&self) -> f64 {
        self.engagement_ratio
    }

    /// Interactions counted towards social growth.
    pub fn interactions(&self) -> u64 {
        self.likes
            .saturating_add(self.shares)
            .saturating_add(self.comments)
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct ViralContentItem {
    pub id: String,
    pub content_type: String,
    pub title: String,
    pub creator: String,
    pub likes: u64,
    pub shares: u64,
    pub comments: u64,
    pub views: u64,
    pub created_at: NaiveDate,
}

impl ViralContentItem {
    pub fn engagement(&self) -> u64 {
        self.likes
            .saturating_add(self.shares)
            .saturating_add(self.comments)
    }
}

/// Orders viral content for presentation, most engaging first.
pub fn sort_viral_content(items: &mut [ViralContentItem]) {
    items.sort_by(|a, b| b.engagement().cmp(&a.engagement()));
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct TrendingHashtag {
    pub hashtag: String,
    pub post_count: u64,
    pub is_trending: bool,
}

/// The raw inputs a momentum result was computed from.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct ArtistSnapshot {
    pub artist: ArtistProfile,
    #[serde(default)]
    pub tracks: Vec<TrackSummary>,
    #[serde(default)]
    pub playlists: Vec<PlaylistPlacement>,
    #[serde(default)]
    pub streaming_history: Vec<StreamingRecord>,
    #[serde(default)]
    pub engagement_history: Vec<EngagementRecord>,
    #[serde(default)]
    pub trending_hashtags: Vec<TrendingHashtag>,
    #[serde(default)]
    pub viral_content: Vec<ViralContentItem>,
}

/// The four scored components of momentum.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct MomentumComponents {
    pub streaming_growth: f64,
    pub social_growth: f64,
    pub playlist_score: f64,
    pub viral_score: f64,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct MomentumResult {
    pub artist: ArtistProfile,
    /// Score presented to callers, after the optional display floor.
    pub momentum_score: f64,
    /// Weighted sum of the components, never floored.
    pub raw_momentum_score: f64,
    #[serde(flatten)]
    pub components: MomentumComponents,
    pub insights: Vec<String>,
    pub window_days: usize,
    pub raw_data: ArtistSnapshot,
    pub generated_at: DateTime<Utc>,
    /// True when the result was produced from synthesized catalog data
    /// because the upstream provider could not be reached.
    pub is_synthetic: bool,
}

impl AsRef<MomentumResult> for MomentumResult {
    fn as_ref(&self) -> &MomentumResult {
        self
    }
}

/// Sorts by date and drops repeated days, keeping the first record of a day.
pub fn normalize_series<T, F>(series: &mut Vec<T>, date_of: F)
where
    F: Fn(&T) -> NaiveDate,
{
    series.sort_by_key(|r| date_of(r));
    series.dedup_by(|a, b| date_of(a) == date_of(b));
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
