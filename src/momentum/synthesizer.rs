//! Synthetic artist data.
//!
//! Produces schema-valid catalog records and daily series when the catalog
//! provider can't be reached, or when a real record carries no history.
//! All randomness comes from a caller-supplied RNG; [`Synthesizer::rng_for`]
//! derives a reproducible one from the configured seed and the artist key.

use super::models::{
    normalize_series, sort_viral_content, ArtistProfile, EngagementRecord, PlaylistPlacement,
    StreamingRecord, TrackSummary, TrendingHashtag, ViralContentItem, MAX_POPULARITY,
};
use chrono::{Duration as ChronoDuration, NaiveDate};
use rand::{rngs::StdRng, seq::IndexedRandom, Rng, SeedableRng};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::ops::RangeInclusive;

pub const DEFAULT_SYNTHESIZER_SEED: u64 = 0x5EED;

/// Popularity above which the last week may receive a viral spike.
const ENGAGEMENT_SPIKE_POPULARITY: u8 = 50;
const ENGAGEMENT_SPIKE_DAYS: usize = 7;
const ENGAGEMENT_SPIKE_CHANCE: f64 = 0.3;

/// Popularity above which viral content is generated at all.
const VIRAL_CONTENT_POPULARITY: u8 = 40;
const MAX_VIRAL_ITEMS: usize = 3;

const SYNTHETIC_TRACKS: usize = 5;
const SYNTHETIC_POPULARITY: RangeInclusive<u8> = 50..=90;

const CONTENT_TYPES: [&str; 5] = ["fan edit", "reaction", "lip sync", "cover", "dance challenge"];
const GENRES: [&str; 6] = ["pop", "rock", "hip hop", "r&b", "electronic", "indie"];

/// Synthesized daily series and collections for one artist.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedSeries {
    pub streaming_history: Vec<StreamingRecord>,
    pub engagement_history: Vec<EngagementRecord>,
    pub playlists: Vec<PlaylistPlacement>,
    pub viral_content: Vec<ViralContentItem>,
    pub trending_hashtags: Vec<TrendingHashtag>,
}

#[derive(Debug, Clone, Copy)]
pub struct Synthesizer {
    seed: u64,
}

impl Default for Synthesizer {
    fn default() -> Self {
        Self::new(DEFAULT_SYNTHESIZER_SEED)
    }
}

impl Synthesizer {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// A reproducible RNG for `key`: same seed and key, same stream.
    pub fn rng_for(&self, key: &str) -> StdRng {
        let digest = Sha256::digest(key.as_bytes());
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest[..8]);
        StdRng::seed_from_u64(self.seed ^ u64::from_le_bytes(prefix))
    }

    /// Synthesizes every series for `profile`, ending the day before `end_date`.
    pub fn synthesize<R: Rng + ?Sized>(
        &self,
        profile: &ArtistProfile,
        days: usize,
        end_date: NaiveDate,
        rng: &mut R,
    ) -> SynthesizedSeries {
        let popularity = profile.popularity.min(MAX_POPULARITY);
        SynthesizedSeries {
            streaming_history: self.streaming_history(popularity, days, end_date, rng),
            engagement_history: self.engagement_history(popularity, days, end_date, rng),
            playlists: self.playlists(&profile.id, popularity, rng),
            viral_content: self.viral_content(&profile.name, popularity, end_date, rng),
            trending_hashtags: self.trending_hashtags(&profile.name, popularity, rng),
        }
    }

    /// Catalog profile for an artist the provider could not deliver.
    pub fn profile<R: Rng + ?Sized>(&self, name: &str, rng: &mut R) -> ArtistProfile {
        let genre_count = rng.random_range(1..=3);
        let genres: BTreeSet<String> = GENRES
            .choose_multiple(rng, genre_count)
            .map(|g| g.to_string())
            .collect();

        ArtistProfile {
            id: synthetic_artist_id(name),
            name: name.trim().to_string(),
            popularity: rng.random_range(SYNTHETIC_POPULARITY),
            followers: rng.random_range(10_000..=1_000_000),
            genres,
            image_url: None,
        }
    }

    pub fn tracks<R: Rng + ?Sized>(&self, profile: &ArtistProfile, rng: &mut R) -> Vec<TrackSummary> {
        (0..SYNTHETIC_TRACKS)
            .map(|i| TrackSummary {
                id: format!("{}_track_{}", profile.id, i),
                name: format!("Track {}", i + 1),
                popularity: rng.random_range(SYNTHETIC_POPULARITY),
                album: format!("Album {}", i / 2 + 1),
                release_date: format!(
                    "2024-{:02}-{:02}",
                    rng.random_range(1..=12),
                    rng.random_range(1..=28)
                ),
                preview_url: None,
            })
            .collect()
    }

    pub fn streaming_history<R: Rng + ?Sized>(
        &self,
        popularity: u8,
        days: usize,
        end_date: NaiveDate,
        rng: &mut R,
    ) -> Vec<StreamingRecord> {
        let base_streams = popularity as f64 * 100.0;
        let mut history: Vec<StreamingRecord> = (0..days)
            .map(|i| {
                let daily_variance = rng.random_range(0.7..=1.3);
                let trend_factor = 1.0 + 0.01 * i as f64 * (popularity as f64 / 100.0);
                StreamingRecord {
                    date: day_of(end_date, days, i),
                    streams: (base_streams * daily_variance * trend_factor) as u64,
                }
            })
            .collect();
        normalize_series(&mut history, |r| r.date);
        history
    }

    pub fn engagement_history<R: Rng + ?Sized>(
        &self,
        popularity: u8,
        days: usize,
        end_date: NaiveDate,
        rng: &mut R,
    ) -> Vec<EngagementRecord> {
        let p = popularity as f64;
        let (base_likes, base_shares, base_comments, base_views, base_mentions) =
            (p * 10.0, p * 1.5, p, p * 100.0, p * 0.5);

        let mut history: Vec<EngagementRecord> = (0..days)
            .map(|i| {
                let variance = rng.random_range(0.8..=1.2);
                let in_spike_window = i + ENGAGEMENT_SPIKE_DAYS >= days;
                let spike_roll: f64 = rng.random();
                let viral_factor = if in_spike_window
                    && popularity > ENGAGEMENT_SPIKE_POPULARITY
                    && spike_roll < ENGAGEMENT_SPIKE_CHANCE
                {
                    rng.random_range(2.5..=5.0)
                } else {
                    1.0
                };
                let scale = |base: f64| (base * variance * viral_factor) as u64;
                EngagementRecord::new(
                    day_of(end_date, days, i),
                    scale(base_likes),
                    scale(base_shares),
                    scale(base_comments),
                    scale(base_views),
                    scale(base_mentions),
                )
            })
            .collect();
        normalize_series(&mut history, |r| r.date());
        history
    }

    fn playlists<R: Rng + ?Sized>(
        &self,
        artist_id: &str,
        popularity: u8,
        rng: &mut R,
    ) -> Vec<PlaylistPlacement> {
        let count = (popularity as usize / 20).max(1) + rng.random_range(0..=1);
        (0..count)
            .map(|i| PlaylistPlacement {
                id: format!("{}_playlist_{}", artist_id, i),
                name: format!("Playlist {}", i + 1),
                owner: format!("User {}", i + 1),
                tracks_total: rng.random_range(20..=100),
                image_url: None,
            })
            .collect()
    }

    pub fn viral_content<R: Rng + ?Sized>(
        &self,
        artist_name: &str,
        popularity: u8,
        end_date: NaiveDate,
        rng: &mut R,
    ) -> Vec<ViralContentItem> {
        if popularity <= VIRAL_CONTENT_POPULARITY {
            return Vec::new();
        }

        let count = (popularity as usize / 30).clamp(1, MAX_VIRAL_ITEMS);
        let base_engagement = popularity as f64 * 10_000.0;

        let mut items: Vec<ViralContentItem> = (0..count)
            .map(|i| {
                let content_type = CONTENT_TYPES.choose(rng).copied().unwrap_or("cover");
                let variance = rng.random_range(0.5..=2.0);
                let likes = (base_engagement * variance * rng.random_range(0.8..=1.2)) as u64;
                let shares = (likes as f64 * rng.random_range(0.1..=0.3)) as u64;
                let comments = (likes as f64 * rng.random_range(0.05..=0.15)) as u64;
                let views = (likes as f64 * rng.random_range(3.0..=8.0)) as u64;
                let days_ago = rng.random_range(1..=30);
                ViralContentItem {
                    id: format!("sim_content_{}", i),
                    content_type: content_type.to_string(),
                    title: format!("{} {} - viral clip #{}", artist_name, content_type, i + 1),
                    creator: format!("Simulated Creator {}", i),
                    likes,
                    shares,
                    comments,
                    views,
                    created_at: end_date - ChronoDuration::days(days_ago),
                }
            })
            .collect();

        sort_viral_content(&mut items);
        items
    }

    pub fn trending_hashtags<R: Rng + ?Sized>(
        &self,
        artist_name: &str,
        popularity: u8,
        rng: &mut R,
    ) -> Vec<TrendingHashtag> {
        let compact: String = artist_name.split_whitespace().collect();
        let mut patterns: Vec<String> = ["", "Music", "Fan", "Live", "Trend"]
            .iter()
            .map(|suffix| format!("#{}{}", compact, suffix))
            .collect();

        let words: Vec<&str> = artist_name.split_whitespace().collect();
        if words.len() > 1 {
            for word in &words {
                if word.chars().count() > 3 {
                    patterns.push(format!("#{}{}", word, words[0]));
                }
            }
        }

        patterns
            .into_iter()
            .enumerate()
            .map(|(i, hashtag)| {
                let post_count = (popularity as f64 * 10_000.0 * rng.random_range(0.5..=1.5)) as u64;
                let lucky: f64 = rng.random();
                let is_trending =
                    (i < 4 && popularity > 40) || (lucky > 0.8 && popularity > 60);
                TrendingHashtag {
                    hashtag,
                    post_count,
                    is_trending,
                }
            })
            .collect()
    }
}

/// Identifier used for artists that only exist as synthetic data.
pub fn synthetic_artist_id(name: &str) -> String {
    let compact: String = name.split_whitespace().collect();
    format!("sim_{}", compact.to_lowercase())
}

/// Date of the `index`-th record of a `days`-long series ending before `end_date`.
fn day_of(end_date: NaiveDate, days: usize, index: usize) -> NaiveDate {
    end_date - ChronoDuration::days((days - index) as i64)
}
