//! Composite momentum scoring.
//!
//! ## Components
//!
//! 1. **Streaming growth** - trailing-window growth of daily streams
//! 2. **Social growth** - trailing-window growth of daily likes + shares + comments
//! 3. **Playlist score** - placement count, saturating at 10 placements
//! 4. **Viral score** - likes and shares of viral content, saturating at
//!    1M likes and 500k shares
//!
//! The momentum score is the dot product of the components with
//! [`MomentumWeights`]. Growth can be negative, so the raw score can be too.
//! A display floor can be enabled through [`ScoringOptions`].

use super::error::MomentumError;
use super::growth::compute_growth;
use super::models::{
    EngagementRecord, MomentumComponents, MomentumResult, PlaylistPlacement, StreamingRecord,
    ViralContentItem,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const PLACEMENT_SATURATION: f64 = 10.0;
const VIRAL_LIKES_SATURATION: f64 = 1_000_000.0;
const VIRAL_SHARES_SATURATION: f64 = 500_000.0;
const VIRAL_LIKES_WEIGHT: f64 = 0.7;
const VIRAL_SHARES_WEIGHT: f64 = 0.3;

const STREAMING_INSIGHT_THRESHOLD: f64 = 0.5;
const SOCIAL_INSIGHT_THRESHOLD: f64 = 1.0;
const PLAYLIST_INSIGHT_THRESHOLD: f64 = 0.5;
const VIRAL_INSIGHT_THRESHOLD: f64 = 0.3;

pub const DEFAULT_INSIGHT: &str = "Steady growth across platforms";

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

pub const STREAMING_GROWTH_KEY: &str = "streaming_growth";
pub const SOCIAL_GROWTH_KEY: &str = "social_growth";
pub const PLAYLIST_SCORE_KEY: &str = "playlist_score";
pub const VIRAL_SCORE_KEY: &str = "viral_score";

/// Weight of each component in the momentum score.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MomentumWeights {
    pub streaming_growth: f64,
    pub social_growth: f64,
    pub playlist_score: f64,
    pub viral_score: f64,
}

impl Default for MomentumWeights {
    fn default() -> Self {
        Self {
            streaming_growth: 0.3,
            social_growth: 0.3,
            playlist_score: 0.2,
            viral_score: 0.2,
        }
    }
}

impl MomentumWeights {
    /// Builds weights from a named mapping. Missing keys keep their default.
    pub fn from_map(map: &HashMap<String, f64>) -> Result<Self, MomentumError> {
        let mut weights = Self::default();
        for (key, value) in map {
            let slot = match key.as_str() {
                STREAMING_GROWTH_KEY => &mut weights.streaming_growth,
                SOCIAL_GROWTH_KEY => &mut weights.social_growth,
                PLAYLIST_SCORE_KEY => &mut weights.playlist_score,
                VIRAL_SCORE_KEY => &mut weights.viral_score,
                other => {
                    return Err(MomentumError::InvalidInput(format!(
                        "Unknown weight '{}'",
                        other
                    )))
                }
            };
            *slot = *value;
        }
        weights.validate()?;
        Ok(weights)
    }

    /// Weights must be finite, non-negative and sum to 1.0.
    pub fn validate(&self) -> Result<(), MomentumError> {
        for (name, value) in self.entries() {
            if !value.is_finite() || value < 0.0 {
                return Err(MomentumError::InvalidInput(format!(
                    "Weight '{}' must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(MomentumError::InvalidInput(format!(
                "Weights must sum to 1.0, got {}",
                sum
            )));
        }
        Ok(())
    }

    pub fn sum(&self) -> f64 {
        self.entries().iter().map(|(_, v)| v).sum()
    }

    pub fn apply(&self, components: &MomentumComponents) -> f64 {
        self.streaming_growth * components.streaming_growth
            + self.social_growth * components.social_growth
            + self.playlist_score * components.playlist_score
            + self.viral_score * components.viral_score
    }

    fn entries(&self) -> [(&'static str, f64); 4] {
        [
            (STREAMING_GROWTH_KEY, self.streaming_growth),
            (SOCIAL_GROWTH_KEY, self.social_growth),
            (PLAYLIST_SCORE_KEY, self.playlist_score),
            (VIRAL_SCORE_KEY, self.viral_score),
        ]
    }
}

/// Post-processing applied to the raw weighted score.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScoringOptions {
    /// When set, presented scores never go below this value.
    /// The unclamped value stays available as the raw score.
    pub minimum_display_score: Option<f64>,
}

/// Output of [`CompositeScorer::score`].
#[derive(Clone, Debug, PartialEq)]
pub struct ScoreBreakdown {
    pub momentum_score: f64,
    pub raw_momentum_score: f64,
    pub components: MomentumComponents,
    pub insights: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct CompositeScorer {
    weights: MomentumWeights,
    options: ScoringOptions,
}

impl Default for CompositeScorer {
    fn default() -> Self {
        Self {
            weights: MomentumWeights::default(),
            options: ScoringOptions::default(),
        }
    }
}

impl CompositeScorer {
    pub fn new(weights: MomentumWeights, options: ScoringOptions) -> Result<Self, MomentumError> {
        weights.validate()?;
        if let Some(floor) = options.minimum_display_score {
            if !floor.is_finite() {
                return Err(MomentumError::InvalidInput(
                    "minimum_display_score must be a finite number".to_string(),
                ));
            }
        }
        Ok(Self { weights, options })
    }

    pub fn weights(&self) -> &MomentumWeights {
        &self.weights
    }

    pub fn options(&self) -> &ScoringOptions {
        &self.options
    }

    pub fn score(
        &self,
        streaming_history: &[StreamingRecord],
        engagement_history: &[EngagementRecord],
        playlists: &[PlaylistPlacement],
        viral_content: &[ViralContentItem],
        window_days: usize,
    ) -> ScoreBreakdown {
        let components = MomentumComponents {
            streaming_growth: compute_growth(streaming_history, window_days),
            social_growth: compute_growth(engagement_history, window_days),
            playlist_score: playlist_score(playlists.len()),
            viral_score: viral_score(viral_content),
        };

        let raw_momentum_score = self.weights.apply(&components);
        let momentum_score = match self.options.minimum_display_score {
            Some(floor) => raw_momentum_score.max(floor),
            None => raw_momentum_score,
        };

        ScoreBreakdown {
            momentum_score,
            raw_momentum_score,
            components,
            insights: generate_insights(&components, playlists.len()),
        }
    }
}

/// min(1, placements / 10)
pub fn playlist_score(placement_count: usize) -> f64 {
    (placement_count as f64 / PLACEMENT_SATURATION).min(1.0)
}

/// 0.7 * min(1, likes / 1M) + 0.3 * min(1, shares / 500k), over all items.
pub fn viral_score(viral_content: &[ViralContentItem]) -> f64 {
    if viral_content.is_empty() {
        return 0.0;
    }
    let total_likes = viral_content
        .iter()
        .fold(0u64, |total, c| total.saturating_add(c.likes));
    let total_shares = viral_content
        .iter()
        .fold(0u64, |total, c| total.saturating_add(c.shares));

    let likes_score = (total_likes as f64 / VIRAL_LIKES_SATURATION).min(1.0);
    let shares_score = (total_shares as f64 / VIRAL_SHARES_SATURATION).min(1.0);

    VIRAL_LIKES_WEIGHT * likes_score + VIRAL_SHARES_WEIGHT * shares_score
}

/// Evaluates the insight rules in order. Never returns an empty list.
pub fn generate_insights(components: &MomentumComponents, placement_count: usize) -> Vec<String> {
    let mut insights = Vec::new();

    if components.streaming_growth > STREAMING_INSIGHT_THRESHOLD {
        insights.push(format!(
            "{}% streaming growth",
            truncated_percent(components.streaming_growth)
        ));
    }
    if components.social_growth > SOCIAL_INSIGHT_THRESHOLD {
        insights.push(format!(
            "{}% increase in social engagement",
            truncated_percent(components.social_growth)
        ));
    }
    if components.playlist_score > PLAYLIST_INSIGHT_THRESHOLD {
        insights.push(format!("Added to {} playlists", placement_count));
    }
    if components.viral_score > VIRAL_INSIGHT_THRESHOLD {
        insights.push("Viral content with high engagement".to_string());
    }

    if insights.is_empty() {
        insights.push(DEFAULT_INSIGHT.to_string());
    }
    insights
}

fn truncated_percent(rate: f64) -> i64 {
    (rate * 100.0).trunc() as i64
}

/// Sorts results by presented momentum score, highest first.
pub fn rank_results<R: AsRef<MomentumResult>>(results: &mut [R]) {
    results.sort_by(|a, b| {
        b.as_ref()
            .momentum_score
            .total_cmp(&a.as_ref().momentum_score)
    });
}
