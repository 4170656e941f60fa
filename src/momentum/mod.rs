//! Artist momentum: data model, scoring and the fetch/synthesize pipeline.

pub mod error;
pub mod growth;
pub mod models;
pub mod pipeline;
pub mod scorer;
pub mod synthesizer;

pub use error::{validate_window_days, MomentumError, MAX_WINDOW_DAYS};
pub use models::{ArtistProfile, ArtistSnapshot, MomentumComponents, MomentumResult};
pub use pipeline::MomentumPipeline;
pub use scorer::{rank_results, CompositeScorer, MomentumWeights, ScoringOptions};
pub use synthesizer::{Synthesizer, DEFAULT_SYNTHESIZER_SEED};
