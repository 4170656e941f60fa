//! Shared constants for end-to-end tests
//!
//! When fixture data changes (artist names, popularity, placements),
//! update only this file.

// ============================================================================
// Fixture Artists
// ============================================================================

/// Artist with 30 days of steadily increasing activity
pub const RISING_ARTIST: &str = "Test Artist";

/// Catalog id of `RISING_ARTIST`
pub const RISING_ARTIST_ID: &str = "artist1";

/// Artist whose activity declines day over day
pub const FADING_ARTIST: &str = "Fading Artist";

/// Catalog id of `FADING_ARTIST`
pub const FADING_ARTIST_ID: &str = "artist2";

/// Name the fixture catalog has never heard of
pub const UNKNOWN_ARTIST: &str = "Nobody Atall";

pub const RISING_ARTIST_POPULARITY: u8 = 70;
pub const RISING_ARTIST_PLAYLISTS: usize = 3;
pub const FIXTURE_HISTORY_DAYS: usize = 30;

/// 0.3: three placements out of a saturation of ten
pub const EXPECTED_PLAYLIST_SCORE: f64 = 0.3;

/// 0.7 * 500k/1M + 0.3 * 100k/500k
pub const EXPECTED_VIRAL_SCORE: f64 = 0.41;

// ============================================================================
// Pipeline Settings
// ============================================================================

pub const TEST_SEED: u64 = 42;
pub const TEST_WINDOW_DAYS: usize = 7;

// ============================================================================
// Timeouts
// ============================================================================

/// Request timeout for test HTTP client (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Maximum time to wait for server to become ready (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Interval between server readiness checks (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 10;

/// Maximum time `wait_until` polls a condition (milliseconds)
pub const CONDITION_TIMEOUT_MS: u64 = 5000;
