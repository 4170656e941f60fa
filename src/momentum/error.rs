//! Errors produced while computing momentum.

use thiserror::Error;

/// Errors that can occur while resolving a momentum result.
///
/// Only `NotFound` and `InvalidInput` are meant to reach callers of the
/// cache. The other variants are degraded to a (possibly synthetic) result
/// before they leave the cache layer.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MomentumError {
    #[error("Artist not found: {0}")]
    NotFound(String),

    #[error("Upstream catalog unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Cache entry corrupted: {0}")]
    CacheCorruption(String),
}

impl MomentumError {
    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            MomentumError::NotFound(_) => "not_found",
            MomentumError::UpstreamUnavailable(_) => "upstream_unavailable",
            MomentumError::InvalidInput(_) => "invalid_input",
            MomentumError::CacheCorruption(_) => "cache_corruption",
        }
    }
}

/// Longest growth window accepted, in days.
pub const MAX_WINDOW_DAYS: usize = 365;

/// Rejects window sizes outside `1..=MAX_WINDOW_DAYS` before any
/// computation happens.
pub fn validate_window_days(window_days: usize) -> Result<(), MomentumError> {
    if window_days == 0 {
        return Err(MomentumError::InvalidInput(
            "window_days must be a positive number of days".to_string(),
        ));
    }
    if window_days > MAX_WINDOW_DAYS {
        return Err(MomentumError::InvalidInput(format!(
            "window_days must be at most {}, got {}",
            MAX_WINDOW_DAYS, window_days
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_window_is_rejected() {
        assert!(matches!(
            validate_window_days(0),
            Err(MomentumError::InvalidInput(_))
        ));
        assert!(validate_window_days(7).is_ok());
    }

    #[test]
    fn test_oversized_window_is_rejected() {
        assert!(validate_window_days(MAX_WINDOW_DAYS).is_ok());
        for window_days in [MAX_WINDOW_DAYS + 1, 60_000_000, usize::MAX] {
            assert!(matches!(
                validate_window_days(window_days),
                Err(MomentumError::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn test_error_kind_labels() {
        assert_eq!(MomentumError::NotFound("x".into()).kind(), "not_found");
        assert_eq!(
            MomentumError::UpstreamUnavailable("x".into()).kind(),
            "upstream_unavailable"
        );
        assert_eq!(
            MomentumError::CacheCorruption("x".into()).to_string(),
            "Cache entry corrupted: x"
        );
    }
}
