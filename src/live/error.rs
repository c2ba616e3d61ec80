//! Live presentation error types.

use thiserror::Error;

/// Errors reported by a live presenter.
#[derive(Debug, Error)]
pub enum LiveError {
    /// The presenter is switched off.
    #[error("Live presentation is not enabled")]
    NotEnabled,

    /// The presenter rejected a start, update or end request.
    #[error("Live presentation request failed: {0}")]
    RequestFailed(String),
}

impl LiveError {
    /// Returns true if enabling the presenter would resolve this error.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        matches!(self, Self::NotEnabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            LiveError::NotEnabled.to_string(),
            "Live presentation is not enabled"
        );
        assert_eq!(
            LiveError::RequestFailed("boom".to_string()).to_string(),
            "Live presentation request failed: boom"
        );
    }

    #[test]
    fn test_is_disabled() {
        assert!(LiveError::NotEnabled.is_disabled());
        assert!(!LiveError::RequestFailed(String::new()).is_disabled());
    }
}
