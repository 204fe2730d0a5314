//! Error types for the catalog-rank crate.
//!
//! Ranking, deduplication and cache lookups never fail: sparse or malformed
//! records degrade to default scores. These variants describe collaborator
//! and configuration failures, most of which are absorbed at the boundary
//! where they occur.

/// Errors produced by collaborators or configuration checks.
#[derive(Debug, thiserror::Error)]
pub enum RankError {
    /// The search-history lookup is missing or failed to answer.
    #[error("collaborator unavailable: {0}")]
    CollaboratorUnavailable(String),

    /// A persisted cache snapshot could not be decoded.
    #[error("cache corrupted: {0}")]
    CacheCorrupted(String),

    /// The key-value store backing the cache rejected a read or write.
    #[error("storage error: {0}")]
    Storage(String),

    /// Invalid ranking or cache configuration.
    #[error("config error: {0}")]
    Config(String),
}

/// Convenience type alias for catalog-rank results.
pub type Result<T> = std::result::Result<T, RankError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_collaborator_unavailable() {
        let err = RankError::CollaboratorUnavailable("history offline".into());
        assert_eq!(err.to_string(), "collaborator unavailable: history offline");
    }

    #[test]
    fn display_cache_corrupted() {
        let err = RankError::CacheCorrupted("expected value at line 1".into());
        assert_eq!(err.to_string(), "cache corrupted: expected value at line 1");
    }

    #[test]
    fn display_storage() {
        let err = RankError::Storage("quota exceeded".into());
        assert_eq!(err.to_string(), "storage error: quota exceeded");
    }

    #[test]
    fn display_config() {
        let err = RankError::Config("max_entries must be greater than 0".into());
        assert_eq!(
            err.to_string(),
            "config error: max_entries must be greater than 0"
        );
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RankError>();
    }
}
