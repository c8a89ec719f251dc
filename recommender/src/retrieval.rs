//! Vector → ranked professor records.

use std::sync::Arc;

use review_index::NeighborRecord;
use tracing::{debug, warn};

use crate::error::RecommendError;
use crate::ports::SearchBackend;

pub(crate) const SEARCH_FAILED: &str = "vector index query failed";

pub struct SimilaritySearchClient {
    backend: Arc<dyn SearchBackend>,
}

impl SimilaritySearchClient {
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self { backend }
    }

    /// Returns at most `k` records, highest score first. Zero matches is `Ok(vec![])`.
    ///
    /// Ordering and the size cap are enforced here even if the backend ignores them.
    ///
    /// # Errors
    /// `InvalidInput` for `k == 0`; `Retrieval` with `SEARCH_FAILED` for any
    /// backend failure. The backend error itself is logged, not returned.
    pub async fn search(
        &self,
        vector: &[f32],
        k: u64,
    ) -> Result<Vec<NeighborRecord>, RecommendError> {
        if k == 0 {
            return Err(RecommendError::InvalidInput("top-k must be positive".into()));
        }

        let records = self
            .backend
            .query(vector, k)
            .await
            .map_err(|e| {
                warn!(error = %e, k, "vector index query failed");
                RecommendError::Retrieval(SEARCH_FAILED.into())
            })?;

        let returned = records.len();
        let ranked = rank(records, k);
        debug!(returned, kept = ranked.len(), k, "similarity search done");
        Ok(ranked)
    }
}

/// Stable descending sort by score, then truncation to `k`.
fn rank(mut records: Vec<NeighborRecord>, k: u64) -> Vec<NeighborRecord> {
    records.sort_by(|a, b| b.score.total_cmp(&a.score));
    records.truncate(usize::try_from(k).unwrap_or(usize::MAX));
    records
}
