//! Read-only access to the professor-review vector index.
//!
//! The index is built elsewhere; this crate only queries it:
//! - Nearest-neighbor search scoped to a namespace, metadata included
//! - Payload → [`NeighborRecord`] mapping that tolerates missing fields
//! - A readiness probe for `/health`
//!
//! Two backends are supported behind one facade: Pinecone (REST) and Qdrant (`qdrant-client`).

mod config;
mod errors;
mod filters;
mod mappers;
mod pinecone;
mod qdrant_facade;
mod record;

pub use config::{IndexConfig, VectorDbKind};
pub use errors::IndexError;
pub use record::{IndexHealth, NeighborRecord, ReviewMetadata};

use tracing::{info, trace};

enum Backend {
    Pinecone(pinecone::PineconeClient),
    Qdrant(qdrant_facade::QdrantFacade),
}

/// High-level facade over the configured vector database.
///
/// Construct once at startup and share behind an `Arc`.
pub struct ReviewIndex {
    cfg: IndexConfig,
    backend: Backend,
}

impl ReviewIndex {
    /// Constructs the backend client selected by `cfg.kind`.
    ///
    /// # Errors
    /// `IndexError::Config` for invalid settings, `IndexError::Qdrant`/`Transport`
    /// if the client cannot be built.
    pub fn new(cfg: IndexConfig) -> Result<Self, IndexError> {
        cfg.validate()?;
        let backend = match cfg.kind {
            VectorDbKind::Pinecone => Backend::Pinecone(pinecone::PineconeClient::new(&cfg)?),
            VectorDbKind::Qdrant => Backend::Qdrant(qdrant_facade::QdrantFacade::new(&cfg)?),
        };
        info!(kind = ?cfg.kind, index = %cfg.index, namespace = %cfg.namespace, "ReviewIndex ready");
        Ok(Self { cfg, backend })
    }

    /// Returns up to `top_k` neighbors of `vector` in backend order.
    ///
    /// # Errors
    /// Transport, HTTP status, decode or Qdrant failures.
    pub async fn query(&self, vector: &[f32], top_k: u64) -> Result<Vec<NeighborRecord>, IndexError> {
        trace!("ReviewIndex::query top_k={top_k}");
        match &self.backend {
            Backend::Pinecone(c) => c.query(vector, top_k).await,
            Backend::Qdrant(c) => c.search(vector, top_k).await,
        }
    }

    /// Probes the backend; failures are reported in the result, never returned.
    pub async fn health(&self) -> IndexHealth {
        match &self.backend {
            Backend::Pinecone(c) => c.health().await,
            Backend::Qdrant(c) => c.health().await,
        }
    }

    pub fn config(&self) -> &IndexConfig {
        &self.cfg
    }
}
