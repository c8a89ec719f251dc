//! Runtime configuration for the review index.
//!
//! Environment variables:
//! - `VECTOR_DB_KIND`          = `pinecone` (default) or `qdrant`
//! - `PINECONE_API_KEY`        = required for Pinecone
//! - `PINECONE_INDEX_HOST`     = optional data-plane host; resolved via the control plane when absent
//! - `PINECONE_CONTROLLER_URL` = control plane (default `https://api.pinecone.io`)
//! - `QDRANT_URL`              = Qdrant gRPC endpoint (default `http://localhost:6334`)
//! - `QDRANT_API_KEY`          = optional, for Qdrant Cloud
//! - `VECTOR_INDEX`            = index / collection name (default `rag`)
//! - `VECTOR_NAMESPACE`        = namespace inside the index (default `ns1`)
//! - `VECTOR_DB_TIMEOUT_SECS`  = per-request timeout (default 30)

use std::fmt;
use std::str::FromStr;

use crate::errors::IndexError;

pub const DEFAULT_PINECONE_CONTROLLER_URL: &str = "https://api.pinecone.io";
pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6334";
pub const DEFAULT_INDEX: &str = "rag";
pub const DEFAULT_NAMESPACE: &str = "ns1";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Which vector database serves the index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VectorDbKind {
    Pinecone,
    Qdrant,
}

impl FromStr for VectorDbKind {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pinecone" => Ok(Self::Pinecone),
            "qdrant" => Ok(Self::Qdrant),
            other => Err(IndexError::Config(format!(
                "unsupported VECTOR_DB_KIND `{other}` (expected pinecone|qdrant)"
            ))),
        }
    }
}

/// Connection and scoping settings for similarity search.
#[derive(Clone, PartialEq)]
pub struct IndexConfig {
    pub kind: VectorDbKind,
    pub pinecone_api_key: Option<String>,
    /// Data-plane host, e.g. `rag-abc123.svc.us-east-1.pinecone.io`.
    pub pinecone_index_host: Option<String>,
    pub pinecone_controller_url: String,
    pub qdrant_url: String,
    pub qdrant_api_key: Option<String>,
    /// Index name (Pinecone) or collection name (Qdrant).
    pub index: String,
    pub namespace: String,
    pub timeout_secs: u64,
}

impl fmt::Debug for IndexConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexConfig")
            .field("kind", &self.kind)
            .field("pinecone_api_key", &self.pinecone_api_key.as_ref().map(|_| "***"))
            .field("pinecone_index_host", &self.pinecone_index_host)
            .field("pinecone_controller_url", &self.pinecone_controller_url)
            .field("qdrant_url", &self.qdrant_url)
            .field("qdrant_api_key", &self.qdrant_api_key.as_ref().map(|_| "***"))
            .field("index", &self.index)
            .field("namespace", &self.namespace)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl IndexConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, IndexError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Builds the configuration from an arbitrary key lookup and validates it.
    ///
    /// # Errors
    /// `IndexError::Config` for an unknown backend, a missing Pinecone key,
    /// an unparsable timeout or an empty index/namespace.
    pub fn from_lookup<L>(lookup: L) -> Result<Self, IndexError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let kind = match get("VECTOR_DB_KIND") {
            Some(v) => v.parse()?,
            None => VectorDbKind::Pinecone,
        };

        let timeout_secs = match get("VECTOR_DB_TIMEOUT_SECS") {
            Some(v) => v.parse::<u64>().map_err(|_| {
                IndexError::Config(format!("VECTOR_DB_TIMEOUT_SECS: expected u64, got `{v}`"))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let cfg = Self {
            kind,
            pinecone_api_key: get("PINECONE_API_KEY"),
            pinecone_index_host: get("PINECONE_INDEX_HOST"),
            pinecone_controller_url: get("PINECONE_CONTROLLER_URL")
                .unwrap_or_else(|| DEFAULT_PINECONE_CONTROLLER_URL.to_string()),
            qdrant_url: get("QDRANT_URL").unwrap_or_else(|| DEFAULT_QDRANT_URL.to_string()),
            qdrant_api_key: get("QDRANT_API_KEY"),
            index: get("VECTOR_INDEX").unwrap_or_else(|| DEFAULT_INDEX.to_string()),
            namespace: get("VECTOR_NAMESPACE").unwrap_or_else(|| DEFAULT_NAMESPACE.to_string()),
            timeout_secs,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validates config values.
    pub fn validate(&self) -> Result<(), IndexError> {
        if self.index.trim().is_empty() {
            return Err(IndexError::Config("index name is empty".into()));
        }
        if self.namespace.trim().is_empty() {
            return Err(IndexError::Config("namespace is empty".into()));
        }
        if self.timeout_secs == 0 {
            return Err(IndexError::Config("VECTOR_DB_TIMEOUT_SECS must be > 0".into()));
        }
        match self.kind {
            VectorDbKind::Pinecone if self.pinecone_api_key.is_none() => Err(IndexError::Config(
                "PINECONE_API_KEY is required for the pinecone backend".into(),
            )),
            VectorDbKind::Qdrant if self.qdrant_url.trim().is_empty() => {
                Err(IndexError::Config("qdrant_url is empty".into()))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn pinecone_defaults() {
        let cfg = IndexConfig::from_lookup(lookup_from(&[("PINECONE_API_KEY", "pk")])).unwrap();
        assert_eq!(cfg.kind, VectorDbKind::Pinecone);
        assert_eq!(cfg.index, "rag");
        assert_eq!(cfg.namespace, "ns1");
        assert_eq!(cfg.timeout_secs, 30);
        assert_eq!(cfg.pinecone_controller_url, DEFAULT_PINECONE_CONTROLLER_URL);
        assert!(cfg.pinecone_index_host.is_none());
    }

    #[test]
    fn pinecone_without_key_is_rejected() {
        let err = IndexConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, IndexError::Config(m) if m.contains("PINECONE_API_KEY")));
    }

    #[test]
    fn qdrant_needs_no_key() {
        let cfg = IndexConfig::from_lookup(lookup_from(&[
            ("VECTOR_DB_KIND", "Qdrant"),
            ("VECTOR_NAMESPACE", "reviews"),
        ]))
        .unwrap();
        assert_eq!(cfg.kind, VectorDbKind::Qdrant);
        assert_eq!(cfg.qdrant_url, DEFAULT_QDRANT_URL);
        assert_eq!(cfg.namespace, "reviews");
    }

    #[test]
    fn bad_kind_and_timeout() {
        assert!(IndexConfig::from_lookup(lookup_from(&[("VECTOR_DB_KIND", "faiss")])).is_err());
        assert!(
            IndexConfig::from_lookup(lookup_from(&[
                ("PINECONE_API_KEY", "pk"),
                ("VECTOR_DB_TIMEOUT_SECS", "soon"),
            ]))
            .is_err()
        );
    }

    #[test]
    fn debug_redacts_keys() {
        let cfg = IndexConfig::from_lookup(lookup_from(&[("PINECONE_API_KEY", "secret")])).unwrap();
        let dbg = format!("{cfg:?}");
        assert!(!dbg.contains("secret"));
    }
}
