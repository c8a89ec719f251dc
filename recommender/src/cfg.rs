//! Pipeline configuration, resolved once at startup.
//!
//! - `RAG_TOP_K`          = neighbors to retrieve (default 3, must be > 0)
//! - `SYSTEM_PROMPT_PATH` = optional file overriding the built-in instruction

use std::path::Path;

use crate::error::RecommendError;
use crate::prompt::DEFAULT_SYSTEM;

pub const DEFAULT_TOP_K: u64 = 3;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecommenderConfig {
    pub top_k: u64,
    pub system_instruction: String,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            system_instruction: DEFAULT_SYSTEM.to_string(),
        }
    }
}

impl RecommenderConfig {
    pub fn from_env() -> Result<Self, RecommendError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// # Errors
    /// `Configuration` when `RAG_TOP_K` is not a positive integer or the
    /// prompt file cannot be read / is blank.
    pub fn from_lookup<L>(lookup: L) -> Result<Self, RecommendError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let top_k = match get("RAG_TOP_K") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(k) if k > 0 => k,
                _ => {
                    return Err(RecommendError::Configuration(format!(
                        "RAG_TOP_K must be a positive integer, got `{raw}`"
                    )));
                }
            },
            None => DEFAULT_TOP_K,
        };

        let system_instruction = match get("SYSTEM_PROMPT_PATH") {
            Some(path) => read_instruction(Path::new(&path))?,
            None => DEFAULT_SYSTEM.to_string(),
        };

        Ok(Self {
            top_k,
            system_instruction,
        })
    }
}

fn read_instruction(path: &Path) -> Result<String, RecommendError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        RecommendError::Configuration(format!("SYSTEM_PROMPT_PATH {}: {e}", path.display()))
    })?;
    if text.trim().is_empty() {
        return Err(RecommendError::Configuration(format!(
            "SYSTEM_PROMPT_PATH {} is empty",
            path.display()
        )));
    }
    Ok(text.trim().to_string())
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
    fn defaults() {
        let cfg = RecommenderConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(cfg, RecommenderConfig::default());
        assert_eq!(cfg.top_k, 3);
    }

    #[test]
    fn top_k_must_be_positive() {
        for bad in ["0", "-1", "three"] {
            let err = RecommenderConfig::from_lookup(lookup_from(&[("RAG_TOP_K", bad)])).unwrap_err();
            assert!(matches!(err, RecommendError::Configuration(_)));
        }
        let cfg = RecommenderConfig::from_lookup(lookup_from(&[("RAG_TOP_K", "5")])).unwrap();
        assert_eq!(cfg.top_k, 5);
    }

    #[test]
    fn prompt_file_override() {
        let path = std::env::temp_dir().join(format!("prompt-{}.txt", std::process::id()));
        std::fs::write(&path, "  Only recommend physics professors.\n").unwrap();

        let cfg = RecommenderConfig::from_lookup(lookup_from(&[(
            "SYSTEM_PROMPT_PATH",
            path.to_str().unwrap(),
        )]))
        .unwrap();
        assert_eq!(cfg.system_instruction, "Only recommend physics professors.");

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn missing_prompt_file_is_a_config_error() {
        let err = RecommenderConfig::from_lookup(lookup_from(&[(
            "SYSTEM_PROMPT_PATH",
            "/definitely/not/here.txt",
        )]))
        .unwrap_err();
        assert!(matches!(err, RecommendError::Configuration(_)));
    }
}
