//! Filter construction for Qdrant searches.
//!
//! Qdrant has no namespaces; points carry a `namespace` payload field instead and
//! every search is scoped with an exact keyword match on it.

use qdrant_client::qdrant::{
    Condition, FieldCondition, Filter, Match, condition::ConditionOneOf, r#match::MatchValue,
};
use tracing::debug;

use crate::mappers::NAMESPACE_KEY;

/// Builds a filter that requires `namespace == ns`.
pub fn namespace_filter(ns: &str) -> Filter {
    debug!(namespace = ns, "filters::namespace_filter");

    Filter {
        must: vec![keyword_eq(NAMESPACE_KEY, ns)],
        ..Default::default()
    }
}

fn keyword_eq(field: &str, value: &str) -> Condition {
    Condition {
        condition_one_of: Some(ConditionOneOf::Field(FieldCondition {
            key: field.to_string(),
            r#match: Some(Match {
                match_value: Some(MatchValue::Keyword(value.to_string())),
            }),
            ..Default::default()
        })),
    }
}
