//! Mappers turning provider payloads into canonical [`NeighborRecord`]s.
//!
//! Both backends hand back free-form JSON metadata; this is the only place that
//! knows which keys carry the review text, subject and rating.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::record::{NeighborRecord, ReviewMetadata};

/// Payload key holding the professor name for backends with non-text point ids.
pub(crate) const PROFESSOR_KEY: &str = "professor";
/// Payload key used to scope Qdrant points to a namespace.
pub(crate) const NAMESPACE_KEY: &str = "namespace";

const REVIEW_KEY: &str = "review";
const SUBJECT_KEY: &str = "subject";
const STARS_KEY: &str = "stars";

/// Builds a record from an id, a score and an optional metadata object.
///
/// Missing `review`/`subject` become empty strings; a missing or non-numeric
/// `stars` becomes `None`.
pub(crate) fn to_neighbor(id: String, score: f32, metadata: Option<Value>) -> NeighborRecord {
    let obj = match metadata {
        Some(Value::Object(m)) => m,
        _ => Map::new(),
    };
    NeighborRecord {
        id,
        score,
        metadata: to_metadata(obj),
    }
}

/// Qdrant variant: the professor name comes from the payload, falling back to the point id.
pub(crate) fn to_neighbor_from_payload(
    point_id: Option<String>,
    score: f32,
    payload: Value,
) -> NeighborRecord {
    let id = payload
        .get(PROFESSOR_KEY)
        .and_then(Value::as_str)
        .map(str::to_string)
        .or(point_id)
        .unwrap_or_default();
    to_neighbor(id, score, Some(payload))
}

fn to_metadata(mut obj: Map<String, Value>) -> ReviewMetadata {
    let review = take_text(&mut obj, REVIEW_KEY);
    let subject = take_text(&mut obj, SUBJECT_KEY);
    let stars = obj.remove(STARS_KEY).and_then(|v| as_rating(&v));

    obj.remove(PROFESSOR_KEY);
    obj.remove(NAMESPACE_KEY);

    ReviewMetadata {
        review,
        subject,
        stars,
        extra: obj.into_iter().collect::<BTreeMap<_, _>>(),
    }
}

fn take_text(obj: &mut Map<String, Value>, key: &str) -> String {
    match obj.remove(key) {
        Some(Value::String(s)) => s,
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Numbers pass through; numeric strings (e.g. `"4.5"`) are parsed.
fn as_rating(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}
