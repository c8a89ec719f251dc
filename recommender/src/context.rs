//! Renders retrieved records into the grounding block handed to the model.

use std::fmt;

use review_index::NeighborRecord;

pub const CONTEXT_HEADER: &str = "Returned results from vector db (done automatically):";
pub const NO_MATCHES: &str = "No matching professors were found in the review database.";

/// Formatted grounding text; never empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContextBlock(String);

impl ContextBlock {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContextBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lays out records in the order received:
///
/// ```text
/// 1. Professor: Dr. Emily Johnson
///    Review: Clear lectures and fair exams.
///    Subject: Computer Science
///    Stars: 5
/// ```
pub fn assemble(records: &[NeighborRecord]) -> ContextBlock {
    let mut out = String::from(CONTEXT_HEADER);
    out.push('\n');

    if records.is_empty() {
        out.push('\n');
        out.push_str(NO_MATCHES);
        return ContextBlock(out);
    }

    for (i, r) in records.iter().enumerate() {
        let m = &r.metadata;
        out.push_str(&format!(
            "\n{}. Professor: {}\n   Review: {}\n   Subject: {}\n   Stars: {}\n",
            i + 1,
            r.id,
            m.review.trim(),
            m.subject.trim(),
            stars(m.stars)
        ));
    }
    ContextBlock(out)
}

fn stars(v: Option<f64>) -> String {
    match v {
        Some(s) if s.is_finite() && s.fract() == 0.0 => format!("{s:.0}"),
        Some(s) if s.is_finite() => s.to_string(),
        _ => "n/a".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use review_index::ReviewMetadata;

    use super::*;

    fn rec(id: &str, score: f32, stars: Option<f64>) -> NeighborRecord {
        NeighborRecord {
            id: id.into(),
            score,
            metadata: ReviewMetadata {
                review: format!("review of {id}"),
                subject: "Physics".into(),
                stars,
                ..Default::default()
            },
        }
    }

    #[test]
    fn empty_set_says_so() {
        let block = assemble(&[]);
        assert!(block.as_str().starts_with(CONTEXT_HEADER));
        assert!(block.as_str().contains(NO_MATCHES));
    }

    #[test]
    fn keeps_received_order() {
        let block = assemble(&[
            rec("A", 0.9, Some(5.0)),
            rec("B", 0.8, Some(4.5)),
            rec("C", 0.7, None),
        ]);
        let s = block.as_str();
        let (a, b, c) = (
            s.find("Professor: A").unwrap(),
            s.find("Professor: B").unwrap(),
            s.find("Professor: C").unwrap(),
        );
        assert!(a < b && b < c);
        assert!(s.contains("1. Professor: A"));
        assert!(s.contains("3. Professor: C"));
        assert!(!s.contains(NO_MATCHES));
    }

    #[test]
    fn star_rendering() {
        assert_eq!(stars(Some(5.0)), "5");
        assert_eq!(stars(Some(3.5)), "3.5");
        assert_eq!(stars(None), "n/a");
        assert_eq!(stars(Some(f64::NAN)), "n/a");
    }
}
