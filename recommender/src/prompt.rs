//! Prompt builder: system instruction + framed context + the student's query.

use std::fmt;

use crate::context::ContextBlock;

/// Default instruction for the professor-recommendation assistant.
pub const DEFAULT_SYSTEM: &str = r#"You are the assistant behind a "Rate My Professor" search tool. Students describe what they want from a professor or a course, and you recommend the three professors from the retrieved reviews who fit those needs best.

For each request:

1. Work out what the student is asking for: teaching style, grading, workload, subject, availability, or anything else they mention.
2. Compare the retrieved professor reviews against those needs.
3. Recommend up to three professors, best match first, with a short explanation of why each one fits.
4. Add advice on course selection or professor compatibility when it helps.

Guidelines:

- Base every recommendation on the retrieved data, not on assumptions or personal bias.
- If the request is too vague to answer well, say what extra detail would help.
- If there are not enough suitable matches, say so honestly and suggest alternatives or compromises.
- Do not reveal personal information about professors beyond what the reviews contain.
- Be ready to explain why a professor was or was not recommended."#;

const FRAMING: &str = "The following professor records were retrieved automatically from the review database. \
Use them as supporting evidence for your answer; they are not part of the student's request.";

/// Final text sent to the generation model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerationRequest(String);

impl GenerationRequest {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GenerationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Composes the request in a fixed order; no truncation is applied.
pub fn build(system: &str, context: &ContextBlock, query: &str) -> GenerationRequest {
    GenerationRequest(format!(
        "{}\n\n{FRAMING}\n\n{}\n\nStudent query:\n{}",
        system.trim(),
        context.as_str().trim_end(),
        query.trim()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{NO_MATCHES, assemble};

    #[test]
    fn order_is_system_context_query() {
        let ctx = assemble(&[]);
        let req = build("SYSTEM RULES", &ctx, "lenient grader please");
        let s = req.as_str();

        assert!(s.starts_with("SYSTEM RULES"));
        let framing = s.find(FRAMING).unwrap();
        let no_match = s.find(NO_MATCHES).unwrap();
        let query = s.find("lenient grader please").unwrap();
        assert!(framing < no_match && no_match < query);
        assert!(s.ends_with("lenient grader please"));
    }

    #[test]
    fn default_instruction_mentions_top_three() {
        assert!(DEFAULT_SYSTEM.contains("three professors"));
    }
}
