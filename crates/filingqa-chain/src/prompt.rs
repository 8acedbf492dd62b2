//! Prompt layout for answering from retrieved chunks, and parsing of the
//! model's `SOURCES:` trailer.

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

use filingqa_core::types::{ChunkId, TextChunk};

const INSTRUCTIONS: &str = "Given the following extracted parts of one or more 10-K filings and a question, \
write a final answer with references (\"SOURCES\").\n\
If the extracted parts do not contain the answer, say that you don't know. Don't try to make up an answer.\n\
ALWAYS end your answer with a line of the form \"SOURCES: <source>, <source>\" listing the Source values you used.";

/// Render every chunk as `Content:`/`Source:` pairs under the question.
pub fn build_prompt(question: &str, chunks: &[TextChunk]) -> String {
    let summaries = chunks
        .iter()
        .map(|c| format!("Content: {}\nSource: {}", c.text.trim(), c.id))
        .collect::<Vec<_>>()
        .join("\n\n");
    format!("{INSTRUCTIONS}\n\nQUESTION: {}\n=========\n{summaries}\n=========\nFINAL ANSWER:", question.trim())
}

fn marker() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bSOURCES?\s*:").ok()).as_ref()
}

fn is_separator(c: char) -> bool { c == ',' || c == ';' || c.is_whitespace() }

/// Split a completion into answer text and the ids it cites, in citation
/// order without duplicates. Without a marker the whole completion is the
/// answer and nothing is cited.
pub fn parse_completion(completion: &str) -> (String, Vec<ChunkId>) {
    let Some(m) = marker().and_then(|re| re.find(completion)) else {
        return (completion.trim().to_string(), Vec::new());
    };
    let text = completion[..m.start()].trim().to_string();
    let mut seen = HashSet::new();
    let sources = completion[m.end()..]
        .split(is_separator)
        .map(|s| s.trim_matches(|c: char| matches!(c, '"' | '\'' | '`' | '[' | ']' | '(' | ')' | '.' | '-' | '*')))
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.to_string()))
        .map(str::to_string)
        .collect();
    (text, sources)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_lists_chunks_with_sources() {
        let chunks = vec![TextChunk::new("c1", "Acme Corp is headquartered in Springfield.", 0.9), TextChunk::new("c2", " Other. ", 0.5)];
        let p = build_prompt(" Where is Acme headquartered? ", &chunks);
        assert!(p.contains("QUESTION: Where is Acme headquartered?\n"));
        assert!(p.contains("Content: Acme Corp is headquartered in Springfield.\nSource: c1\n\nContent: Other.\nSource: c2"));
        assert!(p.ends_with("FINAL ANSWER:"));
        assert!(p.contains("SOURCES"));
    }

    #[test]
    fn prompt_with_no_chunks_has_empty_context() {
        let p = build_prompt("q", &[]);
        assert!(p.contains("=========\n\n========="));
    }

    #[test]
    fn parses_sources_trailer() {
        let (text, sources) = parse_completion("Acme is in Springfield.\nSOURCES: c1, c2, c1");
        assert_eq!(text, "Acme is in Springfield.");
        assert_eq!(sources, vec!["c1", "c2"]);
    }

    #[test]
    fn marker_is_case_insensitive_and_singular_allowed() {
        assert_eq!(parse_completion("A. Source: [c3].").1, vec!["c3"]);
        assert_eq!(parse_completion("A.\nsources:\n- \"c4\"; c5").1, vec!["c4", "c5"]);
    }

    #[test]
    fn no_marker_means_no_sources() {
        let (text, sources) = parse_completion("  I don't know.  ");
        assert_eq!(text, "I don't know.");
        assert!(sources.is_empty());
    }
}
