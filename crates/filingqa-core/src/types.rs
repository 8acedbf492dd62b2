//! Domain types shared by the retriever, the answer chain and the CLI.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type ChunkId = String;
pub type Meta = BTreeMap<String, serde_json::Value>;

/// A stored chunk of a 10-K filing as returned by a similarity search.
///
/// - `id`: chunk identifier (the `chunkId` node property, or the element id)
/// - `text`: the raw text payload
/// - `score`: similarity to the query; higher is better
/// - `metadata`: every other node property except text and embedding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextChunk {
    pub id: ChunkId,
    pub text: String,
    pub score: f32,
    #[serde(default)]
    pub metadata: Meta,
}

impl TextChunk {
    pub fn new(id: impl Into<ChunkId>, text: impl Into<String>, score: f32) -> Self {
        Self { id: id.into(), text: text.into(), score, metadata: Meta::new() }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// The filing this chunk came from, when the graph records it.
    pub fn document_id(&self) -> Option<&str> {
        ["formId", "source"].iter().find_map(|k| self.metadata.get(*k).and_then(|v| v.as_str()))
    }

    /// Position of the chunk inside its filing section.
    pub fn position(&self) -> Option<u64> { self.metadata.get("chunkSeqId").and_then(serde_json::Value::as_u64) }
}

/// Chunks ranked by similarity, never longer than the `top_k` they were
/// retrieved with.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RetrievalResult {
    chunks: Vec<TextChunk>,
    top_k: usize,
}

impl RetrievalResult {
    /// Sorts by descending score and truncates to `top_k`.
    pub fn new(mut chunks: Vec<TextChunk>, top_k: usize) -> Self {
        chunks.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        chunks.truncate(top_k);
        Self { chunks, top_k }
    }

    pub fn chunks(&self) -> &[TextChunk] { &self.chunks }

    pub fn top_k(&self) -> usize { self.top_k }

    pub fn len(&self) -> usize { self.chunks.len() }

    pub fn is_empty(&self) -> bool { self.chunks.is_empty() }

    pub fn ids(&self) -> impl Iterator<Item = &str> { self.chunks.iter().map(|c| c.id.as_str()) }

    pub fn contains_id(&self, id: &str) -> bool { self.ids().any(|c| c == id) }
}

/// Generated answer plus the chunks it cites.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<ChunkId>,
}

impl Answer {
    pub fn new(text: impl Into<String>, sources: Vec<ChunkId>) -> Self { Self { text: text.into(), sources } }

    pub fn has_sources(&self) -> bool { !self.sources.is_empty() }
}

/// True when a question carries no content and must not be sent anywhere.
pub fn is_blank_question(question: &str) -> bool { question.trim().is_empty() }
