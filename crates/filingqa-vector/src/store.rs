use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use filingqa_core::config::{Neo4jSettings, RetrievalSettings};
use filingqa_core::traits::{Embedder, Retriever};
use filingqa_core::types::{Meta, RetrievalResult, TextChunk};
use filingqa_core::{Error, Result};

use crate::client::{Neo4jClient, QueryResult, Record};
use crate::cypher;

/// What the database reports about the vector index the store is bound to.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexInfo {
    pub name: String,
    pub label: String,
    pub property: String,
    pub dimensions: Option<usize>,
    pub similarity: Option<String>,
    pub node_count: u64,
}

/// Read-only handle on an existing Neo4j vector index.
pub struct Neo4jVectorStore {
    client: Neo4jClient,
    embedder: Arc<dyn Embedder>,
    settings: RetrievalSettings,
    query: String,
    info: IndexInfo,
}

impl std::fmt::Debug for Neo4jVectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Neo4jVectorStore")
            .field("endpoint", &self.client.commit_url())
            .field("embedder", &self.embedder.embedder_id())
            .field("info", &self.info)
            .finish()
    }
}

impl Neo4jVectorStore {
    /// Connect and bind to the configured index. Nothing is created: an
    /// unreachable database is a connection error, a missing or mismatched
    /// index is a configuration error.
    pub async fn initialize(neo4j: &Neo4jSettings, embedder: Arc<dyn Embedder>, settings: RetrievalSettings) -> Result<Self> {
        let start = Instant::now();
        let client = Neo4jClient::new(neo4j)?;
        client.run(cypher::PROBE, json!({})).await.map_err(|e| e.into_connection_error())?;
        debug!(endpoint = client.commit_url(), "neo4j reachable");

        let info = inspect_index(&client, &settings).await?;
        if let Some(dims) = info.dimensions {
            if dims != embedder.dim() {
                return Err(Error::configuration(format!(
                    "index '{}' stores {dims}-dimensional vectors but embedder {} produces {}",
                    info.name,
                    embedder.embedder_id(),
                    embedder.dim()
                )));
            }
        }
        if info.node_count == 0 {
            warn!(label = %info.label, "no nodes carry the indexed label; answers will have no context");
        }
        info!(
            index = %info.name,
            nodes = info.node_count,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "vector store ready"
        );
        Ok(Self { query: cypher::vector_query(&settings), client, embedder, settings, info })
    }

    pub fn index_info(&self) -> &IndexInfo { &self.info }
}

async fn inspect_index(client: &Neo4jClient, settings: &RetrievalSettings) -> Result<IndexInfo> {
    let name = &settings.index_name;
    let rows = client
        .run(cypher::SHOW_INDEX, json!({ "name": name }))
        .await
        .map_err(|e| e.into_connection_error())?;
    let row = rows
        .rows()
        .next()
        .ok_or_else(|| Error::configuration(format!("vector index '{name}' does not exist")))?;

    let kind = row.get("type").and_then(Value::as_str).unwrap_or_default();
    if !kind.eq_ignore_ascii_case("VECTOR") {
        return Err(Error::configuration(format!("index '{name}' is a {kind} index, not a vector index")));
    }
    if !string_list(&row, "labelsOrTypes").iter().any(|l| l == &settings.node_label) {
        return Err(Error::configuration(format!("index '{name}' is not defined on label '{}'", settings.node_label)));
    }
    if !string_list(&row, "properties").iter().any(|p| p == &settings.embedding_property) {
        return Err(Error::configuration(format!(
            "index '{name}' is not defined on property '{}'",
            settings.embedding_property
        )));
    }
    let config = row.get("options").and_then(|o| o.get("indexConfig"));
    let dimensions = config
        .and_then(|c| c.get("vector.dimensions"))
        .and_then(Value::as_u64)
        .map(|d| d as usize);
    let similarity = config
        .and_then(|c| c.get("vector.similarity_function"))
        .and_then(Value::as_str)
        .map(str::to_string);

    let labels = client
        .run(cypher::LABEL_EXISTS, json!({ "label": settings.node_label }))
        .await
        .map_err(|e| e.into_connection_error())?;
    if !labels.get(0, "found").and_then(Value::as_u64).is_some_and(|n| n > 0) {
        return Err(Error::configuration(format!("node label '{}' does not exist", settings.node_label)));
    }
    let counted = client
        .run(&cypher::count_nodes(&settings.node_label), json!({}))
        .await
        .map_err(|e| e.into_connection_error())?;
    let node_count = counted.get(0, "nodes").and_then(Value::as_u64).unwrap_or(0);

    Ok(IndexInfo {
        name: name.clone(),
        label: settings.node_label.clone(),
        property: settings.embedding_property.clone(),
        dimensions,
        similarity,
        node_count,
    })
}

fn string_list(row: &Record<'_>, column: &str) -> Vec<String> {
    row.get(column)
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default()
}

fn value_to_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn to_chunks(rows: &QueryResult) -> Vec<TextChunk> {
    rows.rows()
        .filter_map(|row| {
            let id = row.get("id").map(value_to_string)?;
            let text = row.get("text").map(value_to_string).unwrap_or_default();
            let score = row.get("score").and_then(Value::as_f64).unwrap_or(0.0) as f32;
            let metadata: Meta = row
                .get("metadata")
                .and_then(Value::as_object)
                .map(|m| m.iter().filter(|(_, v)| !v.is_null()).map(|(k, v)| (k.clone(), v.clone())).collect())
                .unwrap_or_default();
            Some(TextChunk { id, text, score, metadata })
        })
        .collect()
}

#[async_trait]
impl Retriever for Neo4jVectorStore {
    fn top_k(&self) -> usize { self.settings.top_k }

    async fn retrieve_k(&self, query: &str, k: usize) -> Result<RetrievalResult> {
        if k == 0 {
            return Ok(RetrievalResult::new(Vec::new(), 0));
        }
        let start = Instant::now();
        let embedding = self.embedder.embed_query(query).await?;
        let rows = self
            .client
            .run(&self.query, json!({ "index": self.settings.index_name, "k": k, "embedding": embedding }))
            .await
            .map_err(|e| e.into_upstream_error())?;
        let result = RetrievalResult::new(to_chunks(&rows), k);
        debug!(k, hits = result.len(), elapsed_ms = start.elapsed().as_millis() as u64, "vector search");
        Ok(result)
    }
}
