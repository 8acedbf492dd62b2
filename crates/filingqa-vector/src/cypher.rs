//! Cypher text for the statements the store issues. Names coming from
//! configuration are quoted; everything else is passed as a parameter.

use filingqa_core::config::RetrievalSettings;

/// Backtick-quote a label or property name, doubling embedded backticks.
pub fn quote_identifier(name: &str) -> String { format!("`{}`", name.replace('`', "``")) }

pub const PROBE: &str = "RETURN 1 AS ok";

pub const SHOW_INDEX: &str = "SHOW INDEXES YIELD name, type, labelsOrTypes, properties, options \
     WHERE name = $name RETURN name, type, labelsOrTypes, properties, options";

pub const LABEL_EXISTS: &str = "CALL db.labels() YIELD label WHERE label = $label RETURN count(label) AS found";

pub fn count_nodes(label: &str) -> String {
    format!("MATCH (n:{}) RETURN count(n) AS nodes", quote_identifier(label))
}

/// Top-k search over the vector index. Text, embedding and id are lifted out
/// of the node map so `metadata` only carries the remaining properties.
pub fn vector_query(settings: &RetrievalSettings) -> String {
    let text = quote_identifier(&settings.text_property);
    let embedding = quote_identifier(&settings.embedding_property);
    let id = quote_identifier(&settings.id_property);
    format!(
        "CALL db.index.vector.queryNodes($index, $k, $embedding) YIELD node, score \
         RETURN node.{text} AS text, score, coalesce(node.{id}, elementId(node)) AS id, \
         node {{.*, {text}: null, {embedding}: null, {id}: null}} AS metadata \
         ORDER BY score DESC"
    )
}
