//! filingqa-vector
//!
//! Similarity search over 10-K chunks stored in Neo4j, through the database's
//! HTTP transactional endpoint and its native vector index.

pub mod client;
pub mod cypher;
pub mod store;

pub use client::{http_endpoint, Neo4jClient, Neo4jError};
pub use store::{IndexInfo, Neo4jVectorStore};
