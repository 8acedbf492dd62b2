use std::time::Duration;

use mockito::{Matcher, Mock, ServerGuard};
use secrecy::SecretString;
use serde_json::json;

use filingqa_chain::{OpenAiChatModel, SessionCacheMap, SessionHandle};
use filingqa_core::config::{AppConfig, DisplaySettings, Neo4jSettings, OpenAiSettings, RetrievalSettings};
use filingqa_core::traits::{LanguageModel, QuestionAnswerer};
use filingqa_core::Error;

const COMMIT: &str = "/db/neo4j/tx/commit";

fn config(neo4j_url: &str, openai_url: &str) -> AppConfig {
    AppConfig {
        neo4j: Neo4jSettings {
            uri: neo4j_url.to_string(),
            username: "neo4j".to_string(),
            password: SecretString::new("secret".to_string()),
            database: "neo4j".to_string(),
            timeout: Duration::from_secs(5),
        },
        openai: OpenAiSettings {
            api_key: SecretString::new("sk-test".to_string()),
            base_url: openai_url.to_string(),
            chat_model: "gpt-3.5-turbo".to_string(),
            embedding_model: "text-embedding-ada-002".to_string(),
            embedding_dim: 3,
            temperature: 0.0,
            timeout: Duration::from_secs(5),
        },
        retrieval: RetrievalSettings::default(),
        display: DisplaySettings::default(),
    }
}

fn rows(columns: &[&str], rows: serde_json::Value) -> String {
    let data: Vec<_> = rows
        .as_array()
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .map(|row| json!({ "row": row }))
        .collect();
    json!({ "results": [{ "columns": columns, "data": data }], "errors": [] }).to_string()
}

async fn statement(server: &mut ServerGuard, pattern: &str, body: String, hits: usize) -> Mock {
    server
        .mock("POST", COMMIT)
        .match_body(Matcher::Regex(pattern.to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .expect(hits)
        .create_async()
        .await
}

/// Neo4j holding a 3-dimensional index with the Acme chunk. Returns the
/// connect probe mock so callers can count connections.
async fn acme_graph(server: &mut ServerGuard, searches: usize) -> (Mock, Vec<Mock>) {
    let probe = statement(server, "RETURN 1", rows(&["ok"], json!([[1]])), 1).await;
    let index = rows(
        &["name", "type", "labelsOrTypes", "properties", "options"],
        json!([["form_10k_chunks", "VECTOR", ["TextChunk"], ["textEmbedding"], { "indexConfig": { "vector.dimensions": 3 } }]]),
    );
    let others = vec![
        statement(server, "SHOW INDEXES", index, 1).await,
        statement(server, r"db\.labels", rows(&["found"], json!([[1]])), 1).await,
        statement(server, r"count\(n\)", rows(&["nodes"], json!([[1]])), 1).await,
        statement(
            server,
            "queryNodes",
            rows(
                &["text", "score", "id", "metadata"],
                json!([["Acme Corp is headquartered in Springfield.", 0.93, "acme-item1-chunk0000", { "formId": "acme-10k" }]]),
            ),
            searches,
        )
        .await,
    ];
    (probe, others)
}

async fn embeddings(server: &mut ServerGuard, hits: usize) -> Mock {
    server
        .mock("POST", "/v1/embeddings")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"data":[{"index":0,"embedding":[0.6,0.8,0.0]}]}"#)
        .expect(hits)
        .create_async()
        .await
}

fn completion(content: &str) -> String { json!({ "choices": [{ "message": { "role": "assistant", "content": content } }] }).to_string() }

#[tokio::test]
async fn session_is_built_once_and_answers() {
    let mut graph = mockito::Server::new_async().await;
    let mut openai = mockito::Server::new_async().await;
    let (probe, _others) = acme_graph(&mut graph, 1).await;
    let _emb = embeddings(&mut openai, 1).await;
    let chat = openai
        .mock("POST", "/v1/chat/completions")
        .match_header("authorization", "Bearer sk-test")
        .match_body(Matcher::AllOf(vec![
            Matcher::PartialJson(json!({ "model": "gpt-3.5-turbo", "temperature": 0.0 })),
            Matcher::Regex("Source: acme-item1-chunk0000".to_string()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion("Acme Corp is headquartered in Springfield.\nSOURCES: acme-item1-chunk0000"))
        .expect(1)
        .create_async()
        .await;

    let cfg = config(&graph.url(), &openai.url());
    let cache = SessionCacheMap::new();
    let first = SessionHandle::open(&cache, &cfg).await.expect("open");
    let second = SessionHandle::open(&cache, &cfg).await.expect("reopen");
    assert!(std::sync::Arc::ptr_eq(&first, &second));
    assert_eq!(cache.len(), 1);
    probe.assert_async().await;

    let answer = second.answer("Where is Acme headquartered?").await.expect("answer");
    assert!(answer.text.contains("Springfield"));
    assert_eq!(answer.sources, vec!["acme-item1-chunk0000"]);
    chat.assert_async().await;
}

#[tokio::test]
async fn failed_session_is_not_cached() {
    let cfg = config("http://127.0.0.1:9", "http://127.0.0.1:9");
    let cache = SessionCacheMap::new();
    let err = SessionHandle::open(&cache, &cfg).await.expect_err("nothing listening");
    assert!(matches!(err, Error::Connection(_)));
    assert!(err.is_fatal());
    assert!(cache.is_empty());
}

#[tokio::test]
async fn chat_failure_after_retrieval_is_upstream() {
    let mut graph = mockito::Server::new_async().await;
    let mut openai = mockito::Server::new_async().await;
    let (_probe, others) = acme_graph(&mut graph, 1).await;
    let _emb = embeddings(&mut openai, 1).await;
    let _chat = openai
        .mock("POST", "/v1/chat/completions")
        .with_status(500)
        .with_body(r#"{"error":{"message":"The server had an error while processing your request."}}"#)
        .create_async()
        .await;

    let cache = SessionCacheMap::new();
    let session = SessionHandle::open(&cache, &config(&graph.url(), &openai.url())).await.expect("open");
    let err = session.answer("Where is Acme headquartered?").await.expect_err("500");
    assert!(matches!(err, Error::Upstream(ref m) if m.contains("server had an error")), "{err}");
    others[3].assert_async().await;
}

#[tokio::test]
async fn chat_model_rejects_empty_choices() {
    let mut openai = mockito::Server::new_async().await;
    let _chat = openai
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"choices":[]}"#)
        .create_async()
        .await;

    let model = OpenAiChatModel::new(&config("http://unused", &openai.url()).openai).expect("model");
    let err = model.complete("hello").await.expect_err("no choices");
    assert!(matches!(err, Error::Upstream(_)));
}

#[tokio::test]
async fn invalid_api_key_is_upstream_with_hint() {
    let mut openai = mockito::Server::new_async().await;
    let _chat = openai
        .mock("POST", "/v1/chat/completions")
        .with_status(401)
        .with_body(r#"{"error":{"message":"Incorrect API key provided: sk-test."}}"#)
        .create_async()
        .await;

    let model = OpenAiChatModel::new(&config("http://unused", &openai.url()).openai).expect("model");
    let err = model.complete("hello").await.expect_err("401");
    assert!(matches!(err, Error::Upstream(ref m) if m.contains("OPENAI_API_KEY") && m.contains("Incorrect API key")), "{err}");
}
