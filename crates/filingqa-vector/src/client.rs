//! Minimal client for the Neo4j HTTP transactional endpoint.
//!
//! Every call is an auto-commit transaction: `POST /db/<database>/tx/commit`
//! with one statement and its parameters. Bolt-style URIs from the Aura console
//! are mapped onto the matching HTTP endpoint.

use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;
use tracing::debug;
use url::Url;

use filingqa_core::config::Neo4jSettings;
use filingqa_core::http::build_client;
use filingqa_core::{Error, Result};

/// Why a statement failed. Callers decide which [`Error`] kind it becomes,
/// since the same failure is fatal during setup and per-question afterwards.
#[derive(Debug)]
pub enum Neo4jError {
    Transport(String),
    Unauthorized(String),
    Http { status: StatusCode, body: String },
    Database { code: String, message: String },
    Decode(String),
}

impl std::fmt::Display for Neo4jError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "database unreachable: {e}"),
            Self::Unauthorized(e) => write!(f, "credentials rejected: {e}"),
            Self::Http { status, body } => write!(f, "database returned {status}: {body}"),
            Self::Database { code, message } => write!(f, "{code}: {message}"),
            Self::Decode(e) => write!(f, "malformed database response: {e}"),
        }
    }
}

impl Neo4jError {
    pub fn is_database_not_found(&self) -> bool {
        matches!(self, Self::Database { code, .. } if code == "Neo.ClientError.Database.DatabaseNotFound")
    }

    /// Failure while establishing the session.
    pub fn into_connection_error(self) -> Error {
        if self.is_database_not_found() {
            return Error::configuration(self.to_string());
        }
        Error::connection(self.to_string())
    }

    /// Failure while serving a question.
    pub fn into_upstream_error(self) -> Error { Error::upstream(self.to_string()) }
}

/// Map `neo4j://`, `neo4j+s://`, `bolt(+s|+ssc)://` and `http(s)://` URIs to
/// the HTTP base URL of the same server.
pub fn http_endpoint(uri: &str) -> Result<String> {
    let url = Url::parse(uri.trim()).map_err(|e| Error::configuration(format!("invalid NEO4J_URI '{uri}': {e}")))?;
    let host = url
        .host_str()
        .ok_or_else(|| Error::configuration(format!("NEO4J_URI '{uri}' has no host")))?;
    let bolt_port = |p: Option<u16>| p.filter(|p| *p != 7687);
    let (scheme, port) = match url.scheme() {
        "http" | "https" => (url.scheme().to_string(), url.port()),
        "neo4j+s" | "neo4j+ssc" | "bolt+s" | "bolt+ssc" => ("https".to_string(), bolt_port(url.port())),
        "neo4j" | "bolt" => ("http".to_string(), bolt_port(url.port()).or(Some(7474))),
        other => return Err(Error::configuration(format!("unsupported NEO4J_URI scheme '{other}'"))),
    };
    Ok(match port {
        Some(p) => format!("{scheme}://{host}:{p}"),
        None => format!("{scheme}://{host}"),
    })
}

#[derive(Serialize)]
struct TxRequest<'a> {
    statements: [Statement<'a>; 1],
}

#[derive(Serialize)]
struct Statement<'a> {
    statement: &'a str,
    parameters: &'a Value,
    #[serde(rename = "resultDataContents")]
    result_data_contents: [&'static str; 1],
}

#[derive(Deserialize)]
struct TxResponse {
    #[serde(default)]
    results: Vec<StatementResult>,
    #[serde(default)]
    errors: Vec<TxError>,
}

#[derive(Deserialize)]
struct StatementResult {
    #[serde(default)]
    columns: Vec<String>,
    #[serde(default)]
    data: Vec<RowData>,
}

#[derive(Deserialize)]
struct RowData {
    row: Vec<Value>,
}

#[derive(Deserialize)]
struct TxError {
    code: String,
    message: String,
}

/// Rows of one statement, addressable by column name.
#[derive(Debug, Default)]
pub struct QueryResult {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl QueryResult {
    pub fn len(&self) -> usize { self.rows.len() }

    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let col = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.get(col)
    }

    pub fn rows(&self) -> impl Iterator<Item = Record<'_>> {
        self.rows.iter().map(move |values| Record { columns: &self.columns, values })
    }
}

pub struct Record<'a> {
    columns: &'a [String],
    values: &'a [Value],
}

impl Record<'_> {
    pub fn get(&self, column: &str) -> Option<&Value> {
        let col = self.columns.iter().position(|c| c == column)?;
        self.values.get(col).filter(|v| !v.is_null())
    }
}

pub struct Neo4jClient {
    http: Client,
    commit_url: String,
    username: String,
    password: SecretString,
}

impl Neo4jClient {
    /// Builds the client; no request is sent until [`Neo4jClient::run`].
    pub fn new(settings: &Neo4jSettings) -> Result<Self> {
        let base = http_endpoint(&settings.uri)?;
        let http = build_client(settings.timeout)?;
        Ok(Self {
            http,
            commit_url: format!("{base}/db/{}/tx/commit", settings.database),
            username: settings.username.clone(),
            password: SecretString::new(settings.password.expose_secret().clone()),
        })
    }

    pub fn commit_url(&self) -> &str { &self.commit_url }

    pub async fn run(&self, statement: &str, parameters: Value) -> std::result::Result<QueryResult, Neo4jError> {
        let start = Instant::now();
        let body = TxRequest {
            statements: [Statement { statement, parameters: &parameters, result_data_contents: ["row"] }],
        };
        let resp = self
            .http
            .post(&self.commit_url)
            .basic_auth(&self.username, Some(self.password.expose_secret()))
            .header(reqwest::header::ACCEPT, "application/json;charset=UTF-8")
            .json(&body)
            .send()
            .await
            .map_err(|e| Neo4jError::Transport(e.to_string()))?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| Neo4jError::Transport(e.to_string()))?;
        let parsed = serde_json::from_str::<TxResponse>(&text);

        if let Ok(TxResponse { errors, .. }) = &parsed {
            if let Some(err) = errors.first() {
                if err.code.starts_with("Neo.ClientError.Security.") {
                    return Err(Neo4jError::Unauthorized(err.message.clone()));
                }
                return Err(Neo4jError::Database { code: err.code.clone(), message: err.message.clone() });
            }
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(Neo4jError::Unauthorized(status.to_string()));
        }
        if !status.is_success() {
            return Err(Neo4jError::Http { status, body: text.chars().take(200).collect() });
        }

        let mut parsed = parsed.map_err(|e| Neo4jError::Decode(e.to_string()))?;
        let result = parsed.results.pop().map_or_else(QueryResult::default, |r| QueryResult {
            columns: r.columns,
            rows: r.data.into_iter().map(|d| d.row).collect(),
        });
        debug!(rows = result.len(), elapsed_ms = start.elapsed().as_millis() as u64, "cypher statement");
        Ok(result)
    }
}
