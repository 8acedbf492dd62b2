//! Typed configuration loader and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + environment.
//! The five connection secrets come from their conventional variable names
//! (`NEO4J_*`, `OPENAI_API_KEY`); any other setting can be overridden with
//! `APP_<SECTION>__<KEY>`. A `.env` file is read first when present.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

pub const NEO4J_URI: &str = "NEO4J_URI";
pub const NEO4J_USERNAME: &str = "NEO4J_USERNAME";
pub const NEO4J_PASSWORD: &str = "NEO4J_PASSWORD";
pub const NEO4J_DATABASE: &str = "NEO4J_DATABASE";
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";

#[derive(Debug)]
pub struct Neo4jSettings {
    pub uri: String,
    pub username: String,
    pub password: SecretString,
    pub database: String,
    pub timeout: Duration,
}

#[derive(Debug)]
pub struct OpenAiSettings {
    pub api_key: SecretString,
    pub base_url: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub embedding_dim: usize,
    pub temperature: f32,
    pub timeout: Duration,
}

/// Where the pre-built chunks live and how many of them feed one answer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub index_name: String,
    pub node_label: String,
    pub text_property: String,
    pub embedding_property: String,
    pub id_property: String,
    pub top_k: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            index_name: "form_10k_chunks".to_string(),
            node_label: "TextChunk".to_string(),
            text_property: "text".to_string(),
            embedding_property: "textEmbedding".to_string(),
            id_property: "chunkId".to_string(),
            top_k: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub wrap_width: usize,
}

impl Default for DisplaySettings {
    fn default() -> Self { Self { wrap_width: 80 } }
}

#[derive(Debug)]
pub struct AppConfig {
    pub neo4j: Neo4jSettings,
    pub openai: OpenAiSettings,
    pub retrieval: RetrievalSettings,
    pub display: DisplaySettings,
}

// Shape of the merged sources before required values are checked.
#[derive(Deserialize, Default)]
#[serde(default)]
struct RawConfig {
    neo4j: RawNeo4j,
    openai: RawOpenAi,
    retrieval: RetrievalSettings,
    display: DisplaySettings,
}

#[derive(Deserialize)]
#[serde(default)]
struct RawNeo4j {
    uri: Option<String>,
    username: Option<String>,
    password: Option<SecretString>,
    database: Option<String>,
    timeout_secs: u64,
}

impl Default for RawNeo4j {
    fn default() -> Self { Self { uri: None, username: None, password: None, database: None, timeout_secs: 30 } }
}

#[derive(Deserialize)]
#[serde(default)]
struct RawOpenAi {
    api_key: Option<SecretString>,
    base_url: String,
    chat_model: String,
    embedding_model: String,
    embedding_dim: usize,
    temperature: f32,
    timeout_secs: u64,
}

impl Default for RawOpenAi {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com".to_string(),
            chat_model: "gpt-3.5-turbo".to_string(),
            embedding_model: "text-embedding-ada-002".to_string(),
            embedding_dim: 1536,
            temperature: 0.0,
            timeout_secs: 60,
        }
    }
}

impl AppConfig {
    /// Read `.env`, layer the config files for `RUST_ENV`, overlay the
    /// environment and validate.
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        if let Ok(path) = dotenv::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }
        Self::from_figment(Self::figment(config_file))
    }

    /// The merged provider chain without extraction, so callers and tests can
    /// add or replace layers.
    pub fn figment(config_file: Option<&Path>) -> Figment {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let base = config_file.map_or_else(|| PathBuf::from("config.toml"), Path::to_path_buf);
        let mut figment = Figment::new().merge(Toml::file(base));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment
            .merge(Env::prefixed("APP_").split("__"))
            .merge(
                Env::prefixed("NEO4J_")
                    .only(&["uri", "username", "password", "database"])
                    .map(|k| format!("neo4j.{}", k.as_str().to_ascii_lowercase()).into()),
            )
            .merge(Env::raw().only(&[OPENAI_API_KEY]).map(|_| "openai.api_key".into()))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let raw: RawConfig = figment.extract().map_err(|e| Error::configuration(e.to_string()))?;
        raw.validate()
    }
}

fn present(value: Option<String>, name: &'static str, missing: &mut Vec<&'static str>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => {
            missing.push(name);
            String::new()
        }
    }
}

fn present_secret(value: Option<SecretString>, name: &'static str, missing: &mut Vec<&'static str>) -> SecretString {
    match value {
        Some(v) if !v.expose_secret().trim().is_empty() => v,
        _ => {
            missing.push(name);
            SecretString::new(String::new())
        }
    }
}

impl RawConfig {
    fn validate(self) -> Result<AppConfig> {
        let mut missing = Vec::new();
        let neo4j = Neo4jSettings {
            uri: present(self.neo4j.uri, NEO4J_URI, &mut missing),
            username: present(self.neo4j.username, NEO4J_USERNAME, &mut missing),
            password: present_secret(self.neo4j.password, NEO4J_PASSWORD, &mut missing),
            database: present(self.neo4j.database, NEO4J_DATABASE, &mut missing),
            timeout: Duration::from_secs(self.neo4j.timeout_secs),
        };
        let openai = OpenAiSettings {
            api_key: present_secret(self.openai.api_key, OPENAI_API_KEY, &mut missing),
            base_url: self.openai.base_url.trim_end_matches('/').to_string(),
            chat_model: self.openai.chat_model,
            embedding_model: self.openai.embedding_model,
            embedding_dim: self.openai.embedding_dim,
            temperature: self.openai.temperature,
            timeout: Duration::from_secs(self.openai.timeout_secs),
        };
        if !missing.is_empty() {
            return Err(Error::configuration(format!("missing required settings: {}", missing.join(", "))));
        }

        let r = &self.retrieval;
        if r.top_k == 0 {
            return Err(Error::configuration("retrieval.top_k must be at least 1"));
        }
        for (name, value) in [
            ("retrieval.index_name", &r.index_name),
            ("retrieval.node_label", &r.node_label),
            ("retrieval.text_property", &r.text_property),
            ("retrieval.embedding_property", &r.embedding_property),
            ("retrieval.id_property", &r.id_property),
        ] {
            if value.trim().is_empty() {
                return Err(Error::configuration(format!("{name} must not be empty")));
            }
        }
        if neo4j.timeout.is_zero() {
            return Err(Error::configuration("neo4j.timeout_secs must be at least 1"));
        }
        if openai.timeout.is_zero() {
            return Err(Error::configuration("openai.timeout_secs must be at least 1"));
        }
        // Answers must be reproducible for the same retrieved context.
        if openai.temperature != 0.0 {
            return Err(Error::configuration(format!(
                "openai.temperature is fixed at 0, got {}",
                openai.temperature
            )));
        }
        if openai.embedding_dim == 0 {
            return Err(Error::configuration("openai.embedding_dim must be at least 1"));
        }
        if self.display.wrap_width == 0 {
            return Err(Error::configuration("display.wrap_width must be at least 1"));
        }

        Ok(AppConfig { neo4j, openai, retrieval: self.retrieval, display: self.display })
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    // Expand env vars first
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    // Expand ~ at start
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}
