use thiserror::Error;

/// Failure kinds surfaced by every stage of the question-answering flow.
///
/// `Configuration` and `Connection` happen while a session is being set up and
/// are fatal to it. `Upstream` is a per-question failure and callers are
/// expected to report it and keep serving.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Upstream error: {0}")]
    Upstream(String),
}

impl Error {
    pub fn configuration(msg: impl Into<String>) -> Self { Self::Configuration(msg.into()) }

    pub fn connection(msg: impl Into<String>) -> Self { Self::Connection(msg.into()) }

    pub fn upstream(msg: impl Into<String>) -> Self { Self::Upstream(msg.into()) }

    /// True for errors that must halt initialization.
    pub fn is_fatal(&self) -> bool { matches!(self, Self::Configuration(_) | Self::Connection(_)) }
}

pub type Result<T> = std::result::Result<T, Error>;
