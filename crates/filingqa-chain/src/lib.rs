//! filingqa-chain
//!
//! Retrieval-augmented answering: the prompt layout, the OpenAI chat model, the
//! chain that ties retrieval to generation and the cached session built from an
//! `AppConfig`.

pub mod chain;
pub mod llm;
pub mod prompt;
pub mod session;

pub use chain::AnswerChain;
pub use llm::OpenAiChatModel;
pub use session::{SessionCacheMap, SessionHandle, SessionKey};
