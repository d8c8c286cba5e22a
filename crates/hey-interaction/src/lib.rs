//! Remote side of hey: the OpenAI-compatible chat-completion agent.

pub mod config;
pub mod openai_api_agent;
pub mod sse;

pub use config::ApiConfig;
pub use openai_api_agent::OpenAIApiAgent;
