//! # promochat-llm-api
//!
//! Backend adapters for the promo chat assistant:
//! - the hosted multi-provider relay (streaming plain text or SSE, plus a JSON endpoint)
//! - a model server running on the visitor's own machine (`/api/chat`, NDJSON streaming)
//!
//! Both implement [`ChatBackend`], so the chat layer can switch between them at runtime.
//!
//! ## Example
//!
//! ```rust,no_run
//! use promochat_llm_api::{ClientFactory, ConversationRequest, RelayConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let backend = ClientFactory::create_relay(RelayConfig::default());
//!     let request = ConversationRequest::new(&[], "游戏机制是怎样的？", "session_demo");
//!
//!     let mut print = |chunk: &str| print!("{}", chunk);
//!     let full = backend.stream_chat(&request, &mut print).await?;
//!     println!("\n({} chars)", full.chars().count());
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;


// Re-export commonly used types
pub use client::{
    local_model::LocalModelClient,
    relay::RelayClient,
    BackendError,
    BackendReply,
    BackendResult,
    ChatBackend,
    ChunkStream,
    ConversationRequest,
    WireMessage,
};
pub use config::{
    normalize_base_url,
    BackendType,
    ClientFactory,
    LocalConfig,
    RelayConfig,
    DEFAULT_LOCAL_MODEL,
    DEFAULT_LOCAL_URL,
    DEFAULT_RELAY_MODEL,
    DEFAULT_RELAY_URL,
};
