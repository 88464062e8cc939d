//! IRIS Core
//!
//! Client-side core of the IRIS knowledge assistant. It forwards questions
//! to a remote chat/RAG service and streams the answer back:
//!
//! - Settings read once from the environment (`.env` supported)
//! - HTTP transport with a health check and a streaming query
//! - Accumulation of streamed deltas into the growing answer text
//! - Static role/department registry used to scope retrieval
//! - Session transcript with rollback of failed requests
//!
//! # Example
//!
//! ```no_run
//! use iris_core::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let settings = Settings::from_env()?;
//!     let service = ChatService::new(&settings.api)?;
//!     ensure_available(&service).await?;
//!
//!     let mut session = SessionState::new(&settings.chat)?;
//!     let answer = run_exchange(&service, &mut session, "What is the return policy?", |_| {}).await?;
//!     println!("{}", answer);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod error;
pub mod exchange;
pub mod roles;
pub mod session;
pub mod streaming;
pub mod utils;

pub use client::{ChatBackend, ChatService};
pub use config::{
    load_env, load_env_from_path, parse_log_level, ApiSettings, AppSettings, ChatSettings,
    Endpoints, Layout, LogSettings, Settings,
};
pub use error::{IrisError, Result};
pub use exchange::{ensure_available, run_exchange, ExchangeUpdate, UNAVAILABLE_MESSAGE};
pub use roles::{
    all_roles, departments, departments_for_role, find_role, get_department_for_role,
    is_known_role, Department, Role, GENERAL_DEPARTMENT,
};
pub use session::{ConversationTurn, RequestPhase, SessionState, Speaker};
pub use streaming::{
    collect_stream, create_text_stream, parse_content_line, LineDecoder, StreamAccumulator,
    StreamHandler, TextChunk, TextStream, TextStreamSender,
};
pub use utils::logger::{init_logging, LogGuards};
