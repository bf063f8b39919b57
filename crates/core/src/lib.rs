//! Reelsight Core Library
//!
//! Upload a local video to Gemini, wait for it to be processed, and ask
//! questions about it with web search enabled. Answers are kept in a
//! per-session history.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod format;
pub mod gemini;
pub mod history;
pub mod media;
pub mod provider;
pub mod remote;
pub mod session;
pub mod types;
pub mod upload;

// Re-export commonly used items at crate root
pub use config::Settings;
pub use dispatch::{QUERY_SUGGESTIONS, build_instruction, dispatch};
pub use error::{AnalysisError, ErrorKind, ReelsightError, Result};
pub use format::{format_answer, format_history, format_sources};
pub use gemini::GeminiClient;
pub use history::HistoryStore;
pub use media::{StagedVideo, UploadedVideo, VideoFormat};
pub use provider::ProviderConfig;
pub use remote::{ReasoningAgent, VideoStore};
pub use session::{AnalysisSession, Analyzer};
pub use types::{
    AgentReply, AnalysisRequest, FileState, HistoryEntry, RemoteVideoHandle, WebSource,
};
pub use upload::{PollPolicy, upload_and_wait};
