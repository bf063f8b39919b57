//! Seams to the hosted services. [`crate::gemini::GeminiClient`] implements
//! both traits; tests substitute in-memory fakes.

use std::path::Path;

use async_trait::async_trait;

use crate::{
    error::Result,
    types::{AgentReply, RemoteVideoHandle},
};

/// Remote service that ingests a media file and prepares it asynchronously.
#[async_trait]
pub trait VideoStore: Send + Sync {
    async fn upload(&self, path: &Path, mime_type: &str) -> Result<RemoteVideoHandle>;

    /// Re-fetch the current state of a previously uploaded file.
    async fn get(&self, name: &str) -> Result<RemoteVideoHandle>;
}

/// Model inference over media and text, with web search on the side.
#[async_trait]
pub trait ReasoningAgent: Send + Sync {
    async fn run(&self, instruction: &str, video: &RemoteVideoHandle) -> Result<AgentReply>;
}
