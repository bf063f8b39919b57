use std::path::PathBuf;

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dispatch::dispatch,
    error::{AnalysisError, ReelsightError},
    gemini::GeminiClient,
    history::HistoryStore,
    media::{StagedVideo, UploadedVideo},
    provider::ProviderConfig,
    remote::{ReasoningAgent, VideoStore},
    types::{AgentReply, AnalysisRequest, HistoryEntry},
    upload::{PollPolicy, upload_and_wait},
};

/// State that lives for one interactive session.
#[derive(Debug)]
pub struct AnalysisSession {
    id: Uuid,
    history: HistoryStore,
}

impl Default for AnalysisSession {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            history: HistoryStore::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }
}

/// Runs one query against one video: stage, upload, wait, dispatch, record.
pub struct Analyzer<S, A> {
    store: S,
    agent: A,
    policy: PollPolicy,
    staging_dir: Option<PathBuf>,
}

impl Analyzer<GeminiClient, GeminiClient> {
    pub fn gemini(config: ProviderConfig, policy: PollPolicy) -> Self {
        let client = GeminiClient::new(config);
        Self::new(client.clone(), client, policy)
    }
}

impl<S, A> Analyzer<S, A>
where
    S: VideoStore,
    A: ReasoningAgent,
{
    pub fn new(store: S, agent: A, policy: PollPolicy) -> Self {
        Self {
            store,
            agent,
            policy,
            staging_dir: None,
        }
    }

    /// Stage temporary video copies here instead of the system temp dir.
    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = Some(dir.into());
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn agent(&self) -> &A {
        &self.agent
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Answer `query` about `video` and append the answer to the session history.
    ///
    /// Nothing is recorded unless the agent answers. The temporary copy of the
    /// video is gone by the time this returns, whatever the outcome, and also
    /// when the future is dropped before it completes.
    pub async fn analyze<'s>(
        &self,
        session: &'s mut AnalysisSession,
        video: &UploadedVideo,
        query: &str,
    ) -> Result<&'s HistoryEntry, AnalysisError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AnalysisError::validation(ReelsightError::EmptyQuery));
        }
        video.ensure_not_empty().map_err(AnalysisError::validation)?;

        info!(session = %session.id, file = video.file_name(), "analysis requested");

        let staged = StagedVideo::write(video, self.staging_dir.as_deref())
            .map_err(AnalysisError::remote)?;

        let result = self.run(&staged, video, query).await;

        let staged_path = staged.to_path_buf();
        drop(staged);
        if staged_path.exists() {
            warn!(path = %staged_path.display(), "temporary video copy was not removed");
        }

        let reply = result?;
        Ok(session.history.record(query, reply))
    }

    async fn run(
        &self,
        staged: &StagedVideo,
        video: &UploadedVideo,
        query: &str,
    ) -> Result<AgentReply, AnalysisError> {
        let handle = upload_and_wait(&self.store, staged.path(), video.mime_type(), &self.policy)
            .await
            .map_err(AnalysisError::remote)?;

        let request = AnalysisRequest {
            query: query.to_string(),
            video: handle,
        };

        dispatch(&self.agent, &request)
            .await
            .map_err(AnalysisError::dispatch)
    }
}
