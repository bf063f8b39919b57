use std::{
    collections::VecDeque,
    path::{Path, PathBuf},
    sync::{
        Mutex,
        atomic::{AtomicU32, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use reelsight_core::{
    AgentReply, AnalysisSession, Analyzer, ErrorKind, FileState, PollPolicy, ReasoningAgent,
    ReelsightError, RemoteVideoHandle, Result, UploadedVideo, VideoStore,
};

/// Remote store that replays a fixed sequence of processing states.
struct FakeStore {
    states: Mutex<VecDeque<FileState>>,
    fail_upload: bool,
    uploads: Mutex<Vec<(PathBuf, bool, String)>>,
    polls: AtomicU32,
}

impl FakeStore {
    fn new(states: &[FileState]) -> Self {
        Self {
            states: Mutex::new(states.iter().copied().collect()),
            fail_upload: false,
            uploads: Mutex::new(Vec::new()),
            polls: AtomicU32::new(0),
        }
    }

    fn ready() -> Self {
        Self::new(&[FileState::Active])
    }

    fn failing() -> Self {
        Self {
            fail_upload: true,
            ..Self::new(&[])
        }
    }

    fn next_handle(&self) -> RemoteVideoHandle {
        let state = self
            .states
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(FileState::Active);
        RemoteVideoHandle {
            name: "files/video-1".into(),
            uri: "https://example.test/files/video-1".into(),
            mime_type: "video/mp4".into(),
            state,
            error: None,
        }
    }

    fn upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }

    fn uploaded_paths(&self) -> Vec<PathBuf> {
        self.uploads
            .lock()
            .unwrap()
            .iter()
            .map(|(path, _, _)| path.clone())
            .collect()
    }
}

#[async_trait]
impl VideoStore for FakeStore {
    async fn upload(&self, path: &Path, mime_type: &str) -> Result<RemoteVideoHandle> {
        self.uploads
            .lock()
            .unwrap()
            .push((path.to_path_buf(), path.exists(), mime_type.to_string()));
        if self.fail_upload {
            return Err(ReelsightError::Remote {
                status: 503,
                message: "service unavailable".into(),
            });
        }
        Ok(self.next_handle())
    }

    async fn get(&self, _name: &str) -> Result<RemoteVideoHandle> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        Ok(self.next_handle())
    }
}

struct FakeAgent {
    reply: std::result::Result<String, String>,
    instructions: Mutex<Vec<String>>,
}

impl FakeAgent {
    fn answering(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            instructions: Mutex::new(Vec::new()),
        }
    }

    fn failing(reason: &str) -> Self {
        Self {
            reply: Err(reason.to_string()),
            instructions: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.instructions.lock().unwrap().len()
    }
}

#[async_trait]
impl ReasoningAgent for FakeAgent {
    async fn run(&self, instruction: &str, video: &RemoteVideoHandle) -> Result<AgentReply> {
        assert_eq!(video.state, FileState::Active);
        self.instructions
            .lock()
            .unwrap()
            .push(instruction.to_string());
        match &self.reply {
            Ok(text) => Ok(AgentReply::text(text.clone())),
            Err(reason) => Err(ReelsightError::Remote {
                status: 429,
                message: reason.clone(),
            }),
        }
    }
}

fn analyzer(
    store: FakeStore,
    agent: FakeAgent,
    staging: &Path,
) -> Analyzer<FakeStore, FakeAgent> {
    Analyzer::new(store, agent, PollPolicy::new(Duration::from_millis(1), 10))
        .with_staging_dir(staging)
}

fn synthetic_mp4() -> UploadedVideo {
    // Stand-in for a two second clip; the fakes never decode it.
    let mut bytes = vec![0x00, 0x00, 0x00, 0x18];
    bytes.extend_from_slice(b"ftypmp42");
    bytes.resize(2048, 0);
    UploadedVideo::new("clip.mp4", bytes).unwrap()
}

fn staged_files(dir: &Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}

#[tokio::test]
async fn summarize_scenario_records_one_entry_and_cleans_up() {
    let staging = tempfile::tempdir().unwrap();
    let analyzer = analyzer(
        FakeStore::new(&[
            FileState::Processing,
            FileState::Processing,
            FileState::Active,
        ]),
        FakeAgent::answering("X"),
        staging.path(),
    );
    let mut session = AnalysisSession::new();

    let entry = analyzer
        .analyze(&mut session, &synthetic_mp4(), "Summarize this video")
        .await
        .unwrap();

    assert_eq!(entry.query, "Summarize this video");
    assert_eq!(entry.response, "X");
    assert_eq!(session.history().len(), 1);
    assert_eq!(analyzer.store().polls.load(Ordering::SeqCst), 2);

    let uploads = analyzer.store().uploads.lock().unwrap().clone();
    assert_eq!(uploads.len(), 1);
    let (path, existed_during_upload, mime_type) = &uploads[0];
    assert!(existed_during_upload);
    assert_eq!(mime_type, "video/mp4");
    assert!(!path.exists());
    assert_eq!(staged_files(staging.path()), 0);
}

#[tokio::test]
async fn instruction_contains_the_user_query() {
    let staging = tempfile::tempdir().unwrap();
    let analyzer = analyzer(FakeStore::ready(), FakeAgent::answering("ok"), staging.path());
    let mut session = AnalysisSession::new();

    analyzer
        .analyze(&mut session, &synthetic_mp4(), "Who is on stage?")
        .await
        .unwrap();

    let instructions = analyzer.agent().instructions.lock().unwrap();
    assert!(instructions[0].contains("\nWho is on stage?\n"));
    assert!(instructions[0].contains("supplementary web research"));
}

#[tokio::test]
async fn blank_queries_never_reach_the_remote_side() {
    let staging = tempfile::tempdir().unwrap();
    let analyzer = analyzer(FakeStore::ready(), FakeAgent::answering("X"), staging.path());
    let mut session = AnalysisSession::new();

    for query in ["", "   ", "\n\t "] {
        let err = analyzer
            .analyze(&mut session, &synthetic_mp4(), query)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(matches!(err.inner(), ReelsightError::EmptyQuery));
    }

    assert_eq!(analyzer.store().upload_count(), 0);
    assert_eq!(analyzer.agent().calls(), 0);
    assert!(session.history().is_empty());
    assert_eq!(staged_files(staging.path()), 0);
}

#[tokio::test]
async fn empty_video_is_a_validation_error() {
    let staging = tempfile::tempdir().unwrap();
    let analyzer = analyzer(FakeStore::ready(), FakeAgent::answering("X"), staging.path());
    let mut session = AnalysisSession::new();
    let video = UploadedVideo::new("empty.mp4", Vec::new()).unwrap();

    let err = analyzer
        .analyze(&mut session, &video, "anything")
        .await
        .unwrap_err();

    assert!(err.is_validation());
    assert_eq!(analyzer.store().upload_count(), 0);
}

#[tokio::test]
async fn upload_failure_records_nothing_and_cleans_up() {
    let staging = tempfile::tempdir().unwrap();
    let analyzer = analyzer(FakeStore::failing(), FakeAgent::answering("X"), staging.path());
    let mut session = AnalysisSession::new();

    let err = analyzer
        .analyze(&mut session, &synthetic_mp4(), "Summarize this video")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Remote);
    assert!(err.to_string().contains("service unavailable"));
    assert_eq!(analyzer.agent().calls(), 0);
    assert!(session.history().is_empty());
    for path in analyzer.store().uploaded_paths() {
        assert!(!path.exists());
    }
    assert_eq!(staged_files(staging.path()), 0);
}

#[tokio::test]
async fn remote_processing_failure_is_a_remote_error() {
    let staging = tempfile::tempdir().unwrap();
    let analyzer = analyzer(
        FakeStore::new(&[FileState::Processing, FileState::Failed]),
        FakeAgent::answering("X"),
        staging.path(),
    );
    let mut session = AnalysisSession::new();

    let err = analyzer
        .analyze(&mut session, &synthetic_mp4(), "Summarize this video")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Remote);
    assert!(matches!(err.inner(), ReelsightError::ProcessingFailed { .. }));
    assert_eq!(analyzer.agent().calls(), 0);
    assert!(session.history().is_empty());
    assert_eq!(staged_files(staging.path()), 0);
}

#[tokio::test]
async fn endless_processing_times_out() {
    let staging = tempfile::tempdir().unwrap();
    let states = vec![FileState::Processing; 50];
    let analyzer = Analyzer::new(
        FakeStore::new(&states),
        FakeAgent::answering("X"),
        PollPolicy::new(Duration::from_millis(1), 4),
    )
    .with_staging_dir(staging.path());
    let mut session = AnalysisSession::new();

    let err = analyzer
        .analyze(&mut session, &synthetic_mp4(), "Summarize this video")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Remote);
    assert!(matches!(
        err.inner(),
        ReelsightError::ProcessingTimedOut { polls: 4, .. }
    ));
    assert_eq!(analyzer.store().polls.load(Ordering::SeqCst), 4);
    assert!(session.history().is_empty());
    assert_eq!(staged_files(staging.path()), 0);
}

#[tokio::test]
async fn dropping_an_in_flight_analysis_removes_the_staged_file() {
    let staging = tempfile::tempdir().unwrap();
    let states = vec![FileState::Processing; 10_000];
    let analyzer = Analyzer::new(
        FakeStore::new(&states),
        FakeAgent::answering("X"),
        PollPolicy::unbounded(Duration::from_millis(5)),
    )
    .with_staging_dir(staging.path());
    let mut session = AnalysisSession::new();

    let cancelled = tokio::time::timeout(
        Duration::from_millis(50),
        analyzer.analyze(&mut session, &synthetic_mp4(), "Summarize this video"),
    )
    .await;

    assert!(cancelled.is_err());
    let uploads = analyzer.store().uploads.lock().unwrap().clone();
    assert_eq!(uploads.len(), 1);
    assert!(uploads[0].1, "video was staged while the upload ran");
    assert!(analyzer.store().polls.load(Ordering::SeqCst) > 0);
    assert_eq!(analyzer.agent().calls(), 0);
    assert!(session.history().is_empty());
    assert_eq!(staged_files(staging.path()), 0);
}

#[tokio::test]
async fn agent_failure_is_a_dispatch_error() {
    let staging = tempfile::tempdir().unwrap();
    let analyzer = analyzer(
        FakeStore::ready(),
        FakeAgent::failing("quota exceeded"),
        staging.path(),
    );
    let mut session = AnalysisSession::new();

    let err = analyzer
        .analyze(&mut session, &synthetic_mp4(), "Summarize this video")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Dispatch);
    assert!(err.to_string().contains("quota exceeded"));
    assert!(session.history().is_empty());
    for path in analyzer.store().uploaded_paths() {
        assert!(!path.exists());
    }
    assert_eq!(staged_files(staging.path()), 0);
}

#[tokio::test]
async fn failed_request_does_not_block_the_next_one() {
    let staging = tempfile::tempdir().unwrap();
    let analyzer = analyzer(FakeStore::ready(), FakeAgent::answering("fine"), staging.path());
    let mut session = AnalysisSession::new();
    let video = synthetic_mp4();

    assert!(analyzer.analyze(&mut session, &video, " ").await.is_err());
    analyzer
        .analyze(&mut session, &video, "What happens at the end?")
        .await
        .unwrap();

    assert_eq!(session.history().len(), 1);
}

#[tokio::test]
async fn same_question_twice_yields_two_entries() {
    let staging = tempfile::tempdir().unwrap();
    let analyzer = analyzer(FakeStore::ready(), FakeAgent::answering("X"), staging.path());
    let mut session = AnalysisSession::new();
    let video = synthetic_mp4();

    for _ in 0..2 {
        analyzer
            .analyze(&mut session, &video, "Summarize this video")
            .await
            .unwrap();
    }

    assert_eq!(session.history().len(), 2);
    assert_eq!(analyzer.store().upload_count(), 2);
    let paths = analyzer.store().uploaded_paths();
    assert_ne!(paths[0], paths[1]);
    assert_eq!(staged_files(staging.path()), 0);
}

#[tokio::test]
async fn history_lists_newest_first_across_analyses() {
    let staging = tempfile::tempdir().unwrap();
    let analyzer = analyzer(FakeStore::ready(), FakeAgent::answering("X"), staging.path());
    let mut session = AnalysisSession::new();
    let video = synthetic_mp4();

    for query in ["A", "B", "C"] {
        analyzer.analyze(&mut session, &video, query).await.unwrap();
    }

    let queries: Vec<&str> = session
        .history()
        .list()
        .map(|entry| entry.query.as_str())
        .collect();
    assert_eq!(queries, vec!["C", "B", "A"]);
}

#[tokio::test]
async fn mime_type_follows_the_container() {
    let staging = tempfile::tempdir().unwrap();
    let analyzer = analyzer(FakeStore::ready(), FakeAgent::answering("X"), staging.path());
    let mut session = AnalysisSession::new();
    let video = UploadedVideo::new("holiday.MOV", vec![1; 64]).unwrap();

    analyzer
        .analyze(&mut session, &video, "Where was this filmed?")
        .await
        .unwrap();

    let uploads = analyzer.store().uploads.lock().unwrap();
    assert_eq!(uploads[0].2, "video/quicktime");
    assert_eq!(
        uploads[0].0.extension().and_then(|e| e.to_str()),
        Some("mov")
    );
}
