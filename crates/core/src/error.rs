use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReelsightError {
    #[error("Please enter a query before analyzing")]
    EmptyQuery,

    #[error("Unsupported video format for {file_name}: expected one of mp4, mov, avi")]
    UnsupportedFormat { file_name: String },

    #[error("Uploaded video {file_name} is empty")]
    EmptyVideo { file_name: String },

    #[error("Missing API key: set {env_var} or api_key in the config file")]
    MissingApiKey { env_var: String },

    #[error("Remote service returned {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("Remote processing of {name} failed: {reason}")]
    ProcessingFailed { name: String, reason: String },

    #[error("Remote processing of {name} still running after {polls} polls")]
    ProcessingTimedOut { name: String, polls: u32 },

    #[error("Analysis failed: {reason}")]
    DispatchFailed { reason: String },

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, ReelsightError>;

/// Which stage of an analysis request failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected locally before any remote call. The user may fix the input and retry.
    Validation,
    /// Staging, upload or remote processing of the video failed.
    Remote,
    /// The reasoning agent failed to produce an answer.
    Dispatch,
}

#[derive(Error, Debug)]
#[error("{source}")]
pub struct AnalysisError {
    kind: ErrorKind,
    source: ReelsightError,
}

impl AnalysisError {
    pub fn new(kind: ErrorKind, source: ReelsightError) -> Self {
        Self { kind, source }
    }

    pub fn validation(source: ReelsightError) -> Self {
        Self::new(ErrorKind::Validation, source)
    }

    pub fn remote(source: ReelsightError) -> Self {
        Self::new(ErrorKind::Remote, source)
    }

    pub fn dispatch(source: ReelsightError) -> Self {
        Self::new(ErrorKind::Dispatch, source)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn is_validation(&self) -> bool {
        self.kind == ErrorKind::Validation
    }

    pub fn inner(&self) -> &ReelsightError {
        &self.source
    }

    pub fn into_inner(self) -> ReelsightError {
        self.source
    }
}
