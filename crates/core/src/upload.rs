use std::{path::Path, time::Duration};

use tracing::{debug, info, warn};

use crate::{
    error::{ReelsightError, Result},
    remote::VideoStore,
    types::{FileState, RemoteVideoHandle},
};

/// How long to wait for the remote side to finish processing an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    /// `None` polls until the state changes, however long that takes.
    pub max_polls: Option<u32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_polls: Some(600),
        }
    }
}

impl PollPolicy {
    /// `max_polls == 0` means unbounded.
    pub fn new(interval: Duration, max_polls: u32) -> Self {
        Self {
            interval,
            max_polls: (max_polls > 0).then_some(max_polls),
        }
    }

    pub fn unbounded(interval: Duration) -> Self {
        Self {
            interval,
            max_polls: None,
        }
    }

    fn exhausted(&self, polls: u32) -> bool {
        self.max_polls.is_some_and(|max| polls >= max)
    }
}

/// Upload `path` and poll until the remote file leaves `PROCESSING`.
///
/// Returns the last fetched handle. A `FAILED` handle becomes
/// [`ReelsightError::ProcessingFailed`]; running out of polls becomes
/// [`ReelsightError::ProcessingTimedOut`]. Errors from the store propagate as-is.
pub async fn upload_and_wait<S>(
    store: &S,
    path: &Path,
    mime_type: &str,
    policy: &PollPolicy,
) -> Result<RemoteVideoHandle>
where
    S: VideoStore + ?Sized,
{
    info!(path = %path.display(), mime_type, "uploading video");
    let mut handle = store.upload(path, mime_type).await?;
    let mut polls = 0u32;

    while handle.state == FileState::Processing {
        if policy.exhausted(polls) {
            warn!(name = %handle.name, polls, "giving up on remote processing");
            return Err(ReelsightError::ProcessingTimedOut {
                name: handle.name,
                polls,
            });
        }

        tokio::time::sleep(policy.interval).await;
        let mut fetched = store.get(&handle.name).await?;
        // Status responses may omit the MIME type the upload already reported.
        if fetched.mime_type.is_empty() {
            fetched.mime_type = std::mem::take(&mut handle.mime_type);
        }
        handle = fetched;
        polls += 1;
        debug!(name = %handle.name, state = ?handle.state, polls, "polled remote file");
    }

    if handle.state == FileState::Failed {
        return Err(ReelsightError::ProcessingFailed {
            reason: handle
                .error
                .unwrap_or_else(|| "no reason given".to_string()),
            name: handle.name,
        });
    }

    info!(name = %handle.name, polls, "video ready");
    Ok(handle)
}
