use std::{
    io::Write,
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;
use tokio::fs;

use crate::error::{ReelsightError, Result};

pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["mp4", "mov", "avi"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoFormat {
    Mp4,
    Mov,
    Avi,
}

impl VideoFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "mp4" => Some(VideoFormat::Mp4),
            "mov" => Some(VideoFormat::Mov),
            "avi" => Some(VideoFormat::Avi),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            VideoFormat::Mp4 => "mp4",
            VideoFormat::Mov => "mov",
            VideoFormat::Avi => "avi",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            VideoFormat::Mp4 => "video/mp4",
            VideoFormat::Mov => "video/quicktime",
            VideoFormat::Avi => "video/x-msvideo",
        }
    }
}

/// A video handed over by the user, held in memory for one analysis.
#[derive(Debug, Clone)]
pub struct UploadedVideo {
    file_name: String,
    format: VideoFormat,
    bytes: Vec<u8>,
}

impl UploadedVideo {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        let file_name = file_name.into();
        let format = VideoFormat::from_path(Path::new(&file_name)).ok_or_else(|| {
            ReelsightError::UnsupportedFormat {
                file_name: file_name.clone(),
            }
        })?;

        Ok(Self {
            file_name,
            format,
            bytes,
        })
    }

    pub async fn from_path(path: &Path) -> Result<Self> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        // Reject the extension before reading a possibly large file.
        if VideoFormat::from_path(path).is_none() {
            return Err(ReelsightError::UnsupportedFormat { file_name });
        }
        let bytes = fs::read(path).await?;
        Self::new(file_name, bytes)
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn format(&self) -> VideoFormat {
        self.format
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn ensure_not_empty(&self) -> Result<()> {
        if self.is_empty() {
            return Err(ReelsightError::EmptyVideo {
                file_name: self.file_name.clone(),
            });
        }
        Ok(())
    }
}

/// Temporary on-disk copy of an [`UploadedVideo`]. The file is removed when
/// this value is dropped.
#[derive(Debug)]
pub struct StagedVideo {
    file: NamedTempFile,
}

impl StagedVideo {
    pub fn write(video: &UploadedVideo, dir: Option<&Path>) -> Result<Self> {
        let suffix = format!(".{}", video.format().extension());
        let mut builder = tempfile::Builder::new();
        builder.prefix("reelsight-").suffix(&suffix);

        let mut file = match dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(video.bytes())?;
        file.flush()?;

        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn to_path_buf(&self) -> PathBuf {
        self.file.path().to_path_buf()
    }
}
