//! Media capability traits and shared error type.
//!
//! Two seams separate the metadata logic from real media tools:
//!
//! - [`SizeProbe`] reads the pixel dimensions of an original while the input
//!   tree is scanned.
//! - [`MediaTranscoder`] produces derived files, one method per artifact.
//!
//! The production implementation of both is
//! [`CommandBackend`](super::command_backend::CommandBackend). Tests use the
//! recording [`MockBackend`](tests::MockBackend).

use super::params::TranscodeParams;
use crate::types::{MediaKind, Size};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TranscodeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("{tool} failed with {status} for {}", output.display())]
    ToolFailed {
        tool: String,
        status: std::process::ExitStatus,
        output: PathBuf,
    },
    #[error("Cannot read dimensions of {}: {reason}", path.display())]
    Probe { path: PathBuf, reason: String },
    #[error("No dimensions for {kind} media: {}", path.display())]
    UnsupportedKind { kind: MediaKind, path: PathBuf },
}

/// Reads the dimensions of an original media file.
pub trait SizeProbe: Sync {
    fn size(&self, path: &Path, kind: MediaKind) -> Result<Size, TranscodeError>;
}

/// Produces derived files from an original.
///
/// Every method writes exactly `params.output` and nothing else, so jobs for
/// different outputs can run concurrently.
pub trait MediaTranscoder: Sync {
    /// JPEG thumbnail of an image, fitted into `params.size`.
    fn image_thumbnail(&self, params: &TranscodeParams) -> Result<(), TranscodeError>;

    /// JPEG poster of an image, fitted into `params.size`.
    fn image_poster(&self, params: &TranscodeParams) -> Result<(), TranscodeError>;

    /// MP3 rendition of an audio file.
    fn audio_mp3(&self, params: &TranscodeParams) -> Result<(), TranscodeError>;

    /// Ogg Vorbis rendition of an audio file.
    fn audio_ogg(&self, params: &TranscodeParams) -> Result<(), TranscodeError>;

    /// First frame of a video, scaled and watermarked.
    fn video_thumbnail(&self, params: &TranscodeParams) -> Result<(), TranscodeError>;

    /// First frame of a video, scaled.
    fn video_poster(&self, params: &TranscodeParams) -> Result<(), TranscodeError>;

    /// H.264/AAC rendition scaled to the poster size.
    fn video_mp4(&self, params: &TranscodeParams) -> Result<(), TranscodeError>;

    /// Theora/Vorbis rendition scaled to the poster size.
    fn video_ogv(&self, params: &TranscodeParams) -> Result<(), TranscodeError>;

    /// VP8/Vorbis rendition scaled to the poster size.
    fn video_webm(&self, params: &TranscodeParams) -> Result<(), TranscodeError>;
}
