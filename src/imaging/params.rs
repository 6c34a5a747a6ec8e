//! Parameter types for transcoding operations.
//!
//! These describe *what* to produce, not *how*. The job planner in
//! [`process`](crate::process) decides which [`Artifact`]s an item needs and
//! hands the matching [`TranscodeParams`] to a
//! [`MediaTranscoder`](super::MediaTranscoder), so tests can swap in a mock
//! backend without touching planning logic.

use super::backend::{MediaTranscoder, TranscodeError};
use crate::types::{MediaKind, Size};
use std::fmt;
use std::path::PathBuf;

/// Full description of one derived file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeParams {
    /// Original media file.
    pub source: PathBuf,
    /// File to create.
    pub output: PathBuf,
    /// Target bounding size (thumbnail or poster size of the item).
    pub size: Size,
}

/// A kind of derived file, one per transcoder operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Artifact {
    ImageThumbnail,
    ImagePoster,
    AudioMp3,
    AudioOgg,
    VideoThumbnail,
    VideoPoster,
    VideoMp4,
    VideoOgv,
    VideoWebm,
}

impl Artifact {
    /// Derived files required for an item of the given kind.
    pub fn required_for(kind: MediaKind) -> &'static [Artifact] {
        match kind {
            MediaKind::Image => &[Artifact::ImageThumbnail, Artifact::ImagePoster],
            MediaKind::Audio => &[Artifact::AudioMp3, Artifact::AudioOgg],
            MediaKind::Video => &[
                Artifact::VideoThumbnail,
                Artifact::VideoPoster,
                Artifact::VideoMp4,
                Artifact::VideoOgv,
                Artifact::VideoWebm,
            ],
            MediaKind::Undefined => &[],
        }
    }

    /// Extension appended to the item's artifact base for renditions.
    ///
    /// `None` for thumbnails and posters, whose path is recorded on the item.
    pub fn rendition_extension(self) -> Option<&'static str> {
        match self {
            Artifact::AudioMp3 => Some("mp3"),
            Artifact::AudioOgg => Some("ogg"),
            Artifact::VideoOgv => Some("ogv"),
            Artifact::VideoMp4 => Some("mp4"),
            Artifact::VideoWebm => Some("webm"),
            Artifact::ImageThumbnail
            | Artifact::ImagePoster
            | Artifact::VideoThumbnail
            | Artifact::VideoPoster => None,
        }
    }

    /// Dispatch to the transcoder operation producing this artifact.
    pub fn run(
        self,
        transcoder: &(impl MediaTranscoder + ?Sized),
        params: &TranscodeParams,
    ) -> Result<(), TranscodeError> {
        match self {
            Artifact::ImageThumbnail => transcoder.image_thumbnail(params),
            Artifact::ImagePoster => transcoder.image_poster(params),
            Artifact::AudioMp3 => transcoder.audio_mp3(params),
            Artifact::AudioOgg => transcoder.audio_ogg(params),
            Artifact::VideoThumbnail => transcoder.video_thumbnail(params),
            Artifact::VideoPoster => transcoder.video_poster(params),
            Artifact::VideoMp4 => transcoder.video_mp4(params),
            Artifact::VideoOgv => transcoder.video_ogv(params),
            Artifact::VideoWebm => transcoder.video_webm(params),
        }
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Artifact::ImageThumbnail | Artifact::VideoThumbnail => "thumbnail",
            Artifact::ImagePoster | Artifact::VideoPoster => "poster",
            Artifact::AudioMp3 => "mp3",
            Artifact::AudioOgg => "ogg",
            Artifact::VideoMp4 => "mp4",
            Artifact::VideoOgv => "ogv",
            Artifact::VideoWebm => "webm",
        };
        f.write_str(name)
    }
}
