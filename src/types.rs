//! Shared item model.
//!
//! These types are what the JSON index files carry to the web front end, so
//! their serialized field names are a contract: `type`, `id`, `title`, `tags`,
//! `original`, `thumbnail`, `poster`, `galleryId`, `galleryTitle`.

use serde::Serialize;
use std::fmt;

/// Pixel dimensions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Strictly wider than tall. Squares count as portrait.
    pub fn is_landscape(self) -> bool {
        self.width > self.height
    }
}

impl From<[u32; 2]> for Size {
    fn from([width, height]: [u32; 2]) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A raster asset referenced by an item (thumbnail or poster).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImageSource {
    /// Web-root-relative path, forward slashes.
    pub path: String,
    pub width: u32,
    pub height: u32,
}

impl ImageSource {
    pub fn new(path: impl Into<String>, size: Size) -> Self {
        Self {
            path: path.into(),
            width: size.width,
            height: size.height,
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Final path component, used to match against already generated files.
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// Media kind, selected by file extension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum MediaKind {
    Image,
    Video,
    Audio,
    /// Unsupported extension; such items are never indexed.
    #[default]
    #[serde(rename = "")]
    Undefined,
}

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];
const VIDEO_EXTENSIONS: &[&str] = &["avi", "mp4", "ogv", "webm", "mov"];
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "ogg"];

impl MediaKind {
    /// Kind for an extension given without the leading dot, case-insensitive.
    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.to_ascii_lowercase();
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            MediaKind::Image
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            MediaKind::Video
        } else if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
            MediaKind::Audio
        } else {
            MediaKind::Undefined
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
            MediaKind::Undefined => "undefined",
        };
        f.write_str(name)
    }
}

/// One media asset of a gallery.
///
/// Built once per source file while scanning and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    #[serde(rename = "type")]
    pub kind: MediaKind,
    /// Digit string, unique within the owning gallery.
    pub id: String,
    pub title: String,
    pub tags: Vec<String>,
    /// Web-root-relative path of the source file.
    #[serde(rename = "original")]
    pub original_path: String,
    pub thumbnail: ImageSource,
    pub poster: ImageSource,
    pub gallery_id: String,
    pub gallery_title: String,
}

impl MediaItem {
    pub fn is_indexable(&self) -> bool {
        self.kind != MediaKind::Undefined
    }

    /// File name of the original, for display.
    pub fn original_file_name(&self) -> &str {
        self.original_path
            .rsplit('/')
            .next()
            .unwrap_or(&self.original_path)
    }
}
