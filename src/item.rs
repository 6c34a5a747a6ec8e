//! Item model builder.
//!
//! Turns one file of an input gallery into a [`MediaItem`]: the kind comes
//! from the extension, id/title/tags from the file name, and the thumbnail
//! and poster geometry from the probed original.
//!
//! | Kind | Probed | Thumbnail box | Poster box |
//! |---|---|---|---|
//! | Image | yes | `limits.thumbnail` | `limits.image_poster` |
//! | Video | yes | `limits.thumbnail` | `limits.video` |
//! | Audio | no | placeholder as-is | placeholder as-is |
//!
//! Files with an unknown extension become an `Undefined` item which the
//! scanner skips.

use crate::config::Workspace;
use crate::imaging::{SizeProbe, TranscodeError, shrink};
use crate::naming;
use crate::types::{ImageSource, MediaItem, MediaKind, Size};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ItemError {
    #[error("No numeric id in file name \"{0}\"")]
    MissingId(String),
    #[error("Cannot read dimensions of \"{path}\": {source}")]
    Probe {
        path: String,
        #[source]
        source: TranscodeError,
    },
}

/// Predefined images shown for audio items, probed once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholders {
    pub audio_thumbnail: ImageSource,
    pub audio_poster: ImageSource,
}

impl Placeholders {
    pub fn probe(
        workspace: &Workspace,
        probe: &(impl SizeProbe + ?Sized),
    ) -> Result<Self, ItemError> {
        let paths = workspace.paths();
        Ok(Self {
            audio_thumbnail: probe_asset(workspace, probe, &paths.audio_thumbnail)?,
            audio_poster: probe_asset(workspace, probe, &paths.audio_poster)?,
        })
    }
}

fn probe_asset(
    workspace: &Workspace,
    probe: &(impl SizeProbe + ?Sized),
    path: &str,
) -> Result<ImageSource, ItemError> {
    let size = probe
        .size(&workspace.resolve(path), MediaKind::Image)
        .map_err(|source| ItemError::Probe {
            path: path.to_string(),
            source,
        })?;
    Ok(ImageSource::new(path, size))
}

/// Split `name.ext` at the last dot. Dotfiles and names without a dot have no extension.
pub fn split_extension(file_name: &str) -> (&str, &str) {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, ext),
        _ => (file_name, ""),
    }
}

fn shrink_into(original: Size, [max_width, max_height]: [u32; 2]) -> Size {
    shrink(original, max_width, max_height)
}

/// Builds [`MediaItem`]s for one run. Read-only apart from the probe calls.
pub struct ItemBuilder<'a, P: SizeProbe + ?Sized> {
    workspace: &'a Workspace,
    placeholders: &'a Placeholders,
    probe: &'a P,
}

impl<'a, P: SizeProbe + ?Sized> ItemBuilder<'a, P> {
    pub fn new(workspace: &'a Workspace, placeholders: &'a Placeholders, probe: &'a P) -> Self {
        Self {
            workspace,
            placeholders,
            probe,
        }
    }

    pub fn workspace(&self) -> &Workspace {
        self.workspace
    }

    /// Build the item for `file_name` inside the gallery folder `gallery_name`.
    ///
    /// Returns an `Undefined` item (only `original_path` set) for unsupported
    /// extensions. A missing id or a failed probe is an error for this item.
    pub fn build(
        &self,
        gallery_id: &str,
        gallery_name: &str,
        file_name: &str,
    ) -> Result<MediaItem, ItemError> {
        let paths = self.workspace.paths();
        let original = paths.original(gallery_name, file_name);
        let (stem, ext) = split_extension(file_name);
        let kind = MediaKind::from_extension(ext);
        if kind == MediaKind::Undefined {
            return Ok(MediaItem {
                original_path: original,
                ..Default::default()
            });
        }

        let parsed = naming::parse_entry_name(stem);
        let id = parsed
            .id
            .ok_or_else(|| ItemError::MissingId(file_name.to_string()))?;

        let (thumbnail, poster) = match kind {
            MediaKind::Image | MediaKind::Video => {
                let size = self
                    .probe
                    .size(&self.workspace.resolve(&original), kind)
                    .map_err(|source| ItemError::Probe {
                        path: original.clone(),
                        source,
                    })?;
                let limits = &self.workspace.config.limits;
                let poster_box = if kind == MediaKind::Image {
                    limits.image_poster
                } else {
                    limits.video
                };
                (
                    ImageSource::new(
                        paths.thumbnail(gallery_id, &id),
                        shrink_into(size, limits.thumbnail),
                    ),
                    ImageSource::new(paths.poster(gallery_id, &id), shrink_into(size, poster_box)),
                )
            }
            // Undefined returned above
            MediaKind::Audio | MediaKind::Undefined => (
                self.placeholders.audio_thumbnail.clone(),
                self.placeholders.audio_poster.clone(),
            ),
        };

        Ok(MediaItem {
            kind,
            id,
            title: parsed.title,
            tags: parsed.tags,
            original_path: original,
            thumbnail,
            poster,
            gallery_id: gallery_id.to_string(),
            gallery_title: naming::parse_title(gallery_name),
        })
    }
}
