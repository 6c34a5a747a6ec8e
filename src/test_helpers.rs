//! Shared test utilities for the site-metadata test suite.
//!
//! Provides fixture builders for web roots on disk and in-memory trees, so
//! diff and generator tests can run without touching the filesystem.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let input = input_tree(&[
//!     ("1", "1-Summer", &["1", "2"]),
//!     ("2", "2-Empty", &[]),
//! ]);
//! let output = output_tree(&[("1", &["1.thumbnail.jpg", "1.poster.jpg"])]);
//! let d = diff(&input, &output);
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use crate::config::{PathsConfig, SiteConfig, Workspace};
use crate::item::Placeholders;
use crate::naming;
use crate::scan::{InputGallery, InputTree, OutputTree};
use crate::types::{ImageSource, MediaItem, MediaKind, Size};

// =========================================================================
// Web root fixtures
// =========================================================================

/// Create an empty file at a root-relative path, with its parent folders.
pub fn touch(root: &Path, relative: &str) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, "").unwrap();
}

pub fn touch_all(root: &Path, relatives: &[&str]) {
    for relative in relatives {
        touch(root, relative);
    }
}

/// Workspace over `root` with stock config.
pub fn test_workspace(root: &Path) -> Workspace {
    Workspace::new(root, SiteConfig::default(), false)
}

pub fn test_placeholders() -> Placeholders {
    let paths = PathsConfig::default();
    Placeholders {
        audio_thumbnail: ImageSource::new(paths.audio_thumbnail, Size::new(200, 200)),
        audio_poster: ImageSource::new(paths.audio_poster, Size::new(640, 640)),
    }
}

// =========================================================================
// In-memory trees
// =========================================================================

/// An image item as the builder would produce it for a 4000×3000 original.
pub fn test_item(gallery_id: &str, gallery_name: &str, item_id: &str) -> MediaItem {
    let paths = PathsConfig::default();
    let file_name = format!("{item_id}-Photo.jpg");
    MediaItem {
        kind: MediaKind::Image,
        id: item_id.to_string(),
        title: "Photo".to_string(),
        tags: Vec::new(),
        original_path: paths.original(gallery_name, &file_name),
        thumbnail: ImageSource::new(paths.thumbnail(gallery_id, item_id), Size::new(200, 150)),
        poster: ImageSource::new(paths.poster(gallery_id, item_id), Size::new(1500, 1125)),
        gallery_id: gallery_id.to_string(),
        gallery_title: naming::parse_title(gallery_name),
    }
}

/// Input tree from `(gallery id, folder name, item ids)`.
pub fn input_tree(galleries: &[(&str, &str, &[&str])]) -> InputTree {
    let galleries = galleries
        .iter()
        .map(|(gallery_id, name, item_ids)| {
            let items: BTreeMap<String, MediaItem> = item_ids
                .iter()
                .map(|item_id| (item_id.to_string(), test_item(gallery_id, name, item_id)))
                .collect();
            (
                gallery_id.to_string(),
                InputGallery {
                    name: name.to_string(),
                    items,
                },
            )
        })
        .collect();
    InputTree { galleries }
}

/// Output tree from `(gallery id, generated file names)`.
pub fn output_tree(galleries: &[(&str, &[&str])]) -> OutputTree {
    let mut tree = OutputTree::default();
    for (gallery_id, files) in galleries {
        let gallery = tree.galleries.entry(gallery_id.to_string()).or_default();
        for file in *files {
            gallery
                .entry(naming::output_item_id(file).to_string())
                .or_default()
                .insert(file.to_string());
        }
    }
    tree
}

// =========================================================================
// Extractors
// =========================================================================

/// Gallery ids in tree order.
pub fn gallery_ids(tree: &InputTree) -> Vec<&str> {
    tree.galleries.keys().map(String::as_str).collect()
}

/// Item ids in gallery order.
pub fn item_ids(gallery: &InputGallery) -> Vec<&str> {
    gallery.items.keys().map(String::as_str).collect()
}
