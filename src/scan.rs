//! Input and output tree scanning.
//!
//! Two independent, read-only views of the web root:
//!
//! ```text
//! site-data/galleries/                 # Input tree
//! ├── 3-Summer/                        # Gallery folder: ID-TITLE
//! │   ├── 1-beach-Dawn.jpg             # Item: ID-TAG-...-TAG-TITLE.ext
//! │   ├── 2-Waves.mp4
//! │   └── 3-live-Song.mp3
//! └── 4-Winter/
//!     └── 1-Snow.jpg
//!
//! site-metadata/galleries/             # Output tree (from a previous run)
//! ├── 3.json                           # Gallery index, not a folder: ignored
//! └── 3/                               # Gallery folder named by id
//!     ├── 1.thumbnail.jpg              # Item id = text before the first dot
//!     ├── 1.poster.jpg
//!     └── 2.mp4
//! ```
//!
//! Entries are visited in file-name order, so every "last wins" conflict
//! resolution is deterministic: for two folders sharing an id, the one that
//! sorts later replaces the earlier one. Conflicts are logged as an error
//! followed by a warning and never abort the scan.

use crate::config::Workspace;
use crate::imaging::SizeProbe;
use crate::item::ItemBuilder;
use crate::naming;
use crate::types::MediaItem;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, error, warn};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cannot list directory: {0}")]
    Walk(#[from] walkdir::Error),
}

/// One gallery of the input tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputGallery {
    /// Raw folder name, e.g. `3-Summer`.
    pub name: String,
    /// Items keyed by item id.
    pub items: BTreeMap<String, MediaItem>,
}

impl InputGallery {
    pub fn title(&self) -> String {
        naming::parse_title(&self.name)
    }

    /// Item with the greatest id, `None` for an empty gallery.
    pub fn last_item(&self) -> Option<&MediaItem> {
        self.items.values().next_back()
    }
}

/// Galleries found under the input root, keyed by gallery id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputTree {
    pub galleries: BTreeMap<String, InputGallery>,
}

impl InputTree {
    pub fn item(&self, gallery_id: &str, item_id: &str) -> Option<&MediaItem> {
        self.galleries.get(gallery_id)?.items.get(item_id)
    }

    /// Folder name of a gallery, falling back to its id.
    pub fn gallery_name<'a>(&'a self, gallery_id: &'a str) -> &'a str {
        self.galleries
            .get(gallery_id)
            .map(|g| g.name.as_str())
            .unwrap_or(gallery_id)
    }
}

/// Generated file names of one output gallery, grouped by item id.
pub type OutputGallery = BTreeMap<String, BTreeSet<String>>;

/// Galleries found under the output root, keyed by gallery id (= folder name).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputTree {
    pub galleries: BTreeMap<String, OutputGallery>,
}

impl OutputTree {
    /// Whether `file_name` was already generated for the item.
    pub fn contains_file(&self, gallery_id: &str, item_id: &str, file_name: &str) -> bool {
        self.galleries
            .get(gallery_id)
            .and_then(|items| items.get(item_id))
            .is_some_and(|files| files.contains(file_name))
    }

    /// Total number of files registered in a gallery.
    pub fn file_count(&self, gallery_id: &str) -> usize {
        self.galleries
            .get(gallery_id)
            .map(|items| items.values().map(BTreeSet::len).sum())
            .unwrap_or(0)
    }
}

/// Names of the direct children of `dir`, in file-name order.
fn list_children(dir: &Path, directories: bool) -> Result<Vec<String>, ScanError> {
    let mut names = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry?;
        let file_type = entry.file_type();
        let wanted = if directories {
            file_type.is_dir()
        } else {
            file_type.is_file()
        };
        if wanted {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
    }
    Ok(names)
}

// =============================================================================
// Input tree
// =============================================================================

/// Scan the input galleries folder, building one item per supported file.
///
/// Per-item failures (no id, failed probe) skip the item; unsupported
/// extensions are ignored. Both are logged.
pub fn scan_input<P: SizeProbe + ?Sized>(
    builder: &ItemBuilder<'_, P>,
) -> Result<InputTree, ScanError> {
    let root = builder.workspace().input_galleries_dir();
    let mut tree = InputTree::default();

    for gallery_name in list_children(&root, true)? {
        debug!("In gallery: {}", gallery_name);
        let Some(gallery_id) = naming::parse_id(&gallery_name) else {
            error!("Gallery folder \"{}\" has no numeric id", gallery_name);
            warn!("Rename it to ID-TITLE, the folder is skipped");
            continue;
        };
        let gallery = scan_input_gallery(builder, &root, &gallery_id, &gallery_name)?;
        if let Some(previous) = tree.galleries.insert(gallery_id.clone(), gallery) {
            error!("Gallery id {} already exists", gallery_id);
            warn!(
                "Gallery \"{}\" will be unavailable in favor of \"{}\"",
                previous.name, gallery_name
            );
        }
    }

    log_input_tree(&tree, &root);
    Ok(tree)
}

fn scan_input_gallery<P: SizeProbe + ?Sized>(
    builder: &ItemBuilder<'_, P>,
    root: &Path,
    gallery_id: &str,
    gallery_name: &str,
) -> Result<InputGallery, ScanError> {
    let mut gallery = InputGallery {
        name: gallery_name.to_string(),
        items: BTreeMap::new(),
    };

    for file_name in list_children(&root.join(gallery_name), false)? {
        debug!("In    item: {}", file_name);
        let item = match builder.build(gallery_id, gallery_name, &file_name) {
            Ok(item) => item,
            Err(e) => {
                error!("{}", e);
                warn!(
                    "File \"{}\" in gallery \"{}\" is skipped",
                    file_name, gallery_name
                );
                continue;
            }
        };
        if !item.is_indexable() {
            error!("Ignored unsupported media type \"{}\"", file_name);
            continue;
        }
        let item_id = item.id.clone();
        let original = item.original_path.clone();
        if let Some(previous) = gallery.items.insert(item_id.clone(), item) {
            error!(
                "Gallery id {} already has item with id {}",
                gallery_id, item_id
            );
            warn!(
                "File \"{}\" will be unavailable in favor of \"{}\"",
                previous.original_path, original
            );
        }
    }

    Ok(gallery)
}

fn log_input_tree(tree: &InputTree, root: &Path) {
    debug!("Gallery items in folder \"{}\":", root.display());
    for gallery in tree.galleries.values() {
        debug!("    \"{}\"", gallery.name);
        for item in gallery.items.values() {
            debug!("        \"{}\"", item.original_file_name());
        }
    }
}

// =============================================================================
// Output tree
// =============================================================================

/// Scan previously generated output. A missing output folder is a first run.
pub fn scan_output(workspace: &Workspace) -> Result<OutputTree, ScanError> {
    let root = workspace.output_galleries_dir();
    let mut tree = OutputTree::default();
    if !root.is_dir() {
        debug!("No output folder \"{}\" yet", root.display());
        return Ok(tree);
    }

    for gallery_id in list_children(&root, true)? {
        debug!("Out gallery: {}", gallery_id);
        let mut items = OutputGallery::new();
        for file_name in list_children(&root.join(&gallery_id), false)? {
            debug!("Out    item: {}", file_name);
            let item_id = naming::output_item_id(&file_name).to_string();
            items.entry(item_id).or_default().insert(file_name);
        }
        tree.galleries.insert(gallery_id, items);
    }

    log_output_tree(&tree, &root);
    Ok(tree)
}

fn log_output_tree(tree: &OutputTree, root: &Path) {
    debug!("Gallery items in folder \"{}\":", root.display());
    for (gallery_id, items) in &tree.galleries {
        debug!("    \"{}\"", gallery_id);
        for (item_id, files) in items {
            debug!("        \"{}\"", item_id);
            for file in files {
                debug!("            \"{}\"", file);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::MockBackend;
    use crate::test_helpers::*;
    use crate::types::{MediaKind, Size};
    use tempfile::TempDir;

    fn probe_for(names: &[&str]) -> MockBackend {
        names.iter().fold(MockBackend::new(), |backend, name| {
            backend.with_size(name, Size::new(800, 600))
        })
    }

    #[test]
    fn scans_galleries_and_items_in_order() {
        let tmp = TempDir::new().unwrap();
        touch_all(
            tmp.path(),
            &[
                "site-data/galleries/3-Summer/2-Waves.mp4",
                "site-data/galleries/3-Summer/1-beach-Dawn.jpg",
                "site-data/galleries/3-Summer/3-live-Song.mp3",
                "site-data/galleries/10-Winter/1-Snow.jpg",
                "site-data/galleries/README.txt",
            ],
        );
        let ws = test_workspace(tmp.path());
        let ph = test_placeholders();
        let probe = probe_for(&["1-beach-Dawn.jpg", "2-Waves.mp4", "1-Snow.jpg"]);

        let tree = scan_input(&ItemBuilder::new(&ws, &ph, &probe)).unwrap();

        // Lexicographic, not numeric
        assert_eq!(gallery_ids(&tree), vec!["10", "3"]);
        let summer = &tree.galleries["3"];
        assert_eq!(summer.name, "3-Summer");
        assert_eq!(summer.title(), "Summer");
        assert_eq!(item_ids(summer), vec!["1", "2", "3"]);
        assert_eq!(summer.items["2"].kind, MediaKind::Video);
        assert_eq!(summer.items["3"].kind, MediaKind::Audio);
        assert_eq!(summer.last_item().map(|i| i.id.as_str()), Some("3"));
    }

    #[test]
    fn unsupported_and_broken_items_are_skipped() {
        let tmp = TempDir::new().unwrap();
        touch_all(
            tmp.path(),
            &[
                "site-data/galleries/3-Summer/1-Dawn.jpg",
                "site-data/galleries/3-Summer/2-notes.txt",
                "site-data/galleries/3-Summer/12.jpg",
                "site-data/galleries/3-Summer/4-Unprobed.jpg",
            ],
        );
        let ws = test_workspace(tmp.path());
        let ph = test_placeholders();
        let probe = probe_for(&["1-Dawn.jpg", "12.jpg"]);

        let tree = scan_input(&ItemBuilder::new(&ws, &ph, &probe)).unwrap();
        assert_eq!(item_ids(&tree.galleries["3"]), vec!["1"]);
    }

    #[test]
    fn subfolders_inside_gallery_are_ignored() {
        let tmp = TempDir::new().unwrap();
        touch_all(
            tmp.path(),
            &[
                "site-data/galleries/3-Summer/1-Dawn.jpg",
                "site-data/galleries/3-Summer/9-raw/9-Raw.jpg",
            ],
        );
        let ws = test_workspace(tmp.path());
        let ph = test_placeholders();
        let probe = probe_for(&["1-Dawn.jpg", "9-Raw.jpg"]);

        let tree = scan_input(&ItemBuilder::new(&ws, &ph, &probe)).unwrap();
        assert_eq!(item_ids(&tree.galleries["3"]), vec!["1"]);
    }

    #[test]
    fn duplicate_gallery_id_last_scanned_wins() {
        let tmp = TempDir::new().unwrap();
        touch_all(
            tmp.path(),
            &[
                "site-data/galleries/3-Alpha/1-A.jpg",
                "site-data/galleries/3-Beta/2-B.jpg",
            ],
        );
        let ws = test_workspace(tmp.path());
        let ph = test_placeholders();
        let probe = probe_for(&["1-A.jpg", "2-B.jpg"]);

        let tree = scan_input(&ItemBuilder::new(&ws, &ph, &probe)).unwrap();
        assert_eq!(tree.galleries.len(), 1);
        assert_eq!(tree.galleries["3"].name, "3-Beta");
        assert_eq!(item_ids(&tree.galleries["3"]), vec!["2"]);
    }

    #[test]
    fn duplicate_item_id_last_scanned_wins() {
        let tmp = TempDir::new().unwrap();
        touch_all(
            tmp.path(),
            &[
                "site-data/galleries/3-Summer/1-Alpha.jpg",
                "site-data/galleries/3-Summer/1-Beta.jpg",
            ],
        );
        let ws = test_workspace(tmp.path());
        let ph = test_placeholders();
        let probe = probe_for(&["1-Alpha.jpg", "1-Beta.jpg"]);

        let tree = scan_input(&ItemBuilder::new(&ws, &ph, &probe)).unwrap();
        let summer = &tree.galleries["3"];
        assert_eq!(summer.items.len(), 1);
        assert_eq!(summer.items["1"].title, "Beta");
    }

    #[test]
    fn gallery_folder_without_id_is_skipped() {
        let tmp = TempDir::new().unwrap();
        touch_all(
            tmp.path(),
            &[
                "site-data/galleries/Drafts/1-A.jpg",
                "site-data/galleries/4-Winter/1-Snow.jpg",
            ],
        );
        let ws = test_workspace(tmp.path());
        let ph = test_placeholders();
        let probe = probe_for(&["1-A.jpg", "1-Snow.jpg"]);

        let tree = scan_input(&ItemBuilder::new(&ws, &ph, &probe)).unwrap();
        assert_eq!(gallery_ids(&tree), vec!["4"]);
    }

    #[test]
    fn empty_gallery_has_no_last_item() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("site-data/galleries/5-Empty")).unwrap();
        let ws = test_workspace(tmp.path());
        let ph = test_placeholders();
        let probe = MockBackend::new();

        let tree = scan_input(&ItemBuilder::new(&ws, &ph, &probe)).unwrap();
        assert!(tree.galleries["5"].last_item().is_none());
    }

    #[test]
    fn missing_input_galleries_folder_is_error() {
        let tmp = TempDir::new().unwrap();
        let ws = test_workspace(tmp.path());
        let ph = test_placeholders();
        let probe = MockBackend::new();
        assert!(scan_input(&ItemBuilder::new(&ws, &ph, &probe)).is_err());
    }

    #[test]
    fn missing_output_folder_is_first_run() {
        let tmp = TempDir::new().unwrap();
        let tree = scan_output(&test_workspace(tmp.path())).unwrap();
        assert!(tree.galleries.is_empty());
    }

    #[test]
    fn output_files_grouped_by_item_id() {
        let tmp = TempDir::new().unwrap();
        touch_all(
            tmp.path(),
            &[
                "site-metadata/galleries/3.json",
                "site-metadata/galleries/3/1.thumbnail.jpg",
                "site-metadata/galleries/3/1.poster.jpg",
                "site-metadata/galleries/3/2.mp4",
                "site-metadata/galleries/3/2.webm",
                "site-metadata/galleries/3/10.mp3",
                "site-metadata/galleries/7/1.thumbnail.jpg",
            ],
        );

        let tree = scan_output(&test_workspace(tmp.path())).unwrap();

        assert_eq!(tree.galleries.keys().collect::<Vec<_>>(), vec!["3", "7"]);
        let summer = &tree.galleries["3"];
        assert_eq!(summer.keys().collect::<Vec<_>>(), vec!["1", "10", "2"]);
        assert!(tree.contains_file("3", "1", "1.poster.jpg"));
        assert!(!tree.contains_file("3", "1", "1.mp4"));
        assert!(!tree.contains_file("9", "1", "1.poster.jpg"));
        assert_eq!(tree.file_count("3"), 5);
        assert_eq!(tree.file_count("9"), 0);
    }
}
