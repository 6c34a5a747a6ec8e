//! Change detection between the input tree and the previously generated output.
//!
//! Pure set arithmetic over gallery and item ids:
//!
//! ```text
//! new galleries      = input − output
//! modified galleries = input ∩ output, each with
//!     new items      = input items − output items
//!     removed items  = output items − input items
//! removed galleries  = output − input
//! ```
//!
//! Every list is in lexicographic id order (`"10"` sorts before `"9"`), which
//! is the order consumers of the feed and JSON files see.

use crate::scan::{InputTree, OutputTree};

/// Item-level changes of a gallery present on both sides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GalleryChanges {
    pub id: String,
    pub new_items: Vec<String>,
    pub removed_items: Vec<String>,
}

impl GalleryChanges {
    pub fn has_changes(&self) -> bool {
        !self.new_items.is_empty() || !self.removed_items.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeDiff {
    pub new_galleries: Vec<String>,
    /// Every gallery present on both sides, changed or not.
    pub modified_galleries: Vec<GalleryChanges>,
    pub removed_galleries: Vec<String>,
}

impl TreeDiff {
    /// Nothing to add or remove.
    pub fn is_empty(&self) -> bool {
        self.new_galleries.is_empty()
            && self.removed_galleries.is_empty()
            && !self.modified_galleries.iter().any(GalleryChanges::has_changes)
    }

    /// Galleries on both sides that gained or lost items.
    pub fn changed_galleries(&self) -> impl Iterator<Item = &GalleryChanges> {
        self.modified_galleries.iter().filter(|g| g.has_changes())
    }
}

/// Compare the two trees. Neither is modified.
pub fn diff(input: &InputTree, output: &OutputTree) -> TreeDiff {
    let mut result = TreeDiff::default();

    for (gallery_id, gallery) in &input.galleries {
        match output.galleries.get(gallery_id) {
            None => result.new_galleries.push(gallery_id.clone()),
            Some(generated) => result.modified_galleries.push(GalleryChanges {
                id: gallery_id.clone(),
                new_items: gallery
                    .items
                    .keys()
                    .filter(|id| !generated.contains_key(*id))
                    .cloned()
                    .collect(),
                removed_items: generated
                    .keys()
                    .filter(|id| !gallery.items.contains_key(*id))
                    .cloned()
                    .collect(),
            }),
        }
    }

    result.removed_galleries = output
        .galleries
        .keys()
        .filter(|id| !input.galleries.contains_key(*id))
        .cloned()
        .collect();

    result
}

// =============================================================================
// Preview with collapse
// =============================================================================

/// Thresholds of a collapsed listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewLimits {
    /// Items always listed individually.
    pub min_shown: usize,
    /// Smallest remainder worth collapsing into an "N more" marker.
    pub min_collapsed: usize,
}

impl PreviewLimits {
    /// RSS item descriptions.
    pub const RSS: Self = Self {
        min_shown: 5,
        min_collapsed: 3,
    };
    /// `news.json` entries.
    pub const NEWS: Self = Self {
        min_shown: 10,
        min_collapsed: 5,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preview<'a, T> {
    pub shown: &'a [T],
    /// Size of the collapsed remainder, 0 when everything is shown.
    pub not_listed: usize,
}

/// Split `items` into the listed head and a collapsed tail.
///
/// Walking the items, index `i` is listed while `i < min_shown` or
/// `i + min_collapsed > total`; the first index failing both collapses the
/// rest. That index is always `min_shown`, so with the RSS limits (5/3):
///
/// ```text
/// total 7 → 7 shown
/// total 8 → 5 shown, 3 more
/// total 9 → 5 shown, 4 more
/// ```
pub fn preview<T>(items: &[T], limits: PreviewLimits) -> Preview<'_, T> {
    let total = items.len();
    if total >= limits.min_shown + limits.min_collapsed {
        Preview {
            shown: &items[..limits.min_shown],
            not_listed: total - limits.min_shown,
        }
    } else {
        Preview {
            shown: items,
            not_listed: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;

    #[test]
    fn partitions_galleries_and_items() {
        let input = input_tree(&[
            ("1", "1-Kept", &["1", "2", "3"]),
            ("2", "2-Fresh", &["1"]),
        ]);
        let output = output_tree(&[
            ("1", &["1.thumbnail.jpg", "1.poster.jpg", "4.mp3"]),
            ("9", &["1.thumbnail.jpg"]),
        ]);

        let d = diff(&input, &output);

        assert_eq!(d.new_galleries, vec!["2"]);
        assert_eq!(d.removed_galleries, vec!["9"]);
        assert_eq!(
            d.modified_galleries,
            vec![GalleryChanges {
                id: "1".into(),
                new_items: vec!["2".into(), "3".into()],
                removed_items: vec!["4".into()],
            }]
        );
        assert!(!d.is_empty());
    }

    #[test]
    fn ids_are_ordered_lexicographically() {
        let input = input_tree(&[
            ("9", "9-Nine", &[]),
            ("10", "10-Ten", &["2", "10", "1"]),
        ]);
        let d = diff(&input, &OutputTree::default());
        assert_eq!(d.new_galleries, vec!["10", "9"]);

        let output = output_tree(&[("10", &[]), ("9", &[])]);
        let d = diff(&input, &output);
        assert_eq!(d.modified_galleries[0].id, "10");
        assert_eq!(d.modified_galleries[0].new_items, vec!["1", "10", "2"]);
    }

    #[test]
    fn unchanged_trees_have_empty_diff() {
        let input = input_tree(&[("1", "1-A", &["1", "2"]), ("2", "2-B", &["5"])]);
        let output = output_tree(&[
            ("1", &["1.thumbnail.jpg", "2.mp3", "2.ogg"]),
            ("2", &["5.webm"]),
        ]);

        let first = diff(&input, &output);
        let second = diff(&input, &output);
        assert!(first.is_empty());
        assert_eq!(first, second);
        assert!(first.new_galleries.is_empty());
        assert!(first.removed_galleries.is_empty());
        assert_eq!(first.changed_galleries().count(), 0);
        // Unchanged galleries on both sides are still listed
        assert_eq!(first.modified_galleries.len(), 2);
    }

    #[test]
    fn first_run_everything_is_new() {
        let input = input_tree(&[("1", "1-A", &["1"]), ("2", "2-B", &[])]);
        let d = diff(&input, &OutputTree::default());
        assert_eq!(d.new_galleries, vec!["1", "2"]);
        assert!(d.modified_galleries.is_empty());
    }

    fn shown_and_more(total: usize, limits: PreviewLimits) -> (usize, usize) {
        let items: Vec<usize> = (0..total).collect();
        let p = preview(&items, limits);
        (p.shown.len(), p.not_listed)
    }

    #[test]
    fn rss_preview_boundaries() {
        assert_eq!(shown_and_more(0, PreviewLimits::RSS), (0, 0));
        assert_eq!(shown_and_more(5, PreviewLimits::RSS), (5, 0));
        assert_eq!(shown_and_more(7, PreviewLimits::RSS), (7, 0));
        assert_eq!(shown_and_more(8, PreviewLimits::RSS), (5, 3));
        assert_eq!(shown_and_more(9, PreviewLimits::RSS), (5, 4));
        assert_eq!(shown_and_more(100, PreviewLimits::RSS), (5, 95));
    }

    #[test]
    fn news_preview_boundaries() {
        assert_eq!(shown_and_more(14, PreviewLimits::NEWS), (14, 0));
        assert_eq!(shown_and_more(15, PreviewLimits::NEWS), (10, 5));
        assert_eq!(shown_and_more(16, PreviewLimits::NEWS), (10, 6));
    }

    #[test]
    fn preview_matches_item_by_item_walk() {
        // Reference walk: list while i < shown || i + collapsed > total
        for limits in [PreviewLimits::RSS, PreviewLimits::NEWS] {
            for total in 0..40 {
                let mut listed = 0;
                let mut more = 0;
                for i in 0..total {
                    if i < limits.min_shown || i + limits.min_collapsed > total {
                        listed += 1;
                    } else {
                        more = total - i;
                        break;
                    }
                }
                assert_eq!(shown_and_more(total, limits), (listed, more), "total {total}");
            }
        }
    }

    #[test]
    fn preview_keeps_head_order() {
        let items = ["a", "b", "c", "d", "e", "f", "g", "h"];
        let p = preview(&items, PreviewLimits::RSS);
        assert_eq!(p.shown, &["a", "b", "c", "d", "e"]);
    }
}
