//! CLI output formatting.
//!
//! # Statistics
//!
//! Running without action flags prints what an update would change:
//!
//! ```text
//! New galleries (*):
//!     "3-Summer" (3 items/files)
//!
//! New items in existing galleries (*):
//!     "1-Kept" (1 items/files)
//!         "2-beach-Dawn.jpg"
//!
//! Removed galleries (**):
//!     "9" (2 items / 5 files)
//!
//! Deleted items in existing galleries (**):
//!     "1-Kept" (1 items / 2 files)
//!         "4-???"
//!             "4.mp3"
//!             "4.ogg"
//!
//! *) RUN with any combination of arguments (--rss, --json, --media) to update site metadata.
//! **) DELETE files/folders manually from "/web/site-metadata/galleries"
//! ```
//!
//! # Architecture
//!
//! Each report has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::config::Workspace;
use crate::diff::TreeDiff;
use crate::process::ProcessReport;
use crate::scan::{InputTree, OutputTree};

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn quoted(depth: usize, text: &str) -> String {
    format!("{}\"{}\"", indent(depth), text)
}

/// Statistics of a run without action flags.
pub fn format_statistics(
    workspace: &Workspace,
    input: &InputTree,
    output: &OutputTree,
    diff: &TreeDiff,
) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push("New galleries (*):".to_string());
    for gallery_id in &diff.new_galleries {
        let count = input
            .galleries
            .get(gallery_id)
            .map(|g| g.items.len())
            .unwrap_or(0);
        lines.push(format!(
            "{} ({count} items/files)",
            quoted(1, input.gallery_name(gallery_id))
        ));
    }

    lines.push(String::new());
    lines.push("New items in existing galleries (*):".to_string());
    for changes in diff.modified_galleries.iter().filter(|g| !g.new_items.is_empty()) {
        lines.push(format!(
            "{} ({} items/files)",
            quoted(1, input.gallery_name(&changes.id)),
            changes.new_items.len()
        ));
        for item_id in &changes.new_items {
            if let Some(item) = input.item(&changes.id, item_id) {
                lines.push(quoted(2, item.original_file_name()));
            }
        }
    }

    lines.push(String::new());
    lines.push("Removed galleries (**):".to_string());
    for gallery_id in &diff.removed_galleries {
        let items = output.galleries.get(gallery_id).map(|g| g.len()).unwrap_or(0);
        lines.push(format!(
            "{} ({items} items / {} files)",
            quoted(1, gallery_id),
            output.file_count(gallery_id)
        ));
    }

    lines.push(String::new());
    lines.push("Deleted items in existing galleries (**):".to_string());
    for changes in diff
        .modified_galleries
        .iter()
        .filter(|g| !g.removed_items.is_empty())
    {
        let Some(generated) = output.galleries.get(&changes.id) else {
            continue;
        };
        let files: usize = changes
            .removed_items
            .iter()
            .filter_map(|item_id| generated.get(item_id))
            .map(|files| files.len())
            .sum();
        lines.push(format!(
            "{} ({} items / {files} files)",
            quoted(1, input.gallery_name(&changes.id)),
            changes.removed_items.len()
        ));
        for item_id in &changes.removed_items {
            lines.push(quoted(2, &format!("{item_id}-???")));
            for file in generated.get(item_id).into_iter().flatten() {
                lines.push(quoted(3, file));
            }
        }
    }

    lines.push(String::new());
    lines.push(
        "*) RUN with any combination of arguments (--rss, --json, --media) to update site metadata."
            .to_string(),
    );
    lines.push(format!(
        "**) DELETE files/folders manually from \"{}\"",
        workspace.output_galleries_dir().display()
    ));
    lines
}

pub fn print_statistics(
    workspace: &Workspace,
    input: &InputTree,
    output: &OutputTree,
    diff: &TreeDiff,
) {
    for line in format_statistics(workspace, input, output, diff) {
        println!("{}", line);
    }
}

/// Summary of a media run.
pub fn format_process_report(report: &ProcessReport, dry_run: bool) -> Vec<String> {
    if dry_run {
        return vec![format!("Media: {} files would be created", report.planned)];
    }
    let mut lines = vec![format!(
        "Media: {} created, {} failed",
        report.created.len(),
        report.failed.len()
    )];
    for failed in &report.failed {
        lines.push(format!("{}{}: {}", indent(1), failed.target, failed.error));
    }
    lines
}

pub fn print_process_report(report: &ProcessReport, dry_run: bool) {
    for line in format_process_report(report, dry_run) {
        println!("{}", line);
    }
}
