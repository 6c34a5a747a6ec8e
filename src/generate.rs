//! Feed and JSON index generation.
//!
//! Consumes the input tree and the [`TreeDiff`] and writes, under the output
//! root:
//!
//! ```text
//! site-metadata/
//! ├── rss.xml              # One <item> per new or changed gallery
//! ├── news.json            # Single record: this run's new/changed galleries
//! ├── galleries.json       # Every gallery with its last item
//! └── galleries/
//!     └── 3.json           # Every item of gallery 3
//! ```
//!
//! All files are fully overwritten. In dry-run mode their content is printed
//! to stdout instead.
//!
//! ## HTML in the feed
//!
//! Item descriptions are rendered with [maud](https://maud.lambda.xyz/) and
//! then escaped once more into the XML text node, which is how feed readers
//! expect HTML descriptions.

use crate::config::{FeedConfig, SiteInfo, Workspace};
use crate::diff::{Preview, PreviewLimits, TreeDiff, preview};
use crate::scan::InputTree;
use crate::types::MediaItem;
use maud::{Markup, PreEscaped, html};
use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use thiserror::Error;
use tracing::info;

pub const RSS_FILE: &str = "rss.xml";
pub const NEWS_FILE: &str = "news.json";
pub const GALLERIES_FILE: &str = "galleries.json";

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Cannot format date with \"{0}\"")]
    DateFormat(String),
}

/// Write a web-root-relative output file, or print it in dry-run mode.
pub fn write_output(workspace: &Workspace, relative: &str, data: &str) -> Result<(), GenerateError> {
    if workspace.dry_run {
        println!("{data}");
    } else {
        let path = workspace.resolve(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, data)?;
    }
    info!("Generated \"{}\"", relative);
    Ok(())
}

/// Substitute `{title}` and `{count}` in a feed text.
///
/// `{count}` goes first so a title containing a placeholder stays verbatim.
fn fill(template: &str, title: &str, count: usize) -> String {
    template
        .replace("{count}", &count.to_string())
        .replace("{title}", title)
}

// =============================================================================
// RSS
// =============================================================================

/// One `<item>` of the feed before XML rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub gallery_id: String,
    pub title: String,
    /// Unescaped HTML.
    pub description: String,
}

fn gallery_link(workspace: &Workspace, gallery_id: &str) -> String {
    format!("#{}/{}", workspace.paths().galleries, gallery_id)
}

fn description_list(
    workspace: &Workspace,
    heading: &str,
    items: Preview<'_, &MediaItem>,
    feed: &FeedConfig,
) -> Markup {
    let site = &workspace.config.site;
    html! {
        style { "li{list-style:none;}" }
        div { (heading) }
        ul {
            @for item in items.shown {
                li {
                    a href=(site.url(&format!("{}/{}", gallery_link(workspace, &item.gallery_id), item.id))) {
                        img width=(item.thumbnail.width) height=(item.thumbnail.height)
                            alt=(item.title) title=(item.title)
                            src=(site.url(&item.thumbnail.path));
                    }
                }
            }
            @if items.not_listed > 0 {
                li { (fill(&feed.more_items, "", items.not_listed)) }
            }
        }
    }
}

/// Feed entries for new galleries (empty ones included) and for galleries
/// that gained items, in id order.
pub fn feed_entries(workspace: &Workspace, input: &InputTree, diff: &TreeDiff) -> Vec<FeedEntry> {
    let feed = &workspace.config.feed;
    let mut entries = Vec::new();

    for gallery_id in &diff.new_galleries {
        let Some(gallery) = input.galleries.get(gallery_id) else {
            continue;
        };
        let items: Vec<&MediaItem> = gallery.items.values().collect();
        let title = gallery.title();
        let description = if items.is_empty() {
            html! { div { (feed.gallery_empty) } }
        } else {
            let heading = fill(&feed.gallery_contains, &title, items.len());
            description_list(workspace, &heading, preview(&items, PreviewLimits::RSS), feed)
        };
        info!("    \"{}\" ({} items)", gallery.name, items.len());
        entries.push(FeedEntry {
            gallery_id: gallery_id.clone(),
            title: fill(&feed.new_gallery, &title, items.len()),
            description: description.into_string(),
        });
    }

    for changes in diff.changed_galleries() {
        let items: Vec<&MediaItem> = changes
            .new_items
            .iter()
            .filter_map(|item_id| input.item(&changes.id, item_id))
            .collect();
        if items.is_empty() {
            continue;
        }
        let name = input.gallery_name(&changes.id);
        let title = crate::naming::parse_title(name);
        let heading = fill(&feed.gallery_added, &title, items.len());
        info!("    \"{}\" (added {} items)", name, items.len());
        entries.push(FeedEntry {
            gallery_id: changes.id.clone(),
            title: fill(&feed.modified_gallery, &title, items.len()),
            description: description_list(
                workspace,
                &heading,
                preview(&items, PreviewLimits::RSS),
                feed,
            )
            .into_string(),
        });
    }

    entries
}

fn feed_item(workspace: &Workspace, entry: &FeedEntry, pub_date: &str) -> Markup {
    let link = workspace
        .config
        .site
        .url(&gallery_link(workspace, &entry.gallery_id));
    html! {
        item {
            title { (entry.title) }
            link { (link) }
            guid isPermaLink="false" { (link) }
            pubDate { (pub_date) }
            description { (entry.description) }
        }
    }
}

/// Full RSS 2.0 document, `None` when there is nothing to announce.
///
/// `pub_date` is an RFC 2822 timestamp shared by every item. Descriptions
/// are HTML and end up escaped once more as XML text.
pub fn render_rss(
    workspace: &Workspace,
    input: &InputTree,
    diff: &TreeDiff,
    pub_date: &str,
) -> Option<String> {
    let entries = feed_entries(workspace, input, diff);
    if entries.is_empty() {
        return None;
    }
    let site: &SiteInfo = &workspace.config.site;
    let location = site.location.trim_end_matches('/');
    let self_link = site.url(&workspace.paths().metadata_file(RSS_FILE));

    let document = html! {
        (PreEscaped("<?xml version=\"1.0\" encoding=\"UTF-8\" ?>\n"))
        rss version="2.0" xmlns:atom="http://www.w3.org/2005/Atom" {
            channel {
                title { (site.title) }
                link { (location) }
                atom:link href=(self_link) rel="self" type="application/rss+xml" {}
                description {}
                language { (site.language) }
                image {
                    url { (site.url("apple-touch-icon.png")) }
                    title { (site.title) }
                    link { (location) }
                }
                @for entry in &entries {
                    (feed_item(workspace, entry, pub_date))
                }
            }
        }
    };
    Some(document.into_string())
}

/// Write `rss.xml` if any gallery is new or gained items. Returns whether it was written.
pub fn generate_rss(
    workspace: &Workspace,
    input: &InputTree,
    diff: &TreeDiff,
) -> Result<bool, GenerateError> {
    let pub_date = chrono::Local::now().to_rfc2822();
    match render_rss(workspace, input, diff, &pub_date) {
        Some(xml) => {
            write_output(workspace, &workspace.paths().metadata_file(RSS_FILE), &xml)?;
            Ok(true)
        }
        None => {
            info!("No new or changed galleries, {} not updated", RSS_FILE);
            Ok(false)
        }
    }
}

// =============================================================================
// JSON
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsRecord<'a> {
    pub date: String,
    pub new_galleries: Vec<NewsGallery<'a>>,
    pub modified_galleries: Vec<NewsGallery<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsGallery<'a> {
    pub id: &'a str,
    pub title: String,
    pub items: Vec<&'a MediaItem>,
    pub not_listed_items_count: usize,
    pub removed_items_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryRecord<'a> {
    pub id: &'a str,
    pub title: String,
    pub last_item: Option<&'a MediaItem>,
}

/// This run's news record.
///
/// New galleries without items are left out; existing galleries appear when
/// they gained or lost items.
pub fn news_record<'a>(input: &'a InputTree, diff: &'a TreeDiff, date: String) -> NewsRecord<'a> {
    let new_galleries = diff
        .new_galleries
        .iter()
        .filter_map(|gallery_id| {
            let gallery = input.galleries.get(gallery_id)?;
            let items: Vec<&MediaItem> = gallery.items.values().collect();
            let shown = preview(&items, PreviewLimits::NEWS);
            if shown.shown.is_empty() {
                return None;
            }
            Some(NewsGallery {
                id: gallery_id,
                title: gallery.title(),
                items: shown.shown.to_vec(),
                not_listed_items_count: shown.not_listed,
                removed_items_count: 0,
            })
        })
        .collect();

    let modified_galleries = diff
        .changed_galleries()
        .map(|changes| {
            let items: Vec<&MediaItem> = changes
                .new_items
                .iter()
                .filter_map(|item_id| input.item(&changes.id, item_id))
                .collect();
            let shown = preview(&items, PreviewLimits::NEWS);
            NewsGallery {
                id: &changes.id,
                title: crate::naming::parse_title(input.gallery_name(&changes.id)),
                items: shown.shown.to_vec(),
                not_listed_items_count: shown.not_listed,
                removed_items_count: changes.removed_items.len(),
            }
        })
        .collect();

    NewsRecord {
        date,
        new_galleries,
        modified_galleries,
    }
}

/// `galleries.json` records, one per input gallery.
pub fn gallery_records(input: &InputTree) -> Vec<GalleryRecord<'_>> {
    input
        .galleries
        .iter()
        .map(|(gallery_id, gallery)| GalleryRecord {
            id: gallery_id,
            title: gallery.title(),
            last_item: gallery.last_item(),
        })
        .collect()
}

fn format_date(format: &str) -> Result<String, GenerateError> {
    let mut date = String::new();
    write!(date, "{}", chrono::Local::now().format(format))
        .map_err(|_| GenerateError::DateFormat(format.to_string()))?;
    Ok(date)
}

/// Write `news.json` when there is news, or when the file does not exist yet.
pub fn generate_news(
    workspace: &Workspace,
    input: &InputTree,
    diff: &TreeDiff,
) -> Result<bool, GenerateError> {
    let relative = workspace.paths().metadata_file(NEWS_FILE);
    let record = news_record(
        input,
        diff,
        format_date(&workspace.config.feed.date_format)?,
    );
    let has_news = !record.new_galleries.is_empty() || !record.modified_galleries.is_empty();
    if !has_news && workspace.resolve(&relative).is_file() {
        info!("No news, {} kept", NEWS_FILE);
        return Ok(false);
    }
    let json = serde_json::to_string_pretty(&[record])?;
    write_output(workspace, &relative, &json)?;
    Ok(true)
}

/// Write `galleries.json` and one `galleries/<id>.json` per gallery.
pub fn generate_galleries(workspace: &Workspace, input: &InputTree) -> Result<(), GenerateError> {
    let paths = workspace.paths();
    let json = serde_json::to_string_pretty(&gallery_records(input))?;
    write_output(workspace, &paths.metadata_file(GALLERIES_FILE), &json)?;

    for (gallery_id, gallery) in &input.galleries {
        let items: Vec<&MediaItem> = gallery.items.values().collect();
        let json = serde_json::to_string_pretty(&items)?;
        write_output(workspace, &paths.gallery_index(gallery_id), &json)?;
    }
    Ok(())
}

/// All JSON files: news first, then the gallery indexes.
pub fn generate_json(
    workspace: &Workspace,
    input: &InputTree,
    diff: &TreeDiff,
) -> Result<(), GenerateError> {
    generate_news(workspace, input, diff)?;
    generate_galleries(workspace, input)
}
