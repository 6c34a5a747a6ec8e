//! # Site Metadata
//!
//! Keeps the generated metadata of a media gallery website in sync with its
//! source folders. Galleries are plain directories of photos, videos and
//! audio files; their names carry the id, title and tags of every item.
//!
//! # Architecture: Scan, Diff, Generate
//!
//! Every run compares what exists now with what a previous run produced:
//!
//! ```text
//! 1. Scan      site-data/galleries/      →  input tree   (ids, titles, tags, geometry)
//!              site-metadata/galleries/  →  output tree  (already generated files)
//! 2. Diff      input × output            →  new / modified / removed galleries and items
//! 3. Generate  diff + input              →  rss.xml, news.json, galleries.json,
//!                                           galleries/<id>.json, thumbnails, posters,
//!                                           audio and video renditions
//! ```
//!
//! The output tree is the only state carried between runs. Generated media
//! files are never overwritten, so an interrupted or partially failed run is
//! completed by simply running again.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`naming`] | `ID-TAG-...-TAG-TITLE` filename grammar with `--` escapes |
//! | [`types`] | Item model serialized into the JSON files (`MediaItem`, `ImageSource`, `Size`) |
//! | [`imaging`] | Shrink geometry, probe/transcode traits, the ffmpeg-backed implementation |
//! | [`item`] | Builds a `MediaItem` from a file name and its probed dimensions |
//! | [`scan`] | Walks the input and output trees into keyed maps, resolving id conflicts |
//! | [`diff`] | Set comparison of the two trees and the collapsed preview listing |
//! | [`generate`] | RSS feed and JSON index files |
//! | [`process`] | Plans missing media artifacts and runs them on a worker pool |
//! | [`config`] | Optional `site.toml`, merged over stock defaults, and the per-run `Workspace` |
//! | [`output`] | CLI output formatting: statistics and media summary |
//!
//! # Design Decisions
//!
//! ## Explicit Workspace
//!
//! The web root, the resolved config and the dry-run flag travel together in
//! a [`config::Workspace`] passed to every stage. There are no global flags,
//! which keeps every stage callable from tests against a temporary directory.
//!
//! ## Media Behind Traits
//!
//! Reading dimensions and producing derived files go through
//! [`imaging::SizeProbe`] and [`imaging::MediaTranscoder`]. Images are handled
//! in-process by the `image` crate; video and audio go to `ffmpeg`, `ffprobe`
//! and ImageMagick's `composite`. Tests swap in a recording mock.
//!
//! ## Lexicographic Ids
//!
//! Ids are digit strings compared as strings, so `10` sorts before `9`.
//! Feed readers and the web front end already depend on that order.

pub mod config;
pub mod diff;
pub mod generate;
pub mod imaging;
pub mod item;
pub mod naming;
pub mod output;
pub mod process;
pub mod scan;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
