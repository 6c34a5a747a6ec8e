//! Site configuration and the per-run [`Workspace`].
//!
//! Configuration lives in an optional `site.toml` in the web root. Stock
//! defaults describe the original site layout, so a web root that follows the
//! conventions needs no config file at all.
//!
//! ## Config File
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [site]
//! title = "T.O.M.ův web"
//! location = "https://www.tomovo.cz"
//! language = "cs"
//!
//! [paths]
//! site_data = "site-data"           # Input root
//! site_metadata = "site-metadata"   # Output root
//! galleries = "galleries"           # Galleries subfolder on both sides
//! audio_thumbnail = "images/gallery/generic-audio.thumbnail.png"
//! audio_poster = "images/gallery/generic-audio.poster.png"
//! video_watermark = "images/gallery/video-thumbnail-watermark.png"
//!
//! [limits]
//! thumbnail = [200, 200]
//! image_poster = [1500, 1000]
//! video = [640, 640]
//!
//! [tools]
//! composite = "composite"           # Name on PATH or absolute path
//! ffmpeg = "ffmpeg"
//! ffprobe = "ffprobe"
//!
//! [feed]                            # {title} and {count} are substituted
//! new_gallery = "Nová galerie: {title}"
//! gallery_added = "Přidáno {count} položek:"
//! more_items = "... a {count} dalších"
//! date_format = "%d. %B %Y"         # chrono strftime, news.json date
//!
//! [processing]
//! max_processes = 4                 # Omit for auto = CPU cores
//! ```
//!
//! Config files are sparse: user values are merged on top of the stock
//! defaults. Unknown keys are rejected to catch typos early.

use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the optional config file in the web root.
pub const CONFIG_FILE: &str = "site.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `site.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Public identity of the site (feed channel, absolute links).
    pub site: SiteInfo,
    /// Input/output folder names and predefined resources.
    pub paths: PathsConfig,
    /// Bounding boxes for generated thumbnails and posters.
    pub limits: LimitsConfig,
    /// External tool locations.
    pub tools: ToolsConfig,
    /// Localized feed/news strings.
    pub feed: FeedConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let boxes = [
            ("limits.thumbnail", self.limits.thumbnail),
            ("limits.image_poster", self.limits.image_poster),
            ("limits.video", self.limits.video),
        ];
        for (key, [w, h]) in boxes {
            if w == 0 || h == 0 {
                return Err(ConfigError::Validation(format!(
                    "{key} values must be non-zero"
                )));
            }
        }
        if self.paths.site_data.is_empty()
            || self.paths.site_metadata.is_empty()
            || self.paths.galleries.is_empty()
        {
            return Err(ConfigError::Validation(
                "paths.site_data, paths.site_metadata and paths.galleries must not be empty"
                    .into(),
            ));
        }
        if StrftimeItems::new(&self.feed.date_format).any(|item| matches!(item, Item::Error)) {
            return Err(ConfigError::Validation(format!(
                "feed.date_format is not a valid strftime format: {:?}",
                self.feed.date_format
            )));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteInfo {
    pub title: String,
    /// Absolute base URL, no trailing slash needed.
    pub location: String,
    pub language: String,
}

impl Default for SiteInfo {
    fn default() -> Self {
        Self {
            title: "T.O.M.ův web".to_string(),
            location: "https://www.tomovo.cz".to_string(),
            language: "cs".to_string(),
        }
    }
}

impl SiteInfo {
    /// Absolute URL for a web-root-relative path.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.location.trim_end_matches('/'), path)
    }
}

/// Folder names, all relative to the web root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    pub site_data: String,
    pub site_metadata: String,
    pub galleries: String,
    pub audio_thumbnail: String,
    pub audio_poster: String,
    pub video_watermark: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            site_data: "site-data".to_string(),
            site_metadata: "site-metadata".to_string(),
            galleries: "galleries".to_string(),
            audio_thumbnail: "images/gallery/generic-audio.thumbnail.png".to_string(),
            audio_poster: "images/gallery/generic-audio.poster.png".to_string(),
            video_watermark: "images/gallery/video-thumbnail-watermark.png".to_string(),
        }
    }
}

/// Suffix of generated thumbnails, before the extension.
pub const THUMBNAIL_SUFFIX: &str = ".thumbnail";
/// Suffix of generated posters, before the extension.
pub const POSTER_SUFFIX: &str = ".poster";

impl PathsConfig {
    /// `site-data/galleries/<gallery folder>/<file>`
    pub fn original(&self, gallery_name: &str, file_name: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.site_data, self.galleries, gallery_name, file_name
        )
    }

    /// `site-metadata/<name>`, for the feed and index files.
    pub fn metadata_file(&self, name: &str) -> String {
        format!("{}/{}", self.site_metadata, name)
    }

    /// `site-metadata/galleries/<gid>.json`
    pub fn gallery_index(&self, gallery_id: &str) -> String {
        format!("{}/{}/{}.json", self.site_metadata, self.galleries, gallery_id)
    }

    /// `site-metadata/galleries/<gid>/<iid>`, the stem every artifact extends.
    pub fn artifact_base(&self, gallery_id: &str, item_id: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.site_metadata, self.galleries, gallery_id, item_id
        )
    }

    pub fn thumbnail(&self, gallery_id: &str, item_id: &str) -> String {
        format!(
            "{}{THUMBNAIL_SUFFIX}.jpg",
            self.artifact_base(gallery_id, item_id)
        )
    }

    pub fn poster(&self, gallery_id: &str, item_id: &str) -> String {
        format!(
            "{}{POSTER_SUFFIX}.jpg",
            self.artifact_base(gallery_id, item_id)
        )
    }
}

/// Bounding boxes as `[width, height]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    /// Image and video thumbnails.
    pub thumbnail: [u32; 2],
    /// Image posters.
    pub image_poster: [u32; 2],
    /// Video posters and renditions.
    pub video: [u32; 2],
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            thumbnail: [200, 200],
            image_poster: [1500, 1000],
            video: [640, 640],
        }
    }
}

/// External tools; bare names are looked up on `PATH`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolsConfig {
    pub composite: String,
    pub ffmpeg: String,
    pub ffprobe: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            composite: "composite".to_string(),
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
        }
    }
}

/// Feed and news texts. `{title}` and `{count}` are substituted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeedConfig {
    pub new_gallery: String,
    pub modified_gallery: String,
    pub gallery_contains: String,
    pub gallery_added: String,
    pub gallery_empty: String,
    pub more_items: String,
    /// chrono format string for the `news.json` date.
    pub date_format: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            new_gallery: "Nová galerie: {title}".to_string(),
            modified_gallery: "Změny v galerii: {title}".to_string(),
            gallery_contains: "Obsahuje {count} položek:".to_string(),
            gallery_added: "Přidáno {count} položek:".to_string(),
            gallery_empty: "Galerie je zatím prázdná.".to_string(),
            more_items: "... a {count} dalších".to_string(),
            date_format: "%d. %B %Y".to_string(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel media jobs.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective worker count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(SiteConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `site.toml` from the web root as a raw TOML value, `None` if absent.
pub fn load_raw_config(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = root.join(CONFIG_FILE);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Load config from the web root, merged over stock defaults and validated.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match load_raw_config(root)? {
        Some(overlay) => merge_toml(base, overlay),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// A fully commented stock `site.toml`, printed by `--gen-config`.
pub fn stock_config_toml() -> &'static str {
    r##"# Site metadata configuration
# ===========================
#
# Place this file as `site.toml` in the web root. Every key is optional;
# only the values you set override the defaults shown here.

[site]
# Channel title of the RSS feed.
title = "T.O.M.ův web"
# Absolute base URL used for links in the feed.
location = "https://www.tomovo.cz"
# Feed language.
language = "cs"

[paths]
# Input root: contains the galleries folder with one folder per gallery,
# named ID-TITLE, holding items named ID-TAG-...-TAG-TITLE.ext.
site_data = "site-data"
# Output root for rss.xml, news.json, galleries.json and generated media.
site_metadata = "site-metadata"
# Galleries subfolder name, on both sides.
galleries = "galleries"
# Predefined images shown for audio items, and the video thumbnail watermark.
audio_thumbnail = "images/gallery/generic-audio.thumbnail.png"
audio_poster = "images/gallery/generic-audio.poster.png"
video_watermark = "images/gallery/video-thumbnail-watermark.png"

[limits]
# Bounding boxes [width, height]; originals are never upscaled.
thumbnail = [200, 200]
image_poster = [1500, 1000]
video = [640, 640]

[tools]
# External tools: a name looked up on PATH or an absolute path.
composite = "composite"
ffmpeg = "ffmpeg"
ffprobe = "ffprobe"

[feed]
# {title} and {count} are substituted.
new_gallery = "Nová galerie: {title}"
modified_gallery = "Změny v galerii: {title}"
gallery_contains = "Obsahuje {count} položek:"
gallery_added = "Přidáno {count} položek:"
gallery_empty = "Galerie je zatím prázdná."
more_items = "... a {count} dalších"
# chrono strftime format of the news date.
date_format = "%d. %B %Y"

[processing]
# Max parallel media jobs (omit for auto = CPU cores).
# max_processes = 4
"##
}

// =============================================================================
// Workspace
// =============================================================================

/// Everything a run needs to know about where it operates.
///
/// Passed explicitly to every stage instead of process-wide flags.
#[derive(Debug, Clone)]
pub struct Workspace {
    /// Web root all configured paths are relative to.
    pub root: PathBuf,
    pub config: SiteConfig,
    /// Report intended writes and tool invocations without performing them.
    pub dry_run: bool,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>, config: SiteConfig, dry_run: bool) -> Self {
        Self {
            root: root.into(),
            config,
            dry_run,
        }
    }

    pub fn paths(&self) -> &PathsConfig {
        &self.config.paths
    }

    /// Absolute location of a web-root-relative path.
    pub fn resolve(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    pub fn site_data_dir(&self) -> PathBuf {
        self.root.join(&self.config.paths.site_data)
    }

    pub fn input_galleries_dir(&self) -> PathBuf {
        self.site_data_dir().join(&self.config.paths.galleries)
    }

    pub fn metadata_dir(&self) -> PathBuf {
        self.root.join(&self.config.paths.site_metadata)
    }

    pub fn output_galleries_dir(&self) -> PathBuf {
        self.metadata_dir().join(&self.config.paths.galleries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_matches_site_layout() {
        let config = SiteConfig::default();
        assert_eq!(config.paths.site_data, "site-data");
        assert_eq!(config.paths.site_metadata, "site-metadata");
        assert_eq!(config.limits.thumbnail, [200, 200]);
        assert_eq!(config.limits.image_poster, [1500, 1000]);
        assert_eq!(config.limits.video, [640, 640]);
        assert_eq!(config.tools.ffmpeg, "ffmpeg");
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
[site]
location = "http://localhost:8000"
"#;
        let config: SiteConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.site.location, "http://localhost:8000");
        // Defaults preserved
        assert_eq!(config.site.language, "cs");
        assert_eq!(config.paths.galleries, "galleries");
    }

    #[test]
    fn unknown_keys_rejected() {
        let toml = r#"
[limits]
thumbnial = [100, 100]
"#;
        assert!(toml::from_str::<SiteConfig>(toml).is_err());
    }

    #[test]
    fn stock_config_toml_parses_to_defaults() {
        let config: SiteConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config.limits.video, LimitsConfig::default().video);
        assert_eq!(config.feed.date_format, FeedConfig::default().date_format);
        assert_eq!(config.processing.max_processes, None);
    }

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.site.title, SiteInfo::default().title);
    }

    #[test]
    fn load_config_merges_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILE),
            r#"
[limits]
video = [1280, 720]

[processing]
max_processes = 2
"#,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.limits.video, [1280, 720]);
        assert_eq!(config.limits.thumbnail, [200, 200]);
        assert_eq!(config.processing.max_processes, Some(2));
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE), "[limits\n").unwrap();
        assert!(matches!(
            load_config(tmp.path()),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn zero_limit_fails_validation() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE), "[limits]\nthumbnail = [0, 200]\n").unwrap();
        assert!(matches!(
            load_config(tmp.path()),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn merge_toml_overlays_nested_tables() {
        let base: toml::Value = toml::from_str("[a]\nx = 1\ny = 2\n").unwrap();
        let overlay: toml::Value = toml::from_str("[a]\ny = 3\n").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"]["x"].as_integer(), Some(1));
        assert_eq!(merged["a"]["y"].as_integer(), Some(3));
    }

    #[test]
    fn artifact_paths() {
        let paths = PathsConfig::default();
        assert_eq!(
            paths.original("3-Summer", "12-Dawn.jpg"),
            "site-data/galleries/3-Summer/12-Dawn.jpg"
        );
        assert_eq!(
            paths.thumbnail("3", "12"),
            "site-metadata/galleries/3/12.thumbnail.jpg"
        );
        assert_eq!(paths.poster("3", "12"), "site-metadata/galleries/3/12.poster.jpg");
        assert_eq!(paths.gallery_index("3"), "site-metadata/galleries/3.json");
        assert_eq!(paths.metadata_file("rss.xml"), "site-metadata/rss.xml");
    }

    #[test]
    fn invalid_date_format_fails_validation() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE), "[feed]\ndate_format = \"%Q\"\n").unwrap();
        assert!(matches!(
            load_config(tmp.path()),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn site_url_joins_location() {
        let site = SiteInfo {
            location: "http://localhost:8000/".into(),
            ..Default::default()
        };
        assert_eq!(site.url("#galleries/3"), "http://localhost:8000/#galleries/3");
    }

    #[test]
    fn workspace_directories() {
        let ws = Workspace::new("/web", SiteConfig::default(), false);
        assert_eq!(ws.input_galleries_dir(), PathBuf::from("/web/site-data/galleries"));
        assert_eq!(ws.output_galleries_dir(), PathBuf::from("/web/site-metadata/galleries"));
        assert_eq!(
            ws.resolve("site-metadata/rss.xml"),
            PathBuf::from("/web/site-metadata/rss.xml")
        );
    }

    #[test]
    fn effective_threads_user_constrains_down() {
        let config = ProcessingConfig {
            max_processes: Some(1),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    #[test]
    fn effective_threads_clamped_to_cores() {
        let config = ProcessingConfig {
            max_processes: Some(99999),
        };
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_threads(&config), cores);
    }
}
