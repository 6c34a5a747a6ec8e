//! Derived media generation.
//!
//! Plans which artifacts are missing from the output tree and runs them on a
//! bounded worker pool.
//!
//! ## Required artifacts
//!
//! | Kind | Files under `site-metadata/galleries/<gid>/` |
//! |---|---|
//! | Image | `<iid>.thumbnail.jpg`, `<iid>.poster.jpg` |
//! | Audio | `<iid>.mp3`, `<iid>.ogg` |
//! | Video | `<iid>.thumbnail.jpg`, `<iid>.poster.jpg`, `<iid>.mp4`, `<iid>.ogv`, `<iid>.webm` |
//!
//! A file whose name is already registered in the output tree is never
//! regenerated, so a second run over unchanged input plans nothing and a
//! failed job is simply retried by the next run.
//!
//! ## Parallel Processing
//!
//! Planning is single-threaded and finishes before any job starts, so it sees
//! a consistent snapshot of the output tree. Jobs then run on a dedicated
//! [rayon](https://docs.rs/rayon) pool; each one writes exactly one distinct
//! file. Failures are logged with the target path and collected into the
//! [`ProcessReport`] without stopping sibling jobs. There is no per-job
//! timeout: a hung external tool blocks the run.

use crate::config::Workspace;
use crate::diff::TreeDiff;
use crate::imaging::{Artifact, MediaTranscoder, TranscodeParams};
use crate::scan::{InputTree, OutputTree};
use crate::types::{MediaItem, Size};
use rayon::prelude::*;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cannot start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// One file to generate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactJob {
    pub gallery_id: String,
    pub item_id: String,
    pub artifact: Artifact,
    /// Web-root-relative path of the file to create.
    pub target: String,
    pub params: TranscodeParams,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedJob {
    pub target: String,
    pub error: String,
}

/// Outcome of a media run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessReport {
    /// Jobs the planner found missing.
    pub planned: usize,
    pub created: Vec<String>,
    pub failed: Vec<FailedJob>,
}

/// Relative target path and size of one artifact of `item`.
fn artifact_target(workspace: &Workspace, item: &MediaItem, artifact: Artifact) -> (String, Size) {
    match artifact {
        Artifact::ImageThumbnail | Artifact::VideoThumbnail => {
            (item.thumbnail.path.clone(), item.thumbnail.size())
        }
        Artifact::ImagePoster | Artifact::VideoPoster => {
            (item.poster.path.clone(), item.poster.size())
        }
        // Renditions are scaled like the poster
        _ => {
            let base = workspace.paths().artifact_base(&item.gallery_id, &item.id);
            let ext = artifact.rendition_extension().unwrap_or_default();
            (format!("{base}.{ext}"), item.poster.size())
        }
    }
}

fn file_name(relative: &str) -> &str {
    relative.rsplit('/').next().unwrap_or(relative)
}

/// Every artifact of the input tree whose file is not in the output tree,
/// in gallery/item id order.
pub fn plan(workspace: &Workspace, input: &InputTree, output: &OutputTree) -> Vec<ArtifactJob> {
    let mut jobs = Vec::new();
    for (gallery_id, gallery) in &input.galleries {
        for (item_id, item) in &gallery.items {
            for &artifact in Artifact::required_for(item.kind) {
                let (target, size) = artifact_target(workspace, item, artifact);
                if output.contains_file(gallery_id, item_id, file_name(&target)) {
                    continue;
                }
                jobs.push(ArtifactJob {
                    gallery_id: gallery_id.clone(),
                    item_id: item_id.clone(),
                    artifact,
                    params: TranscodeParams {
                        source: workspace.resolve(&item.original_path),
                        output: workspace.resolve(&target),
                        size,
                    },
                    target,
                });
            }
        }
    }
    jobs
}

/// Create output folders of new galleries. Returns the folders created.
pub fn create_gallery_dirs(workspace: &Workspace, diff: &TreeDiff) -> Result<Vec<String>, ProcessError> {
    let mut created = Vec::new();
    for gallery_id in &diff.new_galleries {
        let dir = workspace.output_galleries_dir().join(gallery_id);
        if dir.is_dir() {
            continue;
        }
        if !workspace.dry_run {
            std::fs::create_dir_all(&dir)?;
        }
        info!("Created folder \"{}\"", dir.display());
        created.push(gallery_id.clone());
    }
    Ok(created)
}

/// Remove whatever a failed job left at its output, so the next scan does
/// not register it and the job is planned again.
fn discard_partial(output: &Path) {
    match std::fs::remove_file(output) {
        Ok(()) => debug!("Removed partial output \"{}\"", output.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Cannot remove partial output \"{}\" ({})", output.display(), e),
    }
}

/// Run `jobs` on a pool of `threads` workers and wait for all of them.
///
/// A failed job never leaves a file behind.
pub fn execute(
    jobs: &[ArtifactJob],
    transcoder: &(impl MediaTranscoder + ?Sized),
    threads: usize,
) -> Result<ProcessReport, ProcessError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()?;
    debug!("{} operations queued on {} workers", jobs.len(), threads);

    let results: Vec<_> = pool.install(|| {
        jobs.par_iter()
            .map(|job| {
                let result = job.artifact.run(transcoder, &job.params);
                if result.is_err() {
                    discard_partial(&job.params.output);
                }
                (job, result)
            })
            .collect()
    });

    let mut report = ProcessReport {
        planned: jobs.len(),
        ..Default::default()
    };
    for (job, result) in results {
        match result {
            Ok(()) => {
                info!("Created \"{}\"", job.target);
                report.created.push(job.target.clone());
            }
            Err(e) => {
                error!(
                    "Cannot write to \"{}\" ({})",
                    job.params.output.display(),
                    e
                );
                report.failed.push(FailedJob {
                    target: job.target.clone(),
                    error: e.to_string(),
                });
            }
        }
    }
    Ok(report)
}

/// Create folders, plan and run every missing artifact.
///
/// In dry-run mode the planned artifacts are only logged.
pub fn generate_media(
    workspace: &Workspace,
    input: &InputTree,
    output: &OutputTree,
    diff: &TreeDiff,
    transcoder: &(impl MediaTranscoder + ?Sized),
) -> Result<ProcessReport, ProcessError> {
    info!(">>>>> Creating media metadata files started...");
    create_gallery_dirs(workspace, diff)?;
    let jobs = plan(workspace, input, output);

    let report = if workspace.dry_run {
        for job in &jobs {
            info!("Would create \"{}\" ({})", job.target, job.artifact);
        }
        ProcessReport {
            planned: jobs.len(),
            ..Default::default()
        }
    } else {
        let threads = crate::config::effective_threads(&workspace.config.processing);
        execute(&jobs, transcoder, threads)?
    };

    info!("<<<<< Creating media metadata files finished.");
    Ok(report)
}
