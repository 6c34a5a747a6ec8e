//! Media dimensions and derived-file generation.
//!
//! | Operation | Implementation |
//! |---|---|
//! | **Identify image** | `image::image_dimensions` |
//! | **Identify video** | `ffprobe -show_streams` |
//! | **Image thumbnail / poster** | Lanczos3 resize → JPEG |
//! | **Audio / video renditions** | `ffmpeg`, watermark via `composite` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing a derived file
//! - **Backend**: [`SizeProbe`] + [`MediaTranscoder`] traits
//! - **Command backend**: [`CommandBackend`], the production implementation

pub mod backend;
mod calculations;
pub mod command_backend;
mod params;

pub use backend::{MediaTranscoder, SizeProbe, TranscodeError};
pub use calculations::{shrink, video_scale_filter};
pub use command_backend::{CommandBackend, MissingTool, Tool, check_tools};
pub use params::{Artifact, TranscodeParams};
