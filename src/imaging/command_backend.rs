//! Production backend: the `image` crate in-process, ffmpeg tools out of process.
//!
//! ## Tool mapping
//!
//! | Operation | Implementation |
//! |---|---|
//! | Probe image | `image::image_dimensions` (header only) |
//! | Probe video | `ffprobe -show_streams`, first `width=` / `height=` lines |
//! | Image thumbnail / poster | `image` decode → Lanczos3 resize → JPEG |
//! | Audio mp3 / ogg | `ffmpeg` (libmp3lame / libvorbis, 160k, 44.1 kHz, stereo) |
//! | Video thumbnail / poster | `ffmpeg` first frame → JPEG; thumbnail watermarked with `composite` |
//! | Video mp4 / ogv / webm | `ffmpeg` (libx264+aac / libtheora+vorbis / libvpx+vorbis, 500k video) |
//!
//! Tools run with stdin and stderr detached and no timeout: a hung tool hangs
//! its worker until it exits.

use super::backend::{MediaTranscoder, SizeProbe, TranscodeError};
use super::calculations::video_scale_filter;
use super::params::TranscodeParams;
use crate::config::ToolsConfig;
use crate::types::{MediaKind, Size};
use image::ImageFormat;
use image::imageops::FilterType;
use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;

/// External tools the backend shells out to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Composite,
    Ffmpeg,
    Ffprobe,
}

impl Tool {
    pub const ALL: [Tool; 3] = [Tool::Composite, Tool::Ffmpeg, Tool::Ffprobe];

    fn configured<'a>(self, tools: &'a ToolsConfig) -> &'a str {
        match self {
            Tool::Composite => &tools.composite,
            Tool::Ffmpeg => &tools.ffmpeg,
            Tool::Ffprobe => &tools.ffprobe,
        }
    }

    /// Distribution package that usually provides the tool.
    pub fn package(self) -> &'static str {
        match self {
            Tool::Composite => "imagemagick",
            Tool::Ffmpeg | Tool::Ffprobe => "ffmpeg",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tool::Composite => "composite",
            Tool::Ffmpeg => "ffmpeg",
            Tool::Ffprobe => "ffprobe",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
#[error("Cannot find executable tool \"{command}\" ({tool})")]
pub struct MissingTool {
    pub tool: Tool,
    pub command: String,
}

/// Verify every configured tool resolves to an executable.
///
/// Checked in a fixed order so the first missing tool is reported.
pub fn check_tools(tools: &ToolsConfig) -> Result<(), MissingTool> {
    for tool in Tool::ALL {
        let command = tool.configured(tools);
        if which::which(command).is_err() {
            return Err(MissingTool {
                tool,
                command: command.to_string(),
            });
        }
    }
    Ok(())
}

/// Backend shelling out to ffmpeg/ffprobe/composite.
pub struct CommandBackend {
    tools: ToolsConfig,
    /// Image composited over video thumbnails.
    watermark: PathBuf,
}

impl CommandBackend {
    pub fn new(tools: ToolsConfig, watermark: impl Into<PathBuf>) -> Self {
        Self {
            tools,
            watermark: watermark.into(),
        }
    }

    fn run(&self, mut command: Command, output: &Path) -> Result<(), TranscodeError> {
        tracing::debug!("Running {:?}", command);
        let status = command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()?;
        if status.success() {
            Ok(())
        } else {
            Err(TranscodeError::ToolFailed {
                tool: command.get_program().to_string_lossy().to_string(),
                status,
                output: output.to_path_buf(),
            })
        }
    }

    fn ffmpeg(&self, source: &Path) -> Command {
        let mut command = Command::new(&self.tools.ffmpeg);
        command.arg("-i").arg(source);
        command
    }

    fn audio(&self, params: &TranscodeParams, codec: &str, format: &str) -> Result<(), TranscodeError> {
        let mut command = self.ffmpeg(&params.source);
        command
            .args(["-vn", "-codec:a", codec])
            .args(AUDIO_SETTINGS)
            .args(["-f", format])
            .arg(&params.output);
        self.run(command, &params.output)
    }

    fn video_frame(&self, params: &TranscodeParams) -> Result<(), TranscodeError> {
        let mut command = self.ffmpeg(&params.source);
        command
            .args(["-filter:v", &video_scale_filter(params.size)])
            .args(["-ss", "00:00:00", "-frames:v", "1", "-r", "1", "-q:v", "1"])
            .args(["-f", "image2"])
            .arg(&params.output);
        self.run(command, &params.output)
    }

    fn video<I, S>(&self, params: &TranscodeParams, codecs: I, format: &str) -> Result<(), TranscodeError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut command = self.ffmpeg(&params.source);
        command
            .args(["-filter:v", &video_scale_filter(params.size)])
            .args(codecs)
            .args(AUDIO_SETTINGS)
            .args(["-f", format])
            .arg(&params.output);
        self.run(command, &params.output)
    }

    fn probe_video(&self, path: &Path) -> Result<Size, TranscodeError> {
        let output = Command::new(&self.tools.ffprobe)
            .arg(path)
            .arg("-show_streams")
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()?;
        if !output.status.success() {
            return Err(TranscodeError::Probe {
                path: path.to_path_buf(),
                reason: format!("ffprobe exited with {}", output.status),
            });
        }
        parse_ffprobe_size(&String::from_utf8_lossy(&output.stdout)).ok_or_else(|| {
            TranscodeError::Probe {
                path: path.to_path_buf(),
                reason: "no width/height in ffprobe output".to_string(),
            }
        })
    }
}

const AUDIO_SETTINGS: [&str; 6] = ["-b:a", "160k", "-ar", "44100", "-ac", "2"];

/// First `width=` and `height=` lines of `ffprobe -show_streams` output.
fn parse_ffprobe_size(stdout: &str) -> Option<Size> {
    let field = |key: &str| {
        stdout
            .lines()
            .find_map(|line| line.trim().strip_prefix(key)?.parse::<u32>().ok())
    };
    Some(Size::new(field("width=")?, field("height=")?))
}

/// Decode, resize into `params.size` and save as JPEG.
fn resize_to_jpeg(params: &TranscodeParams) -> Result<(), TranscodeError> {
    let image = image::open(&params.source)?;
    let resized = image.resize(params.size.width, params.size.height, FilterType::Lanczos3);
    // JPEG has no alpha channel
    image::DynamicImage::ImageRgb8(resized.to_rgb8())
        .save_with_format(&params.output, ImageFormat::Jpeg)?;
    Ok(())
}

impl SizeProbe for CommandBackend {
    fn size(&self, path: &Path, kind: MediaKind) -> Result<Size, TranscodeError> {
        match kind {
            MediaKind::Image => {
                let (width, height) = image::image_dimensions(path)?;
                Ok(Size::new(width, height))
            }
            MediaKind::Video => self.probe_video(path),
            MediaKind::Audio | MediaKind::Undefined => Err(TranscodeError::UnsupportedKind {
                kind,
                path: path.to_path_buf(),
            }),
        }
    }
}

impl MediaTranscoder for CommandBackend {
    fn image_thumbnail(&self, params: &TranscodeParams) -> Result<(), TranscodeError> {
        resize_to_jpeg(params)
    }

    fn image_poster(&self, params: &TranscodeParams) -> Result<(), TranscodeError> {
        resize_to_jpeg(params)
    }

    fn audio_mp3(&self, params: &TranscodeParams) -> Result<(), TranscodeError> {
        self.audio(params, "libmp3lame", "mp3")
    }

    fn audio_ogg(&self, params: &TranscodeParams) -> Result<(), TranscodeError> {
        self.audio(params, "libvorbis", "ogg")
    }

    fn video_thumbnail(&self, params: &TranscodeParams) -> Result<(), TranscodeError> {
        self.video_frame(params)?;
        let mut command = Command::new(&self.tools.composite);
        command
            .args(["-dissolve", "50%", "-gravity", "center"])
            .arg(&self.watermark)
            .arg(&params.output)
            .arg(&params.output);
        self.run(command, &params.output)
    }

    fn video_poster(&self, params: &TranscodeParams) -> Result<(), TranscodeError> {
        self.video_frame(params)
    }

    fn video_mp4(&self, params: &TranscodeParams) -> Result<(), TranscodeError> {
        self.video(
            params,
            [
                "-codec:v", "libx264", "-b:v", "500k", "-codec:a", "aac", "-strict",
                "experimental",
            ],
            "mp4",
        )
    }

    fn video_ogv(&self, params: &TranscodeParams) -> Result<(), TranscodeError> {
        self.video(
            params,
            ["-codec:v", "libtheora", "-b:v", "500k", "-codec:a", "libvorbis"],
            "ogg",
        )
    }

    fn video_webm(&self, params: &TranscodeParams) -> Result<(), TranscodeError> {
        self.video(
            params,
            ["-codec:v", "libvpx", "-b:v", "500k", "-codec:a", "libvorbis"],
            "webm",
        )
    }
}
