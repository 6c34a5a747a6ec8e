//! Pure calculation functions for media dimensions.
//!
//! All functions here are pure and testable without any I/O or media files.

use crate::types::Size;

/// Shrink `original` to fit `max_width` × `max_height`, preserving aspect ratio.
///
/// Never upscales. The driving edge depends on orientation:
/// - Landscape (strictly wider than tall): width is capped at `max_width`,
///   height follows the aspect ratio.
/// - Portrait or square: height is capped at `max_height`, width follows.
///
/// The derived edge is rounded half away from zero. A zero-sized original
/// yields `0×0`.
///
/// # Examples
/// ```
/// # use site_metadata::imaging::shrink;
/// # use site_metadata::types::Size;
/// assert_eq!(shrink(Size::new(1000, 500), 200, 200), Size::new(200, 100));
/// assert_eq!(shrink(Size::new(500, 1000), 200, 200), Size::new(100, 200));
/// ```
pub fn shrink(original: Size, max_width: u32, max_height: u32) -> Size {
    if original.width == 0 || original.height == 0 {
        return Size::default();
    }
    if original.is_landscape() {
        let width = original.width.min(max_width);
        let height = (width as f64 * original.height as f64 / original.width as f64).round();
        Size::new(width, height as u32)
    } else {
        let height = original.height.min(max_height);
        let width = (height as f64 * original.width as f64 / original.height as f64).round();
        Size::new(width as u32, height)
    }
}

/// ffmpeg `-filter:v` argument scaling video to `size`.
///
/// The edge that was not capped is derived from the aspect ratio and forced
/// even, which most video codecs require.
pub fn video_scale_filter(size: Size) -> String {
    if size.is_landscape() {
        format!("scale={}:trunc(ow/a/2)*2", size.width)
    } else {
        format!("scale=trunc(oh*a/2)*2:{}", size.height)
    }
}
