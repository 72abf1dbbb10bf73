//! Image standardization and frame sampling.

use anyhow::Result;
use image::{DynamicImage, ImageFormat, RgbImage, imageops::FilterType};
use std::io::Cursor;

/// Side length every image is resized to.
pub const TARGET_SIZE: (u32, u32) = (224, 224);

/// Maximum frames sampled from one video.
pub const MAX_FRAMES: usize = 16;

/// Decode image bytes of any supported format.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage> {
    Ok(image::load_from_memory(bytes)?)
}

/// Convert to RGB and resize to [`TARGET_SIZE`], ignoring aspect ratio.
pub fn standardize(image: &DynamicImage) -> RgbImage {
    let (width, height) = TARGET_SIZE;
    image.resize_exact(width, height, FilterType::CatmullRom).to_rgb8()
}

/// Whether an image has exactly the target size.
pub fn is_valid(image: &RgbImage) -> bool {
    image.dimensions() == TARGET_SIZE
}

/// Encode as PNG.
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    image.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)?;
    Ok(buffer)
}

/// Frame indices to sample from a video of `total` frames.
///
/// One frame per second (`fps` rounded, at least 1); more than
/// [`MAX_FRAMES`] candidates are thinned with [`uniform_sample`].
pub fn frame_indices(total: usize, fps: f64) -> Vec<usize> {
    let step = if fps.is_finite() {
        (fps.round() as usize).max(1)
    } else {
        1
    };
    let candidates = (0..total).step_by(step).collect::<Vec<_>>();
    if candidates.len() > MAX_FRAMES {
        uniform_sample(&candidates, MAX_FRAMES)
    } else {
        candidates
    }
}

/// Pick `n` evenly spaced items: `floor(i * gap + gap / 2)` for
/// `gap = len / n`.
pub fn uniform_sample<T: Copy>(items: &[T], n: usize) -> Vec<T> {
    if n == 0 || items.is_empty() {
        return Vec::new();
    }
    let gap = items.len() as f64 / n as f64;
    (0..n)
        .map(|i| (i as f64 * gap + gap / 2.0) as usize)
        .filter_map(|index| items.get(index).copied())
        .collect()
}
