//! Atlas builder: decodes every configured image concurrently, stacks the
//! survivors into one vertical-strip bitmap and records a normalized UV
//! rectangle per image.
//!
//! Decode failures are absorbed here and never surfaced to callers; a
//! session that loses images just runs with fewer of them.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use image::RgbaImage;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Normalized rectangle locating one image inside the atlas.
///
/// Y is expressed bottom-up (UV convention of the render surface), so
/// `y_start` is the top edge of the image's band and `y_start > y_end`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvRect {
    pub x_start: f32,
    pub x_end: f32,
    pub y_start: f32,
    pub y_end: f32,
}

impl UvRect {
    #[must_use]
    pub const fn to_array(self) -> [f32; 4] {
        [self.x_start, self.x_end, self.y_start, self.y_end]
    }
}

/// One successfully loaded source image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub aspect_ratio: f32,
    pub uvs: UvRect,
}

/// The composed atlas bitmap plus the per-image UV table.
///
/// When no image loads, `width == height == 1`, `pixels` is a single
/// transparent texel and `images` is empty. Downstream surface creation is
/// suppressed in that state.
#[derive(Debug)]
pub struct Atlas {
    pub width: u32,
    pub height: u32,
    /// RGBA8 rows, top-down.
    pub pixels: Vec<u8>,
    pub images: Vec<ImageInfo>,
}

impl Atlas {
    fn placeholder() -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: vec![0, 0, 0, 0],
            images: Vec::new(),
        }
    }
}

// Decodes an image to RGBA8 and applies EXIF orientation if available.
// Orientation handling is best-effort; missing metadata keeps the pixels
// as decoded.
fn decode_rgba8_apply_exif(path: &Path) -> anyhow::Result<RgbaImage> {
    let img = image::ImageReader::open(path)?
        .with_guessed_format()?
        .decode()?;

    let mut img = img.to_rgba8();

    let orientation: u16 = read_orientation(path).unwrap_or(1);
    match orientation {
        1 => {}
        2 => {
            img = image::imageops::flip_horizontal(&img);
        }
        3 => {
            img = image::imageops::rotate180(&img);
        }
        4 => {
            img = image::imageops::flip_vertical(&img);
        }
        5 => {
            img = image::imageops::rotate90(&img);
            img = image::imageops::flip_horizontal(&img);
        }
        6 => {
            img = image::imageops::rotate90(&img);
        }
        7 => {
            img = image::imageops::rotate270(&img);
            img = image::imageops::flip_horizontal(&img);
        }
        8 => {
            img = image::imageops::rotate270(&img);
        }
        _ => {}
    }

    Ok(img)
}

fn read_orientation(path: &Path) -> Option<u16> {
    let file = File::open(path).ok()?;
    let mut buf = BufReader::new(file);
    let exif = exif::Reader::new().read_from_container(&mut buf).ok()?;
    let field = exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)?;
    let val = field.value.get_uint(0)?;
    Some(val as u16)
}

/// Decode all `paths` concurrently and return the successful images in the
/// original relative order. Every attempt is awaited; failures are logged
/// and dropped without aborting the batch. There is no retry.
pub async fn load_images(paths: &[PathBuf]) -> Vec<RgbaImage> {
    let mut tasks: JoinSet<(usize, Option<RgbaImage>)> = JoinSet::new();
    for (idx, path) in paths.iter().enumerate() {
        let path = path.clone();
        tasks.spawn(async move {
            let decode_path = path.clone();
            let res =
                tokio::task::spawn_blocking(move || decode_rgba8_apply_exif(&decode_path)).await;
            match res {
                Ok(Ok(img)) => {
                    debug!("loaded {}", path.display());
                    (idx, Some(img))
                }
                Ok(Err(e)) => {
                    warn!("skipping {}: {e:#}", path.display());
                    (idx, None)
                }
                Err(e) => {
                    warn!("decode task for {} failed: {e}", path.display());
                    (idx, None)
                }
            }
        });
    }

    let mut slots: Vec<Option<RgbaImage>> = (0..paths.len()).map(|_| None).collect();
    while let Some(joined) = tasks.join_next().await {
        if let Ok((idx, img)) = joined {
            slots[idx] = img;
        }
    }
    slots.into_iter().flatten().collect()
}

/// Stack `sources` into one bitmap and compute each image's UV rectangle.
///
/// Atlas width is the maximum source width, height the sum of source
/// heights; images are drawn top-down at x = 0 in sequence order. The UV
/// bands are pairwise disjoint and jointly cover [0, 1].
#[must_use]
pub fn compose_atlas(sources: Vec<RgbaImage>) -> Atlas {
    let valid: Vec<RgbaImage> = sources
        .into_iter()
        .filter(|img| img.width() > 0 && img.height() > 0)
        .collect();

    if valid.is_empty() {
        return Atlas::placeholder();
    }

    let atlas_w = valid.iter().map(RgbaImage::width).max().unwrap_or(1);
    let atlas_h: u32 = valid.iter().map(RgbaImage::height).sum();

    let mut bitmap = RgbaImage::new(atlas_w, atlas_h);
    let total = atlas_h as f32;

    let mut current_y: u32 = 0;
    let mut infos = Vec::with_capacity(valid.len());
    for img in &valid {
        image::imageops::replace(&mut bitmap, img, 0, i64::from(current_y));

        let (w, h) = img.dimensions();
        infos.push(ImageInfo {
            width: w,
            height: h,
            aspect_ratio: w as f32 / h as f32,
            uvs: UvRect {
                x_start: 0.0,
                x_end: w as f32 / atlas_w as f32,
                y_start: 1.0 - current_y as f32 / total,
                y_end: 1.0 - (current_y + h) as f32 / total,
            },
        });
        current_y += h;
    }

    Atlas {
        width: atlas_w,
        height: atlas_h,
        pixels: bitmap.into_raw(),
        images: infos,
    }
}

/// Load every path and compose whatever survived into the atlas.
pub async fn build_atlas(paths: &[PathBuf]) -> Atlas {
    let images = load_images(paths).await;
    if images.len() < paths.len() {
        warn!(
            requested = paths.len(),
            loaded = images.len(),
            "some images failed to load and were excluded"
        );
    }
    compose_atlas(images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;

    // JPEG 2x1 with EXIF orientation 6 (rotate 90 CW), base64 encoded
    const ORIENT6_JPEG: &str = concat!(
        "/9j/4AAQSkZJRgABAQAAAQABAAD/4QAiRXhpZgAATU0AKgAAAAgAAQESAAMAAAABAAYAAAAAAAD/2wBDAAgGBgcGBQgHBwcJCQgKDBQNDAsLDBkSEw8UHRofHh0aHBwgJC4nICIsIxwcKDcpLDAxNDQ0Hyc5PTgyPC4zNDL/",
        "2wBDAQkJCQwLDBgNDRgyIRwhMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjL/wAARCAABAAIDASIAAhEBAxEB/8QAHwAAAQUBAQEBAQEAAAAAAAAAAAECAwQFBgcICQoL/8QAtRAAAgEDAwIEAwUFBAQAAAF9AQIDAAQRBRIhMUEGE1FhByJxFDKBkaEII0KxwRVS0fAkM2JyggkKFhcYGRolJicoKSo0NTY3ODk6Q0RFRkdISUpTVFVWV1hZWmNkZWZnaGlqc3R1dnd4eXqDhIWGh4iJipKTlJWWl5iZmqKjpKWmp6ipqrKztLW2t7i5usLDxMXGx8jJytLT1NXW19jZ2uHi4+Tl5ufo6erx8vP09fb3+Pn6/8QAHwEAAwEBAQEBAQEBAQAAAAAAAAECAwQFBgcICQoL/8QAtREAAgECBAQDBAcFBAQAAQJ3AAECAxEEBSExBhJBUQdhcRMiMoEIFEKRobHBCSMzUvAVYnLRChYkNOEl8RcYGRomJygpKjU2Nzg5OkNERUZHSElKU1RVVldYWVpjZGVmZ2hpanN0dXZ3eHl6goOEhYaHiImKkpOUlZaXmJmaoqOkpaanqKmqsrO0tba3uLm6wsPExcbHyMnK0tPU1dbX2Nna4uPk5ebn6Onq8vP09fb3+Pn6/9oADAMBAAIRAxEAPwDi6KKK+ZP3E//Z"
    );

    #[test]
    fn applies_orientation_six() {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(ORIENT6_JPEG)
            .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orient6.jpg");
        std::fs::write(&path, &bytes).unwrap();
        let img = decode_rgba8_apply_exif(&path).unwrap();
        assert_eq!(img.dimensions(), (1, 2));
    }

    #[test]
    fn placeholder_for_no_sources() {
        let atlas = compose_atlas(Vec::new());
        assert_eq!((atlas.width, atlas.height), (1, 1));
        assert_eq!(atlas.pixels.len(), 4);
        assert!(atlas.images.is_empty());
    }
}
