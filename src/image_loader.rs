//! Image decoding and view transforms.
//!
//! Decoding is blocking and CPU-bound; callers run it on the rayon pool.

use crate::error::{AppError, Result};
use crate::image_cache::CachedImage;
use image::{DynamicImage, RgbImage};
use std::path::Path;

/// Rotation and mirroring applied to the displayed image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Transform {
    /// Clockwise, one of 0, 90, 180, 270.
    pub rotation: u16,
    pub flip_horizontal: bool,
    pub flip_vertical: bool,
}

impl Transform {
    pub fn is_identity(&self) -> bool {
        *self == Transform::default()
    }

    /// Rotates a further 90 degrees clockwise.
    pub fn rotate(&mut self) {
        self.rotation = (self.rotation + 90) % 360;
    }

    pub fn toggle_flip_horizontal(&mut self) {
        self.flip_horizontal = !self.flip_horizontal;
    }

    pub fn toggle_flip_vertical(&mut self) {
        self.flip_vertical = !self.flip_vertical;
    }

    pub fn reset(&mut self) {
        *self = Transform::default();
    }

    /// Produces a transformed copy. Flips are applied before rotation.
    pub fn apply(&self, source: &CachedImage) -> Option<CachedImage> {
        let mut img = RgbImage::from_raw(source.width, source.height, source.data.clone())?;

        if self.flip_horizontal {
            image::imageops::flip_horizontal_in_place(&mut img);
        }
        if self.flip_vertical {
            image::imageops::flip_vertical_in_place(&mut img);
        }
        let img = match self.rotation {
            90 => image::imageops::rotate90(&img),
            180 => image::imageops::rotate180(&img),
            270 => image::imageops::rotate270(&img),
            _ => img,
        };

        let (width, height) = img.dimensions();
        Some(CachedImage::new(img.into_raw(), width, height))
    }
}

/// Load an image from a file path and decode it to RGB8.
pub fn decode(path: &Path) -> Result<CachedImage> {
    let reader = image::ImageReader::open(path)
        .map_err(|e| AppError::from_io(path, e))?
        .with_guessed_format()
        .map_err(|e| AppError::from_io(path, e))?;

    let img: DynamicImage = reader.decode().map_err(|e| AppError::DecodeFailure {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();
    Ok(CachedImage::new(rgb.into_raw(), width, height))
}
