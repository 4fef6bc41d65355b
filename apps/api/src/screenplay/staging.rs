//! Storyboard image staging.
//!
//! The supplied raster is re-encoded as baseline RGB JPEG into a uniquely named
//! temporary file, then read back by path for embedding. The file lives exactly as
//! long as the `StagedImage`; dropping it (on success or on any error path) removes
//! the file. Concurrent calls each get their own file.

use std::io::{BufWriter, Write};
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::screenplay::FormatError;

/// Fixed encoder quality so identical input always produces identical bytes.
const JPEG_QUALITY: u8 = 90;

/// A JPEG ready for embedding: DCT-encoded bytes plus pixel dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JpegData {
    pub bytes: Vec<u8>,
    pub width_px: u32,
    pub height_px: u32,
}

impl JpegData {
    /// Height / width, used to size the image at a fixed print width.
    pub fn aspect(&self) -> f32 {
        if self.width_px == 0 {
            return 0.0;
        }
        self.height_px as f32 / self.width_px as f32
    }
}

/// A JPEG written to a scoped temporary file.
pub struct StagedImage {
    file: NamedTempFile,
    width_px: u32,
    height_px: u32,
}

impl StagedImage {
    /// Encodes `image` to a temporary JPEG, inside `staging_dir` when given.
    pub fn stage(image: &DynamicImage, staging_dir: Option<&Path>) -> Result<Self, FormatError> {
        let rgb = image.to_rgb8();
        let (width_px, height_px) = rgb.dimensions();
        if width_px == 0 || height_px == 0 {
            return Err(FormatError::ImageIo("image has no pixels".to_string()));
        }

        let mut builder = tempfile::Builder::new();
        builder.prefix("storyboard-").suffix(".jpg");
        let mut file = match staging_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(|e| FormatError::ImageIo(format!("cannot create staging file: {e}")))?;

        {
            let mut writer = BufWriter::new(file.as_file_mut());
            JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY)
                .encode_image(&rgb)
                .map_err(|e| FormatError::ImageIo(format!("JPEG encoding failed: {e}")))?;
            writer
                .flush()
                .map_err(|e| FormatError::ImageIo(format!("cannot write staging file: {e}")))?;
        }

        debug!(
            path = %file.path().display(),
            width_px,
            height_px,
            "Staged storyboard image"
        );

        Ok(Self {
            file,
            width_px,
            height_px,
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Reads the staged file back by path.
    pub fn load(&self) -> Result<JpegData, FormatError> {
        let bytes = std::fs::read(self.path()).map_err(|e| {
            FormatError::ImageIo(format!(
                "cannot read staged image {}: {e}",
                self.path().display()
            ))
        })?;
        Ok(JpegData {
            bytes,
            width_px: self.width_px,
            height_px: self.height_px,
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
