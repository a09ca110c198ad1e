//! Thumbnail rendering seam.
//!
//! The registry never knows how a preview is drawn. It hands a package to a
//! [`ThumbnailRenderer`] and expects a PNG at the output path afterwards.

use crate::config::ThumbnailConfig;
use crate::error::Result;
use crate::library::package;
use crate::library::types::{LibEntryType, TextureChannel};
use image::imageops::FilterType;
use image::{Rgba, RgbaImage};
use std::path::Path;
use tracing::debug;

/// Produces the thumbnail image of one package.
pub trait ThumbnailRenderer {
    /// Render the package at `package_dir` and write a PNG to `output`.
    fn render(&self, package_dir: &Path, entry_type: LibEntryType, output: &Path) -> Result<()>;
}

/// Headless renderer.
///
/// Uses the package's preview channel when it is a decodable image,
/// otherwise a flat swatch coloured by entry type.
#[derive(Debug, Clone)]
pub struct PlaceholderRenderer {
    size: u32,
}

impl Default for PlaceholderRenderer {
    fn default() -> Self {
        Self::new(ThumbnailConfig::THUMBNAIL_SIZE)
    }
}

impl PlaceholderRenderer {
    pub fn new(size: u32) -> Self {
        Self { size: size.max(1) }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    fn swatch(&self, entry_type: LibEntryType) -> RgbaImage {
        let color = match entry_type {
            LibEntryType::PbrMaterial => Rgba([150, 150, 160, 255]),
            LibEntryType::UnlitTexture => Rgba([180, 180, 200, 255]),
            LibEntryType::Skybox => Rgba([110, 150, 210, 255]),
        };
        RgbaImage::from_pixel(self.size, self.size, color)
    }

    fn from_channel(&self, package_dir: &Path, entry_type: LibEntryType) -> Option<RgbaImage> {
        let channel = match entry_type {
            LibEntryType::PbrMaterial => TextureChannel::Albedo,
            LibEntryType::UnlitTexture => TextureChannel::Texture,
            LibEntryType::Skybox => TextureChannel::Hdri,
        };
        let metadata = package::read_package(package_dir).ok()?;
        let file = metadata.slot(channel)?.file.as_ref()?;
        let source = image::open(package_dir.join(file)).ok()?;
        Some(
            source
                .resize_exact(self.size, self.size, FilterType::Triangle)
                .to_rgba8(),
        )
    }
}

impl ThumbnailRenderer for PlaceholderRenderer {
    fn render(&self, package_dir: &Path, entry_type: LibEntryType, output: &Path) -> Result<()> {
        let image = match self.from_channel(package_dir, entry_type) {
            Some(image) => image,
            None => {
                debug!("No preview channel for {}, using swatch", package_dir.display());
                self.swatch(entry_type)
            }
        };
        image.save(output)?;
        Ok(())
    }
}
