//! On-disk entry packages.
//!
//! Every entry owns one directory (its package) named after the entry. The
//! package holds a small `entry.mnsydata` metadata file plus one file per
//! assigned texture channel. File names inside a package are fixed, so a
//! rename only touches the directory name and the metadata `name` field.

use crate::config::{LibraryConfig, ThumbnailConfig};
use crate::error::{MnemosyError, Result};
use crate::library::types::{LibEntryType, TextureChannel};
use crate::metadata::{atomic_read_json, atomic_write_json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// One texture slot of a package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSlot {
    pub channel: TextureChannel,
    /// File name inside the package, once a texture is assigned.
    #[serde(default)]
    pub file: Option<String>,
}

/// Scalar shading parameters of a PBR material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialParameters {
    pub albedo_color: [f32; 3],
    pub roughness: f32,
    pub metallic: f32,
    pub emission_color: [f32; 3],
    pub emission_strength: f32,
    pub normal_strength: f32,
    pub opacity: f32,
    pub uv_tiling: [f32; 2],
}

impl Default for MaterialParameters {
    fn default() -> Self {
        Self {
            albedo_color: [0.8, 0.8, 0.8],
            roughness: 0.5,
            metallic: 0.0,
            emission_color: [0.0, 0.0, 0.0],
            emission_strength: 0.0,
            normal_strength: 1.0,
            opacity: 1.0,
            uv_tiling: [1.0, 1.0],
        }
    }
}

impl MaterialParameters {
    /// Clamp every parameter into its physically meaningful range.
    pub fn clamped(mut self) -> Self {
        for c in self.albedo_color.iter_mut().chain(self.emission_color.iter_mut()) {
            *c = c.clamp(0.0, 1.0);
        }
        self.roughness = self.roughness.clamp(0.0, 1.0);
        self.metallic = self.metallic.clamp(0.0, 1.0);
        self.opacity = self.opacity.clamp(0.0, 1.0);
        self.emission_strength = self.emission_strength.max(0.0);
        self.normal_strength = self.normal_strength.max(0.0);
        for t in self.uv_tiling.iter_mut() {
            *t = t.max(0.001);
        }
        self
    }
}

/// Contents of `entry.mnsydata`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageMetadata {
    pub format_version: u32,
    pub name: String,
    pub entry_type: LibEntryType,
    #[serde(default)]
    pub channels: Vec<ChannelSlot>,
    #[serde(default)]
    pub material: Option<MaterialParameters>,
    pub created_at: String,
    #[serde(default)]
    pub modified_at: Option<String>,
}

impl PackageMetadata {
    /// Fresh metadata with empty slots for every channel of `entry_type`.
    pub fn new(name: &str, entry_type: LibEntryType) -> Self {
        Self {
            format_version: LibraryConfig::DATA_FORMAT_VERSION,
            name: name.to_string(),
            entry_type,
            channels: entry_type
                .channels()
                .iter()
                .map(|channel| ChannelSlot {
                    channel: *channel,
                    file: None,
                })
                .collect(),
            material: match entry_type {
                LibEntryType::PbrMaterial => Some(MaterialParameters::default()),
                _ => None,
            },
            created_at: Utc::now().to_rfc3339(),
            modified_at: None,
        }
    }

    pub fn slot(&self, channel: TextureChannel) -> Option<&ChannelSlot> {
        self.channels.iter().find(|s| s.channel == channel)
    }

    fn touch(&mut self) {
        self.modified_at = Some(Utc::now().to_rfc3339());
    }
}

/// Path of the metadata file inside a package directory.
pub fn metadata_path(package_dir: &Path) -> PathBuf {
    package_dir.join(LibraryConfig::ENTRY_METADATA_FILENAME)
}

/// Path of the rendered thumbnail inside a package directory.
pub fn thumbnail_path(package_dir: &Path) -> PathBuf {
    package_dir.join(ThumbnailConfig::THUMBNAIL_FILENAME)
}

/// Create a package directory with its metadata file.
///
/// The directory must not exist yet. If writing the metadata fails the
/// directory is removed again, so either a complete package exists or
/// nothing does.
pub fn scaffold_package(package_dir: &Path, name: &str, entry_type: LibEntryType) -> Result<PackageMetadata> {
    fs::create_dir(package_dir).map_err(|e| {
        MnemosyError::io_context(
            format!("Failed to create package directory {}", package_dir.display()),
            package_dir,
            e,
        )
    })?;

    let metadata = PackageMetadata::new(name, entry_type);
    if let Err(e) = atomic_write_json(&metadata_path(package_dir), &metadata, false) {
        if let Err(cleanup) = fs::remove_dir_all(package_dir) {
            warn!(
                "Failed to clean up partial package {}: {}",
                package_dir.display(),
                cleanup
            );
        }
        return Err(e);
    }

    debug!("Scaffolded {} package at {}", entry_type, package_dir.display());
    Ok(metadata)
}

/// Read a package's metadata file.
pub fn read_package(package_dir: &Path) -> Result<PackageMetadata> {
    let path = metadata_path(package_dir);
    match atomic_read_json(&path) {
        Ok(Some(metadata)) => Ok(metadata),
        Ok(None) => Err(MnemosyError::CorruptLibraryData {
            path,
            message: "package metadata file is missing".to_string(),
        }),
        Err(MnemosyError::Json { message, .. }) => {
            Err(MnemosyError::CorruptLibraryData { path, message })
        }
        Err(e) => Err(e),
    }
}

/// Overwrite a package's metadata file.
pub fn write_package(package_dir: &Path, metadata: &PackageMetadata) -> Result<()> {
    atomic_write_json(&metadata_path(package_dir), metadata, false)
}

/// Record a new display name in the package metadata.
///
/// A package without readable metadata is repaired by writing fresh
/// metadata for `entry_type`.
pub fn set_package_name(package_dir: &Path, name: &str, entry_type: LibEntryType) -> Result<()> {
    let mut metadata = match read_package(package_dir) {
        Ok(metadata) => metadata,
        Err(e) => {
            warn!(
                "Rewriting unreadable package metadata in {}: {}",
                package_dir.display(),
                e
            );
            PackageMetadata::new(name, entry_type)
        }
    };
    metadata.name = name.to_string();
    metadata.touch();
    write_package(package_dir, &metadata)
}

/// Replace the material parameters of a PBR package.
pub fn write_material(package_dir: &Path, params: MaterialParameters) -> Result<PackageMetadata> {
    let mut metadata = read_package(package_dir)?;
    if metadata.entry_type != LibEntryType::PbrMaterial {
        return Err(MnemosyError::invalid_operation(format!(
            "'{}' is a {}, not a PBR material",
            metadata.name, metadata.entry_type
        )));
    }
    metadata.material = Some(params.clamped());
    metadata.touch();
    write_package(package_dir, &metadata)?;
    Ok(metadata)
}

/// Copy `source` into the package as the file for `channel`.
///
/// Returns the file name stored in the slot. Any previous file of that
/// slot with a different extension is removed afterwards.
pub fn assign_channel(package_dir: &Path, channel: TextureChannel, source: &Path) -> Result<String> {
    let mut metadata = read_package(package_dir)?;
    let slot_index = metadata
        .channels
        .iter()
        .position(|s| s.channel == channel)
        .ok_or_else(|| {
            MnemosyError::invalid_operation(format!(
                "a {} has no {:?} channel",
                metadata.entry_type, channel
            ))
        })?;

    if !source.is_file() {
        return Err(MnemosyError::InvalidPath {
            path: source.to_path_buf(),
            reason: "not a file".to_string(),
        });
    }

    let file_name = match source.extension() {
        Some(ext) => format!("{}.{}", channel.file_stem(), ext.to_string_lossy().to_lowercase()),
        None => channel.file_stem().to_string(),
    };
    let target = package_dir.join(&file_name);
    fs::copy(source, &target).map_err(|e| {
        MnemosyError::io_context(
            format!("Failed to copy {} into package", source.display()),
            &target,
            e,
        )
    })?;

    let previous = metadata.channels[slot_index].file.replace(file_name.clone());
    metadata.touch();
    write_package(package_dir, &metadata)?;

    if let Some(old) = previous.filter(|old| *old != file_name) {
        if let Err(e) = fs::remove_file(package_dir.join(&old)) {
            warn!("Failed to remove replaced channel file {}: {}", old, e);
        }
    }

    Ok(file_name)
}

/// Recursively copy a package directory to `destination`, which must not
/// exist. A failed copy removes whatever was written.
pub fn copy_package(source: &Path, destination: &Path) -> Result<()> {
    if destination.exists() {
        return Err(MnemosyError::InvalidPath {
            path: destination.to_path_buf(),
            reason: "destination already exists".to_string(),
        });
    }

    let result = copy_tree(source, destination);
    if result.is_err() && destination.exists() {
        if let Err(e) = fs::remove_dir_all(destination) {
            warn!("Failed to clean up partial copy {}: {}", destination.display(), e);
        }
    }
    result
}

fn copy_tree(source: &Path, destination: &Path) -> Result<()> {
    for entry in WalkDir::new(source) {
        let entry = entry.map_err(|e| MnemosyError::Io {
            message: format!("Failed to walk {}: {}", source.display(), e),
            path: Some(source.to_path_buf()),
            source: e.into_io_error(),
        })?;
        let relative = entry.path().strip_prefix(source).map_err(|_| MnemosyError::InvalidPath {
            path: entry.path().to_path_buf(),
            reason: "escaped package directory".to_string(),
        })?;
        let target = destination.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| MnemosyError::io_with_path(e, &target))?;
        } else {
            fs::copy(entry.path(), &target).map_err(|e| MnemosyError::io_with_path(e, &target))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_scaffold_pbr_package() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("Brick");

        let metadata = scaffold_package(&dir, "Brick", LibEntryType::PbrMaterial).unwrap();

        assert!(metadata_path(&dir).is_file());
        assert_eq!(metadata.channels.len(), 8);
        assert!(metadata.material.is_some());
        assert_eq!(read_package(&dir).unwrap(), metadata);
    }

    #[test]
    fn test_scaffold_skybox_has_single_slot() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("Sky");

        let metadata = scaffold_package(&dir, "Sky", LibEntryType::Skybox).unwrap();

        assert_eq!(metadata.channels.len(), 1);
        assert!(metadata.slot(TextureChannel::Hdri).is_some());
        assert!(metadata.material.is_none());
    }

    #[test]
    fn test_scaffold_refuses_existing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("Taken");
        fs::create_dir(&dir).unwrap();

        let result = scaffold_package(&dir, "Taken", LibEntryType::UnlitTexture);
        assert!(matches!(result, Err(MnemosyError::Io { .. })));
        assert!(!metadata_path(&dir).exists());
    }

    #[test]
    fn test_read_missing_metadata_is_corrupt() {
        let temp_dir = TempDir::new().unwrap();
        let result = read_package(temp_dir.path());
        assert!(matches!(result, Err(MnemosyError::CorruptLibraryData { .. })));
    }

    #[test]
    fn test_set_package_name() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("Old");
        scaffold_package(&dir, "Old", LibEntryType::UnlitTexture).unwrap();

        set_package_name(&dir, "New", LibEntryType::UnlitTexture).unwrap();

        let metadata = read_package(&dir).unwrap();
        assert_eq!(metadata.name, "New");
        assert!(metadata.modified_at.is_some());
    }

    #[test]
    fn test_assign_channel_copies_file() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("Brick");
        scaffold_package(&dir, "Brick", LibEntryType::PbrMaterial).unwrap();
        let source = temp_dir.path().join("brick_diffuse.PNG");
        fs::write(&source, b"fake image").unwrap();

        let file = assign_channel(&dir, TextureChannel::Albedo, &source).unwrap();

        assert_eq!(file, "albedo.png");
        assert_eq!(fs::read(dir.join("albedo.png")).unwrap(), b"fake image");
        let metadata = read_package(&dir).unwrap();
        assert_eq!(
            metadata.slot(TextureChannel::Albedo).unwrap().file.as_deref(),
            Some("albedo.png")
        );
    }

    #[test]
    fn test_assign_channel_replaces_old_extension() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("Sky");
        scaffold_package(&dir, "Sky", LibEntryType::Skybox).unwrap();
        let first = temp_dir.path().join("a.hdr");
        let second = temp_dir.path().join("b.exr");
        fs::write(&first, b"1").unwrap();
        fs::write(&second, b"2").unwrap();

        assign_channel(&dir, TextureChannel::Hdri, &first).unwrap();
        assign_channel(&dir, TextureChannel::Hdri, &second).unwrap();

        assert!(!dir.join("hdri.hdr").exists());
        assert!(dir.join("hdri.exr").exists());
    }

    #[test]
    fn test_assign_channel_rejects_foreign_slot() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("Sky");
        scaffold_package(&dir, "Sky", LibEntryType::Skybox).unwrap();
        let source = temp_dir.path().join("n.png");
        fs::write(&source, b"n").unwrap();

        let result = assign_channel(&dir, TextureChannel::Normal, &source);
        assert!(matches!(result, Err(MnemosyError::InvalidOperation { .. })));
    }

    #[test]
    fn test_write_material_clamps() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("Metal");
        scaffold_package(&dir, "Metal", LibEntryType::PbrMaterial).unwrap();

        let params = MaterialParameters {
            roughness: 4.0,
            metallic: -1.0,
            ..MaterialParameters::default()
        };
        let metadata = write_material(&dir, params).unwrap();
        let material = metadata.material.unwrap();
        assert_eq!(material.roughness, 1.0);
        assert_eq!(material.metallic, 0.0);
    }

    #[test]
    fn test_copy_package() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("Brick");
        scaffold_package(&source, "Brick", LibEntryType::PbrMaterial).unwrap();
        fs::write(source.join("albedo.png"), b"px").unwrap();
        let destination = temp_dir.path().join("export").join("Brick");
        fs::create_dir_all(destination.parent().unwrap()).unwrap();

        copy_package(&source, &destination).unwrap();

        assert!(metadata_path(&destination).is_file());
        assert_eq!(fs::read(destination.join("albedo.png")).unwrap(), b"px");
        assert!(copy_package(&source, &destination).is_err());
    }
}
