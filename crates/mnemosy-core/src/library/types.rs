//! Identity and classification types shared by the library tree.

use crate::config::LibraryConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Process-lifetime identity of a folder node.
///
/// Stable across moves and renames and never reused within a tree, so it is
/// safe to carry across frames where a reference would not be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FolderId(pub(crate) u64);

/// Process-lifetime identity of a library entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(pub(crate) u64);

impl FolderId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl EntryId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for FolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "folder#{}", self.0)
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entry#{}", self.0)
    }
}

/// Kind of asset an entry represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LibEntryType {
    PbrMaterial,
    UnlitTexture,
    Skybox,
}

impl LibEntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LibEntryType::PbrMaterial => "pbr_material",
            LibEntryType::UnlitTexture => "unlit_texture",
            LibEntryType::Skybox => "skybox",
        }
    }

    pub fn default_name(&self) -> &'static str {
        match self {
            LibEntryType::PbrMaterial => LibraryConfig::DEFAULT_MATERIAL_NAME,
            LibEntryType::UnlitTexture => LibraryConfig::DEFAULT_TEXTURE_NAME,
            LibEntryType::Skybox => LibraryConfig::DEFAULT_SKYBOX_NAME,
        }
    }

    /// Texture slots a package of this type carries.
    pub fn channels(&self) -> &'static [TextureChannel] {
        match self {
            LibEntryType::PbrMaterial => &[
                TextureChannel::Albedo,
                TextureChannel::Roughness,
                TextureChannel::Metallic,
                TextureChannel::Normal,
                TextureChannel::AmbientOcclusion,
                TextureChannel::Emission,
                TextureChannel::Height,
                TextureChannel::Opacity,
            ],
            LibEntryType::UnlitTexture => &[TextureChannel::Texture],
            LibEntryType::Skybox => &[TextureChannel::Hdri],
        }
    }
}

impl fmt::Display for LibEntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LibEntryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pbr_material" | "pbr" | "material" => Ok(LibEntryType::PbrMaterial),
            "unlit_texture" | "texture" | "unlit" => Ok(LibEntryType::UnlitTexture),
            "skybox" | "hdri" => Ok(LibEntryType::Skybox),
            other => Err(format!("unknown entry type '{}'", other)),
        }
    }
}

/// One texture slot of a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextureChannel {
    Albedo,
    Roughness,
    Metallic,
    Normal,
    AmbientOcclusion,
    Emission,
    Height,
    Opacity,
    Texture,
    Hdri,
}

impl TextureChannel {
    /// File stem of the channel file inside a package.
    pub fn file_stem(&self) -> &'static str {
        match self {
            TextureChannel::Albedo => "albedo",
            TextureChannel::Roughness => "roughness",
            TextureChannel::Metallic => "metallic",
            TextureChannel::Normal => "normal",
            TextureChannel::AmbientOcclusion => "ambient_occlusion",
            TextureChannel::Emission => "emission",
            TextureChannel::Height => "height",
            TextureChannel::Opacity => "opacity",
            TextureChannel::Texture => "texture",
            TextureChannel::Hdri => "hdri",
        }
    }
}

impl FromStr for TextureChannel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let channel = match s.to_lowercase().as_str() {
            "albedo" => TextureChannel::Albedo,
            "roughness" => TextureChannel::Roughness,
            "metallic" => TextureChannel::Metallic,
            "normal" => TextureChannel::Normal,
            "ambient_occlusion" | "ao" => TextureChannel::AmbientOcclusion,
            "emission" => TextureChannel::Emission,
            "height" => TextureChannel::Height,
            "opacity" => TextureChannel::Opacity,
            "texture" => TextureChannel::Texture,
            "hdri" => TextureChannel::Hdri,
            other => return Err(format!("unknown texture channel '{}'", other)),
        };
        Ok(channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_type_from_str() {
        for entry_type in [
            LibEntryType::PbrMaterial,
            LibEntryType::UnlitTexture,
            LibEntryType::Skybox,
        ] {
            assert_eq!(entry_type.as_str().parse::<LibEntryType>(), Ok(entry_type));
        }
        assert!("mesh".parse::<LibEntryType>().is_err());
    }

    #[test]
    fn test_channel_counts() {
        assert_eq!(LibEntryType::PbrMaterial.channels().len(), 8);
        assert_eq!(LibEntryType::UnlitTexture.channels(), &[TextureChannel::Texture]);
        assert_eq!(LibEntryType::Skybox.channels(), &[TextureChannel::Hdri]);
    }

    #[test]
    fn test_entry_type_serde_tag() {
        let json = serde_json::to_string(&LibEntryType::UnlitTexture).unwrap();
        assert_eq!(json, "\"unlit_texture\"");
    }
}
