//! Entry preview thumbnails.

mod manager;
mod renderer;

pub use manager::{Thumbnail, ThumbnailManager, ThumbnailState};
pub use renderer::{PlaceholderRenderer, ThumbnailRenderer};
