/// Image and file handling module
///
/// This module handles:
/// - Resizing uploads to per-context canvases before they are stored
/// - Pan/zoom transforms for displaying stored images
/// - Storing uploaded files and handing out public URLs

pub mod resize;
pub mod storage;
pub mod transform;

pub use resize::{
    format_file_size, image_info, resize_image, resize_image_async, DimensionOverrides,
    ImageContext, ImageInfo, ResizedImage,
};
pub use storage::{Bucket, ObjectStore};
pub use transform::{ImageFit, Transform};
