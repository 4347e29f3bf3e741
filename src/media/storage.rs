/// File-backed object storage
///
/// Uploaded images and videos are written under `<root>/<bucket>/<name>` and
/// served from `<public_url>/<bucket>/<name>`. Object names are generated, so
/// two uploads of the same file never collide.

use log::{info, warn};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::StorageError;
use crate::ids::{now_millis, random_base36};
use crate::media::resize::{resize_image, DimensionOverrides, ImageContext};

/// Storage namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Images,
    Videos,
}

impl Bucket {
    pub fn as_str(self) -> &'static str {
        match self {
            Bucket::Images => "images",
            Bucket::Videos => "videos",
        }
    }
}

/// The object store rooted at a local directory
#[derive(Debug, Clone)]
pub struct ObjectStore {
    root: PathBuf,
    public_url: String,
}

impl ObjectStore {
    /// Open the store, creating the bucket directories if they don't exist
    pub fn open(root: impl Into<PathBuf>, public_url: &str) -> Result<Self, StorageError> {
        let root = root.into();
        for bucket in [Bucket::Images, Bucket::Videos] {
            fs::create_dir_all(root.join(bucket.as_str())).map_err(StorageError::Upload)?;
        }

        Ok(Self {
            root,
            public_url: public_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Public URL for an object
    pub fn public_url(&self, bucket: Bucket, name: &str) -> String {
        format!("{}/{}/{}", self.public_url, bucket.as_str(), name)
    }

    /// Path on disk for an object
    pub fn object_path(&self, bucket: Bucket, name: &str) -> PathBuf {
        self.root.join(bucket.as_str()).join(name)
    }

    /// Write a new object; never overwrites an existing one
    /// Returns the object's public URL
    pub fn put(&self, bucket: Bucket, name: &str, bytes: &[u8]) -> Result<String, StorageError> {
        validate_name(name)?;
        let path = self.object_path(bucket, name);

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(StorageError::Upload)?;
        file.write_all(bytes).map_err(StorageError::Upload)?;

        info!("stored {} ({} bytes)", path.display(), bytes.len());
        Ok(self.public_url(bucket, name))
    }

    /// Upload an image, optionally resized for a display context first
    ///
    /// A failed resize is not fatal: the original bytes are uploaded instead.
    pub fn upload_image(
        &self,
        bytes: &[u8],
        file_name: &str,
        resize_for: Option<ImageContext>,
    ) -> Result<String, StorageError> {
        let resized = resize_for.and_then(|context| {
            match resize_image(bytes, file_name, context, DimensionOverrides::default()) {
                Ok(resized) => Some(resized),
                Err(e) => {
                    warn!("image resize failed, uploading original {}: {}", file_name, e);
                    None
                }
            }
        });

        // Resized output is always JPEG, whatever was uploaded
        let (data, name) = match &resized {
            Some(r) => (r.bytes.as_slice(), generated_name(RESIZED_EXTENSION)),
            None => (bytes, object_name(file_name)),
        };
        self.put(Bucket::Images, &name, data)
    }

    /// Upload several images with the same options; stops at the first failure
    pub fn upload_images<'a>(
        &self,
        files: impl IntoIterator<Item = (&'a [u8], &'a str)>,
        resize_for: Option<ImageContext>,
    ) -> Result<Vec<String>, StorageError> {
        files
            .into_iter()
            .map(|(bytes, name)| self.upload_image(bytes, name, resize_for))
            .collect()
    }

    pub fn upload_video(&self, bytes: &[u8], file_name: &str) -> Result<String, StorageError> {
        let name = object_name(file_name);
        self.put(Bucket::Videos, &name, bytes)
    }

    /// Delete the object a public URL points at
    ///
    /// Returns `Ok(false)` when the URL is not inside the bucket or the object
    /// is already gone.
    pub fn delete_by_url(&self, url: &str, bucket: Bucket) -> Result<bool, StorageError> {
        let marker = format!("/{}/", bucket.as_str());
        let Some((_, name)) = url.split_once(&marker) else {
            return Ok(false);
        };
        validate_name(name)?;

        match fs::remove_file(self.object_path(bucket, name)) {
            Ok(()) => {
                info!("deleted {}/{}", bucket.as_str(), name);
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::Delete(e)),
        }
    }
}

/// Extension for objects written from a resize
const RESIZED_EXTENSION: &str = "jpg";

/// `<random>-<millis>.<ext>`, keeping the upload's extension
pub fn object_name(file_name: &str) -> String {
    let ext = Path::new(file_name)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| "bin".to_string());

    generated_name(&ext)
}

fn generated_name(ext: &str) -> String {
    format!("{}-{}.{}", random_base36(11), now_millis(), ext)
}

fn validate_name(name: &str) -> Result<(), StorageError> {
    let plain = !name.is_empty()
        && !name.contains(['/', '\\'])
        && name != "."
        && name != "..";
    if plain {
        Ok(())
    } else {
        Err(StorageError::InvalidName(name.to_string()))
    }
}
