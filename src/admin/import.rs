/// Bulk image import from a local folder
use log::{info, warn};
use std::path::Path;
use walkdir::WalkDir;

use crate::error::StoreError;
use crate::media::{ImageContext, ObjectStore};
use crate::state::Library;

/// Extensions picked up by the importer
pub const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "webp", "gif", "bmp"];

/// Result of a folder import
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportResult {
    pub imported: Vec<String>,
    pub skipped_count: usize,
}

impl ImportResult {
    pub fn imported_count(&self) -> usize {
        self.imported.len()
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// Upload every image under `folder`, resized for `context`.
///
/// Hero and gallery imports also create the matching content rows, appended
/// after the existing ones. Unreadable files and failed uploads are skipped.
pub fn import_images(
    library: &Library,
    store: &ObjectStore,
    folder: &Path,
    context: ImageContext,
) -> Result<ImportResult, StoreError> {
    let mut result = ImportResult::default();
    info!("scanning folder: {}", folder.display());

    let mut paths: Vec<_> = WalkDir::new(folder)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.is_file() && is_image(p))
        .collect();
    paths.sort();

    for path in paths {
        let file_name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();

        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("could not read {}: {}", path.display(), e);
                result.skipped_count += 1;
                continue;
            }
        };

        let url = match store.upload_image(&bytes, &file_name, Some(context)) {
            Ok(url) => url,
            Err(e) => {
                warn!("could not upload {}: {}", file_name, e);
                result.skipped_count += 1;
                continue;
            }
        };

        match context {
            ImageContext::Hero => {
                library.insert_hero_slide(&url, None, None)?;
            }
            ImageContext::Gallery => {
                library.insert_gallery_image(&url)?;
            }
            ImageContext::Product | ImageContext::Category => {}
        }

        result.imported.push(url);
        if result.imported.len() % 100 == 0 {
            info!("imported {} files...", result.imported.len());
        }
    }

    info!(
        "import complete: {} new, {} skipped",
        result.imported_count(),
        result.skipped_count
    );
    Ok(result)
}
