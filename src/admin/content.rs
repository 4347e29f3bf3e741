/// Upload-backed admin edits
///
/// Each editor uploads an image (resized for where it will be shown) or a
/// video, then records the public URL on the owning row. Removing an entry also removes
/// its stored file.

use log::{info, warn};

use crate::error::StoreError;
use crate::media::{Bucket, ImageContext, ObjectStore};
use crate::state::content::OrderedTable;
use crate::state::data::{NewProduct, VideoBillboard, VideoSection};
use crate::state::Library;

fn remove_file(store: &ObjectStore, url: &str, bucket: Bucket) {
    match store.delete_by_url(url, bucket) {
        Ok(true) => {}
        Ok(false) => warn!("no stored file for {}", url),
        Err(e) => warn!("could not delete {}: {}", url, e),
    }
}

/// Add images to a product, in upload order. The first image becomes the
/// main image when the product has none; the rest join the detail gallery.
pub fn add_product_images(
    library: &Library,
    store: &ObjectStore,
    product_id: i64,
    files: &[(&[u8], &str)],
    resize: bool,
) -> Result<Vec<String>, StoreError> {
    let mut product = library
        .get_product(product_id)?
        .ok_or(StoreError::NotFound {
            entity: "product",
            id: product_id,
        })?;

    let urls = store.upload_images(files.iter().copied(), resize.then_some(ImageContext::Product))?;
    for url in &urls {
        if product.image_url.is_empty() {
            product.image_url = url.clone();
        } else {
            product.images.push(url.clone());
        }
    }

    library.update_product(product_id, &NewProduct::from(product))?;
    info!("product {}: {} image(s) added", product_id, urls.len());
    Ok(urls)
}

/// Replace a category tile image, deleting the previous file
pub fn replace_category_image(
    library: &Library,
    store: &ObjectStore,
    slug: &str,
    bytes: &[u8],
    file_name: &str,
) -> Result<String, StoreError> {
    let category = library
        .get_category_by_slug(slug)?
        .ok_or_else(|| StoreError::InvalidValue {
            field: "category",
            value: slug.to_string(),
        })?;

    let url = store.upload_image(bytes, file_name, Some(ImageContext::Category))?;
    library.set_category_image(category.id, &url, category.image_fit)?;
    if !category.image_url.is_empty() {
        remove_file(store, &category.image_url, Bucket::Images);
    }
    Ok(url)
}

/// Replace the header logo, deleting the previous file
pub fn replace_logo(
    library: &Library,
    store: &ObjectStore,
    bytes: &[u8],
    file_name: &str,
) -> Result<String, StoreError> {
    let mut branding = library.site_branding()?;
    let url = store.upload_image(bytes, file_name, None)?;
    let previous = std::mem::replace(&mut branding.logo_url, url.clone());

    library.save_site_branding(&branding)?;
    if !previous.is_empty() {
        remove_file(store, &previous, Bucket::Images);
    }
    Ok(url)
}

/// Upload a video for the home page video section and save it.
/// Starts from the default section when none exists yet.
pub fn set_section_video(
    library: &Library,
    store: &ObjectStore,
    bytes: &[u8],
    file_name: &str,
) -> Result<VideoSection, StoreError> {
    let mut section = library.video_section_or_default()?;
    let url = store.upload_video(bytes, file_name)?;
    let previous = std::mem::replace(&mut section.video_url, url);

    section.id = Some(library.save_video_section(&section)?);
    if !previous.is_empty() {
        remove_file(store, &previous, Bucket::Videos);
    }
    Ok(section)
}

/// Upload the billboard's background video and save it
pub fn set_billboard_video(
    library: &Library,
    store: &ObjectStore,
    bytes: &[u8],
    file_name: &str,
) -> Result<VideoBillboard, StoreError> {
    let mut billboard = library.video_billboard_or_default()?;
    billboard.video_url = Some(store.upload_video(bytes, file_name)?);
    billboard.id = Some(library.save_video_billboard(&billboard)?);
    Ok(billboard)
}

/// Upload the poster shown before the billboard video loads
pub fn set_billboard_poster(
    library: &Library,
    store: &ObjectStore,
    bytes: &[u8],
    file_name: &str,
) -> Result<VideoBillboard, StoreError> {
    let mut billboard = library.video_billboard_or_default()?;
    billboard.poster_image_url = Some(store.upload_image(bytes, file_name, None)?);
    billboard.id = Some(library.save_video_billboard(&billboard)?);
    Ok(billboard)
}

pub fn add_hero_slide(
    library: &Library,
    store: &ObjectStore,
    bytes: &[u8],
    file_name: &str,
    title: Option<&str>,
    subtitle: Option<&str>,
) -> Result<i64, StoreError> {
    let url = store.upload_image(bytes, file_name, Some(ImageContext::Hero))?;
    library.insert_hero_slide(&url, title, subtitle)
}

pub fn add_gallery_image(
    library: &Library,
    store: &ObjectStore,
    bytes: &[u8],
    file_name: &str,
) -> Result<i64, StoreError> {
    let url = store.upload_image(bytes, file_name, Some(ImageContext::Gallery))?;
    library.insert_gallery_image(&url)
}

/// Add a testimonial, with an optional customer photo `(bytes, file_name)`
pub fn add_testimonial(
    library: &Library,
    store: &ObjectStore,
    customer_name: &str,
    rating: i64,
    review_text: &str,
    photo: Option<(&[u8], &str)>,
) -> Result<i64, StoreError> {
    let photo_url = photo
        .map(|(bytes, name)| store.upload_image(bytes, name, Some(ImageContext::Gallery)))
        .transpose()?;
    library.insert_testimonial(customer_name, photo_url.as_deref(), rating, review_text)
}

/// Delete an ordered content entry together with its stored image
pub fn remove_content_image(
    library: &Library,
    store: &ObjectStore,
    table: OrderedTable,
    id: i64,
) -> Result<(), StoreError> {
    let url = match table {
        OrderedTable::HeroSlides => library
            .list_hero_slides(false)?
            .into_iter()
            .find(|s| s.id == id)
            .map(|s| s.image_url),
        OrderedTable::GalleryImages => library
            .list_gallery_images(false)?
            .into_iter()
            .find(|g| g.id == id)
            .map(|g| g.image_url),
        OrderedTable::Testimonials => library
            .list_testimonials(false)?
            .into_iter()
            .find(|t| t.id == id)
            .and_then(|t| t.customer_photo_url),
    };

    library.delete_content(table, id)?;
    if let Some(url) = url {
        remove_file(store, &url, Bucket::Images);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::library::tests::sample_product;
    use image::{DynamicImage, ImageFormat, RgbImage};
    use std::io::Cursor;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::new(width, height))
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    fn temp_store() -> ObjectStore {
        let dir = std::env::temp_dir().join(format!("storefront-admin-{}", crate::ids::random_base36(12)));
        ObjectStore::open(dir, "http://localhost:8080/storage").unwrap()
    }

    fn stored(store: &ObjectStore, url: &str) -> bool {
        let name = url.rsplit('/').next().unwrap();
        store.object_path(Bucket::Images, name).exists()
    }

    #[test]
    fn test_product_images_fill_main_then_gallery() {
        let lib = Library::open_in_memory().unwrap();
        let store = temp_store();
        let id = lib.insert_product(&sample_product("tee", 20)).unwrap();
        let (front, back, side) = (png(30, 30), png(30, 30), png(30, 30));

        let first = add_product_images(&lib, &store, id, &[(front.as_slice(), "front.png"), (back.as_slice(), "back.png")], true).unwrap();
        let later = add_product_images(&lib, &store, id, &[(side.as_slice(), "side.png")], false).unwrap();

        let product = lib.get_product(id).unwrap().unwrap();
        assert_eq!(product.image_url, first[0]);
        assert_eq!(product.images, vec![first[1].clone(), later[0].clone()]);
        assert!(first[0].ends_with(".jpg"));
        assert!(later[0].ends_with(".png"));
        assert!(add_product_images(&lib, &store, 999, &[(front.as_slice(), "x.png")], true).is_err());
        std::fs::remove_dir_all(store.root()).ok();
    }

    #[test]
    fn test_replace_logo_deletes_old_file() {
        let lib = Library::open_in_memory().unwrap();
        let store = temp_store();

        let first = replace_logo(&lib, &store, &png(10, 4), "logo.png").unwrap();
        let second = replace_logo(&lib, &store, &png(10, 4), "logo-v2.png").unwrap();

        assert!(!stored(&store, &first));
        assert!(stored(&store, &second));
        let branding = lib.site_branding().unwrap();
        assert_eq!(branding.logo_url, second);
        assert_eq!(branding.site_name, "EOMC");
        std::fs::remove_dir_all(store.root()).ok();
    }

    #[test]
    fn test_section_video_replaces_previous_upload() {
        let lib = Library::open_in_memory().unwrap();
        let store = temp_store();
        let video_stored =
            |url: &str| store.object_path(Bucket::Videos, url.rsplit('/').next().unwrap()).exists();

        let first = set_section_video(&lib, &store, b"mp4 one", "intro.mp4").unwrap();
        assert!(first.video_url.contains("/videos/"));
        assert_eq!(first.title.as_deref(), Some("EOMC"));

        let second = set_section_video(&lib, &store, b"mp4 two", "intro.mp4").unwrap();
        assert_eq!(second.id, first.id);
        assert!(!video_stored(&first.video_url));
        assert!(video_stored(&second.video_url));
        assert_eq!(lib.active_video_section().unwrap().unwrap(), second);
        std::fs::remove_dir_all(store.root()).ok();
    }

    #[test]
    fn test_billboard_video_and_poster() {
        let lib = Library::open_in_memory().unwrap();
        let store = temp_store();

        let with_video = set_billboard_video(&lib, &store, b"webm", "loop.webm").unwrap();
        let with_poster = set_billboard_poster(&lib, &store, &png(16, 9), "poster.png").unwrap();

        assert_eq!(with_poster.id, with_video.id);
        let saved = lib.video_billboard().unwrap().unwrap();
        assert_eq!(saved.video_url, with_video.video_url);
        assert!(saved.video_url.unwrap().ends_with(".webm"));
        assert!(stored(&store, saved.poster_image_url.as_deref().unwrap()));
        assert_eq!(saved.button_text.as_deref(), Some("Shop Now"));
        std::fs::remove_dir_all(store.root()).ok();
    }

    #[test]
    fn test_replace_category_image_deletes_old_file() {
        let lib = Library::open_in_memory().unwrap();
        let store = temp_store();
        lib.insert_category("Tees", "tees", "").unwrap();

        let first = replace_category_image(&lib, &store, "tees", &png(20, 10), "a.png").unwrap();
        let second = replace_category_image(&lib, &store, "tees", &png(20, 10), "b.png").unwrap();

        assert!(!stored(&store, &first));
        assert!(stored(&store, &second));
        assert_eq!(lib.get_category_by_slug("tees").unwrap().unwrap().image_url, second);
        std::fs::remove_dir_all(store.root()).ok();
    }

    #[test]
    fn test_hero_and_gallery_round_trip() {
        let lib = Library::open_in_memory().unwrap();
        let store = temp_store();

        let slide = add_hero_slide(&lib, &store, &png(64, 16), "hero.png", Some("Drop 01"), None).unwrap();
        let image = add_gallery_image(&lib, &store, &png(16, 16), "g.png").unwrap();
        let url = lib.list_hero_slides(true).unwrap()[0].image_url.clone();
        assert!(stored(&store, &url));

        remove_content_image(&lib, &store, OrderedTable::HeroSlides, slide).unwrap();
        assert!(!stored(&store, &url));
        assert!(lib.list_hero_slides(false).unwrap().is_empty());

        remove_content_image(&lib, &store, OrderedTable::GalleryImages, image).unwrap();
        assert!(lib.list_gallery_images(false).unwrap().is_empty());
        std::fs::remove_dir_all(store.root()).ok();
    }

    #[test]
    fn test_testimonial_with_photo() {
        let lib = Library::open_in_memory().unwrap();
        let store = temp_store();
        let photo = png(12, 12);

        let id = add_testimonial(&lib, &store, "Ana", 5, "Great fit", Some((photo.as_slice(), "ana.png"))).unwrap();
        let saved = &lib.list_testimonials(true).unwrap()[0];
        assert_eq!(saved.id, id);
        assert!(stored(&store, saved.customer_photo_url.as_deref().unwrap()));

        assert!(add_testimonial(&lib, &store, "Bo", 9, "??", None).is_err());
        std::fs::remove_dir_all(store.root()).ok();
    }
}
