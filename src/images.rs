//! Product image uploads

use std::path::Path;
use std::sync::Arc;

use mime::Mime;

use crate::error::{Error, Result};
use crate::storage::ObjectStore;

/// Main image plus the remaining gallery, in display order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Gallery {
    pub main_image: Option<String>,
    pub images: Vec<String>,
}

impl Gallery {
    /// Retained images first, then new uploads; the first becomes the main image
    pub fn arrange(existing: Vec<String>, uploaded: Vec<String>) -> Self {
        let mut all = existing.into_iter().chain(uploaded);
        let main_image = all.next();
        Self {
            main_image,
            images: all.collect(),
        }
    }

    /// Every URL, main image first
    pub fn urls(&self) -> Vec<&str> {
        self.main_image
            .iter()
            .chain(self.images.iter())
            .map(String::as_str)
            .collect()
    }
}

/// A file picked for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    /// Original file name; its extension is kept in the object key
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(file_name: &str, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.to_string(),
            bytes,
        }
    }
}

fn extension(file_name: &str) -> Option<&str> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
}

/// Object key for the `index`-th image of a product:
/// `products/{product_id}/image_{index}.{ext}`
pub fn object_key(product_id: &str, index: usize, file_name: &str) -> String {
    match extension(file_name) {
        Some(ext) => format!("products/{}/image_{}.{}", product_id, index, ext),
        None => format!("products/{}/image_{}", product_id, index),
    }
}

/// Content type guessed from the file extension
pub fn content_type(file_name: &str) -> Mime {
    let ext = extension(file_name).map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => mime::IMAGE_JPEG,
        Some("png") => mime::IMAGE_PNG,
        Some("gif") => mime::IMAGE_GIF,
        Some("svg") => mime::IMAGE_SVG,
        Some("webp") => "image/webp".parse().unwrap_or(mime::APPLICATION_OCTET_STREAM),
        _ => mime::APPLICATION_OCTET_STREAM,
    }
}

/// Writes product images to the object store.
///
/// Index 0 is conventionally the main image; nothing here enforces it.
#[derive(Clone)]
pub struct ImageUploader {
    objects: Arc<dyn ObjectStore>,
}

impl ImageUploader {
    pub fn new(objects: Arc<dyn ObjectStore>) -> Self {
        Self { objects }
    }

    /// Store one image and return its URL
    pub async fn upload(&self, file: &ImageFile, product_id: &str, index: usize) -> Result<String> {
        let key = object_key(product_id, index, &file.file_name);
        self.objects
            .put(&key, file.bytes.clone(), content_type(&file.file_name).essence_str())
            .await
            .map_err(|err| Error::upload(index, err))
    }

    /// Store images in order, numbering them from `first_index`.
    ///
    /// Stops at the first failure. Images already written stay in the store
    /// and are not reported back.
    pub async fn upload_all(&self, files: &[ImageFile], product_id: &str, first_index: usize) -> Result<Vec<String>> {
        let mut urls = Vec::with_capacity(files.len());
        for (offset, file) in files.iter().enumerate() {
            urls.push(self.upload(file, product_id, first_index + offset).await?);
        }
        Ok(urls)
    }

    /// Remove an image, ignoring any failure
    pub async fn delete(&self, url: &str) {
        if let Err(err) = self.objects.delete(url).await {
            log::debug!("ignoring failed image delete for {}: {}", url, err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryObjects;

    #[test]
    fn keys_keep_the_original_extension() {
        assert_eq!(object_key("K7QX2", 0, "necklace.front.JPG"), "products/K7QX2/image_0.JPG");
        assert_eq!(object_key("K7QX2", 3, "scan"), "products/K7QX2/image_3");
    }

    #[test]
    fn content_type_follows_extension() {
        assert_eq!(content_type("a.jpeg"), mime::IMAGE_JPEG);
        assert_eq!(content_type("a.PNG"), mime::IMAGE_PNG);
        assert_eq!(content_type("a.webp").essence_str(), "image/webp");
        assert_eq!(content_type("a"), mime::APPLICATION_OCTET_STREAM);
    }

    #[test]
    fn first_retained_image_becomes_main() {
        let gallery = Gallery::arrange(vec!["a".into()], vec!["b".into(), "c".into()]);
        assert_eq!(gallery.main_image.as_deref(), Some("a"));
        assert_eq!(gallery.images, vec!["b", "c"]);
        assert_eq!(gallery.urls(), vec!["a", "b", "c"]);

        let uploads_only = Gallery::arrange(Vec::new(), vec!["b".into()]);
        assert_eq!(uploads_only.main_image.as_deref(), Some("b"));
        assert!(uploads_only.images.is_empty());

        assert_eq!(Gallery::arrange(Vec::new(), Vec::new()), Gallery::default());
    }

    #[tokio::test]
    async fn uploads_are_numbered_from_the_first_index() {
        let objects = Arc::new(InMemoryObjects::new());
        let uploader = ImageUploader::new(objects.clone());
        let files = [ImageFile::new("a.png", vec![1]), ImageFile::new("b.webp", vec![2])];

        let urls = uploader.upload_all(&files, "K7QX2", 2).await.unwrap();
        assert_eq!(
            urls,
            vec![
                "memory://objects/products/K7QX2/image_2.png",
                "memory://objects/products/K7QX2/image_3.webp",
            ]
        );
        assert_eq!(
            objects.get("products/K7QX2/image_3.webp").unwrap().content_type,
            "image/webp"
        );

        uploader.delete(&urls[0]).await;
        uploader.delete(&urls[0]).await;
        assert_eq!(objects.keys(), vec!["products/K7QX2/image_3.webp"]);
    }
}
