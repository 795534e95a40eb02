use crate::listing::Listing;
use tembea_core::client::RemoteClient;

/// Storage bucket holding listing photos.
pub const LISTING_IMAGES_BUCKET: &str = "listings_images";

/// Shown whenever a listing has no usable image. Resolution misses are
/// logged, never surfaced to the user.
pub const PLACEHOLDER_IMAGE_URL: &str = "https://placehold.co/600x400.png?text=No+Image";

/// Resolve one image reference to a displayable URL. Absolute URLs pass
/// through; storage-relative paths go through the store's public-URL
/// resolution; everything else falls back to the placeholder.
pub fn resolve_image_url(client: &dyn RemoteClient, path: &str) -> String {
    if path.is_empty() {
        return PLACEHOLDER_IMAGE_URL.to_string();
    }

    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }

    match client.public_url(LISTING_IMAGES_BUCKET, path) {
        Some(url) => url,
        None => {
            tracing::warn!(
                bucket = LISTING_IMAGES_BUCKET,
                path,
                "could not resolve public URL for image, substituting placeholder"
            );
            PLACEHOLDER_IMAGE_URL.to_string()
        }
    }
}

/// First image of a listing, or the placeholder.
pub fn primary_image_url(client: &dyn RemoteClient, images: &[String]) -> String {
    match images.first() {
        Some(path) => resolve_image_url(client, path),
        None => PLACEHOLDER_IMAGE_URL.to_string(),
    }
}

/// Gallery layout: one primary image plus up to four secondary images.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Gallery {
    pub primary: String,
    pub secondary: Vec<String>,
}

impl Gallery {
    pub fn for_listing(client: &dyn RemoteClient, listing: &Listing) -> Self {
        Self::from_images(client, &listing.images)
    }

    pub fn from_images(client: &dyn RemoteClient, images: &[String]) -> Self {
        let primary = primary_image_url(client, images);
        let secondary = images
            .iter()
            .skip(1)
            .take(4)
            .map(|path| resolve_image_url(client, path))
            .collect();
        Self { primary, secondary }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tembea_store::MemoryRemoteClient;

    fn client_with_storage() -> MemoryRemoteClient {
        MemoryRemoteClient::new().with_storage_base("https://cdn.example.com")
    }

    #[test]
    fn empty_images_render_the_placeholder() {
        let client = client_with_storage();
        let gallery = Gallery::from_images(&client, &[]);
        assert_eq!(gallery.primary, PLACEHOLDER_IMAGE_URL);
        assert!(gallery.secondary.is_empty());
    }

    #[test]
    fn absolute_urls_pass_through() {
        let client = client_with_storage();
        let url = resolve_image_url(&client, "https://images.example.com/a.jpg");
        assert_eq!(url, "https://images.example.com/a.jpg");
    }

    #[test]
    fn storage_paths_resolve_against_the_bucket() {
        let client = client_with_storage();
        let url = resolve_image_url(&client, "covers/serengeti.jpg");
        assert_eq!(
            url,
            "https://cdn.example.com/storage/v1/object/public/listings_images/covers/serengeti.jpg"
        );
    }

    #[test]
    fn unresolvable_paths_fall_back_to_the_placeholder() {
        // No storage base configured: resolution misses.
        let client = MemoryRemoteClient::new();
        let url = resolve_image_url(&client, "covers/serengeti.jpg");
        assert_eq!(url, PLACEHOLDER_IMAGE_URL);
    }

    #[test]
    fn gallery_caps_secondary_images_at_four() {
        let client = client_with_storage();
        let images: Vec<String> = (0..7).map(|i| format!("img/{i}.jpg")).collect();
        let gallery = Gallery::from_images(&client, &images);
        assert_eq!(gallery.secondary.len(), 4);
        assert!(gallery.primary.ends_with("img/0.jpg"));
    }
}
