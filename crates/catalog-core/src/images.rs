//! Image resolution for product cards and detail views.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::products::Product;

/// Canonical form of a color label used as an image-set key.
///
/// Case-insensitive; runs of whitespace, `-` and `_` collapse to a single
/// `-`, so `"Titanium Black"`, `"titanium-black"` and `" TITANIUM__black "`
/// all map to `"titanium-black"`.
#[must_use]
pub fn normalize_color(color: &str) -> String {
    let mut out = String::with_capacity(color.len());
    let mut pending_separator = false;
    for ch in color.trim().chars().flat_map(char::to_lowercase) {
        if ch.is_whitespace() || ch == '-' || ch == '_' {
            pending_separator = !out.is_empty();
        } else {
            if pending_separator {
                out.push('-');
                pending_separator = false;
            }
            out.push(ch);
        }
    }
    out
}

/// Images shared by every product of one model in one color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSet {
    pub level2: String,
    pub color: String,
    pub images: Vec<String>,
}

impl ImageSet {
    #[must_use]
    pub fn color_key(&self) -> String {
        normalize_color(&self.color)
    }
}

/// Where a resolved image list came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSource {
    Product,
    ImageSet,
    Legacy,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedImages {
    pub urls: Vec<String>,
    pub source: ImageSource,
}

/// Lookup table of image sets keyed by `(level2, normalized color)`.
#[derive(Debug, Clone, Default)]
pub struct ImageIndex {
    sets: HashMap<(String, String), Vec<String>>,
}

impl ImageIndex {
    #[must_use]
    pub fn new(sets: impl IntoIterator<Item = ImageSet>) -> Self {
        let sets = sets
            .into_iter()
            .map(|set| ((set.level2.clone(), set.color_key()), set.images))
            .collect();
        Self { sets }
    }

    #[must_use]
    pub fn get(&self, level2: &str, color: &str) -> Option<&[String]> {
        self.sets
            .get(&(level2.to_string(), normalize_color(color)))
            .map(Vec::as_slice)
    }
}

/// Resolves the images to show for `product`.
///
/// Order: the product's own list, then the image set for its model and
/// color, then the legacy single image, then nothing. Never fails.
#[must_use]
pub fn resolve_images(product: &Product, index: &ImageIndex) -> ResolvedImages {
    let own = non_blank(&product.images);
    if !own.is_empty() {
        return ResolvedImages {
            urls: own,
            source: ImageSource::Product,
        };
    }

    if let (Some(level2), Some(color)) = (product.level2.as_deref(), product.attributes.color.as_deref()) {
        if let Some(images) = index.get(level2, color) {
            let shared = non_blank(images);
            if !shared.is_empty() {
                return ResolvedImages {
                    urls: shared,
                    source: ImageSource::ImageSet,
                };
            }
        }
    }

    if let Some(url) = product
        .image_url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
    {
        return ResolvedImages {
            urls: vec![url.to_string()],
            source: ImageSource::Legacy,
        };
    }

    ResolvedImages {
        urls: Vec::new(),
        source: ImageSource::None,
    }
}

fn non_blank(urls: &[String]) -> Vec<String> {
    urls.iter()
        .map(|u| u.trim())
        .filter(|u| !u.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::products::tests::sample_product;

    fn index() -> ImageIndex {
        ImageIndex::new([ImageSet {
            level2: "iPhone 16 Pro".to_string(),
            color: "Titanium Black".to_string(),
            images: vec![
                "https://cdn.example.com/16pro-black-1.jpg".to_string(),
                "https://cdn.example.com/16pro-black-2.jpg".to_string(),
            ],
        }])
    }

    #[test]
    fn normalize_color_collapses_separators() {
        assert_eq!(normalize_color("Titanium Black"), "titanium-black");
        assert_eq!(normalize_color("titanium-black"), "titanium-black");
        assert_eq!(normalize_color("  TITANIUM__ - black  "), "titanium-black");
        assert_eq!(normalize_color("Синий"), "синий");
        assert_eq!(normalize_color(""), "");
    }

    #[test]
    fn explicit_images_win() {
        let mut product = sample_product(1, "IP16P-256-BLK", "iPhone 16 Pro", "Apple");
        product.images = vec!["https://cdn.example.com/own.jpg".to_string()];
        product.image_url = Some("https://cdn.example.com/legacy.jpg".to_string());
        product.attributes.color = Some("Titanium Black".to_string());

        let resolved = resolve_images(&product, &index());
        assert_eq!(resolved.source, ImageSource::Product);
        assert_eq!(resolved.urls, vec!["https://cdn.example.com/own.jpg"]);
    }

    #[test]
    fn image_set_matches_normalized_color() {
        let mut product = sample_product(1, "IP16P-256-BLK", "iPhone 16 Pro", "Apple");
        product.attributes.color = Some("titanium-black".to_string());
        product.image_url = Some("https://cdn.example.com/legacy.jpg".to_string());

        let resolved = resolve_images(&product, &index());
        assert_eq!(resolved.source, ImageSource::ImageSet);
        assert_eq!(resolved.urls.len(), 2);
    }

    #[test]
    fn legacy_image_is_used_when_nothing_else_matches() {
        let mut product = sample_product(1, "IP16P-256-WHT", "iPhone 16 Pro", "Apple");
        product.attributes.color = Some("White Titanium".to_string());
        product.image_url = Some("https://cdn.example.com/legacy.jpg".to_string());

        let resolved = resolve_images(&product, &index());
        assert_eq!(resolved.source, ImageSource::Legacy);
        assert_eq!(resolved.urls, vec!["https://cdn.example.com/legacy.jpg"]);
    }

    #[test]
    fn no_images_anywhere_is_empty() {
        let product = sample_product(1, "CASE-01", "Case", "Generic");
        let resolved = resolve_images(&product, &ImageIndex::default());
        assert_eq!(resolved.source, ImageSource::None);
        assert!(resolved.urls.is_empty());
    }

    #[test]
    fn blank_entries_are_ignored() {
        let mut product = sample_product(1, "CASE-01", "Case", "Generic");
        product.images = vec!["  ".to_string()];
        product.image_url = Some(" ".to_string());
        let resolved = resolve_images(&product, &ImageIndex::default());
        assert!(resolved.urls.is_empty());
    }
}
