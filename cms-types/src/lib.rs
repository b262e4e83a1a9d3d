use lazy_regex::regex;
use serde::{Deserialize, Serialize};

pub mod content;
pub mod form;
pub mod locale;
pub mod menu;
pub mod page;
pub mod product_series;

/// Media attached to a record. Storage and CDN rewriting live elsewhere.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ImageRef {
    pub url: String,
    pub filename: String,
}

impl ImageRef {
    pub fn from_parts(url: Option<String>, filename: Option<String>) -> Option<Self> {
        let url = url.filter(|u| !u.trim().is_empty())?;
        let filename = filename
            .filter(|f| !f.trim().is_empty())
            .unwrap_or_else(|| filename_from_url(&url));
        Some(Self { url, filename })
    }
}

pub fn filename_from_url(url: &str) -> String {
    url.split(['?', '#'])
        .next()
        .unwrap_or_default()
        .rsplit('/')
        .find(|s| !s.is_empty())
        .unwrap_or_default()
        .to_string()
}

pub fn is_valid_slug(slug: &str) -> bool {
    regex!(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").is_match(slug)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_filename_defaults_to_last_path_segment() {
        let img = ImageRef::from_parts(
            Some("https://cdn.example.com/media/banner.webp?w=640".to_string()),
            None,
        )
        .unwrap();
        assert_eq!(img.filename, "banner.webp");
        assert_eq!(ImageRef::from_parts(Some("  ".to_string()), None), None);
    }

    #[test]
    fn validates_slugs() {
        assert!(is_valid_slug("industrial-pumps"));
        assert!(is_valid_slug("a1"));
        assert!(!is_valid_slug("Bad Slug"));
        assert!(!is_valid_slug("trailing-"));
        assert!(!is_valid_slug(""));
    }
}
