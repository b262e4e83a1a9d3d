use crate::locale::DEFAULT_LOCALE;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PublishStatus {
    #[default]
    Draft,
    Published,
}

impl PublishStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PublishStatus::Draft => "draft",
            PublishStatus::Published => "published",
        }
    }

    pub fn from_str(input: &str) -> Self {
        match input.trim().to_lowercase().as_str() {
            "published" => PublishStatus::Published,
            _ => PublishStatus::Draft,
        }
    }

    pub fn is_published(&self) -> bool {
        matches!(self, PublishStatus::Published)
    }
}

/// Structured document body written for one locale.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ContentTranslation {
    pub locale: String,
    pub content: serde_json::Value,
}

/// Per-locale documents of a record, at most one per locale.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(transparent)]
pub struct Translations(Vec<ContentTranslation>);

impl Translations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the document for `locale`.
    pub fn set(&mut self, locale: &str, content: serde_json::Value) {
        match self.0.iter_mut().find(|t| t.locale == locale) {
            Some(existing) => existing.content = content,
            None => self.0.push(ContentTranslation {
                locale: locale.to_string(),
                content,
            }),
        }
    }

    pub fn get(&self, locale: &str) -> Option<&ContentTranslation> {
        self.0.iter().find(|t| t.locale == locale)
    }

    /// Translation for `locale`, else the default locale one.
    pub fn resolve(&self, locale: &str) -> Option<&ContentTranslation> {
        self.get(locale).or_else(|| self.get(DEFAULT_LOCALE))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ContentTranslation> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<ContentTranslation> for Translations {
    fn from_iter<I: IntoIterator<Item = ContentTranslation>>(iter: I) -> Self {
        let mut out = Self::new();
        for t in iter {
            out.set(&t.locale, t.content);
        }
        out
    }
}

/// Parses a stored document body; malformed input becomes `null`.
pub fn content_from_db(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or_else(|err| {
        log::warn!("Malformed content document in storage: {err}");
        serde_json::Value::Null
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keeps_one_translation_per_locale() {
        let mut t = Translations::new();
        t.set("en", json!({"blocks": [1]}));
        t.set("zh", json!({"blocks": [2]}));
        t.set("en", json!({"blocks": [3]}));
        assert_eq!(t.len(), 2);
        assert_eq!(t.get("en").unwrap().content, json!({"blocks": [3]}));
    }

    #[test]
    fn collecting_duplicates_keeps_last() {
        let t: Translations = vec![
            ContentTranslation { locale: "zh".into(), content: json!(1) },
            ContentTranslation { locale: "zh".into(), content: json!(2) },
        ]
        .into_iter()
        .collect();
        assert_eq!(t.len(), 1);
        assert_eq!(t.get("zh").unwrap().content, json!(2));
    }

    #[test]
    fn resolves_with_default_locale_fallback() {
        let mut t = Translations::new();
        t.set("en", json!("english"));
        assert_eq!(t.resolve("zh").unwrap().locale, "en");
        assert!(Translations::new().resolve("en").is_none());
    }

    #[test]
    fn status_parsing_defaults_to_draft() {
        assert_eq!(PublishStatus::from_str("Published"), PublishStatus::Published);
        assert_eq!(PublishStatus::from_str("archived"), PublishStatus::Draft);
    }

    #[test]
    fn malformed_content_is_null() {
        assert_eq!(content_from_db("{oops"), serde_json::Value::Null);
    }
}
