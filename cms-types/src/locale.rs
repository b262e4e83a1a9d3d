use derive_more::Deref;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_LOCALE: &str = "en";

/// Placeholder shown for menu entries without any usable label.
pub const UNTITLED: &str = "Untitled";

/// Text stored per locale code, e.g. `{"en": "Products", "zh": "产品"}`.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, Deref)]
#[serde(transparent)]
pub struct LocalizedText(BTreeMap<String, String>);

impl LocalizedText {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, locale: &str, value: impl Into<String>) -> Self {
        self.0.insert(locale.to_string(), value.into());
        self
    }

    /// Value for `locale`, then for [`DEFAULT_LOCALE`], then `fallback`.
    pub fn resolve(&self, locale: &str, fallback: &str) -> String {
        self.get_with_fallback(locale)
            .unwrap_or(fallback)
            .to_string()
    }

    fn get_with_fallback(&self, locale: &str) -> Option<&str> {
        self.0
            .get(locale)
            .or_else(|| self.0.get(DEFAULT_LOCALE))
            .map(String::as_str)
    }

    /// Parses a stored column. Malformed input yields an empty map.
    pub fn from_db(raw: Option<String>) -> Self {
        match raw.as_deref().map(str::trim) {
            None | Some("") => Self::default(),
            Some(raw) => parse_localized(raw).unwrap_or_else(|| {
                log::warn!("Malformed localized text in storage: {raw}");
                Self::default()
            }),
        }
    }

    pub fn to_db(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_else(|_| "{}".to_string())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LocalizedText {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Accepts either a JSON object or a JSON string holding an encoded object.
/// Non-string values inside the object are ignored.
fn parse_localized(raw: &str) -> Option<LocalizedText> {
    match serde_json::from_str::<serde_json::Value>(raw).ok()? {
        serde_json::Value::Object(map) => Some(
            map.into_iter()
                .filter_map(|(k, v)| match v {
                    serde_json::Value::String(s) => Some((k, s)),
                    _ => None,
                })
                .collect(),
        ),
        serde_json::Value::String(inner) => parse_localized(&inner),
        _ => None,
    }
}

/// Resolves a localized value that arrived pre-serialized as JSON.
pub fn resolve_localized_json(raw: &str, locale: &str, fallback: &str) -> String {
    parse_localized(raw)
        .map(|text| text.resolve(locale, fallback))
        .unwrap_or_else(|| fallback.to_string())
}

pub fn normalize_locale(input: Option<&str>) -> String {
    match input.map(|l| l.trim().to_lowercase()) {
        Some(l) if !l.is_empty() => l,
        _ => DEFAULT_LOCALE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text() -> LocalizedText {
        LocalizedText::new().with("en", "Products").with("zh", "产品")
    }

    #[test]
    fn resolves_requested_locale() {
        assert_eq!(text().resolve("zh", UNTITLED), "产品");
        assert_eq!(text().resolve("en", UNTITLED), "Products");
    }

    #[test]
    fn falls_back_to_default_locale() {
        assert_eq!(text().resolve("de", UNTITLED), "Products");
    }

    #[test]
    fn falls_back_to_literal() {
        let only_zh = LocalizedText::new().with("zh", "关于");
        assert_eq!(only_zh.resolve("fr", UNTITLED), UNTITLED);
        assert_eq!(LocalizedText::new().resolve("en", ""), "");
    }

    #[test]
    fn present_empty_value_is_returned_as_is() {
        let t = LocalizedText::new().with("zh", "").with("en", "About");
        assert_eq!(t.resolve("zh", UNTITLED), "");
    }

    #[test]
    fn resolution_does_not_mutate_source() {
        let t = text();
        let before = t.clone();
        let _ = t.resolve("fr", UNTITLED);
        assert_eq!(t, before);
    }

    #[test]
    fn resolves_serialized_json() {
        let raw = r#"{"en":"Contact","zh":"联系我们"}"#;
        assert_eq!(resolve_localized_json(raw, "zh", UNTITLED), "联系我们");
        let double = serde_json::to_string(raw).unwrap();
        assert_eq!(resolve_localized_json(&double, "en", UNTITLED), "Contact");
    }

    #[test]
    fn malformed_json_yields_fallback() {
        assert_eq!(resolve_localized_json("{not json", "en", UNTITLED), UNTITLED);
        assert_eq!(resolve_localized_json("42", "en", ""), "");
        assert_eq!(LocalizedText::from_db(Some("[1,2]".to_string())), LocalizedText::new());
    }

    #[test]
    fn db_round_trip_keeps_all_locales() {
        let t = text();
        assert_eq!(LocalizedText::from_db(Some(t.to_db())), t);
    }

    #[test]
    fn normalizes_request_locale() {
        assert_eq!(normalize_locale(Some(" ZH ")), "zh");
        assert_eq!(normalize_locale(Some("")), "en");
        assert_eq!(normalize_locale(None), "en");
    }
}
