use crate::locale::LocalizedText;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    #[default]
    Text,
    Email,
    Tel,
    Textarea,
    Select,
    Checkbox,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct FieldOption {
    pub value: String,
    #[serde(default)]
    pub label: LocalizedText,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct FormField {
    pub name: String,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    #[serde(default)]
    pub label: LocalizedText,
    #[serde(default)]
    pub placeholder: LocalizedText,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub options: Vec<FieldOption>,
}

#[derive(Clone, Debug)]
pub struct FormConfig {
    pub id: Uuid,
    pub name: String,
    pub title: LocalizedText,
    pub submit_label: LocalizedText,
    pub success_message: LocalizedText,
    pub fields: Vec<FormField>,
}

impl FormConfig {
    pub fn localize(&self, locale: &str) -> LocalizedFormConfig {
        LocalizedFormConfig {
            id: self.id.to_string(),
            name: self.name.clone(),
            title: self.title.resolve(locale, ""),
            submit_label: self.submit_label.resolve(locale, ""),
            success_message: self.success_message.resolve(locale, ""),
            fields: self
                .fields
                .iter()
                .map(|f| LocalizedFormField {
                    name: f.name.clone(),
                    field_type: f.field_type.clone(),
                    label: f.label.resolve(locale, &f.name),
                    placeholder: f.placeholder.resolve(locale, ""),
                    required: f.required,
                    options: f
                        .options
                        .iter()
                        .map(|o| LocalizedFieldOption {
                            value: o.value.clone(),
                            label: o.label.resolve(locale, &o.value),
                        })
                        .collect(),
                })
                .collect(),
            locale: locale.to_string(),
        }
    }

    /// Parses stored field definitions; malformed input yields no fields.
    pub fn fields_from_db(raw: Option<&str>) -> Vec<FormField> {
        match raw.map(str::trim) {
            None | Some("") => vec![],
            Some(raw) => serde_json::from_str(raw).unwrap_or_else(|err| {
                log::warn!("Malformed form fields in storage: {err}");
                vec![]
            }),
        }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LocalizedFormConfig {
    pub id: String,
    pub name: String,
    pub title: String,
    pub submit_label: String,
    pub success_message: String,
    pub fields: Vec<LocalizedFormField>,
    pub locale: String,
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct LocalizedFormField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub label: String,
    pub placeholder: String,
    pub required: bool,
    pub options: Vec<LocalizedFieldOption>,
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct LocalizedFieldOption {
    pub value: String,
    pub label: String,
}

#[derive(Clone, Debug)]
pub struct FormSubmission {
    pub id: i64,
    pub form_id: Option<Uuid>,
    pub form_name: String,
    pub data: serde_json::Value,
    pub locale: String,
    pub auto_submitted: bool,
    pub created_at: OffsetDateTime,
}

#[derive(Clone, Debug)]
pub struct NewFormSubmission {
    pub form_id: Option<Uuid>,
    pub form_name: String,
    pub data: serde_json::Value,
    pub locale: String,
    pub auto_submitted: bool,
    pub created_at: OffsetDateTime,
}

#[async_trait]
pub trait FormConfigRepository: Send + Sync {
    async fn get_by_name(&self, name: &str) -> anyhow::Result<Option<FormConfig>>;
    async fn save(&self, config: FormConfig) -> anyhow::Result<()>;
}

#[async_trait]
pub trait FormSubmissionRepository: Send + Sync {
    async fn add(&self, item: NewFormSubmission) -> anyhow::Result<FormSubmission>;
    async fn list_by_form(&self, form_name: &str) -> anyhow::Result<Vec<FormSubmission>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact_form() -> FormConfig {
        FormConfig {
            id: Uuid::new_v4(),
            name: "contact".to_string(),
            title: LocalizedText::new().with("en", "Contact us").with("zh", "联系我们"),
            submit_label: LocalizedText::new().with("en", "Send"),
            success_message: LocalizedText::new(),
            fields: FormConfig::fields_from_db(Some(
                r#"[
                    {"name": "email", "type": "email", "label": {"en": "Email", "zh": "邮箱"}, "required": true},
                    {"name": "topic", "type": "select", "options": [{"value": "sales", "label": {"en": "Sales"}}]}
                ]"#,
            )),
        }
    }

    #[test]
    fn localizes_fields_with_fallbacks() {
        let form = contact_form().localize("zh");
        assert_eq!(form.title, "联系我们");
        assert_eq!(form.submit_label, "Send");
        assert_eq!(form.success_message, "");
        assert_eq!(form.fields[0].label, "邮箱");
        assert!(form.fields[0].required);
        assert_eq!(form.fields[1].label, "topic");
        assert_eq!(form.fields[1].field_type, FieldType::Select);
        assert_eq!(form.fields[1].options[0].label, "Sales");
    }

    #[test]
    fn malformed_fields_become_empty() {
        assert!(FormConfig::fields_from_db(Some("{\"name\": 1")).is_empty());
        assert!(FormConfig::fields_from_db(None).is_empty());
    }
}
