use crate::content::{PublishStatus, Translations};
use crate::locale::LocalizedText;
use async_trait::async_trait;
use time::OffsetDateTime;
use typesafe_repository::async_ops::{Get, Remove, Save, Select};
use typesafe_repository::macros::Id;
use typesafe_repository::prelude::*;
use typesafe_repository::{IdentityOf, SelectBy, Selector};
use uuid::Uuid;

pub const DEFAULT_PAGE_TYPE: &str = "standard";
pub const DEFAULT_TEMPLATE: &str = "default";

#[derive(Clone, Debug, Id)]
#[Id(ref_id, get_id)]
pub struct PageRecord {
    #[id]
    pub id: Uuid,
    pub slug: String,
    pub path: String,
    pub page_type: String,
    pub template: String,
    pub title: LocalizedText,
    pub status: PublishStatus,
    pub translations: Translations,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl PageRecord {
    pub fn new(slug: impl Into<String>, title: LocalizedText) -> Self {
        let slug = slug.into();
        let now = OffsetDateTime::now_utc();
        Self {
            id: Uuid::new_v4(),
            path: format!("/{slug}"),
            slug,
            page_type: DEFAULT_PAGE_TYPE.to_string(),
            template: DEFAULT_TEMPLATE.to_string(),
            title,
            status: PublishStatus::Draft,
            translations: Translations::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Moves a draft to published. Returns `false` if it already was.
    pub fn publish(&mut self) -> bool {
        if self.status.is_published() {
            return false;
        }
        self.status = PublishStatus::Published;
        self.updated_at = OffsetDateTime::now_utc();
        true
    }
}

pub struct ByStatus(pub PublishStatus);

impl Selector for ByStatus {}
impl SelectBy<ByStatus> for PageRecord {}

#[async_trait]
pub trait PageRepository:
    Repository<PageRecord, Error = anyhow::Error>
    + Save<PageRecord>
    + Get<PageRecord>
    + Select<PageRecord, ByStatus>
    + Remove<PageRecord>
    + Send
    + Sync
{
    async fn get_by_slug(&self, slug: &str) -> Result<Option<PageRecord>, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_page_is_draft_with_slug_path() {
        let page = PageRecord::new("about-us", LocalizedText::new().with("en", "About us"));
        assert_eq!(page.path, "/about-us");
        assert_eq!(page.status, PublishStatus::Draft);
    }

    #[test]
    fn publish_is_one_way() {
        let mut page = PageRecord::new("faq", LocalizedText::new());
        assert!(page.publish());
        assert!(!page.publish());
        assert_eq!(page.status, PublishStatus::Published);
    }
}
