use crate::content::{PublishStatus, Translations};
use crate::locale::LocalizedText;
use crate::ImageRef;
use async_trait::async_trait;
use time::OffsetDateTime;
use typesafe_repository::async_ops::{Get, Remove, Save, Select};
use typesafe_repository::macros::Id;
use typesafe_repository::prelude::*;
use typesafe_repository::{IdentityOf, SelectBy, Selector};
use uuid::Uuid;

#[derive(Clone, Debug, Id)]
#[Id(ref_id, get_id)]
pub struct ProductSeriesRecord {
    #[id]
    pub id: Uuid,
    pub slug: String,
    pub path: String,
    pub name: LocalizedText,
    pub summary: LocalizedText,
    pub image: Option<ImageRef>,
    pub order: i64,
    pub status: PublishStatus,
    pub translations: Translations,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl ProductSeriesRecord {
    pub fn new(slug: impl Into<String>, name: LocalizedText) -> Self {
        let slug = slug.into();
        let now = OffsetDateTime::now_utc();
        Self {
            id: Uuid::new_v4(),
            path: format!("/products/{slug}"),
            slug,
            name,
            summary: LocalizedText::new(),
            image: None,
            order: 0,
            status: PublishStatus::Draft,
            translations: Translations::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Published series ordered by `order`.
pub struct Published;

impl Selector for Published {}
impl SelectBy<Published> for ProductSeriesRecord {}

#[async_trait]
pub trait ProductSeriesRepository:
    Repository<ProductSeriesRecord, Error = anyhow::Error>
    + Save<ProductSeriesRecord>
    + Get<ProductSeriesRecord>
    + Select<ProductSeriesRecord, Published>
    + Remove<ProductSeriesRecord>
    + Send
    + Sync
{
    async fn get_by_slug(&self, slug: &str) -> Result<Option<ProductSeriesRecord>, Self::Error>;
}
