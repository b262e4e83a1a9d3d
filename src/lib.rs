#![deny(clippy::unwrap_used)]

use anyhow::Context;
use cms_types::form::{FormConfigRepository, FormSubmissionRepository};
use cms_types::menu::MenuRepository;
use cms_types::page::PageRepository;
use cms_types::product_series::ProductSeriesRepository;
use serde::de::IntoDeserializer;
use serde::Deserialize;
use std::sync::Arc;
use time::OffsetDateTime;
use tokio_rusqlite::Connection;

pub mod config;
pub mod content;
pub mod control;
pub mod form;
pub mod menu;
pub mod navigation;
pub mod page;
pub mod product_series;

/// Repositories shared by the server and the maintenance tools, all backed by one
/// SQLite database.
#[derive(Clone)]
pub struct Repositories {
    pub menu: Arc<dyn MenuRepository>,
    pub pages: Arc<dyn PageRepository>,
    pub product_series: Arc<dyn ProductSeriesRepository>,
    pub form_configs: Arc<dyn FormConfigRepository>,
    pub form_submissions: Arc<dyn FormSubmissionRepository>,
}

impl Repositories {
    pub async fn open(path: &str) -> Result<Self, anyhow::Error> {
        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Unable to create {}", parent.display()))?;
            }
        }
        let conn = Connection::open(path)
            .await
            .with_context(|| format!("Unable to open database {path}"))?;
        conn.call(|conn| {
            conn.execute_batch("PRAGMA journal_mode = WAL;")?;
            Ok(())
        })
        .await?;
        Self::init(conn).await
    }

    pub async fn in_memory() -> Result<Self, anyhow::Error> {
        Self::init(Connection::open_in_memory().await?).await
    }

    async fn init(conn: Connection) -> Result<Self, anyhow::Error> {
        Ok(Self {
            menu: Arc::new(menu::SqliteMenuRepository::init(conn.clone()).await?),
            pages: Arc::new(page::SqlitePageRepository::init(conn.clone()).await?),
            product_series: Arc::new(
                product_series::SqliteProductSeriesRepository::init(conn.clone()).await?,
            ),
            form_configs: Arc::new(form::SqliteFormConfigRepository::init(conn.clone()).await?),
            form_submissions: Arc::new(form::SqliteFormSubmissionRepository::init(conn).await?),
        })
    }
}

pub fn datetime_from_db(ts: i64) -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp(ts).unwrap_or(OffsetDateTime::UNIX_EPOCH)
}

pub fn empty_string_as_none<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::Deserialize<'de>,
{
    let opt = Option::<String>::deserialize(de)?;
    match opt.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => T::deserialize(s.into_deserializer()).map(Some),
    }
}
