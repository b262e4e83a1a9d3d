use crate::content::{self, OwnerKind};
use crate::datetime_from_db;
use anyhow::anyhow;
use async_trait::async_trait;
use cms_types::content::PublishStatus;
use cms_types::locale::LocalizedText;
use cms_types::page::{ByStatus, PageRecord, PageRepository};
use rusqlite::params;
use tokio_rusqlite::Connection;
use typesafe_repository::async_ops::{Get, Remove, Save, Select};
use typesafe_repository::prelude::*;
use typesafe_repository::IdentityOf;

const SELECT_PAGE: &str = "SELECT id, slug, path, page_type, template, title, status, created_at, updated_at
     FROM page";

pub struct SqlitePageRepository {
    conn: Connection,
}

impl SqlitePageRepository {
    pub async fn init(conn: Connection) -> Result<Self, tokio_rusqlite::Error> {
        conn.call(|conn| {
            conn.execute(
                "CREATE TABLE IF NOT EXISTS page (
                    id BLOB PRIMARY KEY,
                    slug TEXT NOT NULL UNIQUE,
                    path TEXT NOT NULL,
                    page_type TEXT NOT NULL DEFAULT 'standard',
                    template TEXT NOT NULL DEFAULT 'default',
                    title TEXT NOT NULL,
                    status TEXT NOT NULL DEFAULT 'draft',
                    created_at INTEGER NOT NULL,
                    updated_at INTEGER NOT NULL
                )",
                [],
            )?;
            content::init_translation_table(conn)?;
            Ok(())
        })
        .await?;
        Ok(Self { conn })
    }
}

fn page_from_row(row: &rusqlite::Row) -> Result<PageRecord, rusqlite::Error> {
    Ok(PageRecord {
        id: row.get(0)?,
        slug: row.get(1)?,
        path: row.get(2)?,
        page_type: row.get(3)?,
        template: row.get(4)?,
        title: LocalizedText::from_db(row.get(5)?),
        status: PublishStatus::from_str(row.get::<_, String>(6)?.as_str()),
        translations: Default::default(),
        created_at: datetime_from_db(row.get(7)?),
        updated_at: datetime_from_db(row.get(8)?),
    })
}

fn with_translations(
    conn: &rusqlite::Connection,
    mut pages: Vec<PageRecord>,
) -> Result<Vec<PageRecord>, rusqlite::Error> {
    for page in pages.iter_mut() {
        page.translations = content::load_translations(conn, OwnerKind::Page, page.id)?;
    }
    Ok(pages)
}

impl Repository<PageRecord> for SqlitePageRepository {
    type Error = anyhow::Error;
}

#[async_trait]
impl Select<PageRecord, ByStatus> for SqlitePageRepository {
    async fn select(&self, ByStatus(status): &ByStatus) -> Result<Vec<PageRecord>, Self::Error> {
        let status = status.as_str();
        Ok(self
            .conn
            .call(move |conn| {
                let sql = format!("{SELECT_PAGE} WHERE status = ?1 ORDER BY created_at, slug");
                let mut stmt = conn.prepare(&sql)?;
                let pages = stmt
                    .query_map([status], page_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(with_translations(conn, pages)?)
            })
            .await?)
    }
}

#[async_trait]
impl Get<PageRecord> for SqlitePageRepository {
    async fn get_one(
        &self,
        id: &IdentityOf<PageRecord>,
    ) -> Result<Option<PageRecord>, Self::Error> {
        let id = *id;
        Ok(self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!("{SELECT_PAGE} WHERE id = ?1"))?;
                let pages = stmt
                    .query_map([id], page_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(with_translations(conn, pages)?.into_iter().next())
            })
            .await?)
    }
}

#[async_trait]
impl Save<PageRecord> for SqlitePageRepository {
    async fn save(&self, page: PageRecord) -> Result<(), Self::Error> {
        Ok(self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT INTO page (id, slug, path, page_type, template, title, status, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                     ON CONFLICT(id) DO UPDATE SET slug=?2, path=?3, page_type=?4, template=?5, title=?6,
                        status=?7, created_at=?8, updated_at=?9",
                    params![
                        page.id,
                        page.slug,
                        page.path,
                        page.page_type,
                        page.template,
                        page.title.to_db(),
                        page.status.as_str(),
                        page.created_at.unix_timestamp().max(0),
                        page.updated_at.unix_timestamp().max(0),
                    ],
                )?;
                content::replace_translations(&tx, OwnerKind::Page, page.id, &page.translations)?;
                tx.commit()?;
                Ok(())
            })
            .await?)
    }
}

#[async_trait]
impl Remove<PageRecord> for SqlitePageRepository {
    async fn remove(&self, id: &IdentityOf<PageRecord>) -> Result<(), Self::Error> {
        let id = *id;
        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                tx.execute("DELETE FROM page WHERE id = ?1", params![id])?;
                content::delete_translations(&tx, OwnerKind::Page, id)?;
                tx.commit()?;
                Ok(())
            })
            .await?;
        Ok(())
    }
}

#[async_trait]
impl PageRepository for SqlitePageRepository {
    async fn get_by_slug(&self, slug: &str) -> Result<Option<PageRecord>, Self::Error> {
        let slug = slug.to_string();
        Ok(self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!("{SELECT_PAGE} WHERE slug = ?1"))?;
                let pages = stmt
                    .query_map([slug], page_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(with_translations(conn, pages)?.into_iter().next())
            })
            .await?)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub published: Vec<String>,
    pub already_published: Vec<String>,
}

/// Publishes the draft page `slug`, or every draft page when no slug is given.
pub async fn publish_pages(
    repo: &dyn PageRepository,
    slug: Option<&str>,
) -> Result<PublishReport, anyhow::Error> {
    let pages = match slug {
        Some(slug) => vec![repo
            .get_by_slug(slug)
            .await?
            .ok_or_else(|| anyhow!("Page {slug} not found"))?],
        None => repo.select(&ByStatus(PublishStatus::Draft)).await?,
    };
    let mut report = PublishReport::default();
    for mut page in pages {
        if page.publish() {
            log::info!("Publishing {}", page.slug);
            report.published.push(page.slug.clone());
            repo.save(page).await?;
        } else {
            report.already_published.push(page.slug);
        }
    }
    Ok(report)
}
