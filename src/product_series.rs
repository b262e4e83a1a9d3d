use crate::content::{self, OwnerKind};
use crate::datetime_from_db;
use async_trait::async_trait;
use cms_types::content::PublishStatus;
use cms_types::locale::LocalizedText;
use cms_types::product_series::{ProductSeriesRecord, ProductSeriesRepository, Published};
use cms_types::ImageRef;
use rusqlite::params;
use tokio_rusqlite::Connection;
use typesafe_repository::async_ops::{Get, Remove, Save, Select};
use typesafe_repository::prelude::*;
use typesafe_repository::IdentityOf;

const SELECT_SERIES: &str = "SELECT id, slug, path, name, summary, image_url, image_filename, sort_order,
        status, created_at, updated_at FROM product_series";

pub struct SqliteProductSeriesRepository {
    conn: Connection,
}

impl SqliteProductSeriesRepository {
    pub async fn init(conn: Connection) -> Result<Self, tokio_rusqlite::Error> {
        conn.call(|conn| {
            conn.execute(
                "CREATE TABLE IF NOT EXISTS product_series (
                    id BLOB PRIMARY KEY,
                    slug TEXT NOT NULL UNIQUE,
                    path TEXT NOT NULL,
                    name TEXT NOT NULL,
                    summary TEXT,
                    image_url TEXT,
                    image_filename TEXT,
                    sort_order INTEGER NOT NULL DEFAULT 0,
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

    async fn query(
        &self,
        filter: &'static str,
        param: String,
    ) -> Result<Vec<ProductSeriesRecord>, anyhow::Error> {
        Ok(self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!("{SELECT_SERIES} {filter}"))?;
                let mut items = stmt
                    .query_map([param], series_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                for item in items.iter_mut() {
                    item.translations =
                        content::load_translations(conn, OwnerKind::ProductSeries, item.id)?;
                }
                Ok(items)
            })
            .await?)
    }
}

fn series_from_row(row: &rusqlite::Row) -> Result<ProductSeriesRecord, rusqlite::Error> {
    Ok(ProductSeriesRecord {
        id: row.get(0)?,
        slug: row.get(1)?,
        path: row.get(2)?,
        name: LocalizedText::from_db(row.get(3)?),
        summary: LocalizedText::from_db(row.get(4)?),
        image: ImageRef::from_parts(row.get(5)?, row.get(6)?),
        order: row.get(7)?,
        status: PublishStatus::from_str(row.get::<_, String>(8)?.as_str()),
        translations: Default::default(),
        created_at: datetime_from_db(row.get(9)?),
        updated_at: datetime_from_db(row.get(10)?),
    })
}

impl Repository<ProductSeriesRecord> for SqliteProductSeriesRepository {
    type Error = anyhow::Error;
}

#[async_trait]
impl Select<ProductSeriesRecord, Published> for SqliteProductSeriesRepository {
    async fn select(&self, _: &Published) -> Result<Vec<ProductSeriesRecord>, Self::Error> {
        self.query(
            "WHERE status = ?1 ORDER BY sort_order, rowid",
            PublishStatus::Published.as_str().to_string(),
        )
        .await
    }
}

#[async_trait]
impl Get<ProductSeriesRecord> for SqliteProductSeriesRepository {
    async fn get_one(
        &self,
        id: &IdentityOf<ProductSeriesRecord>,
    ) -> Result<Option<ProductSeriesRecord>, Self::Error> {
        let id = *id;
        Ok(self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!("{SELECT_SERIES} WHERE id = ?1"))?;
                let item = stmt.query_map([id], series_from_row)?.next().transpose()?;
                let item = match item {
                    Some(mut item) => {
                        item.translations =
                            content::load_translations(conn, OwnerKind::ProductSeries, item.id)?;
                        Some(item)
                    }
                    None => None,
                };
                Ok(item)
            })
            .await?)
    }
}

#[async_trait]
impl Save<ProductSeriesRecord> for SqliteProductSeriesRepository {
    async fn save(&self, s: ProductSeriesRecord) -> Result<(), Self::Error> {
        Ok(self
            .conn
            .call(move |conn| {
                let (image_url, image_filename) = match &s.image {
                    Some(img) => (Some(img.url.clone()), Some(img.filename.clone())),
                    None => (None, None),
                };
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT INTO product_series (id, slug, path, name, summary, image_url, image_filename,
                        sort_order, status, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                     ON CONFLICT(id) DO UPDATE SET slug=?2, path=?3, name=?4, summary=?5, image_url=?6,
                        image_filename=?7, sort_order=?8, status=?9, created_at=?10, updated_at=?11",
                    params![
                        s.id,
                        s.slug,
                        s.path,
                        s.name.to_db(),
                        s.summary.to_db(),
                        image_url,
                        image_filename,
                        s.order,
                        s.status.as_str(),
                        s.created_at.unix_timestamp().max(0),
                        s.updated_at.unix_timestamp().max(0),
                    ],
                )?;
                let owner = OwnerKind::ProductSeries;
                content::replace_translations(&tx, owner, s.id, &s.translations)?;
                tx.commit()?;
                Ok(())
            })
            .await?)
    }
}

#[async_trait]
impl Remove<ProductSeriesRecord> for SqliteProductSeriesRepository {
    async fn remove(&self, id: &IdentityOf<ProductSeriesRecord>) -> Result<(), Self::Error> {
        let id = *id;
        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                tx.execute("DELETE FROM product_series WHERE id = ?1", params![id])?;
                content::delete_translations(&tx, OwnerKind::ProductSeries, id)?;
                tx.commit()?;
                Ok(())
            })
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ProductSeriesRepository for SqliteProductSeriesRepository {
    async fn get_by_slug(&self, slug: &str) -> Result<Option<ProductSeriesRecord>, Self::Error> {
        Ok(self
            .query("WHERE slug = ?1", slug.to_string())
            .await?
            .into_iter()
            .next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn repo() -> SqliteProductSeriesRepository {
        let conn = Connection::open_in_memory().await.unwrap();
        SqliteProductSeriesRepository::init(conn).await.unwrap()
    }

    fn series(slug: &str, order: i64, published: bool) -> ProductSeriesRecord {
        let mut s = ProductSeriesRecord::new(slug, LocalizedText::new().with("en", slug));
        s.order = order;
        if published {
            s.status = PublishStatus::Published;
        }
        s
    }

    #[tokio::test]
    async fn lists_only_published_in_order() {
        let repo = repo().await;
        repo.save(series("centrifugal", 2, true)).await.unwrap();
        repo.save(series("prototype", 1, false)).await.unwrap();
        repo.save(series("axial", 1, true)).await.unwrap();

        let listed = repo.select(&Published).await.unwrap();
        let slugs: Vec<_> = listed.iter().map(|s| s.slug.as_str()).collect();
        assert_eq!(slugs, vec!["axial", "centrifugal"]);
    }

    #[tokio::test]
    async fn reads_back_image_and_translations() {
        let repo = repo().await;
        let mut s = series("axial", 1, true);
        s.image = Some(ImageRef {
            url: "https://cdn.example.com/axial.jpg".to_string(),
            filename: "axial.jpg".to_string(),
        });
        s.translations.set("zh", serde_json::json!({"intro": "轴流"}));
        repo.save(s.clone()).await.unwrap();

        let stored = repo.get_by_slug("axial").await.unwrap().unwrap();
        assert_eq!(stored.image, s.image);
        assert_eq!(stored.path, "/products/axial");
        assert!(stored.translations.get("zh").is_some());
        assert!(repo.get_one(&s.id).await.unwrap().is_some());
        repo.remove(&s.id).await.unwrap();
        assert!(repo.get_by_slug("axial").await.unwrap().is_none());
    }
}
