use anyhow::anyhow;
use async_trait::async_trait;
use cms_types::locale::LocalizedText;
use cms_types::menu::{All, ByParent, MenuNode, MenuRepository, MenuType, TopLevel};
use cms_types::ImageRef;
use rusqlite::params;
use tokio_rusqlite::Connection;
use typesafe_repository::async_ops::{Get, Remove, Save, Select};
use typesafe_repository::prelude::*;
use typesafe_repository::IdentityOf;

const SELECT_MENU_NODE: &str = "SELECT id, parent_id, slug, label, url, menu_type, icon, inquiry_url,
        sort_order, visible, image_url, image_filename FROM menu_node";

pub struct SqliteMenuRepository {
    conn: Connection,
}

impl SqliteMenuRepository {
    pub async fn init(conn: Connection) -> Result<Self, tokio_rusqlite::Error> {
        conn.call(|conn| {
            conn.execute(
                "CREATE TABLE IF NOT EXISTS menu_node (
                    id BLOB PRIMARY KEY,
                    parent_id BLOB,
                    slug TEXT NOT NULL,
                    label TEXT NOT NULL,
                    url TEXT NOT NULL DEFAULT '',
                    menu_type TEXT NOT NULL DEFAULT 'standard',
                    icon TEXT,
                    inquiry_url TEXT,
                    sort_order INTEGER NOT NULL DEFAULT 0,
                    visible INTEGER NOT NULL DEFAULT 1,
                    image_url TEXT,
                    image_filename TEXT
                )",
                [],
            )?;
            conn.execute(
                "CREATE INDEX IF NOT EXISTS menu_node_parent ON menu_node (parent_id)",
                [],
            )?;
            Ok(())
        })
        .await?;
        Ok(Self { conn })
    }

    async fn query(
        &self,
        filter: &'static str,
        param: Option<IdentityOf<MenuNode>>,
    ) -> Result<Vec<MenuNode>, anyhow::Error> {
        Ok(self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "{SELECT_MENU_NODE} {filter} ORDER BY sort_order, rowid"
                ))?;
                let nodes = match param {
                    Some(id) => stmt.query_map([id], menu_node_from_row)?,
                    None => stmt.query_map([], menu_node_from_row)?,
                }
                .collect::<Result<Vec<_>, _>>()?;
                Ok(nodes)
            })
            .await?)
    }
}

fn menu_node_from_row(row: &rusqlite::Row) -> Result<MenuNode, rusqlite::Error> {
    Ok(MenuNode {
        id: row.get(0)?,
        parent_id: row.get(1)?,
        slug: row.get(2)?,
        label: LocalizedText::from_db(row.get(3)?),
        url: row.get(4)?,
        menu_type: MenuType::from_str(row.get::<_, String>(5)?.as_str()),
        icon: row.get(6)?,
        inquiry_url: row.get(7)?,
        order: row.get(8)?,
        visible: row.get::<_, i64>(9)? != 0,
        image: ImageRef::from_parts(row.get(10)?, row.get(11)?),
    })
}

impl Repository<MenuNode> for SqliteMenuRepository {
    type Error = anyhow::Error;
}

#[async_trait]
impl Select<MenuNode, All> for SqliteMenuRepository {
    async fn select(&self, _: &All) -> Result<Vec<MenuNode>, Self::Error> {
        self.query("", None).await
    }
}

#[async_trait]
impl Select<MenuNode, ByParent> for SqliteMenuRepository {
    async fn select(&self, ByParent(id): &ByParent) -> Result<Vec<MenuNode>, Self::Error> {
        self.query("WHERE parent_id = ?1", Some(*id)).await
    }
}

#[async_trait]
impl Select<MenuNode, TopLevel> for SqliteMenuRepository {
    async fn select(&self, _: &TopLevel) -> Result<Vec<MenuNode>, Self::Error> {
        self.query("WHERE parent_id IS NULL", None).await
    }
}

#[async_trait]
impl Get<MenuNode> for SqliteMenuRepository {
    async fn get_one(&self, id: &IdentityOf<MenuNode>) -> Result<Option<MenuNode>, Self::Error> {
        Ok(self.query("WHERE id = ?1", Some(*id)).await?.into_iter().next())
    }
}

#[async_trait]
impl Save<MenuNode> for SqliteMenuRepository {
    async fn save(&self, n: MenuNode) -> Result<(), Self::Error> {
        Ok(self
            .conn
            .call(move |conn| {
                let (image_url, image_filename) = match n.image {
                    Some(ImageRef { url, filename }) => (Some(url), Some(filename)),
                    None => (None, None),
                };
                conn.execute(
                    "INSERT INTO menu_node (id, parent_id, slug, label, url, menu_type, icon, inquiry_url,
                        sort_order, visible, image_url, image_filename)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                     ON CONFLICT(id) DO UPDATE SET parent_id=?2, slug=?3, label=?4, url=?5, menu_type=?6,
                        icon=?7, inquiry_url=?8, sort_order=?9, visible=?10, image_url=?11, image_filename=?12",
                    params![
                        n.id,
                        n.parent_id,
                        n.slug,
                        n.label.to_db(),
                        n.url,
                        n.menu_type.as_str(),
                        n.icon,
                        n.inquiry_url,
                        n.order,
                        if n.visible { 1 } else { 0 },
                        image_url,
                        image_filename,
                    ],
                )?;
                Ok(())
            })
            .await?)
    }
}

/// Removes the node only; children keep their dangling parent reference.
#[async_trait]
impl Remove<MenuNode> for SqliteMenuRepository {
    async fn remove(&self, id: &IdentityOf<MenuNode>) -> Result<(), Self::Error> {
        let id = *id;
        self.conn
            .call(move |conn| {
                conn.execute("DELETE FROM menu_node WHERE id = ?1", params![id])?;
                Ok(())
            })
            .await?;
        Ok(())
    }
}

#[async_trait]
impl MenuRepository for SqliteMenuRepository {
    async fn clear(&self) -> Result<usize, Self::Error> {
        Ok(self
            .conn
            .call(|conn| Ok(conn.execute("DELETE FROM menu_node", [])?))
            .await?)
    }

    async fn find_by_slug(
        &self,
        parent_id: Option<IdentityOf<MenuNode>>,
        slug: &str,
    ) -> Result<Option<MenuNode>, Self::Error> {
        let slug = slug.to_string();
        Ok(self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "{SELECT_MENU_NODE} WHERE slug = ?1 AND parent_id IS ?2 ORDER BY sort_order, rowid"
                ))?;
                let node = stmt
                    .query_map(params![slug, parent_id], menu_node_from_row)?
                    .next()
                    .transpose()?;
                Ok(node)
            })
            .await?)
    }

    async fn set_order(&self, id: &IdentityOf<MenuNode>, order: i64) -> Result<(), Self::Error> {
        let id = *id;
        let changed = self
            .conn
            .call(move |conn| {
                Ok(conn.execute(
                    "UPDATE menu_node SET sort_order = ?1 WHERE id = ?2",
                    params![order, id],
                )?)
            })
            .await?;
        if changed == 0 {
            return Err(anyhow!("Menu node {id} not found"));
        }
        Ok(())
    }
}
