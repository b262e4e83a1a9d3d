//! Menu repository wrapper that fails selected writes.

use crate::menu::SqliteMenuRepository;
use anyhow::anyhow;
use async_trait::async_trait;
use cms_types::menu::{All, ByParent, MenuNode, MenuRepository, TopLevel};
use typesafe_repository::async_ops::{Get, Remove, Save, Select};
use typesafe_repository::prelude::*;
use typesafe_repository::IdentityOf;

pub struct FaultyMenu {
    pub inner: SqliteMenuRepository,
    /// Saves of nodes with this slug fail.
    pub failing_save: Option<&'static str>,
    /// Order updates of nodes with this slug fail.
    pub failing_order: Option<&'static str>,
}

impl FaultyMenu {
    pub async fn new() -> Self {
        let conn = tokio_rusqlite::Connection::open_in_memory().await.unwrap();
        Self {
            inner: SqliteMenuRepository::init(conn).await.unwrap(),
            failing_save: None,
            failing_order: None,
        }
    }

    pub fn failing_save(mut self, slug: &'static str) -> Self {
        self.failing_save = Some(slug);
        self
    }

    pub fn failing_order(mut self, slug: &'static str) -> Self {
        self.failing_order = Some(slug);
        self
    }
}

impl Repository<MenuNode> for FaultyMenu {
    type Error = anyhow::Error;
}

#[async_trait]
impl Save<MenuNode> for FaultyMenu {
    async fn save(&self, n: MenuNode) -> Result<(), Self::Error> {
        if self.failing_save == Some(n.slug.as_str()) {
            return Err(anyhow!("refusing to save {}", n.slug));
        }
        self.inner.save(n).await
    }
}

#[async_trait]
impl Get<MenuNode> for FaultyMenu {
    async fn get_one(&self, id: &IdentityOf<MenuNode>) -> Result<Option<MenuNode>, Self::Error> {
        self.inner.get_one(id).await
    }
}

#[async_trait]
impl Select<MenuNode, All> for FaultyMenu {
    async fn select(&self, s: &All) -> Result<Vec<MenuNode>, Self::Error> {
        self.inner.select(s).await
    }
}

#[async_trait]
impl Select<MenuNode, ByParent> for FaultyMenu {
    async fn select(&self, s: &ByParent) -> Result<Vec<MenuNode>, Self::Error> {
        self.inner.select(s).await
    }
}

#[async_trait]
impl Select<MenuNode, TopLevel> for FaultyMenu {
    async fn select(&self, s: &TopLevel) -> Result<Vec<MenuNode>, Self::Error> {
        self.inner.select(s).await
    }
}

#[async_trait]
impl Remove<MenuNode> for FaultyMenu {
    async fn remove(&self, id: &IdentityOf<MenuNode>) -> Result<(), Self::Error> {
        self.inner.remove(id).await
    }
}

#[async_trait]
impl MenuRepository for FaultyMenu {
    async fn clear(&self) -> Result<usize, Self::Error> {
        self.inner.clear().await
    }

    async fn find_by_slug(
        &self,
        parent_id: Option<IdentityOf<MenuNode>>,
        slug: &str,
    ) -> Result<Option<MenuNode>, Self::Error> {
        self.inner.find_by_slug(parent_id, slug).await
    }

    async fn set_order(&self, id: &IdentityOf<MenuNode>, order: i64) -> Result<(), Self::Error> {
        let slug = self.inner.get_one(id).await?.map(|n| n.slug);
        if slug.is_some() && slug.as_deref() == self.failing_order {
            return Err(anyhow!("refusing to reorder {id}"));
        }
        self.inner.set_order(id, order).await
    }
}
