//! Maintenance of the site navigation: sibling reordering, JSON backups, the reset
//! saga and the seed menu it recreates.

pub mod backup;
#[cfg(test)]
mod faulty;
pub mod reorder;
pub mod reset;
pub mod seed;

use cms_types::menu::{MenuNode, MenuRepository};

/// Resolves a slash separated slug path (`products/pumps`) starting at the top level.
pub async fn find_by_path(
    repo: &dyn MenuRepository,
    path: &str,
) -> Result<Option<MenuNode>, anyhow::Error> {
    let mut current: Option<MenuNode> = None;
    for slug in path.split('/').map(str::trim).filter(|s| !s.is_empty()) {
        let parent_id = current.as_ref().map(|n| n.id);
        match repo.find_by_slug(parent_id, slug).await? {
            Some(node) => current = Some(node),
            None => return Ok(None),
        }
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Repositories;
    use cms_types::locale::LocalizedText;
    use typesafe_repository::async_ops::Save;

    #[tokio::test]
    async fn resolves_nested_paths() {
        let repos = Repositories::in_memory().await.unwrap();
        let products = MenuNode::new("products", LocalizedText::new(), "/products");
        let mut pumps = MenuNode::new("pumps", LocalizedText::new(), "/products/pumps");
        pumps.parent_id = Some(products.id);
        repos.menu.save(products.clone()).await.unwrap();
        repos.menu.save(pumps.clone()).await.unwrap();

        let found = find_by_path(repos.menu.as_ref(), "products/pumps").await.unwrap();
        assert_eq!(found.map(|n| n.id), Some(pumps.id));
        assert!(find_by_path(repos.menu.as_ref(), "pumps").await.unwrap().is_none());
        assert!(find_by_path(repos.menu.as_ref(), "").await.unwrap().is_none());
    }
}
