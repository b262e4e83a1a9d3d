use anyhow::Context;
use cms_types::locale::LocalizedText;
use cms_types::menu::{All, MenuNode, MenuRepository, MenuType};
use cms_types::ImageRef;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use time::macros::format_description;
use time::OffsetDateTime;
use tokio::io::AsyncWriteExt;
use typesafe_repository::async_ops::{Save, Select};
use uuid::Uuid;

const NAME_ATTEMPTS: usize = 5;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct NodeRef {
    pub id: Uuid,
    #[serde(default)]
    pub slug: String,
}

/// One menu node as written to a backup file, with its relations spelled out.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MenuSnapshot {
    pub id: Uuid,
    pub slug: String,
    pub label: LocalizedText,
    pub url: String,
    #[serde(rename = "type", default)]
    pub menu_type: MenuType,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub inquiry_url: Option<String>,
    #[serde(default)]
    pub order: i64,
    #[serde(default = "visible_default")]
    pub visible: bool,
    #[serde(default)]
    pub image: Option<ImageRef>,
    #[serde(default)]
    pub parent: Option<NodeRef>,
    #[serde(default)]
    pub children: Vec<NodeRef>,
}

fn visible_default() -> bool {
    true
}

impl MenuSnapshot {
    /// Fresh node carrying this snapshot's fields under a new id.
    fn recreate(&self, parent_id: Option<Uuid>) -> MenuNode {
        MenuNode {
            id: Uuid::new_v4(),
            slug: self.slug.clone(),
            label: self.label.clone(),
            url: self.url.clone(),
            menu_type: self.menu_type.clone(),
            icon: self.icon.clone(),
            inquiry_url: self.inquiry_url.clone(),
            order: self.order,
            visible: self.visible,
            image: self.image.clone(),
            parent_id,
        }
    }
}

pub fn snapshot(nodes: &[MenuNode]) -> Vec<MenuSnapshot> {
    let slugs: HashMap<Uuid, &str> = nodes.iter().map(|n| (n.id, n.slug.as_str())).collect();
    let mut children: HashMap<Uuid, Vec<NodeRef>> = HashMap::new();
    for n in nodes {
        if let Some(parent_id) = n.parent_id {
            children.entry(parent_id).or_default().push(NodeRef {
                id: n.id,
                slug: n.slug.clone(),
            });
        }
    }
    nodes
        .iter()
        .map(|n| MenuSnapshot {
            id: n.id,
            slug: n.slug.clone(),
            label: n.label.clone(),
            url: n.url.clone(),
            menu_type: n.menu_type.clone(),
            icon: n.icon.clone(),
            inquiry_url: n.inquiry_url.clone(),
            order: n.order,
            visible: n.visible,
            image: n.image.clone(),
            parent: n.parent_id.map(|id| NodeRef {
                id,
                slug: slugs.get(&id).map(|s| s.to_string()).unwrap_or_default(),
            }),
            children: children.remove(&n.id).unwrap_or_default(),
        })
        .collect()
}

pub fn backup_file_name(at: OffsetDateTime) -> String {
    file_name("navigation-backup", at, "json")
}

pub(crate) fn file_name(prefix: &str, at: OffsetDateTime, extension: &str) -> String {
    let format = format_description!(
        "[year]-[month]-[day]T[hour]-[minute]-[second]-[subsecond digits:3]Z"
    );
    let at = at.to_offset(time::UtcOffset::UTC);
    let stamp = at
        .format(format)
        .unwrap_or_else(|_| at.unix_timestamp().to_string());
    format!("{prefix}-{stamp}.{extension}")
}

/// Writes every menu node to a new timestamped file in `dir` and returns its path.
/// Existing files are never overwritten.
pub async fn backup(repo: &dyn MenuRepository, dir: &Path) -> Result<PathBuf, anyhow::Error> {
    let nodes = repo.select(&All).await?;
    let body = serde_json::to_vec_pretty(&snapshot(&nodes))?;
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Unable to create {}", dir.display()))?;
    let mut attempt = 0;
    let (path, mut file) = loop {
        let path = dir.join(backup_file_name(OffsetDateTime::now_utc()));
        match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => break (path, file),
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                attempt += 1;
                if attempt >= NAME_ATTEMPTS {
                    return Err(anyhow::anyhow!("{} already exists", path.display()));
                }
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
            Err(err) => {
                return Err(err).with_context(|| format!("Unable to create {}", path.display()));
            }
        }
    };
    file.write_all(&body).await?;
    file.flush().await?;
    log::info!("Backed up {} menu nodes to {}", nodes.len(), path.display());
    Ok(path)
}

pub async fn read_backup(path: &Path) -> Result<Vec<MenuSnapshot>, anyhow::Error> {
    let body = tokio::fs::read(path)
        .await
        .with_context(|| format!("Unable to read backup {}", path.display()))?;
    serde_json::from_slice(&body).with_context(|| format!("Invalid backup {}", path.display()))
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub created: usize,
    /// Slugs of nodes whose parent could not be resolved.
    pub skipped: Vec<String>,
}

/// Recreates the snapshot tree under fresh ids.
///
/// Roots go first. Nodes with a parent are then created once their parent exists,
/// repeating while any progress is made, so file order does not matter.
pub async fn restore(
    repo: &dyn MenuRepository,
    snapshots: &[MenuSnapshot],
) -> Result<RestoreReport, anyhow::Error> {
    let mut report = RestoreReport::default();
    let mut new_ids: HashMap<Uuid, Uuid> = HashMap::new();
    let (roots, mut pending): (Vec<_>, Vec<_>) =
        snapshots.iter().partition(|s| s.parent.is_none());

    for s in roots {
        let node = s.recreate(None);
        new_ids.insert(s.id, node.id);
        repo.save(node).await?;
        report.created += 1;
    }

    loop {
        let mut waiting = Vec::with_capacity(pending.len());
        let mut progress = false;
        for s in pending {
            let parent = s.parent.as_ref().and_then(|p| new_ids.get(&p.id)).copied();
            match parent {
                Some(parent_id) => {
                    let node = s.recreate(Some(parent_id));
                    new_ids.insert(s.id, node.id);
                    repo.save(node).await?;
                    report.created += 1;
                    progress = true;
                }
                None => waiting.push(s),
            }
        }
        pending = waiting;
        if pending.is_empty() || !progress {
            break;
        }
    }

    for s in pending {
        let parent = s.parent.as_ref().map(|p| p.slug.as_str()).unwrap_or_default();
        log::warn!("Parent {parent} of {} not restored, skipping", s.slug);
        report.skipped.push(s.slug.clone());
    }
    log::info!(
        "Restored {} menu nodes, skipped {}",
        report.created,
        report.skipped.len()
    );
    Ok(report)
}

pub async fn restore_file(
    repo: &dyn MenuRepository,
    path: &Path,
) -> Result<RestoreReport, anyhow::Error> {
    let snapshots = read_backup(path).await?;
    restore(repo, &snapshots).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Repositories;
    use time::macros::datetime;

    #[derive(Debug, PartialEq, Eq)]
    struct Shape(String, i64, Vec<Shape>);

    fn shape(nodes: &[MenuNode], parent: Option<Uuid>) -> Vec<Shape> {
        let mut level: Vec<_> = nodes.iter().filter(|n| n.parent_id == parent).collect();
        level.sort_by_key(|n| (n.order, n.slug.clone()));
        level
            .into_iter()
            .map(|n| Shape(n.slug.clone(), n.order, shape(nodes, Some(n.id))))
            .collect()
    }

    fn node(slug: &str, order: i64, parent: Option<&MenuNode>) -> MenuNode {
        let mut n = MenuNode::new(slug, LocalizedText::new().with("en", slug), format!("/{slug}"));
        n.order = order;
        n.parent_id = parent.map(|p| p.id);
        n
    }

    fn sample() -> Vec<MenuNode> {
        let home = node("home", 1, None);
        let products = node("products", 2, None);
        let pumps = node("pumps", 1, Some(&products));
        let mut inline = node("inline", 1, Some(&pumps));
        inline.visible = false;
        let valves = node("valves", 2, Some(&products));
        vec![home, products, pumps, inline, valves]
    }

    #[test]
    fn names_backups_by_utc_millisecond() {
        let at = datetime!(2024-03-05 07:08:09.123456 +02:00);
        assert_eq!(
            backup_file_name(at),
            "navigation-backup-2024-03-05T05-08-09-123Z.json"
        );
    }

    #[test]
    fn snapshot_records_parent_and_children() {
        let nodes = sample();
        let snaps = snapshot(&nodes);
        let products = snaps.iter().find(|s| s.slug == "products").unwrap();
        let slugs: Vec<_> = products.children.iter().map(|c| c.slug.as_str()).collect();
        assert_eq!(slugs, vec!["pumps", "valves"]);
        let pumps = snaps.iter().find(|s| s.slug == "pumps").unwrap();
        assert_eq!(pumps.parent.as_ref().unwrap().slug, "products");

        let json = serde_json::to_value(&snaps).unwrap();
        assert!(json[0]["parent"].is_null());
        assert_eq!(json[2]["parent"]["slug"], "products");
    }

    #[tokio::test]
    async fn restore_is_isomorphic_with_fresh_ids() {
        let source = Repositories::in_memory().await.unwrap();
        let nodes = sample();
        for n in nodes.clone() {
            source.menu.save(n).await.unwrap();
        }
        let dir = std::env::temp_dir().join(format!("nav-backup-{}", Uuid::new_v4()));
        let path = backup(source.menu.as_ref(), &dir).await.unwrap();
        assert!(path.file_name().unwrap().to_string_lossy().starts_with("navigation-backup-"));

        let target = Repositories::in_memory().await.unwrap();
        let report = restore_file(target.menu.as_ref(), &path).await.unwrap();
        assert_eq!(report.created, nodes.len());
        assert!(report.skipped.is_empty());

        let restored = target.menu.select(&All).await.unwrap();
        assert_eq!(shape(&restored, None), shape(&nodes, None));
        assert!(restored.iter().all(|r| nodes.iter().all(|n| n.id != r.id)));
        assert!(!restored.iter().find(|n| n.slug == "inline").unwrap().visible);
        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn restore_handles_children_listed_before_parents() {
        let nodes = sample();
        let mut snaps = snapshot(&nodes);
        snaps.reverse();
        let repos = Repositories::in_memory().await.unwrap();
        let report = restore(repos.menu.as_ref(), &snaps).await.unwrap();
        assert_eq!(report.created, nodes.len());
        let restored = repos.menu.select(&All).await.unwrap();
        assert_eq!(shape(&restored, None), shape(&nodes, None));
    }

    #[tokio::test]
    async fn orphans_are_skipped() {
        let nodes = sample();
        let snaps: Vec<_> = snapshot(&nodes)
            .into_iter()
            .filter(|s| s.slug != "products")
            .collect();
        let repos = Repositories::in_memory().await.unwrap();
        let report = restore(repos.menu.as_ref(), &snaps).await.unwrap();
        assert_eq!(report.created, 1);
        assert_eq!(report.skipped.len(), 3);
    }

    #[tokio::test]
    async fn backups_never_reuse_a_name() {
        let repos = Repositories::in_memory().await.unwrap();
        let dir = std::env::temp_dir().join(format!("nav-backup-{}", Uuid::new_v4()));
        let first = backup(repos.menu.as_ref(), &dir).await.unwrap();
        let second = backup(repos.menu.as_ref(), &dir).await.unwrap();
        assert_ne!(first, second);
        assert_eq!(read_backup(&first).await.unwrap(), vec![]);
        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
