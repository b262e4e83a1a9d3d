use super::find_by_path;
use anyhow::Context;
use cms_types::menu::MenuRepository;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_PLAN_FILE: &str = "navigation-order.yaml";

/// Desired sibling order under one parent. `parent` is a slug path such as
/// `products` or `products/pumps`; no parent means the top level.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct OrderGroup {
    #[serde(default)]
    pub parent: Option<String>,
    pub slugs: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct OrderPlan(pub Vec<OrderGroup>);

impl OrderPlan {
    /// Parses a plan from YAML. JSON plans are accepted as well.
    pub fn parse(input: &str) -> Result<Self, anyhow::Error> {
        Ok(serde_yaml::from_str(input)?)
    }

    pub async fn read(path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        let input = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Unable to read order plan {}", path.display()))?;
        Self::parse(&input).with_context(|| format!("Invalid order plan {}", path.display()))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FailedUpdate {
    pub slug: String,
    pub error: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReorderReport {
    pub updated: usize,
    pub missing: Vec<String>,
    pub missing_parents: Vec<String>,
    pub failed: Vec<FailedUpdate>,
}

impl ReorderReport {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.missing_parents.is_empty() && self.failed.is_empty()
    }
}

fn qualified(parent: Option<&str>, slug: &str) -> String {
    match parent {
        Some(parent) => format!("{parent}/{slug}"),
        None => slug.to_string(),
    }
}

/// Sets every listed slug's order to its 1-based position in its group.
///
/// Lookups and updates are independent of each other: a missing slug or a failed
/// update is recorded and the remaining entries are still processed.
pub async fn apply_order(repo: &dyn MenuRepository, plan: &OrderPlan) -> ReorderReport {
    let mut report = ReorderReport::default();
    for group in &plan.0 {
        let parent = group.parent.as_deref().map(str::trim).filter(|p| !p.is_empty());
        let parent_id = match parent {
            None => None,
            Some(path) => match find_by_path(repo, path).await {
                Ok(Some(node)) => Some(node.id),
                Ok(None) => {
                    log::warn!("Parent {path} not found, skipping {} slugs", group.slugs.len());
                    report.missing_parents.push(path.to_string());
                    report
                        .missing
                        .extend(group.slugs.iter().map(|s| qualified(Some(path), s)));
                    continue;
                }
                Err(err) => {
                    log::error!("Unable to look up parent {path}: {err:?}");
                    report
                        .failed
                        .extend(group.slugs.iter().map(|s| FailedUpdate {
                            slug: qualified(Some(path), s),
                            error: err.to_string(),
                        }));
                    continue;
                }
            },
        };
        for (position, slug) in group.slugs.iter().enumerate() {
            let order = position as i64 + 1;
            let name = qualified(parent, slug);
            let node = match repo.find_by_slug(parent_id, slug).await {
                Ok(Some(node)) => node,
                Ok(None) => {
                    log::warn!("Menu node {name} not found");
                    report.missing.push(name);
                    continue;
                }
                Err(err) => {
                    log::error!("Unable to look up {name}: {err:?}");
                    report.failed.push(FailedUpdate {
                        slug: name,
                        error: err.to_string(),
                    });
                    continue;
                }
            };
            match repo.set_order(&node.id, order).await {
                Ok(()) => {
                    log::info!("{name} -> {order}");
                    report.updated += 1;
                }
                Err(err) => {
                    log::error!("Unable to update {name}: {err:?}");
                    report.failed.push(FailedUpdate {
                        slug: name,
                        error: err.to_string(),
                    });
                }
            }
        }
    }
    report
}
