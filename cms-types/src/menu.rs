use crate::locale::{LocalizedText, UNTITLED};
use crate::ImageRef;
use async_trait::async_trait;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use typesafe_repository::async_ops::{Get, Remove, Save, Select};
use typesafe_repository::macros::Id;
use typesafe_repository::prelude::*;
use typesafe_repository::{IdentityOf, SelectBy, Selector};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MenuType {
    #[default]
    Standard,
    ProductCards,
    IconSubmenu,
}

impl MenuType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MenuType::Standard => "standard",
            MenuType::ProductCards => "product_cards",
            MenuType::IconSubmenu => "icon_submenu",
        }
    }

    pub fn from_str(input: &str) -> Self {
        match input.trim().to_lowercase().as_str() {
            "product_cards" => MenuType::ProductCards,
            "icon_submenu" => MenuType::IconSubmenu,
            _ => MenuType::Standard,
        }
    }
}

#[derive(Clone, Debug, Id)]
#[Id(ref_id, get_id)]
pub struct MenuNode {
    #[id]
    pub id: Uuid,
    pub slug: String,
    pub label: LocalizedText,
    pub url: String,
    pub menu_type: MenuType,
    pub icon: Option<String>,
    pub inquiry_url: Option<String>,
    pub order: i64,
    pub visible: bool,
    pub image: Option<ImageRef>,
    pub parent_id: Option<IdentityOf<MenuNode>>,
}

impl MenuNode {
    pub fn new(slug: impl Into<String>, label: LocalizedText, url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            slug: slug.into(),
            label,
            url: url.into(),
            menu_type: MenuType::Standard,
            icon: None,
            inquiry_url: None,
            order: 0,
            visible: true,
            image: None,
            parent_id: None,
        }
    }

    pub fn resolve(&self, locale: &str, children: Vec<ResolvedMenuItem>) -> ResolvedMenuItem {
        ResolvedMenuItem {
            id: self.id.to_string(),
            label: self.label.resolve(locale, UNTITLED),
            url: self.url.clone(),
            menu_type: self.menu_type.clone(),
            icon: self.icon.clone(),
            inquiry_link: self.inquiry_url.clone(),
            children,
            image: self.image.clone(),
        }
    }
}

pub struct All;
pub struct ByParent(pub IdentityOf<MenuNode>);
pub struct TopLevel;

impl Selector for All {}
impl SelectBy<All> for MenuNode {}

impl Selector for ByParent {}
impl SelectBy<ByParent> for MenuNode {}

impl Selector for TopLevel {}
impl SelectBy<TopLevel> for MenuNode {}

/// Single-locale projection of a [`MenuNode`] served to the site.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedMenuItem {
    pub id: String,
    pub label: String,
    pub url: String,
    #[serde(rename = "type")]
    pub menu_type: MenuType,
    pub icon: Option<String>,
    pub inquiry_link: Option<String>,
    pub children: Vec<ResolvedMenuItem>,
    pub image: Option<ImageRef>,
}

/// A node as some fetches return it: with its children already nested.
#[derive(Clone, Debug)]
pub struct NestedMenuNode {
    pub node: MenuNode,
    pub children: Vec<NestedMenuNode>,
}

/// Flattens pre-nested records. The parent reference carried by every node stays
/// authoritative; nesting position is discarded. Duplicates keep the first occurrence.
pub fn flatten_nested(records: Vec<NestedMenuNode>) -> Vec<MenuNode> {
    fn walk(record: NestedMenuNode, out: &mut Vec<MenuNode>) {
        out.push(record.node);
        for child in record.children {
            walk(child, out);
        }
    }
    let mut out = vec![];
    for record in records {
        walk(record, &mut out);
    }
    out.into_iter().unique_by(|n| n.id).collect()
}

/// Builds the ordered, single-locale menu tree from a flat node list.
///
/// Top level is every node without a parent. Siblings are sorted by `order`; the sort
/// is stable, so equal orders keep fetch order. Hidden nodes are dropped together
/// with their whole subtree.
pub fn build_menu_tree(nodes: &[MenuNode], locale: &str) -> Vec<ResolvedMenuItem> {
    let mut by_parent: HashMap<Option<Uuid>, Vec<&MenuNode>> = HashMap::new();
    for node in nodes {
        by_parent.entry(node.parent_id).or_default().push(node);
    }
    for siblings in by_parent.values_mut() {
        siblings.sort_by_key(|n| n.order);
    }
    let mut visited = HashSet::new();
    resolve_level(None, &by_parent, locale, &mut visited)
}

pub fn build_nested_menu_tree(
    records: Vec<NestedMenuNode>,
    locale: &str,
) -> Vec<ResolvedMenuItem> {
    build_menu_tree(&flatten_nested(records), locale)
}

fn resolve_level(
    parent: Option<Uuid>,
    by_parent: &HashMap<Option<Uuid>, Vec<&MenuNode>>,
    locale: &str,
    visited: &mut HashSet<Uuid>,
) -> Vec<ResolvedMenuItem> {
    let Some(siblings) = by_parent.get(&parent) else {
        return vec![];
    };
    let mut items = Vec::with_capacity(siblings.len());
    for node in siblings.iter().filter(|n| n.visible) {
        if !visited.insert(node.id) {
            log::warn!("Menu node {} ({}) reached twice, skipping", node.id, node.slug);
            continue;
        }
        let children = resolve_level(Some(node.id), by_parent, locale, visited);
        items.push(node.resolve(locale, children));
    }
    items
}

#[async_trait]
pub trait MenuRepository:
    Repository<MenuNode, Error = anyhow::Error>
    + Save<MenuNode>
    + Get<MenuNode>
    + Select<MenuNode, All>
    + Select<MenuNode, ByParent>
    + Select<MenuNode, TopLevel>
    + Remove<MenuNode>
    + Send
    + Sync
{
    async fn clear(&self) -> Result<usize, Self::Error>;
    async fn find_by_slug(
        &self,
        parent_id: Option<IdentityOf<MenuNode>>,
        slug: &str,
    ) -> Result<Option<MenuNode>, Self::Error>;
    async fn set_order(&self, id: &IdentityOf<MenuNode>, order: i64) -> Result<(), Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(slug: &str, order: i64, parent: Option<&MenuNode>) -> MenuNode {
        let mut n = MenuNode::new(
            slug,
            LocalizedText::new().with("en", slug).with("zh", format!("{slug}-zh")),
            format!("/{slug}"),
        );
        n.order = order;
        n.parent_id = parent.map(|p| p.id);
        n
    }

    fn labels(items: &[ResolvedMenuItem]) -> Vec<&str> {
        items.iter().map(|i| i.label.as_str()).collect()
    }

    #[test]
    fn sorts_top_level_by_order() {
        let nodes = vec![node("home", 1, None), node("shop", 3, None), node("about", 2, None)];
        let tree = build_menu_tree(&nodes, "en");
        assert_eq!(labels(&tree), vec!["home", "about", "shop"]);
    }

    #[test]
    fn equal_orders_keep_fetch_order() {
        let nodes = vec![node("b", 1, None), node("a", 1, None), node("c", 0, None)];
        let tree = build_menu_tree(&nodes, "en");
        assert_eq!(labels(&tree), vec!["c", "b", "a"]);
    }

    #[test]
    fn hidden_parent_hides_subtree() {
        let mut products = node("products", 1, None);
        products.visible = false;
        let pumps = node("pumps", 1, Some(&products));
        let valves = node("valves", 1, Some(&pumps));
        let about = node("about", 2, None);
        let tree = build_menu_tree(&[products, pumps, valves, about], "en");
        assert_eq!(labels(&tree), vec!["about"]);
        assert!(tree[0].children.is_empty());
    }

    #[test]
    fn hidden_child_is_pruned_at_its_level() {
        let products = node("products", 1, None);
        let mut pumps = node("pumps", 1, Some(&products));
        pumps.visible = false;
        let valves = node("valves", 2, Some(&products));
        let nested = node("gate-valves", 1, Some(&pumps));
        let tree = build_menu_tree(&[products, pumps, valves, nested], "zh");
        assert_eq!(labels(&tree[0].children), vec!["valves-zh"]);
    }

    #[test]
    fn resolves_recursively_in_requested_locale() {
        let products = node("products", 1, None);
        let pumps = node("pumps", 2, Some(&products));
        let valves = node("valves", 1, Some(&products));
        let tree = build_menu_tree(&[products, pumps, valves], "zh");
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].label, "products-zh");
        assert_eq!(labels(&tree[0].children), vec!["valves-zh", "pumps-zh"]);
    }

    #[test]
    fn missing_label_becomes_untitled() {
        let mut n = node("blank", 1, None);
        n.label = LocalizedText::new().with("de", "Leer");
        let tree = build_menu_tree(&[n], "zh");
        assert_eq!(tree[0].label, UNTITLED);
    }

    #[test]
    fn self_parented_node_is_never_emitted() {
        let mut looped = node("loop", 1, None);
        looped.parent_id = Some(looped.id);
        let home = node("home", 1, None);
        let tree = build_menu_tree(&[looped, home], "en");
        assert_eq!(labels(&tree), vec!["home"]);
    }

    #[test]
    fn duplicate_nodes_are_emitted_once() {
        let home = node("home", 1, None);
        let tree = build_menu_tree(&[home.clone(), home], "en");
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn nested_input_uses_parent_reference_for_top_level() {
        let products = node("products", 1, None);
        let pumps = node("pumps", 1, Some(&products));
        let records = vec![
            NestedMenuNode {
                node: products.clone(),
                children: vec![NestedMenuNode {
                    node: pumps.clone(),
                    children: vec![],
                }],
            },
            // The child also comes back as a top-level record of the fetch.
            NestedMenuNode {
                node: pumps,
                children: vec![],
            },
        ];
        let tree = build_nested_menu_tree(records, "en");
        assert_eq!(labels(&tree), vec!["products"]);
        assert_eq!(labels(&tree[0].children), vec!["pumps"]);
    }

    #[test]
    fn serializes_with_client_field_names() {
        let mut n = node("support", 1, None);
        n.menu_type = MenuType::IconSubmenu;
        n.inquiry_url = Some("/contact".to_string());
        let json = serde_json::to_value(build_menu_tree(&[n], "en")).unwrap();
        assert_eq!(json[0]["type"], "icon_submenu");
        assert_eq!(json[0]["inquiryLink"], "/contact");
        assert_eq!(json[0]["children"], serde_json::json!([]));
    }
}
