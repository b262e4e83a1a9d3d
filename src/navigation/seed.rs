use cms_types::locale::LocalizedText;
use cms_types::menu::{MenuNode, MenuRepository, MenuType};
use cms_types::ImageRef;
use typesafe_repository::async_ops::Save;
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct SeedNode {
    pub slug: &'static str,
    pub en: &'static str,
    pub zh: &'static str,
    pub url: &'static str,
    pub menu_type: MenuType,
    pub icon: Option<&'static str>,
    pub inquiry_url: Option<&'static str>,
    pub image: Option<&'static str>,
    pub children: Vec<SeedNode>,
}

impl SeedNode {
    fn link(slug: &'static str, en: &'static str, zh: &'static str, url: &'static str) -> Self {
        Self {
            slug,
            en,
            zh,
            url,
            menu_type: MenuType::Standard,
            icon: None,
            inquiry_url: None,
            image: None,
            children: vec![],
        }
    }

    fn menu_type(mut self, menu_type: MenuType) -> Self {
        self.menu_type = menu_type;
        self
    }

    fn icon(mut self, icon: &'static str) -> Self {
        self.icon = Some(icon);
        self
    }

    fn inquiry(mut self, url: &'static str) -> Self {
        self.inquiry_url = Some(url);
        self
    }

    fn image(mut self, url: &'static str) -> Self {
        self.image = Some(url);
        self
    }

    fn children(mut self, children: Vec<SeedNode>) -> Self {
        self.children = children;
        self
    }

    fn to_node(&self, order: i64, parent_id: Option<Uuid>) -> MenuNode {
        let mut node = MenuNode::new(
            self.slug,
            LocalizedText::new().with("en", self.en).with("zh", self.zh),
            self.url,
        );
        node.menu_type = self.menu_type.clone();
        node.icon = self.icon.map(str::to_string);
        node.inquiry_url = self.inquiry_url.map(str::to_string);
        node.image = ImageRef::from_parts(self.image.map(str::to_string), None);
        node.order = order;
        node.parent_id = parent_id;
        node
    }
}

/// The menu a reset starts the site over with.
pub fn default_seed() -> Vec<SeedNode> {
    vec![
        SeedNode::link("home", "Home", "首页", "/"),
        SeedNode::link("products", "Products", "产品中心", "/products")
            .menu_type(MenuType::ProductCards)
            .inquiry("/contact")
            .children(vec![
                SeedNode::link(
                    "centrifugal-pumps",
                    "Centrifugal Pumps",
                    "离心泵",
                    "/products/centrifugal-pumps",
                )
                .image("/images/products/centrifugal-pumps.jpg"),
                SeedNode::link("axial-fans", "Axial Fans", "轴流风机", "/products/axial-fans")
                    .image("/images/products/axial-fans.jpg"),
                SeedNode::link(
                    "control-valves",
                    "Control Valves",
                    "控制阀",
                    "/products/control-valves",
                )
                .image("/images/products/control-valves.jpg"),
            ]),
        SeedNode::link("solutions", "Solutions", "解决方案", "/solutions").children(vec![
            SeedNode::link(
                "water-treatment",
                "Water Treatment",
                "水处理",
                "/solutions/water-treatment",
            ),
            SeedNode::link(
                "power-generation",
                "Power Generation",
                "电力行业",
                "/solutions/power-generation",
            ),
        ]),
        SeedNode::link("support", "Support", "服务支持", "/support")
            .menu_type(MenuType::IconSubmenu)
            .inquiry("/contact")
            .children(vec![
                SeedNode::link("downloads", "Downloads", "资料下载", "/support/downloads")
                    .icon("download"),
                SeedNode::link("faq", "FAQ", "常见问题", "/support/faq").icon("help-circle"),
                SeedNode::link("service", "After-sales Service", "售后服务", "/support/service")
                    .icon("wrench"),
            ]),
        SeedNode::link("about", "About Us", "关于我们", "/about"),
        SeedNode::link("contact", "Contact", "联系我们", "/contact"),
    ]
}

/// Creates the seed nodes, parents before children, and returns how many were saved.
pub async fn apply_seed(
    repo: &dyn MenuRepository,
    seed: &[SeedNode],
) -> Result<usize, anyhow::Error> {
    let mut stack: Vec<(&SeedNode, i64, Option<Uuid>)> = seed
        .iter()
        .enumerate()
        .rev()
        .map(|(i, s)| (s, i as i64 + 1, None))
        .collect();
    let mut created = 0;
    while let Some((seed_node, order, parent_id)) = stack.pop() {
        let node = seed_node.to_node(order, parent_id);
        let id = node.id;
        repo.save(node).await?;
        created += 1;
        stack.extend(
            seed_node
                .children
                .iter()
                .enumerate()
                .rev()
                .map(|(i, s)| (s, i as i64 + 1, Some(id))),
        );
    }
    log::info!("Seeded {created} menu nodes");
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Repositories;
    use cms_types::menu::{build_menu_tree, All};
    use typesafe_repository::async_ops::Select;

    #[tokio::test]
    async fn seeds_bilingual_menu() {
        let repos = Repositories::in_memory().await.unwrap();
        let created = apply_seed(repos.menu.as_ref(), &default_seed()).await.unwrap();
        assert_eq!(created, 14);

        let nodes = repos.menu.select(&All).await.unwrap();
        let tree = build_menu_tree(&nodes, "zh");
        let labels: Vec<_> = tree.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["首页", "产品中心", "解决方案", "服务支持", "关于我们", "联系我们"]
        );
        assert_eq!(tree[1].menu_type, MenuType::ProductCards);
        assert_eq!(tree[1].children.len(), 3);
        assert_eq!(
            tree[1].children[0].image.as_ref().unwrap().filename,
            "centrifugal-pumps.jpg"
        );
        assert_eq!(tree[3].children[1].icon.as_deref(), Some("help-circle"));
        assert_eq!(tree[3].inquiry_link.as_deref(), Some("/contact"));
    }
}
