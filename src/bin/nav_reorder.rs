use anyhow::anyhow;
use site_cms::config;
use site_cms::navigation::reorder::{apply_order, OrderPlan, DEFAULT_PLAN_FILE};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let plan_file = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_PLAN_FILE.to_string());
    let (_, repos) = config::bootstrap().await?;
    let plan = OrderPlan::read(&plan_file).await?;
    let report = apply_order(repos.menu.as_ref(), &plan).await;

    println!("Updated {} nodes", report.updated);
    for parent in &report.missing_parents {
        println!("Parent not found: {parent}");
    }
    for slug in &report.missing {
        println!("Not found: {slug}");
    }
    for failed in &report.failed {
        println!("Failed: {} ({})", failed.slug, failed.error);
    }
    if !report.failed.is_empty() {
        return Err(anyhow!("{} updates failed", report.failed.len()));
    }
    Ok(())
}
