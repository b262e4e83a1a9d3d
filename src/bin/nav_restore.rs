use anyhow::anyhow;
use site_cms::config;
use site_cms::navigation::backup;
use std::path::PathBuf;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("Usage: nav-restore <backup-file>"))?;
    let (_, repos) = config::bootstrap().await?;
    let report = backup::restore_file(repos.menu.as_ref(), &path).await?;
    println!("Restored {} nodes from {}", report.created, path.display());
    for slug in &report.skipped {
        println!("Skipped {slug}: parent not restored");
    }
    Ok(())
}
