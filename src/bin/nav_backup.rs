use site_cms::config;
use site_cms::navigation::backup;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let (settings, repos) = config::bootstrap().await?;
    let path = backup::backup(repos.menu.as_ref(), &settings.backup_dir).await?;
    println!("Navigation backed up to {}", path.display());
    Ok(())
}
