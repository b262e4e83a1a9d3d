use site_cms::config;
use site_cms::navigation::{reset, seed};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let (settings, repos) = config::bootstrap().await?;
    let seed_menu = seed::default_seed();
    let journal = reset::reset(repos.menu.as_ref(), &settings.backup_dir, &seed_menu).await?;
    if let Some(backup) = &journal.backup {
        println!("Backup: {}", backup.display());
    }
    println!(
        "Deleted {} nodes, seeded {} nodes",
        journal.deleted.unwrap_or_default(),
        journal.seeded.unwrap_or_default()
    );
    println!("Step log: {}", journal.path.display());
    Ok(())
}
