use site_cms::config;
use site_cms::page::publish_pages;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let slug = std::env::args().nth(1);
    let (_, repos) = config::bootstrap().await?;
    let report = publish_pages(repos.pages.as_ref(), slug.as_deref()).await?;
    for slug in &report.published {
        println!("Published {slug}");
    }
    for slug in &report.already_published {
        println!("Already published: {slug}");
    }
    println!("{} pages published", report.published.len());
    Ok(())
}
