use actix_web::middleware::{Compress, DefaultHeaders, NormalizePath, TrailingSlash};
use actix_web::{App, HttpServer};
use site_cms::config::{self, Settings};
use site_cms::control::site_api::{self, CachePolicy};
use site_cms::Repositories;

#[actix_web::main]
async fn main() -> Result<(), anyhow::Error> {
    config::init_logging();
    config::load_env_file()?;
    let settings = Settings::from_env();

    let repos = Repositories::open(&settings.database).await?;
    let cache = CachePolicy::new(settings.cache_max_age);

    log::info!(
        "Listening on {}:{} (database {})",
        settings.bind_addr,
        settings.port,
        settings.database
    );
    HttpServer::new(move || {
        App::new()
            .wrap(
                DefaultHeaders::new()
                    .add(("Access-Control-Allow-Origin", "*"))
                    .add(("Access-Control-Allow-Methods", "GET, POST, OPTIONS"))
                    .add(("Access-Control-Allow-Headers", "*")),
            )
            .wrap(Compress::default())
            .wrap(NormalizePath::new(TrailingSlash::Trim))
            .configure(site_api::configure(&repos, cache))
    })
    .bind((settings.bind_addr.as_str(), settings.port))?
    .run()
    .await?;
    Ok(())
}
