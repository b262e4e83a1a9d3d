use crate::Repositories;
use std::env;
use std::path::PathBuf;

pub const DEFAULT_DATABASE: &str = "storage/cms.db";
pub const DEFAULT_BACKUP_DIR: &str = "backups";

/// Loads `.env`, creating an empty one on first start.
pub fn load_env_file() -> Result<(), anyhow::Error> {
    match std::fs::File::open(".env") {
        Ok(_) => envmnt::load_file(".env")?,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            std::fs::File::create(".env")?;
            envmnt::load_file(".env")?;
        }
        Err(err) => {
            return Err(anyhow::anyhow!("Unable to open .env file: {err}"));
        }
    }
    Ok(())
}

pub fn init_logging() {
    if let Err(env::VarError::NotPresent) = env::var("RUST_LOG") {
        env::set_var("RUST_LOG", "INFO");
    }
    pretty_env_logger::formatted_timed_builder()
        .parse_default_env()
        .init();
}

/// Logging, `.env` and the database, as every maintenance tool needs them.
pub async fn bootstrap() -> Result<(Settings, Repositories), anyhow::Error> {
    init_logging();
    load_env_file()?;
    let settings = Settings::from_env();
    let repos = Repositories::open(&settings.database).await?;
    Ok((settings, repos))
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub database: String,
    pub bind_addr: String,
    pub port: u16,
    pub backup_dir: PathBuf,
    pub cache_max_age: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: DEFAULT_DATABASE.to_string(),
            bind_addr: "0.0.0.0".to_string(),
            port: 8080,
            backup_dir: PathBuf::from(DEFAULT_BACKUP_DIR),
            cache_max_age: 60,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            database: non_empty_var("CMS_DATABASE").unwrap_or(defaults.database),
            bind_addr: non_empty_var("CMS_BIND_ADDR").unwrap_or(defaults.bind_addr),
            port: parsed_var("CMS_PORT", envmnt::get_parse("CMS_PORT")).unwrap_or(defaults.port),
            backup_dir: non_empty_var("CMS_BACKUP_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.backup_dir),
            cache_max_age: parsed_var("CMS_CACHE_MAX_AGE", envmnt::get_parse("CMS_CACHE_MAX_AGE"))
                .unwrap_or(defaults.cache_max_age),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    Some(envmnt::get_or(key, "").trim().to_string()).filter(|v| !v.is_empty())
}

fn parsed_var<T>(key: &str, value: Result<T, envmnt::errors::EnvmntError>) -> Option<T> {
    match value {
        Ok(v) => Some(v),
        Err(envmnt::errors::EnvmntError::Missing(_)) => None,
        Err(err) => {
            log::warn!("Ignoring invalid {key}: {err}");
            None
        }
    }
}
