use config::{Config, ConfigError, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct Database {
    pub path: String,
    /// Load the demo users, posts, threads and jobs on startup
    pub seed: bool,
}

/// Page size bounds shared by the feed and the job board
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Feed {
    pub default_limit: u32,
    pub max_limit: u32,
}

impl Default for Feed {
    fn default() -> Self {
        Self {
            default_limit: 20,
            max_limit: 100,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: Server,
    pub database: Database,
    pub feed: Feed,
}

impl Settings {
    /// Load settings from an optional TOML file, defaults, and environment overrides.
    ///
    /// `explicit_path` (from `--config`) is required to exist when given; otherwise
    /// `settings.toml` is picked up from the working directory or `portal-server/`.
    pub fn new(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("database.path", "portal.db")?
            .set_default("database.seed", true)?
            .set_default("feed.default_limit", 20)?
            .set_default("feed.max_limit", 100)?;

        match explicit_path {
            Some(path) => {
                builder = builder.add_source(File::from(path.to_path_buf()).required(true));
            }
            None => {
                let config_file_name = "settings.toml";
                let candidates = [
                    PathBuf::from(config_file_name),
                    PathBuf::from("portal-server").join(config_file_name),
                ];
                for candidate in candidates {
                    if candidate.exists() {
                        builder = builder.add_source(File::from(candidate).required(false));
                    }
                }
            }
        }

        // Environment variables have the highest priority
        if let Ok(db_path) = std::env::var("DATABASE_PATH") {
            builder = builder.set_override("database.path", db_path)?;
        }
        if let Ok(seed) = std::env::var("PORTAL_SEED") {
            builder = builder.set_override("database.seed", seed)?;
        }
        if let Ok(port) = std::env::var("PORT") {
            builder = builder.set_override("server.port", port)?;
        }
        if let Ok(host) = std::env::var("HOST") {
            builder = builder.set_override("server.host", host)?;
        }

        let settings: Settings = builder.build()?.try_deserialize()?;
        if settings.feed.default_limit == 0
            || settings.feed.default_limit > settings.feed.max_limit
        {
            return Err(ConfigError::Message(format!(
                "feed.default_limit must be between 1 and feed.max_limit ({})",
                settings.feed.max_limit
            )));
        }
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_file_overrides_defaults() {
        let path = std::env::temp_dir().join(format!("portal_settings_{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            "[database]\npath = \"custom.db\"\nseed = false\n\n[feed]\ndefault_limit = 10\nmax_limit = 50\n",
        )
        .unwrap();

        let settings = Settings::new(Some(&path)).expect("settings should load");
        // DATABASE_PATH may be set in the environment running the tests
        if std::env::var("DATABASE_PATH").is_err() {
            assert_eq!(settings.database.path, "custom.db");
        }
        assert_eq!(settings.feed.default_limit, 10);
        assert_eq!(settings.feed.max_limit, 50);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_default_above_max_is_rejected() {
        let path = std::env::temp_dir().join(format!("portal_settings_{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "[feed]\ndefault_limit = 500\nmax_limit = 100\n").unwrap();

        assert!(Settings::new(Some(&path)).is_err());

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let path = std::env::temp_dir().join("portal_settings_does_not_exist.toml");
        assert!(Settings::new(Some(&path)).is_err());
    }
}
