pub mod aggregate;
pub mod domain;
pub mod insights;
pub mod listings;
pub mod report;
pub mod roles;
pub mod scoring;
pub mod storage;
pub mod time;

pub mod config {
    use anyhow::Context;

    use crate::aggregate::FreshnessAnchor;

    const DEFAULT_PORT: u16 = 3000;
    const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
    const DEFAULT_HEATMAP_LIMIT: usize = 50;
    const DEFAULT_CACHE_MAX_AGE_SECS: u64 = 300;
    const DEFAULT_ROLES_CACHE_MAX_AGE_SECS: u64 = 600;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub database_url: Option<String>,
        pub sentry_dsn: Option<String>,
        pub port: u16,
        pub db_max_connections: u32,
        pub heatmap_default_limit: usize,
        pub cache_max_age_secs: u64,
        pub roles_cache_max_age_secs: u64,
        pub freshness_anchor: FreshnessAnchor,
    }

    impl Default for Settings {
        fn default() -> Self {
            Self {
                database_url: None,
                sentry_dsn: None,
                port: DEFAULT_PORT,
                db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
                heatmap_default_limit: DEFAULT_HEATMAP_LIMIT,
                cache_max_age_secs: DEFAULT_CACHE_MAX_AGE_SECS,
                roles_cache_max_age_secs: DEFAULT_ROLES_CACHE_MAX_AGE_SECS,
                freshness_anchor: FreshnessAnchor::default(),
            }
        }
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let defaults = Self::default();

            let freshness_anchor = match std::env::var("FRESHNESS_ANCHOR") {
                Ok(s) if !s.trim().is_empty() => s
                    .parse::<FreshnessAnchor>()
                    .with_context(|| format!("invalid FRESHNESS_ANCHOR: {s}"))?,
                _ => defaults.freshness_anchor,
            };

            Ok(Self {
                database_url: std::env::var("DATABASE_URL").ok(),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                port: env_parse("PORT").unwrap_or(defaults.port),
                db_max_connections: env_parse("DB_MAX_CONNECTIONS")
                    .unwrap_or(defaults.db_max_connections),
                heatmap_default_limit: env_parse("HEATMAP_DEFAULT_LIMIT")
                    .unwrap_or(defaults.heatmap_default_limit),
                cache_max_age_secs: env_parse("CACHE_MAX_AGE_SECS")
                    .unwrap_or(defaults.cache_max_age_secs),
                roles_cache_max_age_secs: env_parse("ROLES_CACHE_MAX_AGE_SECS")
                    .unwrap_or(defaults.roles_cache_max_age_secs),
                freshness_anchor,
            })
        }

        pub fn require_database_url(&self) -> anyhow::Result<&str> {
            self.database_url
                .as_deref()
                .context("DATABASE_URL is required")
        }
    }

    fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
        std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
    }
}
