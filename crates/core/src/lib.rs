pub mod cache;
pub mod domain;
pub mod fallback;
pub mod ingest;
pub mod time;

pub mod config {
    #[derive(Debug, Clone)]
    pub struct Settings {
        pub source_url: Option<String>,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                source_url: std::env::var("PICKEM_SOURCE_URL").ok(),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
            })
        }
    }
}
