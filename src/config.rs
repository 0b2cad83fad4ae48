use chrono::Duration;

use crate::errors::AppError;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_SESSION_TTL_HOURS: i64 = 12;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| AppError::configuration("DATABASE_URL not set"))?;

        let port = std::env::var("APP_PORT")
            .map(|val| val.parse::<u16>())
            .unwrap_or(Ok(DEFAULT_PORT))
            .map_err(|_| AppError::configuration("APP_PORT must be a valid port number"))?;

        Ok(Self { database_url, port })
    }
}

/// How long an opened session may be restored.
#[derive(Debug, Clone, Copy)]
pub struct SessionTtl(pub Duration);

impl SessionTtl {
    /// Reads `SESSION_TTL_HOURS`, defaulting to 12 hours.
    pub fn from_env() -> Result<Self, AppError> {
        Self::parse(std::env::var("SESSION_TTL_HOURS").ok().as_deref())
    }

    fn parse(raw: Option<&str>) -> Result<Self, AppError> {
        let hours = match raw {
            Some(val) => val
                .trim()
                .parse::<i64>()
                .map_err(|_| AppError::configuration("SESSION_TTL_HOURS must be a valid integer"))?,
            None => DEFAULT_SESSION_TTL_HOURS,
        };

        if hours <= 0 {
            return Err(AppError::configuration("SESSION_TTL_HOURS must be positive"));
        }

        Ok(Self(Duration::hours(hours)))
    }
}

/// Load `.env` from the working directory, falling back to the crate directory.
pub fn load_env() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    let crate_env = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    let _ = dotenvy::from_path(crate_env);
}

pub fn init_tracing() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false);

    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ttl_defaults_and_validates() {
        assert_eq!(SessionTtl::parse(None).unwrap().0, Duration::hours(12));
        assert_eq!(SessionTtl::parse(Some(" 3 ")).unwrap().0, Duration::hours(3));
        assert!(matches!(SessionTtl::parse(Some("0")), Err(AppError::Configuration(_))));
        assert!(matches!(SessionTtl::parse(Some("-2")), Err(AppError::Configuration(_))));
        assert!(matches!(SessionTtl::parse(Some("twelve")), Err(AppError::Configuration(_))));
    }
}
