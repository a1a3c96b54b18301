use std::env;

/// AppConfig
///
/// The application's configuration, immutable once loaded. Pulled into handlers
/// and extractors through `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Postgres connection string. `None` runs on the in-memory store (local only).
    pub db_url: Option<String>,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
    // Name of the cookie carrying the session token.
    pub session_cookie_name: String,
    // Sets the `Secure` attribute on the session cookie.
    pub cookie_secure: bool,
    // Runtime environment marker. Controls log format and fail-fast checks.
    pub env: Env,
}

/// Env
///
/// Runtime context: `Local` for development, `Production` for deployed instances.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_SESSION_COOKIE: &str = "sessionUser";

impl Default for AppConfig {
    /// default
    ///
    /// Non-panicking configuration for tests: local mode, in-memory store.
    fn default() -> Self {
        Self {
            db_url: None,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            session_cookie_name: DEFAULT_SESSION_COOKIE.to_string(),
            cookie_secure: false,
            env: Env::Local,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables at startup.
    ///
    /// # Panics
    /// Panics in `Env::Production` when `DATABASE_URL` is missing, so the service
    /// never starts on the in-memory store by accident.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        let session_cookie_name = env::var("SESSION_COOKIE_NAME")
            .unwrap_or_else(|_| DEFAULT_SESSION_COOKIE.to_string());

        match env {
            Env::Local => Self {
                env: Env::Local,
                db_url: env::var("DATABASE_URL").ok(),
                bind_addr,
                session_cookie_name,
                cookie_secure: false,
            },
            Env::Production => Self {
                env: Env::Production,
                db_url: Some(
                    env::var("DATABASE_URL").expect("FATAL: DATABASE_URL required in prod"),
                ),
                bind_addr,
                session_cookie_name,
                cookie_secure: true,
            },
        }
    }
}
