use anyhow::{Context, Result};

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `127.0.0.1`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Mark the session cookie `Secure` (default: `true`).
    ///
    /// Only turned off for plain-HTTP local development, where clients
    /// would otherwise never send the cookie back.
    pub secure_cookies: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 3000,
            request_timeout_secs: 30,
            secure_cookies: true,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default     |
    /// |------------------------|-------------|
    /// | `HOST`                 | `127.0.0.1` |
    /// | `PORT`                 | `3000`      |
    /// | `REQUEST_TIMEOUT_SECS` | `30`        |
    /// | `INSECURE_COOKIES`     | unset       |
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let host = lookup("HOST").unwrap_or(defaults.host);

        let port = match lookup("PORT") {
            Some(port) => port.parse().context("PORT must be a valid u16")?,
            None => defaults.port,
        };

        let request_timeout_secs = match lookup("REQUEST_TIMEOUT_SECS") {
            Some(secs) => secs
                .parse()
                .context("REQUEST_TIMEOUT_SECS must be a valid u64")?,
            None => defaults.request_timeout_secs,
        };

        let insecure = matches!(lookup("INSECURE_COOKIES").as_deref(), Some("1") | Some("true"));

        Ok(Self {
            host,
            port,
            request_timeout_secs,
            secure_cookies: !insecure,
        })
    }
}
