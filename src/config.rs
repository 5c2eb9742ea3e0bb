use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Host the public site talks to when `PORTAL_API_URL=default`.
pub const DEFAULT_API_URL: &str = "https://techy.zapto.org:8000/api";

/// Fixed name of the persisted token pair.
pub const TOKEN_STORE_KEY: &str = "admin_tokens";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BackendMode {
    /// In-process stand-in with a fixed slot catalogue.
    Mock,
    /// Real REST API rooted at this base URL.
    Remote(String),
}

#[derive(Clone, Debug)]
pub struct Config {
    pub api_url: Option<String>,
    pub token_file: PathBuf,
    pub redirect_debounce: Duration,
    pub form_reset_delay: Duration,
    pub http_timeout: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("PORTAL_API_URL")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(|s| {
                if s.eq_ignore_ascii_case("default") {
                    DEFAULT_API_URL.to_string()
                } else {
                    s.trim_end_matches('/').to_string()
                }
            });

        let token_file = match lookup("PORTAL_TOKEN_FILE").filter(|s| !s.trim().is_empty()) {
            Some(path) => PathBuf::from(path),
            None => default_token_file()?,
        };

        let redirect_debounce = Duration::from_millis(parse_or(&lookup, "PORTAL_REDIRECT_DEBOUNCE_MS", 100));
        let form_reset_delay = Duration::from_secs(parse_or(&lookup, "PORTAL_FORM_RESET_SECS", 5));
        let http_timeout = Duration::from_secs(parse_or(&lookup, "PORTAL_HTTP_TIMEOUT_SECS", 30));

        Ok(Self {
            api_url,
            token_file,
            redirect_debounce,
            form_reset_delay,
            http_timeout,
        })
    }

    pub fn backend_mode(&self) -> BackendMode {
        match &self.api_url {
            Some(url) => BackendMode::Remote(url.clone()),
            None => BackendMode::Mock,
        }
    }

    /// Base URL for authenticated admin calls. Admin screens always need the
    /// real API, so mock mode falls back to the default host.
    pub fn admin_api_url(&self) -> &str {
        self.api_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }
}

fn parse_or<F>(lookup: &F, key: &str, default: u64) -> u64
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|s| s.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn default_token_file() -> anyhow::Result<PathBuf> {
    let base = dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .ok_or_else(|| anyhow::anyhow!("no local data directory; set PORTAL_TOKEN_FILE"))?;
    Ok(base.join("clinic-portal").join(format!("{TOKEN_STORE_KEY}.json")))
}
