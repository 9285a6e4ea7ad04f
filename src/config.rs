use serde::Deserialize;
use std::time::Duration;

/// Forward proxy used for the search fetch and the health check.
#[derive(Debug, Clone, Deserialize)]
pub struct ProxyConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl ProxyConfig {
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub search_base_url: String,
    pub ip_echo_url: String,
    pub proxy: Option<ProxyConfig>,
    pub rate_limit_max_requests: u32,
    pub rate_limit_window_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            gemini_api_key: std::env::var("GOOGLE_API_KEY")
                .or_else(|_| std::env::var("GEMINI_API_KEY"))
                .map_err(|_| {
                    anyhow::anyhow!("GOOGLE_API_KEY or GEMINI_API_KEY environment variable required")
                })
                .and_then(|key| {
                    if key.trim().is_empty() {
                        anyhow::bail!("GOOGLE_API_KEY cannot be empty");
                    }
                    Ok(key)
                })?,
            gemini_model: std::env::var("GEMINI_MODEL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "gemini-1.5-flash".to_string()),
            gemini_base_url: url_var(
                "GEMINI_BASE_URL",
                "https://generativelanguage.googleapis.com",
            )?,
            search_base_url: url_var("SEARCH_BASE_URL", "https://www.google.com")?,
            ip_echo_url: url_var("IP_ECHO_URL", "http://httpbin.org/ip")?,
            proxy: proxy_from_env()?,
            rate_limit_max_requests: std::env::var("RATE_LIMIT_MAX_REQUESTS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("RATE_LIMIT_MAX_REQUESTS must be a positive number"))
                .and_then(|n: u32| {
                    if n == 0 {
                        anyhow::bail!("RATE_LIMIT_MAX_REQUESTS must be at least 1");
                    }
                    Ok(n)
                })?,
            rate_limit_window_secs: std::env::var("RATE_LIMIT_WINDOW_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("RATE_LIMIT_WINDOW_SECS must be a positive number"))
                .and_then(|n: u64| {
                    if n == 0 {
                        anyhow::bail!("RATE_LIMIT_WINDOW_SECS must be at least 1");
                    }
                    Ok(n)
                })?,
        };

        // Log successful configuration load (without sensitive values)
        tracing::debug!("Gemini model: {}", config.gemini_model);
        tracing::debug!("Gemini base URL: {}", config.gemini_base_url);
        tracing::debug!("Search base URL: {}", config.search_base_url);
        tracing::debug!("IP echo URL: {}", config.ip_echo_url);
        match config.proxy {
            Some(ref proxy) => tracing::info!(
                "Outbound proxy configured: {} (auth: {})",
                proxy.url(),
                proxy.username.is_some()
            ),
            None => tracing::warn!("No PROXY_HOST configured, search requests go out directly"),
        }
        tracing::debug!(
            "Rate limit: {} requests per {}s",
            config.rate_limit_max_requests,
            config.rate_limit_window_secs
        );
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }
}

fn url_var(name: &str, default: &str) -> anyhow::Result<String> {
    let url = std::env::var(name)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| default.to_string());
    validate_http_url(name, &url)?;
    Ok(url.trim_end_matches('/').to_string())
}

fn validate_http_url(name: &str, url: &str) -> anyhow::Result<()> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        anyhow::bail!("{} must start with http:// or https://", name);
    }
    Ok(())
}

fn proxy_from_env() -> anyhow::Result<Option<ProxyConfig>> {
    let host = std::env::var("PROXY_HOST")
        .ok()
        .filter(|s| !s.trim().is_empty());
    let port = std::env::var("PROXY_PORT")
        .ok()
        .filter(|s| !s.trim().is_empty());

    let (host, port) = match (host, port) {
        (None, None) => return Ok(None),
        (Some(host), Some(port)) => (host, port),
        _ => anyhow::bail!("PROXY_HOST and PROXY_PORT must be set together"),
    };

    let port = port
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("PROXY_PORT must be a valid number between 1-65535"))?;

    let username = std::env::var("PROXY_USERNAME")
        .ok()
        .filter(|s| !s.is_empty());
    let password = std::env::var("PROXY_PASSWORD")
        .ok()
        .filter(|s| !s.is_empty());
    if username.is_some() != password.is_some() {
        anyhow::bail!("PROXY_USERNAME and PROXY_PASSWORD must be set together");
    }

    Ok(Some(ProxyConfig {
        host: host.trim().to_string(),
        port,
        username,
        password,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proxy_url() {
        let proxy = ProxyConfig {
            host: "proxy.example.net".to_string(),
            port: 31112,
            username: None,
            password: None,
        };
        assert_eq!(proxy.url(), "http://proxy.example.net:31112");
    }

    #[test]
    fn test_validate_http_url() {
        assert!(validate_http_url("X", "https://www.google.com").is_ok());
        assert!(validate_http_url("X", "http://127.0.0.1:8080").is_ok());
        assert!(validate_http_url("X", "ftp://example.com").is_err());
        assert!(validate_http_url("X", "www.google.com").is_err());
    }
}
