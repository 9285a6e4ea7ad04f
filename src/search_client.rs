use crate::config::{Config, ProxyConfig};
use crate::errors::AppError;
use crate::models::{ProxyHealth, ValidatedLeadRequest};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, PRAGMA};
use serde::Deserialize;
use std::time::Duration;

/// Timeout for the search results fetch.
pub const SEARCH_TIMEOUT: Duration = Duration::from_secs(10);
/// Timeout for the proxy health check.
pub const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);
/// Results requested per search page.
pub const RESULTS_PER_PAGE: &str = "100";

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Builds the search-engine query for a lead request.
///
/// `site:{site} "{keyword}" "{location}" "@{domain}"`. Double quotes inside
/// a term are dropped so no term can close its own phrase.
pub fn build_search_query(request: &ValidatedLeadRequest) -> String {
    format!(
        "site:{} \"{}\" \"{}\" \"@{}\"",
        strip_quotes(&request.site_address).replace(' ', ""),
        strip_quotes(&request.keyword),
        strip_quotes(&request.location),
        strip_quotes(&request.email_domain).trim_start_matches('@'),
    )
}

fn strip_quotes(term: &str) -> String {
    term.chars()
        .filter(|c| *c != '"')
        .collect::<String>()
        .trim()
        .to_string()
}

#[derive(Debug, Deserialize)]
struct IpEcho {
    origin: Option<String>,
}

/// Outbound client for the search engine and the IP-echo endpoint.
///
/// Both go through the configured forward proxy, with certificate
/// verification disabled.
#[derive(Clone)]
pub struct SearchClient {
    search_client: reqwest::Client,
    health_client: reqwest::Client,
    search_base_url: String,
    ip_echo_url: String,
}

impl SearchClient {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let search_client = build_client(config.proxy.as_ref(), SEARCH_TIMEOUT, true)?;
        let health_client = build_client(config.proxy.as_ref(), HEALTH_CHECK_TIMEOUT, false)?;

        Ok(Self {
            search_client,
            health_client,
            search_base_url: config.search_base_url.clone(),
            ip_echo_url: config.ip_echo_url.clone(),
        })
    }

    /// Fetches the raw results page for a query.
    pub async fn fetch_results(&self, query: &str) -> Result<String, AppError> {
        let url = reqwest::Url::parse_with_params(
            &format!("{}/search", self.search_base_url),
            &[("q", query), ("num", RESULTS_PER_PAGE)],
        )
        .map_err(|e| AppError::Internal(format!("Failed to build search URL: {}", e)))?;

        tracing::info!("Fetching search results for query: {}", query);

        let response = self.search_client.get(url).send().await.map_err(|e| {
            tracing::error!("Search request failed: {}", e);
            AppError::from(e)
        })?;

        let status = response.status();
        tracing::info!("Search response status: {}", status);

        if !status.is_success() {
            tracing::error!("Search response headers: {:?}", response.headers());
            let body = response.text().await.unwrap_or_default();
            tracing::debug!("Search error body: {}", truncate(&body, 2_000));
            return Err(AppError::Fetch(format!(
                "Search engine returned status {}",
                status
            )));
        }

        response.text().await.map_err(|e| {
            AppError::Fetch(format!("Failed to read search response body: {}", e))
        })
    }

    /// Reports the egress IP seen through the proxy, or why it could not.
    pub async fn check_proxy(&self) -> ProxyHealth {
        match self.fetch_egress_ip().await {
            Ok(proxy_ip) => {
                tracing::info!("Proxy health check OK, egress IP {}", proxy_ip);
                ProxyHealth::Ok { proxy_ip }
            }
            Err(message) => {
                tracing::error!("Proxy health check failed: {}", message);
                ProxyHealth::Error { message }
            }
        }
    }

    async fn fetch_egress_ip(&self) -> Result<String, String> {
        let response = self
            .health_client
            .get(&self.ip_echo_url)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!("IP echo response headers: {:?}", response.headers());
            let body = response.text().await.unwrap_or_default();
            tracing::error!("IP echo response data: {}", truncate(&body, 2_000));
            return Err(format!("IP echo endpoint returned status {}", status));
        }

        let echo: IpEcho = response
            .json()
            .await
            .map_err(|e| format!("Failed to parse IP echo response: {}", e))?;

        echo.origin
            .filter(|ip| !ip.trim().is_empty())
            .ok_or_else(|| "IP echo response missing 'origin'".to_string())
    }
}

fn build_client(
    proxy: Option<&ProxyConfig>,
    timeout: Duration,
    browser_headers: bool,
) -> Result<reqwest::Client, AppError> {
    let mut builder = reqwest::Client::builder()
        .timeout(timeout)
        .danger_accept_invalid_certs(true);

    if let Some(proxy) = proxy {
        let mut outbound = reqwest::Proxy::all(proxy.url())
            .map_err(|e| AppError::Internal(format!("Invalid proxy configuration: {}", e)))?;
        if let (Some(user), Some(pass)) = (&proxy.username, &proxy.password) {
            outbound = outbound.basic_auth(user, pass);
        }
        builder = builder.proxy(outbound);
    } else {
        builder = builder.no_proxy();
    }

    if browser_headers {
        builder = builder
            .user_agent(BROWSER_USER_AGENT)
            .default_headers(browser_header_map());
    }

    builder
        .build()
        .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))
}

fn browser_header_map() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(keyword: &str, site: &str, location: &str, domain: &str) -> ValidatedLeadRequest {
        ValidatedLeadRequest {
            keyword: keyword.to_string(),
            site_address: site.to_string(),
            location: location.to_string(),
            email_domain: domain.to_string(),
        }
    }

    #[test]
    fn test_build_search_query() {
        let query = build_search_query(&request(
            "real estate agent",
            "instagram.com",
            "Austin, TX",
            "gmail.com",
        ));
        assert_eq!(
            query,
            r#"site:instagram.com "real estate agent" "Austin, TX" "@gmail.com""#
        );
    }

    #[test]
    fn test_build_search_query_strips_embedded_quotes() {
        let query = build_search_query(&request(
            r#"dentist" OR "x"#,
            "linkedin.com",
            "Ohio",
            "@yahoo.com",
        ));
        assert_eq!(
            query,
            r#"site:linkedin.com "dentist OR x" "Ohio" "@yahoo.com""#
        );
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("abc", 10), "abc");
    }

    #[test]
    fn test_client_creation() {
        let config = Config {
            port: 3000,
            gemini_api_key: "key".to_string(),
            gemini_model: "gemini-1.5-flash".to_string(),
            gemini_base_url: "https://generativelanguage.googleapis.com".to_string(),
            search_base_url: "https://www.google.com".to_string(),
            ip_echo_url: "http://httpbin.org/ip".to_string(),
            proxy: Some(ProxyConfig {
                host: "proxy.example.net".to_string(),
                port: 31112,
                username: Some("user".to_string()),
                password: Some("pass".to_string()),
            }),
            rate_limit_max_requests: 10,
            rate_limit_window_secs: 60,
        };
        assert!(SearchClient::new(&config).is_ok());
    }
}
