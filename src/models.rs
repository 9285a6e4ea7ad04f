use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Placeholder for a lead field the model could not find.
pub const NOT_AVAILABLE: &str = "N/A";

// ============ Request Models ============

/// Body of `POST /generate-leads`.
///
/// Every field is optional at the serde level so that a missing field is
/// reported as a validation error (400) instead of a JSON rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeadRequest {
    /// Search keyword, e.g. "real estate agent".
    #[serde(default)]
    pub keyword: Option<String>,
    /// Site restriction, e.g. "instagram.com".
    #[serde(default)]
    pub site_address: Option<String>,
    /// Location phrase, e.g. "Austin, TX".
    #[serde(default)]
    pub location: Option<String>,
    /// Email domain hint without the `@`, e.g. "gmail.com".
    #[serde(default)]
    pub email_domain: Option<String>,
}

impl LeadRequest {
    pub fn new(
        keyword: impl Into<String>,
        site_address: impl Into<String>,
        location: impl Into<String>,
        email_domain: impl Into<String>,
    ) -> Self {
        Self {
            keyword: Some(keyword.into()),
            site_address: Some(site_address.into()),
            location: Some(location.into()),
            email_domain: Some(email_domain.into()),
        }
    }
}

/// A request that passed validation. All terms are trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedLeadRequest {
    pub keyword: String,
    pub site_address: String,
    pub location: String,
    pub email_domain: String,
}

// ============ Lead Models ============

/// One structured contact extracted from search results.
///
/// Keys are PascalCase on the wire. Missing, `null` and blank values become
/// [`NOT_AVAILABLE`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct LeadRecord {
    #[serde(rename = "Name", deserialize_with = "lenient_field")]
    pub name: String,
    #[serde(rename = "BusinessName", deserialize_with = "lenient_field")]
    pub business_name: String,
    #[serde(rename = "Email", deserialize_with = "lenient_field")]
    pub email: String,
    #[serde(rename = "SocialMediaHandleLink", deserialize_with = "lenient_field")]
    pub social_media_handle_link: String,
}

impl Default for LeadRecord {
    fn default() -> Self {
        Self {
            name: not_available(),
            business_name: not_available(),
            email: not_available(),
            social_media_handle_link: not_available(),
        }
    }
}

impl LeadRecord {
    /// True when at least one field carries a real value.
    pub fn has_any_value(&self) -> bool {
        [
            &self.name,
            &self.business_name,
            &self.email,
            &self.social_media_handle_link,
        ]
        .iter()
        .any(|field| field.as_str() != NOT_AVAILABLE)
    }
}

fn not_available() -> String {
    NOT_AVAILABLE.to_string()
}

/// Accepts any JSON scalar for a lead field. Models occasionally emit
/// numbers or `null` where a string was requested.
fn lenient_field<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let text = match value {
        Value::Null => return Ok(not_available()),
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    };

    if text.is_empty() {
        Ok(not_available())
    } else {
        Ok(text)
    }
}

// ============ Response Models ============

/// Error envelope returned by every failing lead route.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

/// Result of the proxy health check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ProxyHealth {
    /// Proxy answered; `proxyIp` is the egress address the echo service saw.
    Ok {
        #[serde(rename = "proxyIp")]
        proxy_ip: String,
    },
    Error { message: String },
}
