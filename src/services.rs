use crate::config::Config;
use crate::errors::AppError;
use crate::gemini_client::{build_lead_prompt, GeminiClient};
use crate::html_text::{extract_results_text, is_blocked_page, RESULTS_CONTAINER};
use crate::lead_parser::parse_lead_records;
use crate::models::{LeadRecord, LeadRequest, ValidatedLeadRequest};
use crate::search_client::{build_search_query, SearchClient};
use tracing::Instrument;
use uuid::Uuid;

/// Checks that every lead request field is present and non-blank.
pub fn validate_lead_request(request: &LeadRequest) -> Result<ValidatedLeadRequest, AppError> {
    fn required(value: &Option<String>) -> Option<String> {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    match (
        required(&request.keyword),
        required(&request.site_address),
        required(&request.location),
        required(&request.email_domain),
    ) {
        (Some(keyword), Some(site_address), Some(location), Some(email_domain)) => {
            Ok(ValidatedLeadRequest {
                keyword,
                site_address,
                location,
                email_domain,
            })
        }
        _ => Err(AppError::Validation(
            "All fields (keyword, siteAddress, location, emailDomain) are required".to_string(),
        )),
    }
}

/// Runs the lead pipeline: search fetch, text extraction, model call, parse.
///
/// At most one search fetch and one model call per request, no retries.
#[derive(Clone)]
pub struct LeadService {
    search: SearchClient,
    gemini: GeminiClient,
}

impl LeadService {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        Ok(Self {
            search: SearchClient::new(config)?,
            gemini: GeminiClient::new(config)?,
        })
    }

    pub fn from_parts(search: SearchClient, gemini: GeminiClient) -> Self {
        Self { search, gemini }
    }

    pub fn search_client(&self) -> &SearchClient {
        &self.search
    }

    /// Runs the whole pipeline for one request.
    ///
    /// # Arguments
    ///
    /// * `request` - The raw lead request; validated before any outbound call.
    ///
    /// # Returns
    ///
    /// * `Result<Vec<LeadRecord>, AppError>` - Leads with at least one real
    ///   field, or the first error hit by any stage.
    pub async fn extract_leads(&self, request: &LeadRequest) -> Result<Vec<LeadRecord>, AppError> {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("extract_leads", %request_id);
        self.run_pipeline(request).instrument(span).await
    }

    async fn run_pipeline(&self, request: &LeadRequest) -> Result<Vec<LeadRecord>, AppError> {
        let request = validate_lead_request(request)?;
        let query = build_search_query(&request);

        let html = self.search.fetch_results(&query).await?;

        if is_blocked_page(&html) {
            return Err(AppError::BlockingDetected);
        }

        let search_text = extract_results_text(&html).unwrap_or_else(|| {
            tracing::warn!(
                "Results page has no {} container; sending empty text to the model",
                RESULTS_CONTAINER
            );
            String::new()
        });
        tracing::debug!("Extracted {} chars of result text", search_text.len());

        let generated = self.gemini.generate(&build_lead_prompt(&search_text)).await?;
        let leads = parse_lead_records(&generated)?;

        tracing::info!("Extracted {} leads", leads.len());
        Ok(leads)
    }
}
