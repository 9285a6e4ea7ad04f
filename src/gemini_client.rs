use crate::config::Config;
use crate::errors::AppError;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

const GENERATION_TIMEOUT: Duration = Duration::from_secs(60);

/// Instruction placed before the scraped text.
const LEAD_PROMPT: &str = r#"I'm attaching cluttered and messy data from a Google search. Please process it and extract information in the following JSON format:
[
  {
    "Name": "Extracted name or 'N/A' if not found",
    "BusinessName": "Extracted business name or 'N/A' if not found",
    "Email": "Extracted email or 'N/A' if not found",
    "SocialMediaHandleLink": "Extracted social media link or 'N/A' if not found"
  }
]
Only include entries where at least one field is not 'N/A'. Ensure the JSON is properly formatted. Here's the data:"#;

/// Full prompt for a block of search-result text.
pub fn build_lead_prompt(search_text: &str) -> String {
    format!("{}\n\n{}", LEAD_PROMPT, search_text)
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate.
    fn into_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// Client for the Gemini `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(GENERATION_TIMEOUT)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create Gemini client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.gemini_base_url.clone(),
            model: config.gemini_model.clone(),
            api_key: config.gemini_api_key.clone(),
        })
    }

    /// Sends one prompt and returns the generated text.
    pub async fn generate(&self, prompt: &str) -> Result<String, AppError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        tracing::info!(
            "Calling Gemini model {} ({} prompt chars)",
            self.model,
            prompt.len()
        );

        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Model(format!("Gemini request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!("Gemini returned {}: {}", status, error_text);
            return Err(AppError::Model(format!("Gemini returned status {}", status)));
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|e| {
            AppError::Model(format!("Failed to parse Gemini response: {}", e))
        })?;

        parsed
            .into_text()
            .ok_or_else(|| AppError::Model("Gemini returned no text candidate".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_ends_with_search_text() {
        let prompt = build_lead_prompt("Jane Doe jane@gmail.com");
        assert!(prompt.starts_with("I'm attaching cluttered"));
        assert!(prompt.contains("\"SocialMediaHandleLink\""));
        assert!(prompt.ends_with("Here's the data:\n\nJane Doe jane@gmail.com"));
    }

    #[test]
    fn test_response_text_concatenates_parts() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [
                { "content": { "parts": [{ "text": "[{\"Name\":" }, { "text": " \"A\"}]" }] } },
                { "content": { "parts": [{ "text": "ignored" }] } }
            ]
        }))
        .unwrap();

        assert_eq!(response.into_text().as_deref(), Some("[{\"Name\": \"A\"}]"));
    }

    #[test]
    fn test_response_without_candidates_has_no_text() {
        let response: GenerateContentResponse =
            serde_json::from_value(json!({ "promptFeedback": { "blockReason": "SAFETY" } }))
                .unwrap();
        assert!(response.into_text().is_none());
    }
}
