use std::time::Duration;

use anyhow::Context;
use axum::async_trait;
use log::{debug, info};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::data::page_view::PageView;
use crate::service::Summarizer;

use super::{build_prompt, one_line};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Client for the Generative Language `generateContent` endpoint.
pub struct GeminiSummarizer {
    http_client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GenerateContentResponse {
    fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .first()
            .map(|part| part.text.as_str())
    }
}

impl GeminiSummarizer {
    pub fn new(
        endpoint: &str,
        model: &str,
        api_key: &str,
        timeout: Duration,
    ) -> Result<Self, anyhow::Error> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Error building HTTP client")?;
        info!("GeminiSummarizer: using model {}", model);
        Ok(Self {
            http_client,
            endpoint: endpoint.trim_end_matches('/').to_owned(),
            model: model.to_owned(),
            api_key: api_key.to_owned(),
        })
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

#[async_trait]
impl Summarizer for GeminiSummarizer {
    async fn summarize(&self, user_id: &str, views: &[PageView]) -> Result<String, anyhow::Error> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: build_prompt(user_id, views),
                }],
            }],
        };
        let response: GenerateContentResponse = self
            .http_client
            .post(self.url())
            .header(API_KEY_HEADER, self.api_key.as_str())
            .json(&request)
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .context("generateContent request failed")?
            .error_for_status()
            .map_err(reqwest::Error::without_url)
            .context("generateContent returned an error status")?
            .json()
            .await
            .map_err(reqwest::Error::without_url)
            .context("Failed to parse generateContent response")?;

        let summary = response
            .first_text()
            .and_then(one_line)
            .context("generateContent returned no text")?;
        debug!("GeminiSummarizer: summary for {}: {}", user_id, summary);
        Ok(summary)
    }
}
