//! Microsoft Container Registry (Docker Registry v2) tag listing

use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::USER_AGENT;
use crate::tag::error::RegistryError;
use crate::tag::registry::TagSource;

/// Default base URL for MCR
pub const DEFAULT_BASE_URL: &str = "https://mcr.microsoft.com";

/// Response from `GET /v2/<name>/tags/list`
#[derive(Debug, Deserialize)]
struct TagListResponse {
    #[serde(default)]
    name: Option<String>,
    /// `null` for repositories without tags
    #[serde(default)]
    tags: Option<Vec<String>>,
}

/// Tag source backed by the Docker Registry v2 `tags/list` endpoint
pub struct McrRegistry {
    client: reqwest::Client,
    base_url: String,
}

impl McrRegistry {
    /// Creates a new McrRegistry with a custom base URL
    pub fn new(base_url: &str) -> Result<Self, RegistryError> {
        Ok(Self {
            client: reqwest::Client::builder().user_agent(USER_AGENT).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait::async_trait]
impl TagSource for McrRegistry {
    async fn fetch_tags(&self, image_name: &str) -> Result<Vec<String>, RegistryError> {
        let url = format!("{}/v2/{}/tags/list", self.base_url, image_name);

        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if !status.is_success() {
            warn!("Source registry returned status {}: {}", status, url);
            return Err(RegistryError::UnexpectedStatus { status, url });
        }

        let body = response.text().await?;
        let listing: TagListResponse = serde_json::from_str(&body).map_err(|e| {
            warn!("Failed to parse tag list response: {}", e);
            RegistryError::MalformedResponse {
                url: url.clone(),
                reason: e.to_string(),
            }
        })?;

        let tags = listing.tags.unwrap_or_default();
        debug!(
            "Fetched {} tags for {}",
            tags.len(),
            listing.name.as_deref().unwrap_or(image_name)
        );

        Ok(tags)
    }
}
