//! GitHub Packages API listing of published container versions

use reqwest::header::{ACCEPT, HeaderMap, LINK};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::{GITHUB_API_VERSION, USER_AGENT};
use crate::tag::error::RegistryError;
use crate::tag::registry::PublishedTags;

/// Default base URL for GitHub API
pub const DEFAULT_BASE_URL: &str = "https://api.github.com";

/// Page size requested from the versions endpoint (GitHub maximum)
const PER_PAGE: u32 = 100;

/// Entry in the package versions response
#[derive(Debug, Deserialize)]
struct PackageVersion {
    name: String,
}

/// Published-name listing backed by the GitHub Packages REST API
pub struct GitHubPackagesRegistry {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl GitHubPackagesRegistry {
    /// Creates a new GitHubPackagesRegistry with a custom base URL
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, RegistryError> {
        Ok(Self {
            client: reqwest::Client::builder().user_agent(USER_AGENT).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Package names may contain '/', which must be sent encoded
    fn encode_package_name(package: &str) -> String {
        package.replace('/', "%2F")
    }

    async fn fetch_page(&self, url: &str) -> Result<(Vec<String>, Option<String>), RegistryError> {
        let mut request = self
            .client
            .get(url)
            .header(ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            warn!("GitHub API returned status {}: {}", status, url);
            return Err(RegistryError::UnexpectedStatus {
                status,
                url: url.to_string(),
            });
        }

        let next = next_page_url(response.headers());
        let body = response.text().await?;
        let versions: Vec<PackageVersion> = serde_json::from_str(&body).map_err(|e| {
            warn!("Failed to parse GitHub package versions response: {}", e);
            RegistryError::MalformedResponse {
                url: url.to_string(),
                reason: e.to_string(),
            }
        })?;

        Ok((versions.into_iter().map(|v| v.name).collect(), next))
    }
}

/// Extract the `rel="next"` target from a `Link` header
fn next_page_url(headers: &HeaderMap) -> Option<String> {
    let link = headers.get(LINK)?.to_str().ok()?;
    link.split(',').find_map(|part| {
        let (target, params) = part.split_once(';')?;
        params
            .split(';')
            .any(|param| param.trim() == r#"rel="next""#)
            .then(|| {
                target
                    .trim()
                    .trim_start_matches('<')
                    .trim_end_matches('>')
                    .to_string()
            })
    })
}

#[async_trait::async_trait]
impl PublishedTags for GitHubPackagesRegistry {
    async fn fetch_published(
        &self,
        org: &str,
        package: &str,
    ) -> Result<Vec<String>, RegistryError> {
        let mut next = Some(format!(
            "{}/orgs/{}/packages/container/{}/versions?per_page={}",
            self.base_url,
            org,
            Self::encode_package_name(package),
            PER_PAGE
        ));
        let mut names = Vec::new();

        // Pages are fetched one at a time, following the Link header
        while let Some(url) = next {
            let (page, following) = self.fetch_page(&url).await?;
            debug!("Fetched {} published names from {}", page.len(), url);
            names.extend(page);
            next = following;
        }

        Ok(names)
    }
}
