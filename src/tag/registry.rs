//! Registry traits for the source listing and the downstream package listing

#[cfg(test)]
use mockall::automock;

use crate::tag::error::RegistryError;

/// Upstream registry the build matrix is generated from
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait TagSource: Send + Sync {
    /// Fetches every tag published for an image
    ///
    /// # Arguments
    /// * `image_name` - Repository path inside the registry (e.g., "dotnet/runtime")
    ///
    /// # Returns
    /// * `Ok(Vec<String>)` - Raw tags in registry order, possibly with duplicates
    /// * `Err(RegistryError)` - If the request fails or the body has the wrong shape
    async fn fetch_tags(&self, image_name: &str) -> Result<Vec<String>, RegistryError>;
}

/// Downstream registry that already holds built images
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait PublishedTags: Send + Sync {
    /// Fetches the names already published for a package
    async fn fetch_published(&self, org: &str, package: &str)
    -> Result<Vec<String>, RegistryError>;
}
