//! Registry test utilities

use std::collections::HashMap;

use async_trait::async_trait;

use tag_matrix::tag::error::RegistryError;
use tag_matrix::tag::registry::TagSource;

/// In-memory tag source keyed by image name
#[derive(Default)]
pub struct FakeSource {
    images: HashMap<String, Vec<String>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self {
            images: HashMap::new(),
        }
    }

    pub fn with_tags(mut self, image: &str, tags: &[&str]) -> Self {
        self.images.insert(
            image.to_string(),
            tags.iter().map(|t| t.to_string()).collect(),
        );
        self
    }
}

#[async_trait]
impl TagSource for FakeSource {
    async fn fetch_tags(&self, image_name: &str) -> Result<Vec<String>, RegistryError> {
        self.images
            .get(image_name)
            .cloned()
            .ok_or_else(|| RegistryError::MalformedResponse {
                url: image_name.to_string(),
                reason: "unknown image".to_string(),
            })
    }
}

/// Environment map for `Config::from_lookup`
pub fn env_map(pairs: &[(&str, String)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}
