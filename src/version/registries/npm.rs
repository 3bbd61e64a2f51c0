//! npm registry API implementation

use indexmap::IndexMap;
use tracing::warn;

use crate::version::error::RegistryError;
use crate::version::registry::TagRegistry;

/// Default base URL for npm registry
pub const DEFAULT_BASE_URL: &str = "https://registry.npmjs.org";

/// Registry implementation for the npm dist-tags API
pub struct NpmRegistry {
    client: reqwest::Client,
    base_url: String,
}

impl NpmRegistry {
    /// Creates a new NpmRegistry with a custom base URL
    pub fn new(base_url: &str) -> Result<Self, RegistryError> {
        let client = reqwest::Client::builder()
            .user_agent("dist-tag-sync")
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Encode package name for URL (handles scoped packages)
    fn encode_package_name(package_name: &str) -> String {
        if package_name.starts_with('@') {
            // Scoped package: @scope/name -> @scope%2Fname
            package_name.replace('/', "%2F")
        } else {
            package_name.to_string()
        }
    }

    /// Render dist-tags the way `npm dist-tags` prints them
    fn render(tags: &IndexMap<String, String>) -> String {
        tags.iter()
            .map(|(tag, version)| format!("{tag}: {version}\n"))
            .collect()
    }
}

#[async_trait::async_trait]
impl TagRegistry for NpmRegistry {
    fn name(&self) -> &'static str {
        "registry"
    }

    async fn fetch_dist_tags(&self, package_name: &str) -> Result<String, RegistryError> {
        let encoded_name = Self::encode_package_name(package_name);
        let url = format!("{}/-/package/{}/dist-tags", self.base_url, encoded_name);

        let response = self.client.get(&url).send().await?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(RegistryError::NotFound(package_name.to_string()));
        }

        if !status.is_success() {
            warn!("npm registry returned status {}: {}", status, url);
            return Err(RegistryError::InvalidResponse(format!(
                "Unexpected status: {}",
                status
            )));
        }

        let tags: IndexMap<String, String> = response.json().await.map_err(|e| {
            warn!("Failed to parse npm dist-tags response: {}", e);
            RegistryError::InvalidResponse(e.to_string())
        })?;

        Ok(Self::render(&tags))
    }
}
