//! Registry trait for fetching dist-tag listings

#[cfg(test)]
use mockall::automock;

use crate::version::error::RegistryError;

/// Trait for fetching the dist-tags of a package
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait TagRegistry: Send + Sync {
    /// Short name used in log output
    fn name(&self) -> &'static str;

    /// Fetches the dist-tag listing for a package
    ///
    /// # Arguments
    /// * `package_name` - The name of the package (e.g., "@types/node")
    ///
    /// # Returns
    /// * `Ok(String)` - One `tag: version` pair per line, as printed by `npm dist-tags`
    /// * `Err(RegistryError)` - If the query fails
    async fn fetch_dist_tags(&self, package_name: &str) -> Result<String, RegistryError>;
}
