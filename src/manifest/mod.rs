//! Manifest layer
//! - types.rs: Dependency groups and entries
//! - package_json.rs: package.json load/update/save

pub mod package_json;
pub mod types;

pub use package_json::{Manifest, ManifestError};
pub use types::{DependencyEntry, DependencyGroup};
