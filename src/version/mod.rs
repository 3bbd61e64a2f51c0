//! Dist-tag lookup layer
//!
//! This module fetches the dist-tag listing of a package and resolves the
//! version behind a tag.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐
//! │ TagRegistry │────▶│  Resolver   │
//! │  (fetch)    │text │ (tag→ver)   │
//! └─────────────┘     └─────────────┘
//!        │
//!        ▼
//! ┌─────────────┐
//! │ Registries  │
//! │ (npm, http) │
//! └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`registry`]: Registry trait for fetching dist-tag listings
//! - [`registries`]: Concrete implementations (`npm dist-tags`, registry HTTP API)
//! - [`resolver`]: Extracts the version behind a tag from a listing
//! - [`semver`]: Classifies version changes for reporting
//! - [`error`]: Error types for registry operations

pub mod error;
pub mod registries;
pub mod registry;
pub mod resolver;
pub mod semver;
