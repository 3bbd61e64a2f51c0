//! Registry implementations for fetching dist-tags

pub mod npm;
pub mod npm_cli;

pub use npm::NpmRegistry;
pub use npm_cli::NpmCliRegistry;
