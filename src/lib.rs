//! Update package.json dependencies to the versions behind their npm
//! dist-tags, then rebuild the installed dependency tree.

pub mod app;
pub mod config;
pub mod maintenance;
pub mod manifest;
pub mod process;
pub mod updater;
pub mod version;
