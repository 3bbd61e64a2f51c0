//! Shared helpers for integration tests

#![allow(dead_code)]

mod runner;

pub use runner::{FakeRunner, write_manifest};
