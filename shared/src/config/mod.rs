//! Configuration module for Fundingwatch.
//!
//! This module contains configuration structures shared by the server and
//! the CLI.

pub mod collection;

pub use collection::{CollectionConfig, DEFAULT_INTERVAL_SECS, DEFAULT_SOURCE_TIMEOUT_SECS};
