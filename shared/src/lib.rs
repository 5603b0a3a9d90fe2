//! Fundingwatch Shared Library
//!
//! This crate contains the collection and storage core of the Fundingwatch
//! funding rate aggregator.
//!
//! # Modules
//!
//! - [`source`] - The `DataSource` trait every provider adapter implements
//! - [`aggregator`] - Concurrent fan-out over registered sources
//! - [`storage`] - The append-only per-instrument, per-day log
//! - [`models`] - Observations and the records derived from the log
//! - [`clock`] - Injectable time source
//! - [`config`] - Collection timing configuration
//!
//! # Example
//!
//! ```
//! use shared::models::Observation;
//!
//! let obs = Observation::new("BTCUSDT", "binance", 0.0001)
//!     .with_prices(43000.5, 42990.1);
//!
//! assert!(obs.validate_observation().is_ok());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod aggregator;
pub mod clock;
pub mod config;
pub mod models;
pub mod source;
pub mod storage;

/// Re-export common dependencies for convenience.
pub use chrono;
pub use serde;
pub use serde_json;
pub use validator;
