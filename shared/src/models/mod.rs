//! Data models for the Fundingwatch service.
//!
//! This module contains the observation produced by data sources, the
//! provider liveness summary, and the records derived from the on-disk log.

pub mod history;
pub mod observation;
pub mod status;

pub use history::{HistoryPoint, LogBlock, LogFileDescriptor, RateLine};
pub use observation::{Observation, ObservationValidationError};
pub use status::ProviderStatus;
