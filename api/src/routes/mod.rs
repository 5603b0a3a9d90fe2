//! API route definitions.
//!
//! This module organizes all HTTP routes for the Fundingwatch API server.

mod error;
mod funding;
mod health;
mod history;
mod logs;

pub use error::ErrorBody;
pub use funding::funding_routes;
pub use health::health_routes;
pub use history::history_routes;
pub use logs::logs_routes;
