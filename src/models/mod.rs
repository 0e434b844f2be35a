//! Core data models for the dashboard.

mod analytics;
mod ids;
mod query;
mod records;

pub use analytics::*;
pub use ids::*;
pub use query::*;
pub use records::*;
