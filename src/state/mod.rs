//! State module for tracking how collections leave the work ledger
//!
//! A collection job is active until it reaches one of two terminal outcomes:
//! its listing ran dry, or fetching it failed twice in a row.
//!
//! # Components
//!
//! - `Resolution`: The terminal outcome recorded for a retired collection

mod resolution;

// Re-export main types
pub use resolution::Resolution;
