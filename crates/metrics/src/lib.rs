//! Metric definitions for herald.
//!
//! Crates record through the `metrics` facade behind their own `metrics`
//! feature. Nothing is exported until the embedding application installs a
//! recorder; without one every call is a no-op.
//!
//! ```rust,ignore
//! use herald_metrics::{counter, dispatch, labels};
//!
//! counter!(dispatch::EVENTS_TOTAL, labels::KIND => "text_message").increment(1);
//! ```

mod definitions;

pub use definitions::*;

// Re-export metrics macros for convenience
pub use metrics::{counter, gauge, histogram};
