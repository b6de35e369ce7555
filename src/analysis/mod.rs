//! Analytics modules.
//!
//! Classification of subject labels, boundary normalization of backend
//! payloads, and aggregation into chart-ready data.

pub mod adapter;
pub mod aggregator;
pub mod classifier;

pub use aggregator::*;
