//! Shared utilities for the access log workspace
//!
//! Currently the diagnostic logging setup used by embedders and by tests.

pub mod tracing;
