//! Integration test utilities for the client library
//!
//! This crate provides a scripted mock of the REST API and a harness that
//! feeds gateway frames through the event loop.

pub mod helpers;
pub mod fixtures;

pub use helpers::*;
pub use fixtures::*;
