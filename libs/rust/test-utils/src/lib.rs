//! Shared test utilities for the SET issuer workspace.
//!
//! This crate provides:
//! - Proptest generators for event, subject and claim inputs
//! - A recording mock transmitter
//! - Fixtures: lazily generated RSA keys, sample events, a test-only verifier

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod mocks;

pub use generators::*;
