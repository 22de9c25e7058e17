//! The `utils` module provides a collection of utility functions and common
//! definitions used across the `milight-bridge` crate.
//!
//! It centralizes the error types shared by every layer of the pipeline and
//! the logging bootstrap used by the binary and the tests.

pub mod error;
pub mod logging;
