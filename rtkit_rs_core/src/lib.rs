//! # rtkit_core
//!
//! pure Rust kernels behind `rtkit`: key normalization, as-of alignment and
//! sentinel-aware gathering over [`ndarray`] columns.
//!
//! Nothing in this crate touches Python, so it can be tested and benchmarked on its own.
//! The bindings live in `rtkit_bindings` / `rtkit`.

pub mod error;
pub mod toolkit;

pub use error::{Result, ToolkitError};
