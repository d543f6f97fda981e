//! # toolkit
//!
//! the building blocks are layered bottom-up:
//! - [`dtype`] / [`sentinel`]: element types, promotion and "invalid" values.
//! - [`column`] / [`categorical`]: the dynamically typed arrays every entry point accepts.
//! - [`keys`] / [`align`]: key normalization and the as-of aligner built on it.
//! - [`gather`]: out-of-bounds tolerant fancy indexing.
//! - [`stats`] / [`strings`] / `sample`: smaller helpers on top of the above.

pub mod align;
pub mod categorical;
pub mod column;
pub mod dtype;
pub mod gather;
pub mod keys;
#[cfg(feature = "sample")]
pub mod sample;
pub mod sentinel;
pub mod stats;
pub mod strings;
