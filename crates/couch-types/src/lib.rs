//! Foundation types and traits for couchmode.
//!
//! This crate contains the platform-agnostic types shared by all couchmode
//! crates: colors, bitmaps, input events, backend trait definitions, and
//! error types.

pub mod backend;
pub mod bitmap;
pub mod error;
pub mod input;
