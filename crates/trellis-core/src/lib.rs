//! Trellis Core - Foundational types for the Trellis attribute engine
//!
//! This crate provides the types that all other Trellis crates depend on:
//! - `Vec2`, `Vec3` - Vector values parsed from attribute strings
//! - `Color` - RGBA color with CSS-style parsing
//! - `ContentHash` - SHA-256 based fingerprints for change detection
//! - Error types and Result alias

mod color;
mod error;
mod hash;
mod types;

pub use color::{Color, ColorError};
pub use error::{Result, TrellisError};
pub use hash::ContentHash;
pub use types::{Vec2, Vec3};
