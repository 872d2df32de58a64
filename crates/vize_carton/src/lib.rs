//! Carton - The artist's toolbox for Vize.
//!
//! This crate provides the small, dependency-light utilities shared by the
//! Vize build pipeline, much like a carton (artist's portfolio case) holds all
//! the essential tools and materials an artist needs for their work.
//!
//! # Modules
//!
//! - **hash**: stable SHA-256 digests and hex encoding
//! - **path**: lexical path normalisation, project-relative paths and
//!   import-specifier helpers
//!
//! # Example
//!
//! ```
//! use vize_carton::hash::short_digest;
//! use vize_carton::path::to_slash;
//! use std::path::Path;
//!
//! let id = short_digest(&to_slash(Path::new("src/App.vue")), 8);
//! assert_eq!(id.len(), 8);
//! ```

pub mod hash;
pub mod path;

// Re-export rustc-hash for fast hash maps/sets
pub use rustc_hash::{FxHashMap, FxHashSet};
