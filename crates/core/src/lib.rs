//! Core domain types and shared logic for the pantry basket catalog.
//!
//! This crate defines the canonical data model used across all other crates:
//! - Content hashes and the streaming integrity computer
//! - Basket manifest, supplement, and metadata schema
//! - Upload item model and basket address derivation
//! - Configuration types for storage and index backends

pub mod basket;
pub mod config;
pub mod error;
pub mod hash;
pub mod integrity;
pub mod manifest;
pub mod supplement;

pub use basket::{basket_address, UploadItem, MANIFEST_FILE, METADATA_FILE, SUPPLEMENT_FILE};
pub use config::{IndexConfig, StorageConfig};
pub use error::{Error, Result};
pub use hash::{ContentHash, ContentHasher};
pub use integrity::IntegrityComputer;
pub use manifest::Manifest;
pub use supplement::{Supplement, SupplementEntry};

/// Chunk size for streaming reads and hashing (64 KiB).
///
/// Bounds memory use regardless of file size; not semantically significant.
pub const READ_CHUNK_SIZE: usize = 64 * 1024;
