//! Basket lifecycle management and orchestration for the pantry catalog.
//!
//! This crate provides:
//! - `BasketWriter`: the staging-then-atomic-promote commit protocol
//! - `BasketReader`: validated read-only basket views
//! - `PantryValidator`: whole-tree validation with aggregated warnings
//! - `Pantry`: the orchestrator composing writer, reader, index, and
//!   lineage behind upload/get/delete/validate operations

pub mod error;
pub mod pantry;
pub mod reader;
pub mod validate;
pub mod writer;

pub use error::{PantryError, PantryResult};
pub use pantry::{Pantry, UploadReceipt};
pub use reader::{Basket, BasketReader};
pub use validate::{IntegrityMode, PantryValidator, Warning};
pub use writer::{BasketWriter, CommittedBasket, UploadRequest};
