//! # modsrecon common library
//!
//! Shared code for the MODS reconciliation tools:
//! - Canonical field model and compound value encodings
//! - Value normalization and fuzzy equality
//! - Report column mapping
//! - Identifier registry loading
//! - Configuration loading

pub mod compound;
pub mod config;
pub mod error;
pub mod mapping;
pub mod model;
pub mod normalize;
pub mod registry;

pub use error::{Error, Result};
pub use mapping::FieldMapping;
pub use model::{Field, MetadataRecord};
pub use normalize::{fuzzy_eq, normalize};
pub use registry::IdentifierRegistry;
