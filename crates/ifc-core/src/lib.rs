//! Core types for reconstructing and storing STEP/IFC instance graphs.
//!
//! This crate provides the foundational types used across the other ifc crates:
//! - Attribute values, including SELECT wrappers
//! - Entities with process-wide identities
//! - Raw instance records as produced by the physical file reader
//! - The type registry describing constructible schema types
//! - The insertion-ordered entity store (`Document`)
//! - Error types

pub mod document;
pub mod entity;
pub mod errors;
pub mod instance;
pub mod schema;
pub mod value;

pub use document::*;
pub use entity::*;
pub use errors::*;
pub use instance::*;
pub use schema::*;
pub use value::*;
