//! Error types for the ifc crates.

use thiserror::Error;

/// Top-level error type.
#[derive(Debug, Error)]
pub enum IfcError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Load(#[from] LoadError),
}

/// Errors while building a type registry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Type {name} is declared more than once")]
    DuplicateType { name: String },

    #[error("Entity {entity} has unknown supertype {supertype}")]
    UnknownSupertype { entity: String, supertype: String },

    #[error("Inheritance cycle through {entity}")]
    InheritanceCycle { entity: String },

    #[error("Type {referenced_by} references unknown type {name}")]
    UnknownType { referenced_by: String, name: String },

    #[error("Factory registered for unknown type {name}")]
    UnknownFactoryTarget { name: String },
}

/// Errors reading the physical file text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Syntax error at line {line}, column {column}: {message}")]
    Syntax {
        message: String,
        line: u32,
        column: u32,
    },

    #[error("Missing {section} section")]
    MissingSection { section: &'static str },

    #[error("Instance #{id} is defined more than once")]
    DuplicateId { id: u64 },

    #[error("Complex entity instance #{id} is not supported")]
    ComplexInstance { id: u64 },
}

/// Errors raised by a registry factory for a single instance.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConstructionError {
    #[error("No constructor registered for type {type_name}")]
    UnknownType { type_name: String },

    #[error("Type {type_name} is abstract")]
    AbstractType { type_name: String },

    #[error("{type_name} expects {expected} parameters, found {found}")]
    ArityMismatch {
        type_name: String,
        expected: usize,
        found: usize,
    },

    #[error("{type_name}.{attribute}: expected {expected}, found {found}")]
    IncompatibleValue {
        type_name: String,
        attribute: String,
        expected: String,
        found: String,
    },

    #[error("{type_name}: {reason}")]
    Factory { type_name: String, reason: String },
}

/// Why graph construction refused to recurse further.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RecursionKind {
    #[error("reference cycle")]
    Cycle,

    #[error("nesting deeper than {limit}")]
    DepthExceeded { limit: usize },
}

/// Errors that abort loading a whole file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Cannot construct #{id} ({type_name}): {source}")]
    Construction {
        id: i64,
        type_name: String,
        #[source]
        source: ConstructionError,
    },

    #[error("Structural recursion at #{id} ({type_name}): {kind}")]
    StructuralRecursion {
        id: i64,
        type_name: String,
        kind: RecursionKind,
    },

    #[error("#{referrer} references missing instance #{target}")]
    MissingReference { referrer: i64, target: u64 },
}

/// Recoverable anomalies collected while loading.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoadIssue {
    #[error("#{referrer} references missing instance #{target}")]
    MissingReference { referrer: i64, target: u64 },
}

impl LoadIssue {
    /// Promote a soft issue to a load-aborting error.
    pub fn into_error(self) -> LoadError {
        match self {
            LoadIssue::MissingReference { referrer, target } => {
                LoadError::MissingReference { referrer, target }
            }
        }
    }
}
