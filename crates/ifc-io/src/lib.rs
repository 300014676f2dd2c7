//! Load and save IFC documents in the STEP physical file format.
//!
//! # Example
//!
//! ```ignore
//! use ifc_io::{load, save};
//!
//! let registry = ifc_schema::ifc2x3()?;
//! let loaded = load(&text, &registry)?;
//! for issue in &loaded.issues {
//!     eprintln!("{}", issue);
//! }
//! let walls = loaded.document.all_of_kind("IfcWall").count();
//! let text = save(&loaded.document);
//! ```

use tracing::{debug, info, warn};

pub use ifc_core::{Document, IfcError, LoadError, LoadIssue, Registry};
pub use ifc_export::SerializeOptions;
pub use ifc_resolver::LoadOptions;

/// Result type for load operations.
pub type Result<T> = std::result::Result<T, IfcError>;

/// A constructed document plus the recoverable issues met while building it.
#[derive(Debug)]
pub struct Loaded {
    pub document: Document,
    pub issues: Vec<LoadIssue>,
}

/// Load `source` with default options.
pub fn load(source: &str, registry: &Registry) -> Result<Loaded> {
    load_with(source, registry, &LoadOptions::default())
}

/// Parse `source` and construct every record against `registry`.
pub fn load_with(source: &str, registry: &Registry, options: &LoadOptions) -> Result<Loaded> {
    let file = ifc_parser::parse(source)?;
    let mut records = file.records;
    debug!(records = records.len(), "parsed physical file");

    let mut document = Document::with_metadata(file.metadata);
    if !document.schema().eq_ignore_ascii_case(registry.schema()) {
        warn!(
            file = document.schema(),
            registry = registry.schema(),
            "schema mismatch, loading anyway"
        );
    }

    let issues = ifc_resolver::construct_all(registry, &mut records, &mut document, options)?;
    info!(
        entities = document.len(),
        issues = issues.len(),
        "loaded document"
    );
    Ok(Loaded { document, issues })
}

/// Serialize `document` with default options.
pub fn save(document: &Document) -> String {
    save_with(document, &SerializeOptions::default())
}

pub fn save_with(document: &Document, options: &SerializeOptions) -> String {
    ifc_export::to_step(document, options)
}
