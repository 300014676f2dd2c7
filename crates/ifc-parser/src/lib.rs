//! Reader for ISO 10303-21 physical files.
//!
//! Turns file text into raw [`InstanceData`](ifc_core::InstanceData) records
//! keyed by file id, plus the header metadata. Records are not resolved here;
//! references stay as [`RefId`](ifc_core::RefId)s until graph construction.
//! Built on `nom`.

mod p21;

pub use p21::parse_step;

use ifc_core::{FileMetadata, ParseError, RecordMap};

/// Parsed contents of a physical file.
#[derive(Debug, Clone, Default)]
pub struct StepFile {
    pub metadata: FileMetadata,
    /// Records in file order.
    pub records: RecordMap,
}

/// Parse a STEP physical file.
///
/// # Example
///
/// ```ignore
/// use ifc_parser::parse;
///
/// let file = parse(source)?;
/// println!("{} records", file.records.len());
/// ```
pub fn parse(source: &str) -> Result<StepFile, ParseError> {
    parse_step(source)
}
