//! Type registries for IFC schemas.
//!
//! Only a core subset of IFC2X3 is declared: project and ownership data,
//! spatial structure and walls, placement geometry, SI units, single-value
//! properties and the relationships tying them together. The value SELECT
//! hierarchy (`IfcValue` over `IfcMeasureValue` and `IfcSimpleValue`) is
//! complete enough to exercise nested SELECT wrapping.

mod ifc2x3;

pub use ifc2x3::{ifc2x3, IFC2X3};
