//! End-to-end load/save tests against the IFC2X3 subset.

use chrono::{TimeZone, Utc};
use ifc_core::{EntityRef, RecursionKind, Value};
use ifc_io::{load, load_with, save, save_with, IfcError, LoadError, LoadIssue, LoadOptions, SerializeOptions};
use proptest::prelude::*;

const MINIMAL: &str = include_str!("fixtures/minimal.ifc");

fn registry() -> ifc_core::Registry {
    ifc_schema::ifc2x3().unwrap()
}

fn options() -> SerializeOptions {
    SerializeOptions::new()
        .author("Ann Architect")
        .application("ifc-io", "test")
        .timestamp(Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap())
}

fn linked<'e>(entity: &'e EntityRef, attribute: &str) -> &'e EntityRef {
    entity
        .attribute(attribute)
        .and_then(|v| v.unwrap_select().as_entity())
        .unwrap_or_else(|| panic!("{}.{} is not an entity", entity.type_name(), attribute))
}

fn reals(value: &Value) -> Vec<f64> {
    value
        .as_list()
        .unwrap()
        .iter()
        .map(|v| v.as_real().unwrap())
        .collect()
}

/// Same file with the data records in reverse order.
fn reversed(source: &str) -> String {
    let records: Vec<&str> = source.lines().filter(|l| l.starts_with('#')).collect();
    let mut out = String::new();
    for line in source.lines() {
        if line == "DATA;" {
            out.push_str("DATA;\n");
            for record in records.iter().rev() {
                out.push_str(record);
                out.push('\n');
            }
        } else if !line.starts_with('#') {
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}

#[test]
fn test_load_fixture() {
    let registry = registry();
    let loaded = load(MINIMAL, &registry).unwrap();
    let doc = &loaded.document;

    assert!(loaded.issues.is_empty());
    assert_eq!(doc.len(), 25);
    assert_eq!(doc.schema(), "IFC2X3");
    assert_eq!(doc.metadata().file_name, "minimal.ifc");
    assert_eq!(doc.metadata().timestamp, "2024-05-06T07:08:09");
    assert_eq!(doc.all_of_kind("IfcProduct").count(), 2);
    assert_eq!(doc.all_of_type("IfcWall").count(), 0);
    assert_eq!(doc.all_of_kind("IfcWall").count(), 1);
    assert_eq!(doc.all_of_type("IFCLOCALPLACEMENT").count(), 2);

    let wall = doc.all_of_kind("IfcWall").next().unwrap();
    assert_eq!(wall.attribute("Name").and_then(Value::text), Some("Wall 'A'"));
}

#[test]
fn test_shared_references_keep_identity() {
    let registry = registry();
    let loaded = load(MINIMAL, &registry).unwrap();
    let doc = &loaded.document;

    let context = doc
        .all_of_type("IfcGeometricRepresentationContext")
        .next()
        .unwrap();
    let storey = doc.all_of_type("IfcBuildingStorey").next().unwrap();
    let world = linked(context, "WorldCoordinateSystem");
    let storey_origin = linked(linked(storey, "ObjectPlacement"), "RelativePlacement");
    assert_eq!(world.id(), storey_origin.id());

    let wall = doc.all_of_kind("IfcWall").next().unwrap();
    let wall_placement = linked(wall, "ObjectPlacement");
    let parent = linked(wall_placement, "PlacementRelTo");
    assert_eq!(parent.id(), linked(storey, "ObjectPlacement").id());

    let history = linked(wall, "OwnerHistory");
    for product in doc.all_of_kind("IfcRoot") {
        assert_eq!(linked(product, "OwnerHistory").id(), history.id());
    }
}

#[test]
fn test_select_values_are_wrapped() {
    let registry = registry();
    let loaded = load(MINIMAL, &registry).unwrap();
    let doc = &loaded.document;

    let property = |name: &str| {
        doc.all_of_type("IfcPropertySingleValue")
            .find(|p| p.attribute("Name").and_then(Value::text) == Some(name))
            .unwrap()
            .attribute("NominalValue")
            .unwrap()
            .clone()
    };

    let width = property("Width");
    let select = width.as_select().unwrap();
    assert_eq!(select.layers(), vec!["IfcValue", "IfcMeasureValue"]);
    let measure = select.innermost().as_entity().unwrap();
    assert_eq!(measure.type_name(), "IfcPositiveLengthMeasure");
    assert_eq!(measure.attributes(), &[Value::Real(200.0)]);
    assert!(!doc.contains(measure.id()));

    let external = property("IsExternal");
    assert_eq!(
        external.as_select().unwrap().layers(),
        vec!["IfcValue", "IfcSimpleValue"]
    );
    assert_eq!(property("Reference").text(), Some("W-01 é"));

    let units = doc.all_of_type("IfcUnitAssignment").next().unwrap();
    for unit in units.attribute("Units").and_then(Value::as_list).unwrap() {
        assert_eq!(unit.as_select().unwrap().select(), "IfcUnit");
        assert!(unit.unwrap_select().as_entity().unwrap().is_a("IfcNamedUnit"));
    }
}

#[test]
fn test_save_is_a_fixpoint() {
    let registry = registry();
    let first = load(MINIMAL, &registry).unwrap();
    let text = save_with(&first.document, &options());

    assert!(text.starts_with("ISO-10303-21;\nHEADER;\n"));
    assert!(text.contains(
        "FILE_NAME('minimal.ifc','2024-05-06T07:08:09',('Ann Architect'),('Acme Design'),'ifc-io test','ifc-io test','');"
    ));
    assert!(text.contains("FILE_SCHEMA(('IFC2X3'));"));
    assert!(text.contains("'Wall ''A'''"));
    assert!(text.contains("IFCLABEL('W-01 \\X2\\00E9\\X0\\')"));
    assert!(text.contains("IFCPOSITIVELENGTHMEASURE(200.)"));
    assert!(text.contains("IFCSIUNIT(*,.LENGTHUNIT.,.MILLI.,.METRE.)"));
    assert!(text.ends_with("ENDSEC;\nEND-ISO-10303-21;\n"));

    let second = load(&text, &registry).unwrap();
    assert!(second.issues.is_empty());
    assert_eq!(second.document.len(), first.document.len());

    let types = |loaded: &ifc_io::Loaded| -> Vec<String> {
        loaded
            .document
            .iter()
            .map(|e| e.type_name().to_string())
            .collect()
    };
    assert_eq!(types(&first), types(&second));
    assert_eq!(save_with(&second.document, &options()), text);
}

#[test]
fn test_default_save_writes_current_header() {
    let registry = registry();
    let loaded = load(MINIMAL, &registry).unwrap();
    let text = save(&loaded.document);
    assert!(text.contains(&format!(
        "'{} {}'",
        SerializeOptions::default().application_name,
        SerializeOptions::default().application_version
    )));
    assert_eq!(text.matches("= IFC").count(), 25);
}

#[test]
fn test_astral_characters_survive_a_round_trip() {
    let registry = registry();
    let source = MINIMAL.replace("'W-01 \\X2\\00E9\\X0\\'", "'W-01 \\X2\\00E9\\X0\\\\X4\\0001F600\\X0\\'");
    let first = load(&source, &registry).unwrap();
    let text = save_with(&first.document, &options());
    assert!(text.contains("IFCLABEL('W-01 \\X2\\00E9\\X0\\\\X4\\0001F600\\X0\\')"));

    let second = load(&text, &registry).unwrap();
    let reference = second
        .document
        .all_of_type("IfcPropertySingleValue")
        .find(|p| p.attribute("Name").and_then(Value::text) == Some("Reference"))
        .and_then(|p| p.attribute("NominalValue"))
        .and_then(Value::text)
        .map(str::to_string);
    assert_eq!(reference.as_deref(), Some("W-01 \u{e9}\u{1F600}"));
}

#[test]
fn test_oversized_id_is_a_parse_error() {
    let registry = registry();
    let source = MINIMAL.replacen("#1=", "#18446744073709551615=", 1);
    assert!(matches!(load(&source, &registry), Err(IfcError::Parse(_))));
}

#[test]
fn test_record_order_does_not_matter() {
    let registry = registry();
    let forward = load(MINIMAL, &registry).unwrap();
    let backward = load(&reversed(MINIMAL), &registry).unwrap();

    let sorted_types = |doc: &ifc_io::Document| {
        let mut types: Vec<_> = doc.iter().map(|e| e.type_name().to_string()).collect();
        types.sort();
        types
    };
    assert_eq!(
        sorted_types(&forward.document),
        sorted_types(&backward.document)
    );

    for loaded in [&forward, &backward] {
        let wall = loaded.document.all_of_kind("IfcWall").next().unwrap();
        let origin = linked(
            linked(linked(wall, "ObjectPlacement"), "RelativePlacement"),
            "Location",
        );
        assert_eq!(
            reals(origin.attribute("Coordinates").unwrap()),
            vec![1000.0, 250.5, 0.0]
        );
    }
}

#[test]
fn test_missing_reference_is_recovered() {
    let registry = registry();
    let source = MINIMAL.replace("(#70,#71,#72)", "(#70,#71,#99)");
    let loaded = load(&source, &registry).unwrap();

    assert_eq!(
        loaded.issues,
        vec![LoadIssue::MissingReference {
            referrer: 73,
            target: 99
        }]
    );
    assert_eq!(loaded.document.len(), 25);
    let pset = loaded.document.all_of_type("IfcPropertySet").next().unwrap();
    let properties = pset.attribute("HasProperties").and_then(Value::as_list).unwrap();
    assert_eq!(properties.len(), 3);
    assert!(properties[0].as_entity().is_some());
    assert_eq!(properties[2], Value::Null);
}

#[test]
fn test_strict_mode_rejects_missing_reference() {
    let registry = registry();
    let source = MINIMAL.replace("(#70,#71,#72)", "(#70,#71,#99)");
    let result = load_with(&source, &registry, &LoadOptions::new().strict_references(true));
    assert!(matches!(
        result,
        Err(IfcError::Load(LoadError::MissingReference {
            referrer: 73,
            target: 99
        }))
    ));
}

#[test]
fn test_placement_cycle_is_reported() {
    let registry = registry();
    let source = MINIMAL
        .replace("#41= IFCLOCALPLACEMENT($,#21);", "#41= IFCLOCALPLACEMENT(#51,#21);");
    match load(&source, &registry) {
        Err(IfcError::Load(LoadError::StructuralRecursion { kind, .. })) => {
            assert_eq!(kind, RecursionKind::Cycle);
        }
        other => panic!("expected a cycle, got {:?}", other.map(|l| l.document.len())),
    }
}

#[test]
fn test_malformed_text_is_a_parse_error() {
    let registry = registry();
    assert!(matches!(load("not a step file", &registry), Err(IfcError::Parse(_))));

    let truncated = &MINIMAL[..MINIMAL.find("ENDSEC;\nEND-ISO").unwrap()];
    assert!(matches!(load(truncated, &registry), Err(IfcError::Parse(_))));
}

#[test]
fn test_unknown_type_aborts_load() {
    let registry = registry();
    let source = MINIMAL.replace("IFCBOOLEAN(.T.)", "IFCFLAG(.T.)");
    assert!(matches!(
        load(&source, &registry),
        Err(IfcError::Load(LoadError::Construction { .. }))
    ));
}

proptest! {
    #[test]
    fn coordinates_survive_a_round_trip(
        coords in prop::collection::vec(any::<f64>().prop_filter("finite", |v| v.is_finite()), 1..4)
    ) {
        let registry = registry();
        let mut doc = ifc_io::Document::new("IFC2X3");
        let values = coords.iter().copied().map(Value::Real).collect();
        let point = registry
            .construct("IfcCartesianPoint", vec![Value::List(values)])
            .unwrap()
            .into_ref();
        doc.add(point);

        let loaded = load(&save_with(&doc, &options()), &registry).unwrap();
        let point = loaded.document.iter().next().unwrap();
        let read: Vec<u64> = reals(point.attribute("Coordinates").unwrap())
            .into_iter()
            .map(f64::to_bits)
            .collect();
        let expected: Vec<u64> = coords.iter().map(|v| v.to_bits()).collect();
        prop_assert_eq!(read, expected);
    }
}
