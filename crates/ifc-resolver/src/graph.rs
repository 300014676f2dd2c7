//! Graph construction over the record arena.

use tracing::{debug, trace, warn};

use ifc_core::{
    Claim, ConstructionError, Document, Entity, EntityRef, InstanceData, LoadError, LoadIssue,
    ParamType, RawValue, RecordMap, RecursionKind, RefId, Registry, TypeKind, Value,
};

use crate::coerce::coerce;
use crate::LoadOptions;

/// Build every record of `records` into `document`, in file order.
///
/// Records already constructed as a dependency of an earlier one are
/// skipped. Returns the recoverable issues met along the way.
pub fn construct_all(
    registry: &Registry,
    records: &mut RecordMap,
    document: &mut Document,
    options: &LoadOptions,
) -> Result<Vec<LoadIssue>, LoadError> {
    let ids: Vec<u64> = records.keys().copied().collect();
    let mut builder = GraphBuilder::new(registry, records, document, options);
    for id in ids {
        builder.construct(id)?;
    }
    let issues = builder.into_issues();
    debug!(
        entities = document.len(),
        issues = issues.len(),
        "instance graph constructed"
    );
    Ok(issues)
}

/// Depth-first constructor with per-record memoization.
///
/// Each record is claimed once. Meeting a record that is still being built
/// means the references form a cycle, which is reported as structural
/// recursion rather than followed.
pub struct GraphBuilder<'a> {
    registry: &'a Registry,
    records: &'a mut RecordMap,
    document: &'a mut Document,
    options: &'a LoadOptions,
    issues: Vec<LoadIssue>,
    depth: usize,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(
        registry: &'a Registry,
        records: &'a mut RecordMap,
        document: &'a mut Document,
        options: &'a LoadOptions,
    ) -> Self {
        Self {
            registry,
            records,
            document,
            options,
            issues: Vec::new(),
            depth: 0,
        }
    }

    /// Construct the record with file id `id`, or return its memoized entity.
    ///
    /// Returns `None` if no such record exists.
    pub fn construct(&mut self, id: u64) -> Result<Option<EntityRef>, LoadError> {
        self.construct_record(id)
    }

    pub fn into_issues(self) -> Vec<LoadIssue> {
        self.issues
    }

    fn construct_record(&mut self, id: u64) -> Result<Option<EntityRef>, LoadError> {
        let Some(record) = self.records.get_mut(&id) else {
            return Ok(None);
        };
        let type_name = record.type_name.clone();
        let params = match record.claim() {
            Claim::Done(entity) => return Ok(Some(entity)),
            Claim::InProgress => {
                return Err(LoadError::StructuralRecursion {
                    id: id as i64,
                    type_name,
                    kind: RecursionKind::Cycle,
                })
            }
            Claim::Fresh(params) => params,
        };

        let entity = self.nested(id as i64, &type_name, |this| {
            this.build(id as i64, id as i64, &type_name, params)
        })?;
        let entity = entity.into_ref();

        if let Some(record) = self.records.get_mut(&id) {
            record.complete(EntityRef::clone(&entity));
        }
        self.document.add(EntityRef::clone(&entity));
        trace!(id, ty = entity.type_name(), entity = %entity.id(), "constructed record");
        Ok(Some(entity))
    }

    /// Build an anonymous record. The result is never registered.
    fn construct_inline(&mut self, owner: i64, data: InstanceData) -> Result<EntityRef, LoadError> {
        let id = data.id;
        let type_name = data.type_name;
        let params = data.params;
        let entity = self.nested(id, &type_name, |this| {
            this.build(id, owner, &type_name, params)
        })?;
        Ok(entity.into_ref())
    }

    fn nested<T>(
        &mut self,
        id: i64,
        type_name: &str,
        f: impl FnOnce(&mut Self) -> Result<T, LoadError>,
    ) -> Result<T, LoadError> {
        if self.depth >= self.options.max_depth {
            return Err(LoadError::StructuralRecursion {
                id,
                type_name: type_name.to_string(),
                kind: RecursionKind::DepthExceeded {
                    limit: self.options.max_depth,
                },
            });
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    /// Resolve and coerce parameters, then invoke the registry factory.
    ///
    /// `owner` is the nearest numbered record, used when reporting missing
    /// references from inside inline instances.
    fn build(
        &mut self,
        id: i64,
        owner: i64,
        type_name: &str,
        params: Vec<RawValue>,
    ) -> Result<Entity, LoadError> {
        let registry = self.registry;
        let construction = |source: ConstructionError| LoadError::Construction {
            id,
            type_name: type_name.to_string(),
            source,
        };

        let ctor = registry
            .constructor(type_name)
            .ok_or_else(|| {
                construction(ConstructionError::UnknownType {
                    type_name: type_name.to_string(),
                })
            })?;
        let attributes = ctor.entity_type().attributes();

        let mut args = Vec::with_capacity(params.len());
        for (index, raw) in params.into_iter().enumerate() {
            let declared = attributes.get(index).map(|a| a.ty());
            let value = self.resolve(owner, raw, declared)?;
            args.push(match declared {
                Some(ty) => coerce(registry, value, ty),
                None => value,
            });
        }

        ctor.invoke(registry, args).map_err(construction)
    }

    fn resolve(
        &mut self,
        owner: i64,
        raw: RawValue,
        declared: Option<&'a ParamType>,
    ) -> Result<Value, LoadError> {
        let value = match raw {
            RawValue::Null => Value::Null,
            RawValue::Derived => Value::Derived,
            RawValue::Integer(v) => Value::Integer(v),
            RawValue::Real(v) => Value::Real(v),
            RawValue::String(s) => Value::String(s),
            RawValue::Boolean(b) => Value::Boolean(b),
            RawValue::Enum(e) => Value::Enum(e),
            RawValue::Nested(data) => Value::Entity(self.construct_inline(owner, *data)?),
            RawValue::Ref(RefId(target)) => match self.construct_record(target)? {
                Some(entity) => Value::Entity(entity),
                None => return self.missing(owner, target),
            },
            RawValue::List(items) => {
                let element = declared.and_then(|ty| element_type(self.registry, ty));
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    let value = self.resolve(owner, item, element)?;
                    values.push(match element {
                        Some(ty) => coerce(self.registry, value, ty),
                        None => value,
                    });
                }
                Value::List(values)
            }
        };
        Ok(value)
    }

    fn missing(&mut self, referrer: i64, target: u64) -> Result<Value, LoadError> {
        let issue = LoadIssue::MissingReference { referrer, target };
        if self.options.strict_references {
            return Err(issue.into_error());
        }
        warn!(referrer, target, "reference to missing instance, using $");
        self.issues.push(issue);
        Ok(Value::Null)
    }
}

/// Element type of an aggregate, looking through defined types such as
/// `IfcCompoundPlaneAngleMeasure = LIST OF INTEGER`.
fn element_type<'r>(registry: &'r Registry, declared: &'r ParamType) -> Option<&'r ParamType> {
    match declared {
        ParamType::List(inner) => Some(inner),
        ParamType::Named(name) if registry.kind_of(name) == Some(TypeKind::Defined) => registry
            .entity_type(name)
            .and_then(|ty| ty.attributes().first())
            .and_then(|wrapped| element_type(registry, wrapped.ty())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn registry() -> Registry {
        Registry::builder("TEST")
            .defined("IfcLabel", ParamType::String)
            .defined("IfcInteger", ParamType::Integer)
            .select("IfcSimpleValue", &["IfcLabel", "IfcInteger"])
            .entity(
                "Node",
                None,
                &[
                    ("Name", ParamType::named("IfcLabel")),
                    ("Target", ParamType::named("Node")),
                ],
            )
            .entity(
                "Group",
                None,
                &[("Members", ParamType::list_of(ParamType::named("Node")))],
            )
            .entity(
                "Prop",
                None,
                &[("Value", ParamType::named("IfcSimpleValue"))],
            )
            .build()
            .unwrap()
    }

    fn s(text: &str) -> RawValue {
        RawValue::String(text.to_string())
    }

    fn r(id: u64) -> RawValue {
        RawValue::Ref(RefId(id))
    }

    fn records(list: Vec<(u64, &str, Vec<RawValue>)>) -> RecordMap {
        list.into_iter()
            .map(|(id, ty, params)| (id, InstanceData::new(id, ty, params)))
            .collect()
    }

    fn load(
        registry: &Registry,
        mut arena: RecordMap,
        options: &LoadOptions,
    ) -> Result<(Document, Vec<LoadIssue>, RecordMap), LoadError> {
        let mut document = Document::new("TEST");
        let issues = construct_all(registry, &mut arena, &mut document, options)?;
        Ok((document, issues, arena))
    }

    fn name(entity: &EntityRef) -> &str {
        entity.attribute("Name").and_then(Value::text).unwrap()
    }

    #[test]
    fn test_forward_reference() {
        let registry = registry();
        let arena = records(vec![
            (1, "NODE", vec![s("a"), r(2)]),
            (2, "NODE", vec![s("b"), RawValue::Null]),
        ]);
        let (doc, issues, arena) = load(&registry, arena, &LoadOptions::default()).unwrap();

        assert!(issues.is_empty());
        assert_eq!(doc.len(), 2);
        let first = arena[&1].constructed().unwrap();
        let second = arena[&2].constructed().unwrap();
        assert_eq!(first.attribute("Target").and_then(Value::as_entity), Some(second));
        assert_eq!(name(second), "b");
        // Dependencies are registered before their referrers.
        let order: Vec<_> = doc.iter().map(name).collect();
        assert_eq!(order, vec!["b", "a"]);
    }

    #[test]
    fn test_shared_references_are_built_once() {
        let registry = registry();
        let arena = records(vec![
            (1, "NODE", vec![s("a"), RawValue::Null]),
            (2, "GROUP", vec![RawValue::List(vec![r(1), r(1)])]),
            (3, "GROUP", vec![RawValue::List(vec![r(1)])]),
        ]);
        let (doc, _, arena) = load(&registry, arena, &LoadOptions::default()).unwrap();

        assert_eq!(doc.len(), 3);
        let node = arena[&1].constructed().unwrap();
        for id in [2, 3] {
            let group = arena[&id].constructed().unwrap();
            let members = group.attribute("Members").and_then(Value::as_list).unwrap();
            for member in members {
                assert!(Arc::ptr_eq(member.as_entity().unwrap(), node));
            }
        }
    }

    #[test]
    fn test_order_independence() {
        let registry = registry();
        let forward = vec![
            (1, "GROUP", vec![RawValue::List(vec![r(2), r(3)])]),
            (2, "NODE", vec![s("x"), RawValue::Null]),
            (3, "NODE", vec![s("y"), r(2)]),
        ];
        let mut backward = forward.clone();
        backward.reverse();

        for list in [forward, backward] {
            let (doc, issues, arena) =
                load(&registry, records(list), &LoadOptions::default()).unwrap();
            assert!(issues.is_empty());
            assert_eq!(doc.len(), 3);

            let group = arena[&1].constructed().unwrap();
            let members: Vec<_> = group
                .attribute("Members")
                .and_then(Value::as_list)
                .unwrap()
                .iter()
                .map(|m| name(m.as_entity().unwrap()))
                .collect();
            assert_eq!(members, vec!["x", "y"]);

            let y = arena[&3].constructed().unwrap();
            let x = arena[&2].constructed().unwrap();
            assert_eq!(y.attribute("Target").and_then(Value::as_entity), Some(x));
        }
    }

    #[test]
    fn test_missing_reference_in_list() {
        let registry = registry();
        let arena = records(vec![
            (1, "GROUP", vec![RawValue::List(vec![r(2), r(99)])]),
            (2, "NODE", vec![s("a"), RawValue::Null]),
        ]);
        let (doc, issues, arena) = load(&registry, arena, &LoadOptions::default()).unwrap();

        assert_eq!(
            issues,
            vec![LoadIssue::MissingReference {
                referrer: 1,
                target: 99
            }]
        );
        assert_eq!(doc.len(), 2);
        let members = arena[&1]
            .constructed()
            .unwrap()
            .attribute("Members")
            .and_then(Value::as_list)
            .unwrap()
            .to_vec();
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].as_entity(), arena[&2].constructed());
        assert_eq!(members[1], Value::Null);
    }

    #[test]
    fn test_construct_single_record() {
        let registry = registry();
        let mut arena = records(vec![
            (1, "NODE", vec![s("a"), r(9)]),
            (2, "NODE", vec![s("b"), RawValue::Null]),
        ]);
        let mut document = Document::new("TEST");
        let options = LoadOptions::default();
        let mut builder = GraphBuilder::new(&registry, &mut arena, &mut document, &options);

        assert!(builder.construct(42).unwrap().is_none());
        let first = builder.construct(1).unwrap().unwrap();
        assert_eq!(first.attribute("Target"), Some(&Value::Null));
        let again = builder.construct(1).unwrap().unwrap();
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(
            builder.into_issues(),
            vec![LoadIssue::MissingReference {
                referrer: 1,
                target: 9
            }]
        );

        assert_eq!(document.len(), 1);
        assert!(arena[&2].constructed().is_none());
    }

    #[test]
    fn test_strict_references() {
        let registry = registry();
        let arena = records(vec![(1, "NODE", vec![s("a"), r(7)])]);
        let err = load(&registry, arena, &LoadOptions::new().strict_references(true)).unwrap_err();
        assert!(matches!(
            err,
            LoadError::MissingReference {
                referrer: 1,
                target: 7
            }
        ));
    }

    #[test]
    fn test_cycle_is_structural_recursion() {
        let registry = registry();
        let arena = records(vec![
            (1, "NODE", vec![s("a"), r(2)]),
            (2, "NODE", vec![s("b"), r(1)]),
        ]);
        let err = load(&registry, arena, &LoadOptions::default()).unwrap_err();
        match err {
            LoadError::StructuralRecursion {
                id,
                type_name,
                kind,
            } => {
                assert_eq!(id, 1);
                assert_eq!(type_name, "NODE");
                assert_eq!(kind, RecursionKind::Cycle);
            }
            other => panic!("expected structural recursion, got {:?}", other),
        }
    }

    #[test]
    fn test_self_reference_is_a_cycle() {
        let registry = registry();
        let arena = records(vec![(5, "NODE", vec![s("a"), r(5)])]);
        assert!(matches!(
            load(&registry, arena, &LoadOptions::default()),
            Err(LoadError::StructuralRecursion {
                id: 5,
                kind: RecursionKind::Cycle,
                ..
            })
        ));
    }

    #[test]
    fn test_depth_limit() {
        let registry = registry();
        let arena = records(
            (1..=5)
                .map(|id| {
                    let next = if id < 5 { r(id + 1) } else { RawValue::Null };
                    (id, "NODE", vec![s("n"), next])
                })
                .collect(),
        );
        assert!(load(&registry, arena.clone(), &LoadOptions::default()).is_ok());
        assert!(matches!(
            load(&registry, arena, &LoadOptions::new().max_depth(3)),
            Err(LoadError::StructuralRecursion {
                id: 4,
                kind: RecursionKind::DepthExceeded { limit: 3 },
                ..
            })
        ));
    }

    #[test]
    fn test_inline_values_are_wrapped_and_unregistered() {
        let registry = registry();
        let label = InstanceData::inline("IFCLABEL", vec![s("x")]);
        let arena = records(vec![(1, "PROP", vec![RawValue::Nested(Box::new(label))])]);
        let (doc, _, arena) = load(&registry, arena, &LoadOptions::default()).unwrap();

        assert_eq!(doc.len(), 1);
        let value = arena[&1].constructed().unwrap().attribute("Value").unwrap().clone();
        let select = value.as_select().unwrap();
        assert_eq!(select.layers(), vec!["IfcSimpleValue"]);
        let inline = select.innermost().as_entity().unwrap();
        assert_eq!(inline.type_name(), "IfcLabel");
        assert!(!doc.contains(inline.id()));
        assert_eq!(value.text(), Some("x"));
    }

    #[test]
    fn test_uncoercible_select_value_fails() {
        let registry = registry();
        let arena = records(vec![
            (1, "PROP", vec![r(2)]),
            (2, "NODE", vec![s("a"), RawValue::Null]),
        ]);
        match load(&registry, arena, &LoadOptions::default()).unwrap_err() {
            LoadError::Construction { id, source, .. } => {
                assert_eq!(id, 1);
                assert!(matches!(source, ConstructionError::IncompatibleValue { .. }));
            }
            other => panic!("expected construction error, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_type_and_arity() {
        let registry = registry();
        let unknown = records(vec![(1, "IFCWALL", vec![])]);
        assert!(matches!(
            load(&registry, unknown, &LoadOptions::default()),
            Err(LoadError::Construction {
                source: ConstructionError::UnknownType { .. },
                ..
            })
        ));

        let short = records(vec![(1, "NODE", vec![s("a")])]);
        assert!(matches!(
            load(&registry, short, &LoadOptions::default()),
            Err(LoadError::Construction {
                source: ConstructionError::ArityMismatch {
                    expected: 2,
                    found: 1,
                    ..
                },
                ..
            })
        ));
    }

    #[test]
    fn test_every_slot_is_done_after_load() {
        let registry = registry();
        let arena = records(vec![
            (1, "NODE", vec![s("a"), r(2)]),
            (2, "NODE", vec![s("b"), RawValue::Null]),
            (3, "GROUP", vec![RawValue::List(vec![])]),
        ]);
        let (doc, _, arena) = load(&registry, arena, &LoadOptions::default()).unwrap();

        for record in arena.values() {
            let entity = record.constructed().unwrap();
            assert!(doc.contains(entity.id()));
        }
        let members = arena[&3].constructed().unwrap().attribute("Members").cloned();
        assert_eq!(members, Some(Value::List(vec![])));
    }
}
