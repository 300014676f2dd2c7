//! SELECT coercion.

use ifc_core::{ParamType, Registry, SelectValue, TypeKind, Value};

/// Shape `value` for a slot declared as `declared`.
///
/// Only SELECT targets (and lists of them) change anything: the value is
/// wrapped along the registry's chain from its runtime type, innermost
/// layer first. Values with no chain are returned untouched and left for
/// the factory to reject.
pub fn coerce(registry: &Registry, value: Value, declared: &ParamType) -> Value {
    match declared {
        ParamType::List(inner) => match value {
            Value::List(items) => Value::List(
                items
                    .into_iter()
                    .map(|item| coerce(registry, item, inner))
                    .collect(),
            ),
            other => other,
        },
        ParamType::Named(target) if registry.kind_of(target) == Some(TypeKind::Select) => {
            wrap_into(registry, value, target)
        }
        _ => value,
    }
}

fn wrap_into(registry: &Registry, value: Value, target: &str) -> Value {
    let Some(source) = value.runtime_type() else {
        return value;
    };
    if source.eq_ignore_ascii_case(target) {
        return value;
    }
    let Some(chain) = registry.select_chain(source, target) else {
        return value;
    };
    chain.iter().fold(value, |member, select| {
        SelectValue::new(select.clone(), member).into()
    })
}
