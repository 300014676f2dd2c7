//! Attribute values of constructed entities.

use crate::entity::EntityRef;
use crate::schema::TypeName;

/// A resolved attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Unset value (`$`).
    Null,
    /// Value derived from a supertype redeclaration (`*`).
    Derived,
    Integer(i64),
    Real(f64),
    String(String),
    Boolean(bool),
    /// Enumerant without the surrounding dots.
    Enum(String),
    /// Ordered aggregate (LIST, SET, BAG or ARRAY).
    List(Vec<Value>),
    /// Shared handle to another entity.
    Entity(EntityRef),
    /// Value wrapped into a SELECT type.
    Select(Box<SelectValue>),
}

impl Value {
    /// Returns true for `$`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Real value, widening integers.
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Value::Real(v) => Some(*v),
            Value::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&str> {
        match self {
            Value::Enum(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_entity(&self) -> Option<&EntityRef> {
        match self {
            Value::Entity(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_select(&self) -> Option<&SelectValue> {
        match self {
            Value::Select(s) => Some(s),
            _ => None,
        }
    }

    /// Strip every SELECT layer.
    pub fn unwrap_select(&self) -> &Value {
        match self {
            Value::Select(s) => s.innermost(),
            other => other,
        }
    }

    /// Text content, looking through SELECT layers and inline defined-type
    /// instances such as `IFCLABEL('x')`.
    pub fn text(&self) -> Option<&str> {
        match self.unwrap_select() {
            Value::String(s) => Some(s),
            Value::Entity(e) if e.entity_type().is_defined() => {
                e.attributes().first().and_then(Value::text)
            }
            _ => None,
        }
    }

    /// The schema type name this value carries at runtime, if any.
    ///
    /// Entities report their own type, wrapped values the outermost SELECT.
    /// Primitives are untyped.
    pub fn runtime_type(&self) -> Option<&str> {
        match self {
            Value::Entity(e) => Some(e.type_name()),
            Value::Select(s) => Some(s.select()),
            _ => None,
        }
    }

    /// Short description of the value's kind for diagnostics.
    pub fn kind_name(&self) -> String {
        match self {
            Value::Null => "$".to_string(),
            Value::Derived => "*".to_string(),
            Value::Integer(_) => "INTEGER".to_string(),
            Value::Real(_) => "REAL".to_string(),
            Value::String(_) => "STRING".to_string(),
            Value::Boolean(_) => "BOOLEAN".to_string(),
            Value::Enum(e) => format!(".{}.", e),
            Value::List(_) => "LIST".to_string(),
            Value::Entity(e) => e.type_name().to_string(),
            Value::Select(s) => s.select().to_string(),
        }
    }
}

impl From<EntityRef> for Value {
    fn from(entity: EntityRef) -> Self {
        Value::Entity(entity)
    }
}

impl From<SelectValue> for Value {
    fn from(select: SelectValue) -> Self {
        Value::Select(Box::new(select))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

/// One layer of SELECT wrapping.
///
/// Nested SELECT hierarchies produce chains: a value wrapped into
/// `IfcSimpleValue` and then into `IfcValue` is an `IfcValue` layer whose
/// member is an `IfcSimpleValue` layer.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectValue {
    select: TypeName,
    member: Value,
}

impl SelectValue {
    pub fn new(select: TypeName, member: Value) -> Self {
        Self { select, member }
    }

    /// Name of the SELECT type of this layer.
    pub fn select(&self) -> &str {
        &self.select
    }

    /// The value directly wrapped by this layer.
    pub fn member(&self) -> &Value {
        &self.member
    }

    pub fn into_member(self) -> Value {
        self.member
    }

    /// The concrete value beneath all layers.
    pub fn innermost(&self) -> &Value {
        let mut current = &self.member;
        while let Value::Select(inner) = current {
            current = &inner.member;
        }
        current
    }

    /// SELECT names from this layer inwards.
    pub fn layers(&self) -> Vec<&str> {
        let mut names = vec![self.select()];
        let mut current = &self.member;
        while let Value::Select(inner) = current {
            names.push(inner.select());
            current = &inner.member;
        }
        names
    }
}
