//! Constructed entities and their identities.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::schema::EntityType;
use crate::value::Value;

static NEXT_ENTITY_ID: AtomicU64 = AtomicU64::new(1);

/// Process-wide unique identity of a constructed entity.
///
/// Allocated when the entity is built and never reused. It is unrelated to
/// the `#id` the entity had in a file and to the serial id it gets when
/// written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityId(u64);

impl EntityId {
    fn next() -> Self {
        Self(NEXT_ENTITY_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// Shared, non-owning handle used for references between entities.
pub type EntityRef = Arc<Entity>;

/// An instance of an entity or defined type from the registry.
#[derive(Debug)]
pub struct Entity {
    id: EntityId,
    ty: Arc<EntityType>,
    attributes: Vec<Value>,
}

impl Entity {
    /// Create an entity with a fresh identity. No validation is performed;
    /// registry factories are responsible for that.
    pub fn new(ty: Arc<EntityType>, attributes: Vec<Value>) -> Self {
        Self {
            id: EntityId::next(),
            ty,
            attributes,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn entity_type(&self) -> &Arc<EntityType> {
        &self.ty
    }

    pub fn type_name(&self) -> &str {
        self.ty.name()
    }

    /// Whether this entity's type is `name` or one of its subtypes.
    pub fn is_a(&self, name: &str) -> bool {
        self.ty.is_a(name)
    }

    /// All attribute values in declaration order, inherited ones first.
    pub fn attributes(&self) -> &[Value] {
        &self.attributes
    }

    /// Look up an attribute by its schema name (case-insensitive).
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.ty
            .attribute_index(name)
            .and_then(|index| self.attributes.get(index))
    }

    pub fn into_ref(self) -> EntityRef {
        Arc::new(self)
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Entity {}
