//! Raw instance records as read from a physical file.

use indexmap::IndexMap;

use crate::entity::EntityRef;

/// File id of an anonymous instance embedded as a parameter.
pub const INLINE_ID: i64 = -1;

/// Records keyed by file id, in file order.
pub type RecordMap = IndexMap<u64, InstanceData>;

/// Forward reference to another record (`#42`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RefId(pub u64);

/// A parameter exactly as it appeared in the file.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Derived,
    Integer(i64),
    Real(f64),
    String(String),
    Boolean(bool),
    Enum(String),
    Ref(RefId),
    /// Typed parameter such as `IFCLABEL('x')`.
    Nested(Box<InstanceData>),
    List(Vec<RawValue>),
}

/// Construction state of a record.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Slot {
    #[default]
    Unvisited,
    InProgress,
    Done(EntityRef),
}

/// Result of trying to claim a record for construction.
#[derive(Debug)]
pub enum Claim {
    /// The caller now owns construction; these are the raw parameters.
    Fresh(Vec<RawValue>),
    /// Someone up the call chain is still building this record.
    InProgress,
    Done(EntityRef),
}

/// One `#id = TYPE(params);` record.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceData {
    /// File id, or [`INLINE_ID`].
    pub id: i64,
    pub type_name: String,
    pub params: Vec<RawValue>,
    slot: Slot,
}

impl InstanceData {
    /// A numbered record. `id` must not exceed `i64::MAX`; the reader
    /// rejects larger ids.
    pub fn new(id: u64, type_name: impl Into<String>, params: Vec<RawValue>) -> Self {
        debug_assert!(i64::try_from(id).is_ok(), "file id #{} out of range", id);
        Self {
            id: id as i64,
            type_name: type_name.into(),
            params,
            slot: Slot::Unvisited,
        }
    }

    /// An anonymous record embedded in another record's parameters.
    pub fn inline(type_name: impl Into<String>, params: Vec<RawValue>) -> Self {
        Self {
            id: INLINE_ID,
            type_name: type_name.into(),
            params,
            slot: Slot::Unvisited,
        }
    }

    pub fn is_inline(&self) -> bool {
        self.id == INLINE_ID
    }

    pub fn slot(&self) -> &Slot {
        &self.slot
    }

    /// The memoized entity, once built.
    pub fn constructed(&self) -> Option<&EntityRef> {
        match &self.slot {
            Slot::Done(entity) => Some(entity),
            _ => None,
        }
    }

    /// Move an unvisited record to in-progress and hand out its parameters.
    ///
    /// Each record is claimed at most once; later claims observe the
    /// in-progress or finished state instead.
    pub fn claim(&mut self) -> Claim {
        match &self.slot {
            Slot::Done(entity) => Claim::Done(EntityRef::clone(entity)),
            Slot::InProgress => Claim::InProgress,
            Slot::Unvisited => {
                self.slot = Slot::InProgress;
                Claim::Fresh(std::mem::take(&mut self.params))
            }
        }
    }

    /// Memoize the built entity. Only valid after a fresh claim.
    pub fn complete(&mut self, entity: EntityRef) {
        debug_assert!(matches!(self.slot, Slot::InProgress));
        self.slot = Slot::Done(entity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Entity;
    use crate::schema::Registry;

    #[test]
    fn test_claim_is_tri_state() {
        let registry = Registry::builder("T").entity("Foo", None, &[]).build().unwrap();
        let mut record = InstanceData::new(7, "FOO", vec![RawValue::Integer(1)]);
        assert_eq!(record.slot(), &Slot::Unvisited);

        match record.claim() {
            Claim::Fresh(params) => assert_eq!(params, vec![RawValue::Integer(1)]),
            other => panic!("expected fresh claim, got {:?}", other),
        }
        assert!(matches!(record.claim(), Claim::InProgress));

        let entity = Entity::new(registry.entity_type("Foo").unwrap().clone(), vec![]).into_ref();
        record.complete(entity.clone());
        match record.claim() {
            Claim::Done(done) => assert_eq!(done.id(), entity.id()),
            other => panic!("expected done, got {:?}", other),
        }
        assert_eq!(record.constructed().map(|e| e.id()), Some(entity.id()));
    }

    #[test]
    fn test_inline_records() {
        let record = InstanceData::inline("IFCLABEL", vec![RawValue::String("x".into())]);
        assert!(record.is_inline());
        assert_eq!(record.id, INLINE_ID);
        assert!(!InstanceData::new(1, "FOO", vec![]).is_inline());
    }
}
