//! The entity store.

use indexmap::IndexMap;

use crate::entity::{Entity, EntityId, EntityRef};

/// Header data carried from a physical file to the document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FileMetadata {
    pub description: Vec<String>,
    pub file_name: String,
    pub timestamp: String,
    pub authors: Vec<String>,
    pub organizations: Vec<String>,
    pub originating_system: String,
    /// Schema identifiers from `FILE_SCHEMA`.
    pub schemas: Vec<String>,
}

/// Owns every independently identified entity of one load/save cycle.
///
/// Entities are keyed by identity and iterated in insertion order, which
/// also fixes their serial ids when written.
#[derive(Debug, Clone, Default)]
pub struct Document {
    metadata: FileMetadata,
    entities: IndexMap<EntityId, EntityRef>,
}

impl Document {
    /// Create an empty document for `schema`.
    pub fn new(schema: impl Into<String>) -> Self {
        Self::with_metadata(FileMetadata {
            schemas: vec![schema.into()],
            ..FileMetadata::default()
        })
    }

    pub fn with_metadata(metadata: FileMetadata) -> Self {
        Self {
            metadata,
            entities: IndexMap::new(),
        }
    }

    pub fn metadata(&self) -> &FileMetadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut FileMetadata {
        &mut self.metadata
    }

    /// First schema identifier, or an empty string.
    pub fn schema(&self) -> &str {
        self.metadata.schemas.first().map(String::as_str).unwrap_or("")
    }

    /// Add an entity. Returns false if its identity is already stored, in
    /// which case nothing changes.
    pub fn add(&mut self, entity: EntityRef) -> bool {
        if self.entities.contains_key(&entity.id()) {
            return false;
        }
        self.entities.insert(entity.id(), entity);
        true
    }

    pub fn get(&self, id: EntityId) -> Option<&EntityRef> {
        self.entities.get(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Zero-based insertion position of a stored entity.
    pub fn position(&self, id: EntityId) -> Option<usize> {
        self.entities.get_index_of(&id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityRef> + Clone + '_ {
        self.entities.values()
    }

    /// Entities whose type is exactly `type_name`.
    pub fn all_of_type<'a>(&'a self, type_name: &'a str) -> impl Iterator<Item = &'a EntityRef> + Clone + 'a {
        self.iter()
            .filter(move |e| e.type_name().eq_ignore_ascii_case(type_name))
    }

    /// Entities whose type is `type_name` or any subtype of it.
    pub fn all_of_kind<'a>(&'a self, type_name: &'a str) -> impl Iterator<Item = &'a EntityRef> + Clone + 'a {
        self.iter().filter(move |e| e.is_a(type_name))
    }

    /// Entities matching an arbitrary predicate.
    pub fn query<'a, P>(&'a self, predicate: P) -> impl Iterator<Item = &'a EntityRef> + Clone + 'a
    where
        P: Fn(&Entity) -> bool + Clone + 'a,
    {
        self.iter().filter(move |e| predicate(e))
    }
}
