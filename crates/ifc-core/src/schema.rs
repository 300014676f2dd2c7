//! Type registry describing the constructible types of a schema.
//!
//! A `Registry` is what an EXPRESS schema compiler would emit: for every
//! entity and defined type an ordered parameter list and a factory, for every
//! SELECT its members, and for every enumeration its items. SELECT wrapping
//! chains are computed once in [`SchemaBuilder::build`] so coercion is a
//! table lookup.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::entity::Entity;
use crate::errors::{ConstructionError, SchemaError};
use crate::value::Value;

/// Schema type name in its declared spelling (e.g. `IfcLabel`).
pub type TypeName = Arc<str>;

/// SELECT names to wrap a value in, innermost first.
pub type SelectChain = SmallVec<[TypeName; 4]>;

/// Typed constructor captured when the registry is built.
pub type Factory = Arc<
    dyn Fn(&Registry, &Arc<EntityType>, Vec<Value>) -> Result<Entity, ConstructionError>
        + Send
        + Sync,
>;

fn key(name: &str) -> String {
    name.to_ascii_uppercase()
}

/// Declared type of a constructor parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamType {
    Integer,
    Real,
    /// INTEGER or REAL.
    Number,
    String,
    Boolean,
    /// BOOLEAN or `.U.`.
    Logical,
    /// Entity, defined, SELECT or enumeration type from the registry.
    Named(TypeName),
    /// Any EXPRESS aggregate.
    List(Box<ParamType>),
}

impl ParamType {
    pub fn named(name: &str) -> Self {
        ParamType::Named(Arc::from(name))
    }

    pub fn list_of(inner: ParamType) -> Self {
        ParamType::List(Box::new(inner))
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::Integer => f.write_str("INTEGER"),
            ParamType::Real => f.write_str("REAL"),
            ParamType::Number => f.write_str("NUMBER"),
            ParamType::String => f.write_str("STRING"),
            ParamType::Boolean => f.write_str("BOOLEAN"),
            ParamType::Logical => f.write_str("LOGICAL"),
            ParamType::Named(name) => f.write_str(name),
            ParamType::List(inner) => write!(f, "LIST OF {}", inner),
        }
    }
}

/// Kinds of named types in a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Entity,
    Defined,
    Select,
    Enumeration,
}

/// A named, typed constructor parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    name: Arc<str>,
    ty: ParamType,
}

impl Attribute {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &ParamType {
        &self.ty
    }
}

/// Constructor descriptor for an entity or defined type.
///
/// Defined types (`TYPE IfcLabel = STRING`) are constructible too: a typed
/// parameter such as `IFCLABEL('x')` builds an inline instance with a single
/// `wrappedValue` attribute.
#[derive(Debug)]
pub struct EntityType {
    name: TypeName,
    kind: TypeKind,
    supertype: Option<TypeName>,
    /// Upper-cased names of this type and all supertypes, nearest first.
    ancestors: Vec<String>,
    attributes: Vec<Attribute>,
    is_abstract: bool,
}

impl EntityType {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn is_defined(&self) -> bool {
        self.kind == TypeKind::Defined
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    pub fn supertype(&self) -> Option<&str> {
        self.supertype.as_deref()
    }

    /// Full parameter list, inherited attributes first.
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn arity(&self) -> usize {
        self.attributes.len()
    }

    pub fn attribute_index(&self, name: &str) -> Option<usize> {
        self.attributes
            .iter()
            .position(|a| a.name.eq_ignore_ascii_case(name))
    }

    /// Whether this type is `name` or a subtype of it.
    pub fn is_a(&self, name: &str) -> bool {
        self.ancestors.iter().any(|a| a.eq_ignore_ascii_case(name))
    }
}

/// A SELECT type and its legal members.
#[derive(Debug, Clone)]
pub struct SelectType {
    name: TypeName,
    members: Vec<TypeName>,
}

impl SelectType {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> &[TypeName] {
        &self.members
    }
}

/// An enumeration type and its items.
#[derive(Debug, Clone)]
pub struct EnumerationType {
    name: TypeName,
    items: Vec<Arc<str>>,
}

impl EnumerationType {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn items(&self) -> &[Arc<str>] {
        &self.items
    }

    pub fn contains(&self, item: &str) -> bool {
        self.items.iter().any(|i| i.eq_ignore_ascii_case(item))
    }
}

/// Descriptor plus the factory that builds it.
pub struct Constructor {
    ty: Arc<EntityType>,
    factory: Factory,
}

impl Constructor {
    pub fn entity_type(&self) -> &Arc<EntityType> {
        &self.ty
    }

    pub fn invoke(&self, registry: &Registry, args: Vec<Value>) -> Result<Entity, ConstructionError> {
        (self.factory)(registry, &self.ty, args)
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("ty", &self.ty.name)
            .finish_non_exhaustive()
    }
}

/// Registry of constructible types for one schema.
#[derive(Debug)]
pub struct Registry {
    schema: String,
    constructors: IndexMap<String, Constructor>,
    selects: IndexMap<String, SelectType>,
    enumerations: IndexMap<String, EnumerationType>,
    /// (source type, target SELECT) -> wrapping chain.
    chains: HashMap<(String, String), SelectChain>,
}

impl Registry {
    /// Start declaring a schema.
    pub fn builder(schema: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(schema)
    }

    /// Schema identifier, as written to `FILE_SCHEMA`.
    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn constructor(&self, name: &str) -> Option<&Constructor> {
        self.constructors.get(&key(name))
    }

    pub fn entity_type(&self, name: &str) -> Option<&Arc<EntityType>> {
        self.constructor(name).map(Constructor::entity_type)
    }

    pub fn entity_types(&self) -> impl Iterator<Item = &Arc<EntityType>> {
        self.constructors.values().map(Constructor::entity_type)
    }

    pub fn select(&self, name: &str) -> Option<&SelectType> {
        self.selects.get(&key(name))
    }

    pub fn enumeration(&self, name: &str) -> Option<&EnumerationType> {
        self.enumerations.get(&key(name))
    }

    pub fn is_select(&self, name: &str) -> bool {
        self.select(name).is_some()
    }

    pub fn kind_of(&self, name: &str) -> Option<TypeKind> {
        let k = key(name);
        if let Some(ctor) = self.constructors.get(&k) {
            Some(ctor.ty.kind)
        } else if self.selects.contains_key(&k) {
            Some(TypeKind::Select)
        } else if self.enumerations.contains_key(&k) {
            Some(TypeKind::Enumeration)
        } else {
            None
        }
    }

    /// Wrapping chain that turns a value of type `source` into `target`.
    pub fn select_chain(&self, source: &str, target: &str) -> Option<&[TypeName]> {
        self.chains
            .get(&(key(source), key(target)))
            .map(|chain| chain.as_slice())
    }

    /// Invoke the factory registered for `type_name`.
    pub fn construct(&self, type_name: &str, args: Vec<Value>) -> Result<Entity, ConstructionError> {
        let ctor = self
            .constructor(type_name)
            .ok_or_else(|| ConstructionError::UnknownType {
                type_name: type_name.to_string(),
            })?;
        ctor.invoke(self, args)
    }

    /// Whether `value` has a runtime representation compatible with `ty`.
    ///
    /// `$` and `*` are accepted everywhere.
    pub fn accepts(&self, ty: &ParamType, value: &Value) -> bool {
        if matches!(value, Value::Null | Value::Derived) {
            return true;
        }
        match ty {
            ParamType::Integer => matches!(value, Value::Integer(_)),
            ParamType::Real | ParamType::Number => {
                matches!(value, Value::Real(_) | Value::Integer(_))
            }
            ParamType::String => matches!(value, Value::String(_)),
            ParamType::Boolean => matches!(value, Value::Boolean(_)),
            ParamType::Logical => match value {
                Value::Boolean(_) => true,
                Value::Enum(e) => e.eq_ignore_ascii_case("U"),
                _ => false,
            },
            ParamType::List(inner) => match value {
                Value::List(items) => items.iter().all(|item| self.accepts(inner, item)),
                _ => false,
            },
            ParamType::Named(name) => self.accepts_named(name, value),
        }
    }

    fn accepts_named(&self, name: &str, value: &Value) -> bool {
        match self.kind_of(name) {
            Some(TypeKind::Entity) => value.as_entity().is_some_and(|e| e.is_a(name)),
            Some(TypeKind::Defined) => {
                if let Value::Entity(e) = value {
                    return e.type_name().eq_ignore_ascii_case(name);
                }
                self.entity_type(name)
                    .and_then(|ty| ty.attributes.first())
                    .is_some_and(|wrapped| self.accepts(&wrapped.ty, value))
            }
            Some(TypeKind::Select) => value
                .as_select()
                .is_some_and(|s| s.select().eq_ignore_ascii_case(name)),
            Some(TypeKind::Enumeration) => match value {
                Value::Enum(item) => self
                    .enumeration(name)
                    .is_some_and(|e| e.contains(item)),
                _ => false,
            },
            None => false,
        }
    }
}

/// Factory installed for every type unless overridden.
///
/// Rejects abstract types, checks arity, and checks every argument against
/// its declared parameter type.
pub fn default_factory(
    registry: &Registry,
    ty: &Arc<EntityType>,
    args: Vec<Value>,
) -> Result<Entity, ConstructionError> {
    if ty.is_abstract {
        return Err(ConstructionError::AbstractType {
            type_name: ty.name().to_string(),
        });
    }
    if args.len() != ty.arity() {
        return Err(ConstructionError::ArityMismatch {
            type_name: ty.name().to_string(),
            expected: ty.arity(),
            found: args.len(),
        });
    }
    for (attribute, value) in ty.attributes.iter().zip(&args) {
        if !registry.accepts(&attribute.ty, value) {
            return Err(ConstructionError::IncompatibleValue {
                type_name: ty.name().to_string(),
                attribute: attribute.name().to_string(),
                expected: attribute.ty.to_string(),
                found: value.kind_name(),
            });
        }
    }
    Ok(Entity::new(Arc::clone(ty), args))
}

struct EntityDecl {
    name: String,
    kind: TypeKind,
    supertype: Option<String>,
    attributes: Vec<(String, ParamType)>,
    is_abstract: bool,
}

/// Builder for a [`Registry`].
///
/// Declarations may appear in any order; names are resolved in `build`.
pub struct SchemaBuilder {
    schema: String,
    entities: Vec<EntityDecl>,
    selects: Vec<(String, Vec<String>)>,
    enumerations: Vec<(String, Vec<String>)>,
    factories: Vec<(String, Factory)>,
}

impl SchemaBuilder {
    pub fn new(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            entities: Vec::new(),
            selects: Vec::new(),
            enumerations: Vec::new(),
            factories: Vec::new(),
        }
    }

    /// Declare an entity with its own (non-inherited) attributes.
    pub fn entity(self, name: &str, supertype: Option<&str>, attributes: &[(&str, ParamType)]) -> Self {
        self.push_entity(name, supertype, attributes, false)
    }

    pub fn abstract_entity(
        self,
        name: &str,
        supertype: Option<&str>,
        attributes: &[(&str, ParamType)],
    ) -> Self {
        self.push_entity(name, supertype, attributes, true)
    }

    /// Declare a defined type over `underlying`.
    pub fn defined(mut self, name: &str, underlying: ParamType) -> Self {
        self.entities.push(EntityDecl {
            name: name.to_string(),
            kind: TypeKind::Defined,
            supertype: None,
            attributes: vec![("wrappedValue".to_string(), underlying)],
            is_abstract: false,
        });
        self
    }

    pub fn select(mut self, name: &str, members: &[&str]) -> Self {
        self.selects.push((
            name.to_string(),
            members.iter().map(|m| m.to_string()).collect(),
        ));
        self
    }

    pub fn enumeration(mut self, name: &str, items: &[&str]) -> Self {
        self.enumerations.push((
            name.to_string(),
            items.iter().map(|i| i.to_string()).collect(),
        ));
        self
    }

    /// Replace the default factory of an entity or defined type.
    pub fn factory<F>(mut self, name: &str, factory: F) -> Self
    where
        F: Fn(&Registry, &Arc<EntityType>, Vec<Value>) -> Result<Entity, ConstructionError>
            + Send
            + Sync
            + 'static,
    {
        let factory: Factory = Arc::new(factory);
        self.factories.push((name.to_string(), factory));
        self
    }

    fn push_entity(
        mut self,
        name: &str,
        supertype: Option<&str>,
        attributes: &[(&str, ParamType)],
        is_abstract: bool,
    ) -> Self {
        self.entities.push(EntityDecl {
            name: name.to_string(),
            kind: TypeKind::Entity,
            supertype: supertype.map(str::to_string),
            attributes: attributes
                .iter()
                .map(|(n, t)| (n.to_string(), t.clone()))
                .collect(),
            is_abstract,
        });
        self
    }

    /// Resolve inheritance, validate names and precompute SELECT chains.
    pub fn build(self) -> Result<Registry, SchemaError> {
        let mut seen = HashSet::new();
        let names = self
            .entities
            .iter()
            .map(|e| &e.name)
            .chain(self.selects.iter().map(|(n, _)| n))
            .chain(self.enumerations.iter().map(|(n, _)| n));
        for name in names {
            if !seen.insert(key(name)) {
                return Err(SchemaError::DuplicateType { name: name.clone() });
            }
        }

        let decls: HashMap<String, &EntityDecl> =
            self.entities.iter().map(|d| (key(&d.name), d)).collect();

        for decl in &self.entities {
            for (_, ty) in &decl.attributes {
                check_param_type(&seen, &decl.name, ty)?;
            }
        }
        for (name, members) in &self.selects {
            for member in members {
                if !seen.contains(&key(member)) {
                    return Err(SchemaError::UnknownType {
                        referenced_by: name.clone(),
                        name: member.clone(),
                    });
                }
            }
        }

        let mut resolved = HashMap::new();
        for decl in &self.entities {
            resolve_entity(decl, &decls, &mut resolved, &mut Vec::new())?;
        }

        let default: Factory = Arc::new(default_factory);
        let mut constructors = IndexMap::new();
        for decl in &self.entities {
            let k = key(&decl.name);
            if let Some(ty) = resolved.get(&k) {
                constructors.insert(
                    k,
                    Constructor {
                        ty: Arc::clone(ty),
                        factory: Arc::clone(&default),
                    },
                );
            }
        }
        for (name, factory) in self.factories {
            match constructors.get_mut(&key(&name)) {
                Some(ctor) => ctor.factory = factory,
                None => return Err(SchemaError::UnknownFactoryTarget { name }),
            }
        }

        let selects: IndexMap<String, SelectType> = self
            .selects
            .into_iter()
            .map(|(name, members)| {
                let select = SelectType {
                    name: Arc::from(name.as_str()),
                    members: members.iter().map(|m| Arc::from(m.as_str())).collect(),
                };
                (key(&name), select)
            })
            .collect();

        let enumerations = self
            .enumerations
            .into_iter()
            .map(|(name, items)| {
                let enumeration = EnumerationType {
                    name: Arc::from(name.as_str()),
                    items: items.iter().map(|i| Arc::from(i.as_str())).collect(),
                };
                (key(&name), enumeration)
            })
            .collect();

        let chains = compute_chains(&selects, &constructors);

        Ok(Registry {
            schema: self.schema,
            constructors,
            selects,
            enumerations,
            chains,
        })
    }
}

fn check_param_type(known: &HashSet<String>, owner: &str, ty: &ParamType) -> Result<(), SchemaError> {
    match ty {
        ParamType::Named(name) if !known.contains(&key(name)) => Err(SchemaError::UnknownType {
            referenced_by: owner.to_string(),
            name: name.to_string(),
        }),
        ParamType::List(inner) => check_param_type(known, owner, inner),
        _ => Ok(()),
    }
}

fn resolve_entity(
    decl: &EntityDecl,
    decls: &HashMap<String, &EntityDecl>,
    done: &mut HashMap<String, Arc<EntityType>>,
    visiting: &mut Vec<String>,
) -> Result<Arc<EntityType>, SchemaError> {
    let k = key(&decl.name);
    if let Some(ty) = done.get(&k) {
        return Ok(Arc::clone(ty));
    }
    if visiting.contains(&k) {
        return Err(SchemaError::InheritanceCycle {
            entity: decl.name.clone(),
        });
    }
    visiting.push(k.clone());

    let (mut attributes, mut ancestors) = match &decl.supertype {
        Some(supertype) => {
            let parent_decl = decls
                .get(&key(supertype))
                .filter(|d| d.kind == TypeKind::Entity)
                .ok_or_else(|| SchemaError::UnknownSupertype {
                    entity: decl.name.clone(),
                    supertype: supertype.clone(),
                })?;
            let parent = resolve_entity(parent_decl, decls, done, visiting)?;
            (parent.attributes.clone(), parent.ancestors.clone())
        }
        None => (Vec::new(), Vec::new()),
    };
    ancestors.insert(0, k.clone());
    attributes.extend(decl.attributes.iter().map(|(name, ty)| Attribute {
        name: Arc::from(name.as_str()),
        ty: ty.clone(),
    }));

    visiting.pop();
    let ty = Arc::new(EntityType {
        name: Arc::from(decl.name.as_str()),
        kind: decl.kind,
        supertype: decl.supertype.as_deref().map(Arc::from),
        ancestors,
        attributes,
        is_abstract: decl.is_abstract,
    });
    done.insert(k, Arc::clone(&ty));
    Ok(ty)
}

/// Breadth-first walk of each SELECT's nested membership.
///
/// The shortest chain wins; ties go to the member declared first. Entity
/// subtypes inherit the chain of their nearest listed ancestor.
fn compute_chains(
    selects: &IndexMap<String, SelectType>,
    constructors: &IndexMap<String, Constructor>,
) -> HashMap<(String, String), SelectChain> {
    let mut chains = HashMap::new();

    for (target_key, target) in selects {
        let mut direct: IndexMap<String, SelectChain> = IndexMap::new();
        let mut visited = HashSet::from([target_key.clone()]);
        let mut queue = VecDeque::from([(target_key.clone(), {
            let mut path = SelectChain::new();
            path.push(Arc::clone(&target.name));
            path
        })]);

        while let Some((select_key, path)) = queue.pop_front() {
            let Some(select) = selects.get(&select_key) else {
                continue;
            };
            for member in &select.members {
                let member_key = key(member);
                direct
                    .entry(member_key.clone())
                    .or_insert_with(|| path.clone());
                if let Some(nested) = selects.get(&member_key) {
                    if visited.insert(member_key.clone()) {
                        let mut inner = SelectChain::new();
                        inner.push(Arc::clone(&nested.name));
                        inner.extend(path.iter().cloned());
                        queue.push_back((member_key, inner));
                    }
                }
            }
        }

        for (entity_key, ctor) in constructors {
            if direct.contains_key(entity_key) {
                continue;
            }
            let inherited = ctor.ty.ancestors[1..]
                .iter()
                .find_map(|ancestor| direct.get(ancestor));
            if let Some(chain) = inherited {
                chains.insert((entity_key.clone(), target_key.clone()), chain.clone());
            }
        }
        for (source, chain) in direct {
            chains.insert((source, target_key.clone()), chain);
        }
    }

    chains
}
