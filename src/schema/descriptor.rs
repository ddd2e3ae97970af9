//! Entity descriptors and the registry that owns them
//!
//! Entities are declared as [`EntityDef`]s, then frozen into a
//! [`SchemaRegistry`]. The registry is an arena: every descriptor gets a stable
//! [`EntityId`], and associations refer to their target by id, so
//! self-referencing and mutually-referencing entities need no shared pointers.
//! After `build()` nothing is mutable and path resolution is a pure lookup.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::errors::{SchemaError, SchemaResult};
use super::types::FieldType;
use super::virtual_field::{Resolver, VirtualResolver};

/// Stable index of a descriptor inside its registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EntityId(usize);

impl EntityId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// How many target rows an association yields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    ToOne,
    ToMany,
}

/// How an association is joined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssociationKind {
    /// Single key pair between owner and target
    #[default]
    Direct,
    /// Goes through another association
    Through,
    /// Needs an intermediate join table
    ManyToMany,
}

/// Declared association, target given by entity name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociationDef {
    pub target: String,
    pub cardinality: Cardinality,
    #[serde(default)]
    pub kind: AssociationKind,
    /// Column on the owning entity
    pub owner_key: String,
    /// Column on the target entity
    pub related_key: String,
}

/// Entity declaration consumed by [`SchemaRegistryBuilder`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityDef {
    pub name: String,
    /// Table name; defaults to `name`
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default = "default_primary_key")]
    pub primary_key: Option<String>,
    #[serde(default)]
    pub tenant_key: Option<String>,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldType>,
    #[serde(default)]
    pub virtual_fields: BTreeMap<String, FieldType>,
    #[serde(default)]
    pub associations: BTreeMap<String, AssociationDef>,
    #[serde(skip)]
    resolvers: BTreeMap<String, Resolver>,
}

fn default_primary_key() -> Option<String> {
    Some("id".to_string())
}

impl EntityDef {
    /// Entity with an `id` primary key and no fields
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: None,
            primary_key: default_primary_key(),
            tenant_key: None,
            fields: BTreeMap::new(),
            virtual_fields: BTreeMap::new(),
            associations: BTreeMap::new(),
            resolvers: BTreeMap::new(),
        }
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn primary_key(mut self, key: impl Into<String>) -> Self {
        self.primary_key = Some(key.into());
        self
    }

    pub fn without_primary_key(mut self) -> Self {
        self.primary_key = None;
        self
    }

    pub fn tenant_key(mut self, key: impl Into<String>) -> Self {
        self.tenant_key = Some(key.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.insert(name.into(), field_type);
        self
    }

    /// Declares a virtual field together with its resolver
    pub fn virtual_field(
        mut self,
        name: impl Into<String>,
        field_type: FieldType,
        resolver: impl VirtualResolver + 'static,
    ) -> Self {
        let name = name.into();
        self.resolvers.insert(name.clone(), Resolver::new(resolver));
        self.virtual_fields.insert(name, field_type);
        self
    }

    /// Declares a virtual field whose resolver is bound later
    pub fn declared_virtual_field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.virtual_fields.insert(name.into(), field_type);
        self
    }

    pub fn association(mut self, name: impl Into<String>, def: AssociationDef) -> Self {
        self.associations.insert(name.into(), def);
        self
    }

    /// To-one association keyed by `owner_key` on this entity and `id` on the target
    pub fn belongs_to(self, name: impl Into<String>, target: &str, owner_key: &str) -> Self {
        self.association(
            name,
            AssociationDef {
                target: target.to_string(),
                cardinality: Cardinality::ToOne,
                kind: AssociationKind::Direct,
                owner_key: owner_key.to_string(),
                related_key: "id".to_string(),
            },
        )
    }

    /// To-many association keyed by `id` on this entity and `related_key` on the target
    pub fn has_many(self, name: impl Into<String>, target: &str, related_key: &str) -> Self {
        self.association(
            name,
            AssociationDef {
                target: target.to_string(),
                cardinality: Cardinality::ToMany,
                kind: AssociationKind::Direct,
                owner_key: "id".to_string(),
                related_key: related_key.to_string(),
            },
        )
    }

    /// Binds a resolver to an already declared virtual field
    pub fn bind_resolver(
        &mut self,
        field: &str,
        resolver: impl VirtualResolver + 'static,
    ) -> SchemaResult<()> {
        if !self.virtual_fields.contains_key(field) {
            return Err(SchemaError::unknown_field(&self.name, field));
        }
        self.resolvers
            .insert(field.to_string(), Resolver::new(resolver));
        Ok(())
    }
}

/// Frozen association record
#[derive(Debug, Clone)]
pub struct Association {
    name: String,
    target: EntityId,
    cardinality: Cardinality,
    kind: AssociationKind,
    owner_key: String,
    related_key: String,
}

impl Association {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self) -> EntityId {
        self.target
    }

    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    pub fn kind(&self) -> AssociationKind {
        self.kind
    }

    pub fn owner_key(&self) -> &str {
        &self.owner_key
    }

    pub fn related_key(&self) -> &str {
        &self.related_key
    }

    /// Only direct associations can be joined by a single key pair
    pub fn is_direct(&self) -> bool {
        self.kind == AssociationKind::Direct
    }
}

/// Frozen virtual field record
#[derive(Debug, Clone)]
pub struct VirtualField {
    name: String,
    field_type: FieldType,
    resolver: Option<Resolver>,
}

impl VirtualField {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> &FieldType {
        &self.field_type
    }

    pub fn resolver(&self) -> Option<&Resolver> {
        self.resolver.as_ref()
    }
}

/// What a single path segment names on an entity
#[derive(Debug, Clone, Copy)]
pub enum FieldLookup<'a> {
    Stored(&'a FieldType),
    Virtual(&'a VirtualField),
    Association(&'a Association),
    Unknown,
}

/// Read-only reflection surface over one entity
#[derive(Debug, Clone)]
pub struct SchemaDescriptor {
    id: EntityId,
    name: String,
    source: String,
    primary_key: Option<String>,
    tenant_key: Option<String>,
    fields: BTreeMap<String, FieldType>,
    virtual_fields: BTreeMap<String, VirtualField>,
    associations: BTreeMap<String, Association>,
}

impl SchemaDescriptor {
    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Table name, also the canonical anchor name of root queries
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn primary_key(&self) -> Option<&str> {
        self.primary_key.as_deref()
    }

    pub fn tenant_key(&self) -> Option<&str> {
        self.tenant_key.as_deref()
    }

    pub fn field_type(&self, name: &str) -> Option<&FieldType> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldType)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn virtual_field(&self, name: &str) -> Option<&VirtualField> {
        self.virtual_fields.get(name)
    }

    pub fn virtual_fields(&self) -> impl Iterator<Item = &VirtualField> {
        self.virtual_fields.values()
    }

    pub fn association(&self, name: &str) -> Option<&Association> {
        self.associations.get(name)
    }

    pub fn associations(&self) -> impl Iterator<Item = &Association> {
        self.associations.values()
    }

    /// Classifies a path segment. Names are unique across the three kinds.
    pub fn lookup(&self, segment: &str) -> FieldLookup<'_> {
        if let Some(ty) = self.fields.get(segment) {
            FieldLookup::Stored(ty)
        } else if let Some(vf) = self.virtual_fields.get(segment) {
            FieldLookup::Virtual(vf)
        } else if let Some(assoc) = self.associations.get(segment) {
            FieldLookup::Association(assoc)
        } else {
            FieldLookup::Unknown
        }
    }
}

/// Immutable set of entity descriptors
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    entities: Vec<SchemaDescriptor>,
    by_name: HashMap<String, EntityId>,
}

impl SchemaRegistry {
    pub fn builder() -> SchemaRegistryBuilder {
        SchemaRegistryBuilder::default()
    }

    /// Descriptor by entity name
    pub fn entity(&self, name: &str) -> Option<&SchemaDescriptor> {
        self.by_name.get(name).map(|id| &self.entities[id.0])
    }

    /// Descriptor by id.
    ///
    /// Ids are positions in declaration order, so an id minted by another
    /// registry may land on an unrelated descriptor. Callers that can receive
    /// foreign ids must also compare the source name.
    pub fn get(&self, id: EntityId) -> Option<&SchemaDescriptor> {
        self.entities.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SchemaDescriptor> {
        self.entities.iter()
    }
}

/// Collects entity declarations and validates them into a registry
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistryBuilder {
    defs: Vec<EntityDef>,
}

impl SchemaRegistryBuilder {
    pub fn entity(mut self, def: EntityDef) -> Self {
        self.defs.push(def);
        self
    }

    pub fn add_entity(&mut self, def: EntityDef) {
        self.defs.push(def);
    }

    /// Binds a resolver to a virtual field declared on `entity`
    pub fn bind_resolver(
        &mut self,
        entity: &str,
        field: &str,
        resolver: impl VirtualResolver + 'static,
    ) -> SchemaResult<()> {
        self.defs
            .iter_mut()
            .find(|d| d.name == entity)
            .ok_or_else(|| SchemaError::unknown_entity(entity))?
            .bind_resolver(field, resolver)
    }

    /// Validates every declaration and freezes the registry.
    ///
    /// Ids follow declaration order.
    pub fn build(self) -> SchemaResult<SchemaRegistry> {
        let mut by_name = HashMap::new();
        for (index, def) in self.defs.iter().enumerate() {
            if by_name.insert(def.name.clone(), EntityId(index)).is_some() {
                return Err(SchemaError::duplicate_entity(&def.name));
            }
        }

        let mut entities = Vec::with_capacity(self.defs.len());
        for (index, def) in self.defs.iter().enumerate() {
            entities.push(Self::freeze(EntityId(index), def, &self.defs, &by_name)?);
        }

        Ok(SchemaRegistry { entities, by_name })
    }

    fn freeze(
        id: EntityId,
        def: &EntityDef,
        defs: &[EntityDef],
        by_name: &HashMap<String, EntityId>,
    ) -> SchemaResult<SchemaDescriptor> {
        for name in def.virtual_fields.keys() {
            if def.fields.contains_key(name) {
                return Err(SchemaError::duplicate_field(&def.name, name));
            }
        }
        for name in def.associations.keys() {
            if def.fields.contains_key(name) || def.virtual_fields.contains_key(name) {
                return Err(SchemaError::duplicate_field(&def.name, name));
            }
        }

        if let Some(pk) = &def.primary_key {
            if !def.fields.contains_key(pk) {
                return Err(SchemaError::missing_key(&def.name, pk, "Primary key"));
            }
        }
        if let Some(tk) = &def.tenant_key {
            if !def.fields.contains_key(tk) {
                return Err(SchemaError::missing_key(&def.name, tk, "Tenant key"));
            }
        }

        let mut associations = BTreeMap::new();
        for (name, assoc) in &def.associations {
            let target = *by_name
                .get(&assoc.target)
                .ok_or_else(|| SchemaError::unknown_target(&def.name, name, &assoc.target))?;

            if assoc.kind == AssociationKind::Direct {
                if !def.fields.contains_key(&assoc.owner_key) {
                    return Err(SchemaError::missing_key(
                        &def.name,
                        &assoc.owner_key,
                        "Owner key",
                    ));
                }
                let target_def = &defs[target.0];
                if !target_def.fields.contains_key(&assoc.related_key) {
                    return Err(SchemaError::missing_key(
                        &target_def.name,
                        &assoc.related_key,
                        "Related key",
                    ));
                }
            }

            associations.insert(
                name.clone(),
                Association {
                    name: name.clone(),
                    target,
                    cardinality: assoc.cardinality,
                    kind: assoc.kind,
                    owner_key: assoc.owner_key.clone(),
                    related_key: assoc.related_key.clone(),
                },
            );
        }

        let virtual_fields = def
            .virtual_fields
            .iter()
            .map(|(name, ty)| {
                let field = VirtualField {
                    name: name.clone(),
                    field_type: ty.clone(),
                    resolver: def.resolvers.get(name).cloned(),
                };
                (name.clone(), field)
            })
            .collect();

        Ok(SchemaDescriptor {
            id,
            name: def.name.clone(),
            source: def.source.clone().unwrap_or_else(|| def.name.clone()),
            primary_key: def.primary_key.clone(),
            tenant_key: def.tenant_key.clone(),
            fields: def.fields.clone(),
            virtual_fields,
            associations,
        })
    }
}
