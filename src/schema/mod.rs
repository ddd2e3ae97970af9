//! Schema descriptor subsystem
//!
//! Read-only reflection over registered entities: stored fields and their
//! types, virtual fields with resolvers, associations with their join keys,
//! primary and tenant keys.
//!
//! # Design Principles
//!
//! - Registered once, immutable afterwards
//! - Associations refer to targets by stable `EntityId`
//! - Declarations are validated at registration, not at compile time
//! - Only direct associations are joinable; the others are kept so paths
//!   touching them can be rejected by name

mod descriptor;
mod errors;
mod loader;
mod types;
mod virtual_field;

pub use descriptor::{
    Association, AssociationDef, AssociationKind, Cardinality, EntityDef, EntityId, FieldLookup,
    SchemaDescriptor, SchemaRegistry, SchemaRegistryBuilder, VirtualField,
};
pub use errors::{SchemaError, SchemaErrorCode, SchemaResult, Severity};
pub use loader::SchemaLoader;
pub use types::FieldType;
pub use virtual_field::{ContextFree, Resolver, ResolverFn, VirtualResolver};
