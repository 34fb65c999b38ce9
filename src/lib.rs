//! Object-resource mapping for SPARQL triplestores
//!
//! What an ORM does for relational stores, this crate does for a graph of
//! subject-predicate-object triples: a declarative [`ResourceSchema`]
//! drives SPARQL text synthesis for create/read/update/delete and
//! equality filtering, a codec converts the store's N-Quads responses
//! into typed, schema-validated resource objects, and a reference
//! resolver materializes links between resources.
//!
//! The crate emits queries and decodes results; executing them is the
//! job of a SPARQL endpoint reached through the [`Transport`] seam.
//!
//! # Example
//!
//! ```rust,no_run
//! use rdf_orm::{
//!     HttpTransport, Model, PropertyDef, PropertyValues, ResourceSchema, SchemaRegistry,
//! };
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let schema = ResourceSchema::builder("Person", "http://schema.org/")
//!     .prefix("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#")
//!     .prefix("schema", "http://schema.org/")
//!     .property("firstname", PropertyDef::new("rdf"))
//!     .property("lastname", PropertyDef::new("rdf"))
//!     .property("age", PropertyDef::new("schema").integer())
//!     .build()?;
//!
//! let transport = Arc::new(HttpTransport::new(
//!     "http://localhost:3030/test/query",
//!     "http://localhost:3030/test/update",
//! )?);
//! let registry = SchemaRegistry::new();
//! let person = Model::new(schema, transport, registry);
//!
//! let values = PropertyValues::new("DanielFott")
//!     .with("firstname", "Daniel")
//!     .with("lastname", "Fott")
//!     .with("age", 20);
//! let mut daniel = person.create(&values);
//! daniel.save().await?;
//!
//! let everyone = person.find(None).await?;
//! assert_eq!(everyone.len(), 1);
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all)]

pub mod codec;
pub mod model;
pub mod resource;
pub mod schema;
pub mod sparql;
pub mod transport;

pub use codec::{parse_nquads, CodecError, CodecResult, LdConverter, ParsedTerm, ParsedTriple};

pub use model::{Model, ModelError, ModelResult, PreSaveHook};

pub use resource::{
    Context, ContextEntry, LdResource, LdResourceList, PropertyValue, PropertyValues,
    ResourceState, Value,
};

pub use schema::{
    LiteralType, PropertyDef, PropertySpec, ResourceSchema, SchemaBuilder, SchemaError,
    SchemaRegistry, SchemaResult,
};

pub use sparql::{
    limit, FilterValue, FindFilters, QueryBuilder, QueryError, QueryResult, UpdateValues,
};

pub use transport::{HttpTransport, Transport, TransportError, TransportResult, ACCEPT_NQUADS};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}
