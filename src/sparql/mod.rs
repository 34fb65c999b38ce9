//! SPARQL query synthesis
//!
//! Pure string generation: a schema plus a value map or filter map in,
//! SPARQL 1.1 query/update text out. Nothing here talks to a store; the
//! transport executes whatever these functions emit.
//!
//! The textual shape (prefix block, blank line, clause layout, triple
//! order) is part of the contract and covered by golden-string tests:
//! within one resource, triples and pattern lines appear in the schema's
//! property-declaration order, with the `rdf:type` triple leading inserts
//! and closing graph patterns.

mod builder;
mod text;

pub use builder::QueryBuilder;
pub use text::{
    construct_clause, filter_clause, identifier_anchor, insert_triples, limit, prefix_clause,
    where_clause,
};

use indexmap::IndexMap;
use thiserror::Error;

/// Query synthesis errors. All are raised before any query text is
/// returned; a failed build never yields a partial query.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum QueryError {
    /// The value set carries no identifier
    #[error("identifier for this resource is missing in the property values")]
    MissingIdentifier,

    /// A required property is absent or empty at write time
    #[error("no value given for required property '{0}'")]
    MissingValue(String),

    /// A value key has no matching property definition
    #[error("property '{0}' is not part of the schema")]
    UnknownProperty(String),

    /// A filter key has no matching property definition
    #[error("cannot filter by '{0}': not a property of this schema")]
    UnknownFilterProperty(String),

    /// A URI-reference property points at a resource type the registry
    /// does not know
    #[error("referenced resource type '{0}' is not registered")]
    UnknownReference(String),

    /// An update operation was given no values to write
    #[error("update carries no property values")]
    EmptyUpdate,
}

pub type QueryResult<T> = Result<T, QueryError>;

/// A single equality-filter value.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    String(String),
    Integer(i64),
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        FilterValue::String(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        FilterValue::String(s)
    }
}

impl From<i64> for FilterValue {
    fn from(n: i64) -> Self {
        FilterValue::Integer(n)
    }
}

impl From<i32> for FilterValue {
    fn from(n: i32) -> Self {
        FilterValue::Integer(i64::from(n))
    }
}

/// Equality filters: property name to required value, conjoined after the
/// graph pattern.
pub type FindFilters = IndexMap<String, FilterValue>;

/// Partial value map for the filtered update operations; unlike
/// [`crate::resource::PropertyValues`] it carries no identifier.
pub type UpdateValues = IndexMap<String, crate::resource::PropertyValue>;
