//! Resource object model
//!
//! The developer-facing side of the mapper: typed property values, the
//! write-form [`PropertyValues`] handed to `create`/`update`, and the
//! [`LdResource`]/[`LdResourceList`] objects produced by the codec. A
//! resource serializes to a compact JSON-LD document (`@context`, `@id`,
//! `@type`, then its properties).

use crate::model::Model;
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;

/// A single typed property value.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Plain string literal
    String(String),
    /// Integer literal
    Integer(i64),
    /// URI referencing another resource, unresolved
    Uri(String),
    /// A materialized referenced resource (after populate)
    Resource(Box<LdResource>),
}

impl Value {
    /// The URI behind this value, if it is a link: either an unresolved
    /// reference or an already materialized resource
    pub fn reference_uri(&self) -> Option<&str> {
        match self {
            Value::Uri(uri) => Some(uri),
            Value::String(s) => Some(s),
            Value::Resource(res) => Some(&res.id),
            Value::Integer(_) => None,
        }
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

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(i64::from(n))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) | Value::Uri(s) => write!(f, "{s}"),
            Value::Integer(n) => write!(f, "{n}"),
            Value::Resource(res) => write!(f, "{}", res.id),
        }
    }
}

/// A property value with its runtime cardinality.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Scalar(Value),
    Array(Vec<Value>),
}

impl PropertyValue {
    /// Values in this slot, scalar or not
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        match self {
            PropertyValue::Scalar(v) => std::slice::from_ref(v).iter(),
            PropertyValue::Array(vs) => vs.iter(),
        }
    }

    /// Mutable variant of [`PropertyValue::values`]
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut Value> {
        match self {
            PropertyValue::Scalar(v) => std::slice::from_mut(v).iter_mut(),
            PropertyValue::Array(vs) => vs.iter_mut(),
        }
    }

    /// The scalar value, or the first array element
    pub fn first(&self) -> Option<&Value> {
        self.values().next()
    }
}

impl From<Value> for PropertyValue {
    fn from(v: Value) -> Self {
        PropertyValue::Scalar(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::Scalar(s.into())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::Scalar(s.into())
    }
}

impl From<i64> for PropertyValue {
    fn from(n: i64) -> Self {
        PropertyValue::Scalar(n.into())
    }
}

impl From<i32> for PropertyValue {
    fn from(n: i32) -> Self {
        PropertyValue::Scalar(n.into())
    }
}

impl From<Vec<Value>> for PropertyValue {
    fn from(vs: Vec<Value>) -> Self {
        PropertyValue::Array(vs)
    }
}

impl From<Vec<&str>> for PropertyValue {
    fn from(vs: Vec<&str>) -> Self {
        PropertyValue::Array(vs.into_iter().map(Value::from).collect())
    }
}

impl From<Vec<String>> for PropertyValue {
    fn from(vs: Vec<String>) -> Self {
        PropertyValue::Array(vs.into_iter().map(Value::from).collect())
    }
}

impl From<Vec<i64>> for PropertyValue {
    fn from(vs: Vec<i64>) -> Self {
        PropertyValue::Array(vs.into_iter().map(Value::from).collect())
    }
}

/// The write-form value set handed to `create` and the update operations:
/// a resource identifier plus one entry per schema property.
///
/// The identifier is not itself a schema property; it only determines the
/// resource's URI.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyValues {
    /// Identifier the resource URI is derived from
    pub identifier: String,
    values: IndexMap<String, PropertyValue>,
}

impl PropertyValues {
    /// Create an empty value set for the given identifier
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            values: IndexMap::new(),
        }
    }

    /// Builder-style insertion
    pub fn with(mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Insert or replace a property value
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<PropertyValue>) {
        self.values.insert(name.into(), value.into());
    }

    /// Read a property value
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.values.get(name)
    }

    /// Mutable access to a property value
    pub fn get_mut(&mut self, name: &str) -> Option<&mut PropertyValue> {
        self.values.get_mut(name)
    }

    /// Iterate entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &PropertyValue)> {
        self.values.iter()
    }

    /// Whether the set carries no property values
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// One JSON-LD `@context` entry: the fully qualified predicate URI plus
/// the datatype or reference marker the codec needs for coercion.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextEntry {
    /// Fully qualified predicate URI
    pub id: String,
    /// Literal datatype URI, e.g. xsd:integer
    pub datatype: Option<String>,
    /// Whether the property holds references to other resources
    pub reference: bool,
}

impl Serialize for ContextEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("@id", &self.id)?;
        if self.reference {
            map.serialize_entry("@type", "@id")?;
        } else if let Some(datatype) = &self.datatype {
            map.serialize_entry("@type", datatype)?;
        }
        map.end()
    }
}

/// JSON-LD context: bare property name to context entry, in schema
/// declaration order.
pub type Context = IndexMap<String, ContextEntry>;

/// Lifecycle state of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceState {
    /// Built via `create`, not yet persisted; `save` inserts
    New,
    /// Came from a store round trip or was saved before; `save` updates
    Persisted,
}

/// A normalized resource: the compact linked-data object a caller works
/// with. Produced by the codec and bound to the model that produced it,
/// so `save` and `populate` know which schema and transport to use.
#[derive(Clone)]
pub struct LdResource {
    /// Absolute resource URI (`@id`); empty for an empty result
    pub id: String,
    /// Absolute type URI (`@type`)
    pub resource_type: String,
    /// JSON-LD context derived from the schema
    pub context: Context,
    /// Property values keyed by bare property name
    pub properties: IndexMap<String, PropertyValue>,
    state: ResourceState,
    model: Option<Model>,
}

impl LdResource {
    /// Build a resource in the given lifecycle state
    pub(crate) fn new(
        id: String,
        resource_type: String,
        context: Context,
        properties: IndexMap<String, PropertyValue>,
        state: ResourceState,
    ) -> Self {
        Self {
            id,
            resource_type,
            context,
            properties,
            state,
            model: None,
        }
    }

    /// The empty resource: what a lookup with no match returns
    pub(crate) fn empty(context: Context) -> Self {
        Self::new(
            String::new(),
            String::new(),
            context,
            IndexMap::new(),
            ResourceState::Persisted,
        )
    }

    /// Bind the resource to the model whose schema and transport back its
    /// `save`/`populate` behavior
    pub(crate) fn bind(&mut self, model: Model) {
        self.model = Some(model);
    }

    pub(crate) fn model(&self) -> Option<&Model> {
        self.model.as_ref()
    }

    pub(crate) fn mark_persisted(&mut self) {
        self.state = ResourceState::Persisted;
    }

    /// Current lifecycle state
    pub fn state(&self) -> ResourceState {
        self.state
    }

    /// Whether `save` would insert rather than update
    pub fn is_new(&self) -> bool {
        self.state == ResourceState::New
    }

    /// Whether this is the empty resource (lookup found nothing)
    pub fn is_empty(&self) -> bool {
        self.id.is_empty() && self.properties.is_empty()
    }

    /// Read a property value
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    /// Insert or replace a property value
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<PropertyValue>) {
        self.properties.insert(name.into(), value.into());
    }
}

impl PartialEq for LdResource {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.resource_type == other.resource_type
            && self.properties == other.properties
    }
}

impl fmt::Debug for LdResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LdResource")
            .field("@id", &self.id)
            .field("@type", &self.resource_type)
            .field("properties", &self.properties)
            .field("state", &self.state)
            .finish()
    }
}

impl Serialize for LdResource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("@context", &self.context)?;
        map.serialize_entry("@id", &self.id)?;
        map.serialize_entry("@type", &self.resource_type)?;
        for (name, value) in &self.properties {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// A collection of resources (`@graph`). Always array-shaped: a query
/// that matched one resource yields a one-element collection, a query
/// that matched nothing yields an empty one.
#[derive(Debug, Clone, PartialEq)]
pub struct LdResourceList {
    /// JSON-LD context shared by all members
    pub context: Context,
    /// The matched resources
    pub graph: Vec<LdResource>,
}

impl LdResourceList {
    pub(crate) fn new(context: Context, graph: Vec<LdResource>) -> Self {
        Self { context, graph }
    }

    /// Number of resources in the collection
    pub fn len(&self) -> usize {
        self.graph.len()
    }

    /// Whether the query matched nothing
    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    /// Iterate the collection
    pub fn iter(&self) -> impl Iterator<Item = &LdResource> {
        self.graph.iter()
    }
}

impl Serialize for LdResourceList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("@context", &self.context)?;
        map.serialize_entry("@graph", &self.graph)?;
        map.end()
    }
}

impl IntoIterator for LdResourceList {
    type Item = LdResource;
    type IntoIter = std::vec::IntoIter<LdResource>;

    fn into_iter(self) -> Self::IntoIter {
        self.graph.into_iter()
    }
}
