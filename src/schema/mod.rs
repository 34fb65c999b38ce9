//! Resource schemas
//!
//! A [`ResourceSchema`] is the declarative description of one resource type:
//! its namespace prefixes, the base URI its instances live under, and a
//! property list. Schemas are validated once at construction time and are
//! immutable afterwards, so they can be shared freely between models and
//! concurrently executing operations.

mod registry;

pub use registry::SchemaRegistry;

use indexmap::IndexMap;
use oxiri::Iri;
use thiserror::Error;

/// Schema construction errors
#[derive(Error, Debug)]
pub enum SchemaError {
    /// A property references a prefix that is not declared
    #[error("property '{property}' uses undeclared prefix '{prefix}'")]
    UnknownPrefix { property: String, prefix: String },

    /// A URI-reference property carries no referenced resource type
    #[error("URI-reference property '{0}' names no referenced resource type")]
    MissingReference(String),

    /// A namespace URI is not a valid IRI
    #[error("namespace '{prefix}' is not a valid IRI: {message}")]
    InvalidNamespace { prefix: String, message: String },
}

pub type SchemaResult<T> = Result<T, SchemaError>;

/// How a property's values are encoded in generated SPARQL and decoded
/// from store results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LiteralType {
    /// Plain string literal
    #[default]
    Plain,
    /// xsd:integer literal
    Integer,
    /// URI pointing at another resource
    UriReference,
}

/// Definition of a single schema property.
#[derive(Debug, Clone, Default)]
pub struct PropertyDef {
    /// Prefix the property's predicate lives under; must be a key of the
    /// schema's prefix map
    pub prefix: String,
    /// Optional properties may be absent from a value set and are wrapped
    /// in `OPTIONAL` clauses in graph patterns
    pub optional: bool,
    /// Literal encoding of the property's values
    pub literal_type: LiteralType,
    /// Resource type this property points at; required iff `literal_type`
    /// is [`LiteralType::UriReference`]. Stored as a name and resolved
    /// through the [`SchemaRegistry`] at query-build time, so schemas may
    /// reference each other forwards and cyclically.
    pub reference: Option<String>,
}

impl PropertyDef {
    /// Create a plain required property under the given prefix
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Self::default()
        }
    }

    /// Mark the property optional
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Encode values as xsd:integer literals
    pub fn integer(mut self) -> Self {
        self.literal_type = LiteralType::Integer;
        self
    }

    /// Encode values as URIs referencing the named resource type
    pub fn reference(mut self, resource_type: impl Into<String>) -> Self {
        self.literal_type = LiteralType::UriReference;
        self.reference = Some(resource_type.into());
        self
    }
}

/// A property definition together with its declared cardinality.
///
/// Array-valued properties fan out into one triple per element on write
/// and always decode back into a sequence, never a bare scalar.
#[derive(Debug, Clone)]
pub enum PropertySpec {
    /// At most one value per resource
    Scalar(PropertyDef),
    /// Any number of values per resource
    Array(PropertyDef),
}

impl PropertySpec {
    /// The wrapped definition, regardless of cardinality
    pub fn def(&self) -> &PropertyDef {
        match self {
            PropertySpec::Scalar(def) | PropertySpec::Array(def) => def,
        }
    }

    /// Whether the property is declared array-valued
    pub fn is_array(&self) -> bool {
        matches!(self, PropertySpec::Array(_))
    }
}

impl From<PropertyDef> for PropertySpec {
    fn from(def: PropertyDef) -> Self {
        PropertySpec::Scalar(def)
    }
}

/// Immutable description of a resource type.
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    resource_type: String,
    base_uri: String,
    prefixes: IndexMap<String, String>,
    properties: IndexMap<String, PropertySpec>,
}

impl ResourceSchema {
    /// Start building a schema for the given resource type and base URI
    pub fn builder(
        resource_type: impl Into<String>,
        base_uri: impl Into<String>,
    ) -> SchemaBuilder {
        SchemaBuilder {
            resource_type: resource_type.into(),
            base_uri: base_uri.into(),
            prefixes: IndexMap::new(),
            properties: IndexMap::new(),
        }
    }

    /// Type name of the modelled resource, e.g. `Person`
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// Base URI resource instances live under
    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    /// Declared prefixes in declaration order
    pub fn prefixes(&self) -> &IndexMap<String, String> {
        &self.prefixes
    }

    /// Declared properties in declaration order
    pub fn properties(&self) -> &IndexMap<String, PropertySpec> {
        &self.properties
    }

    /// Look up a single property
    pub fn property(&self, name: &str) -> Option<&PropertySpec> {
        self.properties.get(name)
    }

    /// Absolute URI of the resource type itself
    pub fn type_uri(&self) -> String {
        format!("{}{}", self.base_uri, self.resource_type)
    }

    /// Absolute URI of the instance with the given identifier
    pub fn resource_uri(&self, identifier: &str) -> String {
        format!("{}{}/{}", self.base_uri, self.resource_type, identifier)
    }

    /// Fully qualified predicate URI of a property
    pub fn predicate_uri(&self, name: &str, def: &PropertyDef) -> String {
        let namespace = self
            .prefixes
            .get(&def.prefix)
            .map(String::as_str)
            .unwrap_or_default();
        format!("{namespace}{name}")
    }
}

/// Builder for [`ResourceSchema`]; validation happens in [`SchemaBuilder::build`].
pub struct SchemaBuilder {
    resource_type: String,
    base_uri: String,
    prefixes: IndexMap<String, String>,
    properties: IndexMap<String, PropertySpec>,
}

impl SchemaBuilder {
    /// Declare a namespace prefix
    pub fn prefix(mut self, prefix: impl Into<String>, namespace: impl Into<String>) -> Self {
        self.prefixes.insert(prefix.into(), namespace.into());
        self
    }

    /// Declare a scalar property
    pub fn property(mut self, name: impl Into<String>, def: PropertyDef) -> Self {
        self.properties
            .insert(name.into(), PropertySpec::Scalar(def));
        self
    }

    /// Declare an array-valued property
    pub fn array_property(mut self, name: impl Into<String>, def: PropertyDef) -> Self {
        self.properties.insert(name.into(), PropertySpec::Array(def));
        self
    }

    /// Validate and finish the schema
    pub fn build(self) -> SchemaResult<ResourceSchema> {
        for (prefix, namespace) in &self.prefixes {
            Iri::parse(namespace.as_str()).map_err(|e| SchemaError::InvalidNamespace {
                prefix: prefix.clone(),
                message: e.to_string(),
            })?;
        }
        for (name, spec) in &self.properties {
            let def = spec.def();
            if !self.prefixes.contains_key(&def.prefix) {
                return Err(SchemaError::UnknownPrefix {
                    property: name.clone(),
                    prefix: def.prefix.clone(),
                });
            }
            if def.literal_type == LiteralType::UriReference && def.reference.is_none() {
                return Err(SchemaError::MissingReference(name.clone()));
            }
        }
        Ok(ResourceSchema {
            resource_type: self.resource_type,
            base_uri: self.base_uri,
            prefixes: self.prefixes,
            properties: self.properties,
        })
    }
}
