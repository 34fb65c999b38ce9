//! Triple codec
//!
//! Converts between the store's wire format (raw triples) and the
//! developer-facing resource objects, in both directions:
//!
//! - triples → [`LdResource`] / [`LdResourceList`], honoring the schema's
//!   cardinality and literal-type rules;
//! - resource → [`PropertyValues`], the write-form the synthesizer
//!   consumes when a resource is saved.

mod nquads;

pub use nquads::{parse_nquads, ParsedTerm, ParsedTriple};

use crate::resource::{
    Context, ContextEntry, LdResource, LdResourceList, PropertyValue, PropertyValues,
    ResourceState, Value,
};
use crate::schema::{LiteralType, PropertySpec, ResourceSchema};
use indexmap::IndexMap;
use thiserror::Error;
use tracing::warn;

const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";

/// Codec errors
#[derive(Error, Debug)]
pub enum CodecError {
    /// The transport's response was not parseable as N-Quads
    #[error("failed to parse store response: {0}")]
    Parse(String),
}

pub type CodecResult<T> = Result<T, CodecError>;

/// Converts raw triples into resources for one schema.
pub struct LdConverter<'a> {
    schema: &'a ResourceSchema,
}

impl<'a> LdConverter<'a> {
    pub fn new(schema: &'a ResourceSchema) -> Self {
        Self { schema }
    }

    /// Build the JSON-LD context for the schema: every bare property name
    /// mapped to its fully qualified predicate URI, integer properties
    /// tagged with the xsd:integer datatype and reference properties with
    /// the `@id` marker.
    pub fn context(&self) -> Context {
        let mut context = Context::new();
        for (name, spec) in self.schema.properties() {
            let def = spec.def();
            context.insert(
                name.clone(),
                ContextEntry {
                    id: self.schema.predicate_uri(name, def),
                    datatype: (def.literal_type == LiteralType::Integer)
                        .then(|| XSD_INTEGER.to_string()),
                    reference: def.literal_type == LiteralType::UriReference,
                },
            );
        }
        context
    }

    /// Convert raw triples into a single resource. When the triples
    /// describe several resources the first one wins; when they describe
    /// none, the empty resource is returned.
    pub fn to_resource(&self, triples: &[ParsedTriple]) -> LdResource {
        let subjects = group_by_subject(triples);
        match subjects.into_iter().next() {
            Some((subject, triples)) => self.compact(subject, &triples),
            None => LdResource::empty(self.context()),
        }
    }

    /// Convert raw triples into a collection: one member per distinct
    /// subject, in first-seen order. A single match is lifted into a
    /// one-element collection, no match yields an empty one.
    pub fn to_resource_list(&self, triples: &[ParsedTriple]) -> LdResourceList {
        let subjects = group_by_subject(triples);
        let graph = subjects
            .into_iter()
            .map(|(subject, triples)| self.compact(subject, &triples))
            .collect();
        LdResourceList::new(self.context(), graph)
    }

    /// Build a fresh resource in the `New` state straight from a value
    /// set, shaping every value to the schema's declared cardinality.
    /// Keys without a property definition are dropped.
    pub fn initial_resource(&self, values: &PropertyValues) -> LdResource {
        let mut properties = IndexMap::new();
        for (name, spec) in self.schema.properties() {
            let Some(value) = values.get(name) else {
                continue;
            };
            if let Some(value) = coerce_cardinality(value.clone(), spec) {
                properties.insert(name.clone(), value);
            }
        }
        for (name, _) in values.iter() {
            if self.schema.property(name).is_none() {
                warn!(property = %name, "dropping value without property definition");
            }
        }
        LdResource::new(
            self.schema.resource_uri(&values.identifier),
            self.schema.type_uri(),
            self.context(),
            properties,
            ResourceState::New,
        )
    }

    /// The inverse direction: copy every schema-matched property of a
    /// resource into a write-form value set, deriving the identifier from
    /// the trailing `/`-segment of the resource's `@id`. Populated
    /// references are written back as their `@id` URIs.
    ///
    /// An `@id` that cannot be split into namespace and local name
    /// degrades to an empty value set.
    // TODO: surface the malformed-@id case as an error instead of an
    // empty value set once callers can handle it.
    pub fn extract_values(resource: &LdResource) -> PropertyValues {
        let identifier = match resource.id.rsplit_once('/') {
            Some((_, local)) if !local.is_empty() => local.to_string(),
            _ => {
                warn!(id = %resource.id, "resource @id has no local name, extracting nothing");
                return PropertyValues::default();
            }
        };
        let mut values = PropertyValues::new(identifier);
        for (name, value) in &resource.properties {
            values.set(name.clone(), flatten_references(value.clone()));
        }
        values
    }

    fn compact(&self, subject: &str, triples: &[&ParsedTriple]) -> LdResource {
        let resource_type = triples
            .iter()
            .find(|t| t.predicate == RDF_TYPE)
            .and_then(|t| match &t.object {
                ParsedTerm::Iri(iri) => Some(iri.clone()),
                ParsedTerm::Literal { .. } => None,
            })
            .unwrap_or_else(|| self.schema.type_uri());

        let mut properties = IndexMap::new();
        for (name, spec) in self.schema.properties() {
            let def = spec.def();
            let predicate = self.schema.predicate_uri(name, def);
            let mut matched: Vec<Value> = triples
                .iter()
                .filter(|t| t.predicate == predicate)
                .map(|t| self.object_value(name, def.literal_type, &t.object))
                .collect();

            if spec.is_array() {
                properties.insert(name.clone(), PropertyValue::Array(matched));
            } else if matched.len() > 1 {
                warn!(
                    property = %name,
                    count = matched.len(),
                    "scalar property has multiple values in store result, keeping the first"
                );
                properties.insert(name.clone(), PropertyValue::Scalar(matched.remove(0)));
            } else if let Some(value) = matched.pop() {
                properties.insert(name.clone(), PropertyValue::Scalar(value));
            }
        }

        LdResource::new(
            subject.to_string(),
            resource_type,
            self.context(),
            properties,
            ResourceState::Persisted,
        )
    }

    fn object_value(&self, name: &str, literal_type: LiteralType, term: &ParsedTerm) -> Value {
        match term {
            ParsedTerm::Iri(iri) => Value::Uri(iri.clone()),
            ParsedTerm::Literal { value, datatype } => {
                let integer = literal_type == LiteralType::Integer
                    || datatype.as_deref() == Some(XSD_INTEGER);
                if integer {
                    match value.parse::<i64>() {
                        Ok(n) => Value::Integer(n),
                        Err(_) => {
                            warn!(property = %name, value = %value, "integer literal did not parse");
                            Value::String(value.clone())
                        }
                    }
                } else {
                    Value::String(value.clone())
                }
            }
        }
    }
}

/// Group triples by subject, preserving first-seen subject order.
fn group_by_subject(triples: &[ParsedTriple]) -> IndexMap<&str, Vec<&ParsedTriple>> {
    let mut subjects: IndexMap<&str, Vec<&ParsedTriple>> = IndexMap::new();
    for triple in triples {
        subjects.entry(&triple.subject).or_default().push(triple);
    }
    subjects
}

fn coerce_cardinality(value: PropertyValue, spec: &PropertySpec) -> Option<PropertyValue> {
    match (spec.is_array(), value) {
        (true, PropertyValue::Scalar(v)) => Some(PropertyValue::Array(vec![v])),
        (false, PropertyValue::Array(mut vs)) => {
            if vs.len() > 1 {
                warn!("array value given for scalar property, keeping the first element");
            }
            vs.drain(..).next().map(PropertyValue::Scalar)
        }
        (_, value) => Some(value),
    }
}

fn flatten_references(value: PropertyValue) -> PropertyValue {
    fn flatten(v: Value) -> Value {
        match v {
            Value::Resource(res) => Value::Uri(res.id.clone()),
            other => other,
        }
    }
    match value {
        PropertyValue::Scalar(v) => PropertyValue::Scalar(flatten(v)),
        PropertyValue::Array(vs) => PropertyValue::Array(vs.into_iter().map(flatten).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::PropertyDef;

    fn person_schema() -> ResourceSchema {
        ResourceSchema::builder("Person", "http://schema.org/")
            .prefix("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#")
            .prefix("schema", "http://schema.org/")
            .property("firstname", PropertyDef::new("rdf"))
            .property("lastname", PropertyDef::new("rdf"))
            .property("age", PropertyDef::new("schema").integer())
            .build()
            .unwrap()
    }

    fn blog_schema() -> ResourceSchema {
        ResourceSchema::builder("Blog", "http://schema.org/")
            .prefix("schema", "http://schema.org/")
            .property("title", PropertyDef::new("schema"))
            .array_property(
                "comment",
                PropertyDef::new("schema").optional().reference("Comment"),
            )
            .build()
            .unwrap()
    }

    const DANIEL_NQUADS: &str = "\
<http://schema.org/Person/DanielFott> <http://www.w3.org/1999/02/22-rdf-syntax-ns#firstname> \"Daniel\" .
<http://schema.org/Person/DanielFott> <http://www.w3.org/1999/02/22-rdf-syntax-ns#lastname> \"Fott\" .
<http://schema.org/Person/DanielFott> <http://schema.org/age> \"20\"^^<http://www.w3.org/2001/XMLSchema#integer> .
<http://schema.org/Person/DanielFott> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://schema.org/Person> .
";

    #[test]
    fn test_to_resource_compacts_predicates() {
        let schema = person_schema();
        let converter = LdConverter::new(&schema);
        let triples = parse_nquads(DANIEL_NQUADS).unwrap();
        let resource = converter.to_resource(&triples);

        assert_eq!(resource.id, "http://schema.org/Person/DanielFott");
        assert_eq!(resource.resource_type, "http://schema.org/Person");
        assert_eq!(
            resource.get("firstname"),
            Some(&PropertyValue::Scalar(Value::String("Daniel".into())))
        );
        assert_eq!(
            resource.get("age"),
            Some(&PropertyValue::Scalar(Value::Integer(20)))
        );
        assert!(!resource.is_new());
    }

    #[test]
    fn test_to_resource_on_empty_input() {
        let schema = person_schema();
        let converter = LdConverter::new(&schema);
        let resource = converter.to_resource(&[]);
        assert!(resource.is_empty());
    }

    #[test]
    fn test_array_property_always_decodes_to_sequence() {
        let schema = blog_schema();
        let converter = LdConverter::new(&schema);
        // one comment triple only: scalar in the store, array per schema
        let input = "\
<http://schema.org/Blog/blog1> <http://schema.org/title> \"Mein erster Blog\" .
<http://schema.org/Blog/blog1> <http://schema.org/comment> <http://schema.org/Comment/comment1> .
<http://schema.org/Blog/blog1> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://schema.org/Blog> .
";
        let triples = parse_nquads(input).unwrap();
        let resource = converter.to_resource(&triples);
        assert_eq!(
            resource.get("comment"),
            Some(&PropertyValue::Array(vec![Value::Uri(
                "http://schema.org/Comment/comment1".into()
            )]))
        );

        // no comment triple at all: still a sequence, length zero
        let input = "\
<http://schema.org/Blog/blog3> <http://schema.org/title> \"Leer\" .
<http://schema.org/Blog/blog3> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://schema.org/Blog> .
";
        let triples = parse_nquads(input).unwrap();
        let resource = converter.to_resource(&triples);
        assert_eq!(resource.get("comment"), Some(&PropertyValue::Array(vec![])));
    }

    #[test]
    fn test_to_resource_list_lifts_single_match() {
        let schema = person_schema();
        let converter = LdConverter::new(&schema);
        let triples = parse_nquads(DANIEL_NQUADS).unwrap();
        let list = converter.to_resource_list(&triples);
        assert_eq!(list.len(), 1);
        assert_eq!(list.graph[0].id, "http://schema.org/Person/DanielFott");
    }

    #[test]
    fn test_to_resource_list_groups_subjects() {
        let schema = person_schema();
        let converter = LdConverter::new(&schema);
        let input = format!(
            "{DANIEL_NQUADS}\
<http://schema.org/Person/PeterTest> <http://www.w3.org/1999/02/22-rdf-syntax-ns#firstname> \"Peter\" .
<http://schema.org/Person/PeterTest> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://schema.org/Person> .
"
        );
        let triples = parse_nquads(&input).unwrap();
        let list = converter.to_resource_list(&triples);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_to_resource_list_empty() {
        let schema = person_schema();
        let converter = LdConverter::new(&schema);
        let list = converter.to_resource_list(&[]);
        assert!(list.is_empty());
    }

    #[test]
    fn test_initial_resource_coerces_cardinality() {
        let schema = blog_schema();
        let converter = LdConverter::new(&schema);
        let values = PropertyValues::new("blog1")
            .with("title", "Mein erster Blog")
            .with("comment", "http://schema.org/Comment/comment1");
        let resource = converter.initial_resource(&values);

        assert!(resource.is_new());
        assert_eq!(resource.id, "http://schema.org/Blog/blog1");
        assert_eq!(resource.resource_type, "http://schema.org/Blog");
        assert_eq!(
            resource.get("comment"),
            Some(&PropertyValue::Array(vec![Value::String(
                "http://schema.org/Comment/comment1".into()
            )]))
        );
    }

    #[test]
    fn test_initial_resource_drops_unknown_keys() {
        let schema = person_schema();
        let converter = LdConverter::new(&schema);
        let values = PropertyValues::new("x")
            .with("firstname", "Daniel")
            .with("nickname", "Dan");
        let resource = converter.initial_resource(&values);
        assert!(resource.get("nickname").is_none());
    }

    #[test]
    fn test_extract_values_roundtrip() {
        let schema = person_schema();
        let converter = LdConverter::new(&schema);
        let triples = parse_nquads(DANIEL_NQUADS).unwrap();
        let resource = converter.to_resource(&triples);
        let values = LdConverter::extract_values(&resource);

        assert_eq!(values.identifier, "DanielFott");
        assert_eq!(
            values.get("firstname"),
            Some(&PropertyValue::Scalar(Value::String("Daniel".into())))
        );
        assert_eq!(
            values.get("age"),
            Some(&PropertyValue::Scalar(Value::Integer(20)))
        );
    }

    #[test]
    fn test_extract_values_malformed_id_degrades_to_empty() {
        let schema = person_schema();
        let converter = LdConverter::new(&schema);
        let mut resource = converter.to_resource(&[]);
        resource.id = "urn:opaque".to_string();
        let values = LdConverter::extract_values(&resource);
        assert!(values.identifier.is_empty());
        assert!(values.is_empty());
    }

    #[test]
    fn test_context_tags_types() {
        let schema = blog_schema();
        let converter = LdConverter::new(&schema);
        let context = converter.context();
        assert!(context.get("comment").unwrap().reference);
        assert_eq!(
            context.get("title").unwrap().id,
            "http://schema.org/title"
        );

        let schema = person_schema();
        let converter = LdConverter::new(&schema);
        let context = converter.context();
        assert_eq!(
            context.get("age").unwrap().datatype.as_deref(),
            Some("http://www.w3.org/2001/XMLSchema#integer")
        );
    }
}
