//! SPARQL text fragments
//!
//! The building blocks the query shapes are assembled from: the prefix
//! block, the shared graph pattern, insert triples, filter lines and the
//! identifier anchor. Each function is a pure function of the schema and
//! its inputs.

use super::{FilterValue, FindFilters, QueryError, QueryResult};
use crate::resource::{PropertyValues, Value};
use crate::schema::{LiteralType, PropertyDef, ResourceSchema, SchemaRegistry};
use indexmap::IndexMap;

/// Generates the prefix declaration block: one `PREFIX` line per declared
/// prefix, in declaration order.
pub fn prefix_clause(prefixes: &IndexMap<String, String>) -> String {
    prefixes
        .iter()
        .map(|(prefix, namespace)| format!("PREFIX {prefix}: <{namespace}>"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Generates the basic graph pattern used in `where` clauses: one tuple
/// per property, optional properties wrapped in `OPTIONAL`, closed by the
/// type anchor tuple.
pub fn where_clause(schema: &ResourceSchema) -> String {
    let subject = schema.resource_type();
    schema
        .properties()
        .iter()
        .map(|(name, spec)| {
            let def = spec.def();
            let tuple = format!("?{subject} {}:{name} ?{name}", def.prefix);
            if def.optional {
                format!("OPTIONAL {{ {tuple} }}")
            } else {
                tuple
            }
        })
        .collect::<Vec<_>>()
        .join(" .\n")
        + &format!(" .\n?{subject} a ?type .")
}

/// Generates the graph pattern for `construct` clauses. Same tuples as
/// [`where_clause`], but never wrapped in `OPTIONAL`, since `construct`
/// templates take no filters.
pub fn construct_clause(schema: &ResourceSchema) -> String {
    let subject = schema.resource_type();
    schema
        .properties()
        .iter()
        .map(|(name, spec)| format!("?{subject} {}:{name} ?{name}", spec.def().prefix))
        .collect::<Vec<_>>()
        .join(" .\n")
        + &format!(" .\n?{subject} a ?type .")
}

/// Generates one bound tuple per filter entry, conjoined after the graph
/// pattern of a filtered query.
pub fn filter_clause(schema: &ResourceSchema, filters: &FindFilters) -> QueryResult<String> {
    let subject = schema.resource_type();
    let lines = filters
        .iter()
        .map(|(name, value)| {
            let spec = schema
                .property(name)
                .ok_or_else(|| QueryError::UnknownFilterProperty(name.clone()))?;
            let rendered = match value {
                FilterValue::String(s) => format!("\"{}\"", escape_literal(s)),
                FilterValue::Integer(n) => n.to_string(),
            };
            Ok(format!(
                "?{subject} {}:{name} {rendered} .",
                spec.def().prefix
            ))
        })
        .collect::<QueryResult<Vec<_>>>()?;
    Ok(lines.join("\n"))
}

/// Generates the anchor tuple binding the graph pattern's subject
/// variable to one concrete resource, via the schema's first declared
/// property.
pub fn identifier_anchor(schema: &ResourceSchema, identifier: &str) -> String {
    let uri = schema.resource_uri(identifier);
    match schema.properties().first() {
        Some((name, spec)) => {
            format!("<{uri}> {}:{name} ?{name}", spec.def().prefix)
        }
        None => format!("<{uri}> a ?type"),
    }
}

/// Generates the triple block of an insert: the `rdf:type` triple first,
/// then one triple per property in schema declaration order, one per
/// element for array values.
///
/// Fails without emitting anything if the identifier is missing, a value
/// key has no property definition, or a required property has no value.
pub fn insert_triples(
    schema: &ResourceSchema,
    values: &PropertyValues,
    registry: &SchemaRegistry,
) -> QueryResult<String> {
    if values.identifier.is_empty() {
        return Err(QueryError::MissingIdentifier);
    }
    for (name, _) in values.iter() {
        if schema.property(name).is_none() {
            return Err(QueryError::UnknownProperty(name.clone()));
        }
    }

    let uri = schema.resource_uri(&values.identifier);
    let mut triples = vec![format!("<{uri}> a <{}>", schema.type_uri())];

    for (name, spec) in schema.properties() {
        let def = spec.def();
        let value = values.get(name).filter(|v| !is_blank(v));
        let Some(value) = value else {
            if def.optional {
                continue;
            }
            return Err(QueryError::MissingValue(name.clone()));
        };
        for element in value.values() {
            let term = render_term(def, element, registry)?;
            triples.push(format!("<{uri}> {}:{name} {term}", def.prefix));
        }
    }

    Ok(triples.join(" .\n") + " .")
}

/// Appends a `LIMIT` clause; used to implement "find exactly one".
pub fn limit(n: usize, query: &str) -> String {
    format!("{query}\nLIMIT {n}")
}

/// Renders one value as a SPARQL term: strings quoted, integers bare,
/// URI references angle-bracketed. Reference values that are not already
/// absolute URIs are expanded through the referenced schema's URI scheme,
/// not the owning schema's.
pub(crate) fn render_term(
    def: &PropertyDef,
    value: &Value,
    registry: &SchemaRegistry,
) -> QueryResult<String> {
    match value {
        Value::Integer(n) => Ok(n.to_string()),
        Value::Uri(uri) => Ok(format!("<{uri}>")),
        Value::Resource(res) => Ok(format!("<{}>", res.id)),
        Value::String(s) => {
            if def.literal_type == LiteralType::UriReference {
                Ok(format!("<{}>", expand_reference(def, s, registry)?))
            } else {
                Ok(format!("\"{}\"", escape_literal(s)))
            }
        }
    }
}

fn expand_reference(
    def: &PropertyDef,
    value: &str,
    registry: &SchemaRegistry,
) -> QueryResult<String> {
    if value.contains("://") {
        return Ok(value.to_string());
    }
    let target = def.reference.as_deref().unwrap_or_default();
    let referenced = registry
        .get(target)
        .ok_or_else(|| QueryError::UnknownReference(target.to_string()))?;
    Ok(referenced.resource_uri(value))
}

fn is_blank(value: &crate::resource::PropertyValue) -> bool {
    use crate::resource::PropertyValue;
    match value {
        PropertyValue::Scalar(Value::String(s)) => s.is_empty(),
        PropertyValue::Scalar(_) => false,
        PropertyValue::Array(vs) => vs.is_empty(),
    }
}

fn escape_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::PropertyDef;

    fn prefixes() -> IndexMap<String, String> {
        let mut prefixes = IndexMap::new();
        prefixes.insert(
            "rdf".to_string(),
            "http://www.w3.org/1999/02/22-rdf-syntax-ns#".to_string(),
        );
        prefixes.insert("foaf".to_string(), "http://xmlns.com/foaf/0.1/".to_string());
        prefixes.insert(
            "owl".to_string(),
            "http://www.w3.org/2002/07/owl#".to_string(),
        );
        prefixes.insert("schema".to_string(), "http://schema.org/".to_string());
        prefixes
    }

    fn person_schema() -> ResourceSchema {
        ResourceSchema::builder("Person", "http://schema.org/")
            .prefix("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#")
            .prefix("foaf", "http://xmlns.com/foaf/0.1/")
            .prefix("owl", "http://www.w3.org/2002/07/owl#")
            .prefix("schema", "http://schema.org/")
            .property("firstname", PropertyDef::new("rdf"))
            .property("lastname", PropertyDef::new("rdf"))
            .property("age", PropertyDef::new("schema").integer())
            .build()
            .unwrap()
    }

    fn person_schema_advanced() -> ResourceSchema {
        ResourceSchema::builder("Person", "http://schema.org/")
            .prefix("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#")
            .property("firstname", PropertyDef::new("rdf"))
            .property("lastname", PropertyDef::new("rdf"))
            .property("knows", PropertyDef::new("rdf").optional())
            .build()
            .unwrap()
    }

    fn blog_schema() -> (ResourceSchema, SchemaRegistry) {
        let registry = SchemaRegistry::new();
        let comment = ResourceSchema::builder("Comment", "http://schema.org/")
            .prefix("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#")
            .property("content", PropertyDef::new("rdf"))
            .build()
            .unwrap();
        registry.register(std::sync::Arc::new(comment));
        let blog = ResourceSchema::builder("Blog", "http://schema.org/")
            .prefix("schema", "http://schema.org/")
            .property("title", PropertyDef::new("schema"))
            .array_property(
                "comment",
                PropertyDef::new("schema").optional().reference("Comment"),
            )
            .build()
            .unwrap();
        (blog, registry)
    }

    #[test]
    fn test_prefix_clause() {
        let expected = "\
PREFIX rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#>
PREFIX foaf: <http://xmlns.com/foaf/0.1/>
PREFIX owl: <http://www.w3.org/2002/07/owl#>
PREFIX schema: <http://schema.org/>";
        assert_eq!(prefix_clause(&prefixes()), expected);
    }

    #[test]
    fn test_where_clause() {
        let expected = "\
?Person rdf:firstname ?firstname .
?Person rdf:lastname ?lastname .
?Person schema:age ?age .
?Person a ?type .";
        assert_eq!(where_clause(&person_schema()), expected);
    }

    #[test]
    fn test_where_clause_wraps_optional_properties() {
        let expected = "\
?Person rdf:firstname ?firstname .
?Person rdf:lastname ?lastname .
OPTIONAL { ?Person rdf:knows ?knows } .
?Person a ?type .";
        assert_eq!(where_clause(&person_schema_advanced()), expected);
    }

    #[test]
    fn test_construct_clause_never_wraps() {
        let expected = "\
?Person rdf:firstname ?firstname .
?Person rdf:lastname ?lastname .
?Person rdf:knows ?knows .
?Person a ?type .";
        assert_eq!(construct_clause(&person_schema_advanced()), expected);
    }

    #[test]
    fn test_insert_triples() {
        let values = PropertyValues::new("DanielFott")
            .with("firstname", "Daniel")
            .with("lastname", "Fott")
            .with("age", 20);
        let expected = "\
<http://schema.org/Person/DanielFott> a <http://schema.org/Person> .
<http://schema.org/Person/DanielFott> rdf:firstname \"Daniel\" .
<http://schema.org/Person/DanielFott> rdf:lastname \"Fott\" .
<http://schema.org/Person/DanielFott> schema:age 20 .";
        let triples = insert_triples(&person_schema(), &values, &SchemaRegistry::new()).unwrap();
        assert_eq!(triples, expected);
    }

    #[test]
    fn test_insert_triples_expands_references() {
        let (blog, registry) = blog_schema();
        let values = PropertyValues::new("blog1")
            .with("title", "Mein erster Blog")
            .with("comment", vec!["comment1"]);
        let expected = "\
<http://schema.org/Blog/blog1> a <http://schema.org/Blog> .
<http://schema.org/Blog/blog1> schema:title \"Mein erster Blog\" .
<http://schema.org/Blog/blog1> schema:comment <http://schema.org/Comment/comment1> .";
        assert_eq!(insert_triples(&blog, &values, &registry).unwrap(), expected);
    }

    #[test]
    fn test_insert_triples_one_per_array_element() {
        let (blog, registry) = blog_schema();
        let values = PropertyValues::new("blog2")
            .with("title", "Mein zweiter Blog")
            .with(
                "comment",
                vec![
                    "http://schema.org/Comment/comment1",
                    "http://schema.org/Comment/comment2",
                ],
            );
        let expected = "\
<http://schema.org/Blog/blog2> a <http://schema.org/Blog> .
<http://schema.org/Blog/blog2> schema:title \"Mein zweiter Blog\" .
<http://schema.org/Blog/blog2> schema:comment <http://schema.org/Comment/comment1> .
<http://schema.org/Blog/blog2> schema:comment <http://schema.org/Comment/comment2> .";
        assert_eq!(insert_triples(&blog, &values, &registry).unwrap(), expected);
    }

    #[test]
    fn test_insert_triples_missing_identifier() {
        let values = PropertyValues::new("").with("firstname", "Daniel");
        let result = insert_triples(&person_schema(), &values, &SchemaRegistry::new());
        assert_eq!(result, Err(QueryError::MissingIdentifier));
    }

    #[test]
    fn test_insert_triples_missing_required_value() {
        let values = PropertyValues::new("DanielFott").with("firstname", "Daniel");
        let result = insert_triples(&person_schema(), &values, &SchemaRegistry::new());
        assert_eq!(result, Err(QueryError::MissingValue("lastname".to_string())));
    }

    #[test]
    fn test_insert_triples_unknown_property() {
        let values = PropertyValues::new("DanielFott")
            .with("firstname", "Daniel")
            .with("lastname", "Fott")
            .with("age", 20)
            .with("nickname", "Dan");
        let result = insert_triples(&person_schema(), &values, &SchemaRegistry::new());
        assert_eq!(
            result,
            Err(QueryError::UnknownProperty("nickname".to_string()))
        );
    }

    #[test]
    fn test_insert_triples_unregistered_reference() {
        let blog = ResourceSchema::builder("Blog", "http://schema.org/")
            .prefix("schema", "http://schema.org/")
            .property("title", PropertyDef::new("schema"))
            .array_property("comment", PropertyDef::new("schema").reference("Comment"))
            .build()
            .unwrap();
        let values = PropertyValues::new("blog1")
            .with("title", "Titel")
            .with("comment", vec!["comment1"]);
        let result = insert_triples(&blog, &values, &SchemaRegistry::new());
        assert_eq!(
            result,
            Err(QueryError::UnknownReference("Comment".to_string()))
        );
    }

    #[test]
    fn test_filter_clause() {
        let mut filters = FindFilters::new();
        filters.insert("age".to_string(), 20.into());
        assert_eq!(
            filter_clause(&person_schema(), &filters).unwrap(),
            "?Person schema:age 20 ."
        );
    }

    #[test]
    fn test_filter_clause_unknown_property() {
        let mut filters = FindFilters::new();
        filters.insert("nickname".to_string(), "Dan".into());
        assert_eq!(
            filter_clause(&person_schema(), &filters),
            Err(QueryError::UnknownFilterProperty("nickname".to_string()))
        );
    }

    #[test]
    fn test_identifier_anchor_uses_first_property() {
        assert_eq!(
            identifier_anchor(&person_schema(), "DanielFott"),
            "<http://schema.org/Person/DanielFott> rdf:firstname ?firstname"
        );
    }

    #[test]
    fn test_limit() {
        assert_eq!(limit(1, "construct { }"), "construct { }\nLIMIT 1");
    }

    #[test]
    fn test_string_literals_are_escaped() {
        let values = PropertyValues::new("q").with("title", "say \"hi\"");
        let (blog, registry) = blog_schema();
        let triples = insert_triples(&blog, &values, &registry).unwrap();
        assert!(triples.contains("\"say \\\"hi\\\"\""));
    }
}
