//! N-Quads parsing
//!
//! CONSTRUCT results come back from the transport as `application/n-quads`
//! text. This module parses that into owned triples the converter can
//! work on without borrowing the response body.

use super::{CodecError, CodecResult};
use rio_api::model::{Literal, Subject, Term};
use rio_api::parser::QuadsParser;
use rio_turtle::{NQuadsParser, TurtleError};

/// One parsed statement with owned strings.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTriple {
    /// Subject URI (blank nodes keep their `_:` label)
    pub subject: String,
    /// Predicate URI
    pub predicate: String,
    /// Object term
    pub object: ParsedTerm,
}

/// The object position of a parsed statement.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedTerm {
    /// An IRI (or blank-node label)
    Iri(String),
    /// A literal with its datatype, if typed
    Literal {
        value: String,
        datatype: Option<String>,
    },
}

/// Parse an N-Quads document into owned triples, dropping graph labels.
/// RDF-star terms are not part of the wire contract and are skipped.
pub fn parse_nquads(input: &str) -> CodecResult<Vec<ParsedTriple>> {
    let mut triples = Vec::new();
    let mut parser = NQuadsParser::new(input.as_bytes());
    let result: Result<(), TurtleError> = parser.parse_all(&mut |quad| {
        let subject = match quad.subject {
            Subject::NamedNode(n) => n.iri.to_string(),
            Subject::BlankNode(b) => format!("_:{}", b.id),
            Subject::Triple(_) => return Ok(()),
        };
        let object = match quad.object {
            Term::NamedNode(n) => ParsedTerm::Iri(n.iri.to_string()),
            Term::BlankNode(b) => ParsedTerm::Iri(format!("_:{}", b.id)),
            Term::Literal(Literal::Simple { value }) => ParsedTerm::Literal {
                value: value.to_string(),
                datatype: None,
            },
            Term::Literal(Literal::LanguageTaggedString { value, .. }) => ParsedTerm::Literal {
                value: value.to_string(),
                datatype: None,
            },
            Term::Literal(Literal::Typed { value, datatype }) => ParsedTerm::Literal {
                value: value.to_string(),
                datatype: Some(datatype.iri.to_string()),
            },
            Term::Triple(_) => return Ok(()),
        };
        triples.push(ParsedTriple {
            subject,
            predicate: quad.predicate.iri.to_string(),
            object,
        });
        Ok(())
    });
    result.map_err(|e| CodecError::Parse(e.to_string()))?;
    Ok(triples)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_typed_and_plain_literals() {
        let input = r#"<http://schema.org/Person/DanielFott> <http://www.w3.org/1999/02/22-rdf-syntax-ns#firstname> "Daniel" .
<http://schema.org/Person/DanielFott> <http://schema.org/age> "20"^^<http://www.w3.org/2001/XMLSchema#integer> .
<http://schema.org/Person/DanielFott> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://schema.org/Person> .
"#;
        let triples = parse_nquads(input).unwrap();
        assert_eq!(triples.len(), 3);
        assert_eq!(triples[0].subject, "http://schema.org/Person/DanielFott");
        assert_eq!(
            triples[0].object,
            ParsedTerm::Literal {
                value: "Daniel".to_string(),
                datatype: None,
            }
        );
        assert_eq!(
            triples[1].object,
            ParsedTerm::Literal {
                value: "20".to_string(),
                datatype: Some("http://www.w3.org/2001/XMLSchema#integer".to_string()),
            }
        );
        assert_eq!(
            triples[2].object,
            ParsedTerm::Iri("http://schema.org/Person".to_string())
        );
    }

    #[test]
    fn test_parse_empty_document() {
        assert!(parse_nquads("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_error_is_reported() {
        let result = parse_nquads("this is not n-quads");
        assert!(matches!(result, Err(CodecError::Parse(_))));
    }
}
