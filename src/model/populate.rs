//! Reference resolution
//!
//! `populate` turns the URI values of a reference property into the
//! materialized resources they point at: one concurrent lookup per
//! reference occurrence against the referenced model, joined
//! all-or-nothing, then spliced back into the original slots by matching
//! each result's `@id` against the reference URI it came from.

use super::{Model, ModelError, ModelResult};
use crate::resource::{LdResource, LdResourceList, Value};
use crate::schema::LiteralType;
use futures::future::try_join_all;
use std::collections::HashMap;
use tracing::{debug, warn};

impl LdResource {
    /// Materialize the resources referenced by `property`, replacing the
    /// reference URIs in place. Fails if the property is not a declared
    /// URI reference, or if any underlying lookup fails (no partial
    /// results).
    pub async fn populate(&mut self, property: &str) -> ModelResult<()> {
        let model = self.model().cloned().ok_or(ModelError::Detached)?;
        let target = referenced_model(&model, property)?;
        let uris = reference_uris(std::iter::once(&*self), property);
        let resolved = resolve_all(&target, uris).await?;
        splice(std::iter::once(&mut *self), property, &resolved);
        Ok(())
    }
}

impl LdResourceList {
    /// Materialize the resources referenced by `property` across every
    /// member of the collection. One lookup is issued per occurrence;
    /// occurrences pointing at the same target all receive the same
    /// materialized content.
    pub async fn populate(&mut self, property: &str) -> ModelResult<()> {
        let Some(model) = self.graph.iter().find_map(|r| r.model().cloned()) else {
            // nothing to populate in an empty collection
            return Ok(());
        };
        let target = referenced_model(&model, property)?;
        let uris = reference_uris(self.graph.iter(), property);
        let resolved = resolve_all(&target, uris).await?;
        splice(self.graph.iter_mut(), property, &resolved);
        Ok(())
    }
}

/// Check that the property is a populatable reference and build a model
/// for its target type.
fn referenced_model(model: &Model, property: &str) -> ModelResult<Model> {
    let def = model
        .schema()
        .property(property)
        .ok_or_else(|| ModelError::NotPopulatable(property.to_string()))?
        .def();
    if def.literal_type != LiteralType::UriReference {
        return Err(ModelError::NotPopulatable(property.to_string()));
    }
    let target = def.reference.as_deref().unwrap_or_default();
    let schema = model
        .registry()
        .get(target)
        .ok_or_else(|| ModelError::UnknownReference(target.to_string()))?;
    Ok(Model::for_schema(
        schema,
        model.transport().clone(),
        model.registry().clone(),
    ))
}

/// Collect every reference URI under `property`, one entry per
/// occurrence. Duplicates are kept: results are matched back by identity
/// afterwards, so issuing them separately costs round trips, not
/// correctness.
fn reference_uris<'a>(
    resources: impl Iterator<Item = &'a LdResource>,
    property: &str,
) -> Vec<String> {
    resources
        .filter_map(|resource| resource.get(property))
        .flat_map(|value| value.values())
        .filter_map(|value| value.reference_uri().map(str::to_string))
        .collect()
}

/// Fan out one `find_by_identifier` per occurrence and join on all of
/// them, failing fast on the first error.
async fn resolve_all(target: &Model, uris: Vec<String>) -> ModelResult<HashMap<String, LdResource>> {
    debug!(
        resource_type = %target.schema().resource_type(),
        lookups = uris.len(),
        "resolving references"
    );
    let lookups = uris.iter().map(|uri| {
        let target = target.clone();
        let identifier = local_name(uri);
        async move { target.find_by_identifier(&identifier).await }
    });
    let resolved = try_join_all(lookups).await?;
    Ok(uris.into_iter().zip(resolved).collect())
}

/// Replace every reference slot whose URI resolved with the materialized
/// resource. Slots whose lookup came back empty keep their URI.
fn splice<'a>(
    resources: impl Iterator<Item = &'a mut LdResource>,
    property: &str,
    resolved: &HashMap<String, LdResource>,
) {
    for resource in resources {
        let Some(value) = resource.properties.get_mut(property) else {
            continue;
        };
        for slot in value.values_mut() {
            let Some(uri) = slot.reference_uri().map(str::to_string) else {
                continue;
            };
            match resolved.get(&uri).filter(|found| found.id == uri) {
                Some(found) => *slot = Value::Resource(Box::new(found.clone())),
                None => {
                    warn!(reference = %uri, "reference did not resolve, keeping the URI");
                }
            }
        }
    }
}

fn local_name(uri: &str) -> String {
    uri.rsplit('/').next().unwrap_or(uri).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_name() {
        assert_eq!(local_name("http://schema.org/Comment/comment1"), "comment1");
        assert_eq!(local_name("comment1"), "comment1");
    }
}
