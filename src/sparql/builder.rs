//! Query shapes
//!
//! [`QueryBuilder`] assembles the text fragments from [`super::text`]
//! into the five query shapes the mapper needs: `INSERT DATA`,
//! `delete/insert/where`, `construct/where` (plain, filtered, or anchored
//! to one identifier), `delete/where`, and the scoped update used by the
//! filtered update operations.

use super::text::{
    construct_clause, filter_clause, identifier_anchor, insert_triples, prefix_clause, render_term,
    where_clause,
};
use super::{FindFilters, QueryError, QueryResult, UpdateValues};
use crate::resource::PropertyValues;
use crate::schema::{ResourceSchema, SchemaRegistry};

/// Builds SPARQL query and update text for one schema.
pub struct QueryBuilder<'a> {
    schema: &'a ResourceSchema,
    registry: &'a SchemaRegistry,
}

impl<'a> QueryBuilder<'a> {
    /// Create a builder for the given schema. The registry resolves
    /// URI-reference properties to the schemas they point at.
    pub fn new(schema: &'a ResourceSchema, registry: &'a SchemaRegistry) -> Self {
        Self { schema, registry }
    }

    /// Builds an `INSERT DATA` update inserting one resource.
    pub fn build_insert(&self, values: &PropertyValues) -> QueryResult<String> {
        let triples = insert_triples(self.schema, values, self.registry)?;
        Ok(format!(
            "{}\n\nINSERT DATA {{\n{}\n}}",
            prefix_clause(self.schema.prefixes()),
            triples
        ))
    }

    /// Builds a `delete`/`insert`/`where` update that deletes every tuple
    /// describing the resource and reinserts the given values. The full
    /// delete-and-reinsert uniformly covers additions, removals and value
    /// changes for scalar and array properties alike.
    pub fn build_update(&self, values: &PropertyValues) -> QueryResult<String> {
        if values.identifier.is_empty() {
            return Err(QueryError::MissingIdentifier);
        }
        let triples = insert_triples(self.schema, values, self.registry)?;
        let pattern = where_clause(self.schema);
        Ok(format!(
            "{}\n\ndelete {{\n{}\n}}\ninsert {{\n{}\n}}\nwhere {{\n{}\n{}\n}}",
            prefix_clause(self.schema.prefixes()),
            pattern,
            triples,
            pattern,
            identifier_anchor(self.schema, &values.identifier),
        ))
    }

    /// Builds a scoped update that rewrites only the given properties on
    /// every resource matching the filters (or on every resource of the
    /// type when no filters are given).
    pub fn build_update_filtered(
        &self,
        values: &UpdateValues,
        filters: Option<&FindFilters>,
    ) -> QueryResult<String> {
        let filter_lines = match filters {
            Some(filters) => Some(filter_clause(self.schema, filters)?),
            None => None,
        };
        self.build_scoped_update(values, filter_lines)
    }

    /// Builds a scoped update rewriting only the given properties on the
    /// resource with the given identifier.
    pub fn build_update_by_identifier(
        &self,
        identifier: &str,
        values: &UpdateValues,
    ) -> QueryResult<String> {
        if identifier.is_empty() {
            return Err(QueryError::MissingIdentifier);
        }
        let anchor = identifier_anchor(self.schema, identifier);
        self.build_scoped_update(values, Some(anchor))
    }

    fn build_scoped_update(
        &self,
        values: &UpdateValues,
        extra_where: Option<String>,
    ) -> QueryResult<String> {
        if values.is_empty() {
            return Err(QueryError::EmptyUpdate);
        }
        let subject = self.schema.resource_type();
        let mut delete_lines = Vec::new();
        let mut insert_lines = Vec::new();
        for (name, value) in values {
            let spec = self
                .schema
                .property(name)
                .ok_or_else(|| QueryError::UnknownProperty(name.clone()))?;
            let def = spec.def();
            delete_lines.push(format!("?{subject} {}:{name} ?{name}", def.prefix));
            for element in value.values() {
                let term = render_term(def, element, self.registry)?;
                insert_lines.push(format!("?{subject} {}:{name} {term}", def.prefix));
            }
        }
        let mut where_block = where_clause(self.schema);
        if let Some(extra) = extra_where {
            where_block.push('\n');
            where_block.push_str(&extra);
        }
        let delete_block = delete_lines.join(" .\n") + " .";
        // An empty-array value deletes without reinserting; the insert
        // template may legitimately end up empty.
        let insert_block = if insert_lines.is_empty() {
            String::new()
        } else {
            insert_lines.join(" .\n") + " ."
        };
        Ok(format!(
            "{}\n\ndelete {{\n{}\n}}\ninsert {{\n{}\n}}\nwhere {{\n{}\n}}",
            prefix_clause(self.schema.prefixes()),
            delete_block,
            insert_block,
            where_block,
        ))
    }

    /// Builds a `construct` query matching every resource of the type.
    pub fn build_find(&self) -> String {
        format!(
            "{}\n\nconstruct {{\n{}\n}}\nwhere {{\n{}\n}}",
            prefix_clause(self.schema.prefixes()),
            construct_clause(self.schema),
            where_clause(self.schema),
        )
    }

    /// Builds a `construct` query narrowed by equality filters.
    pub fn build_find_filtered(&self, filters: &FindFilters) -> QueryResult<String> {
        Ok(format!(
            "{}\n\nconstruct {{\n{}\n}}\nwhere {{\n{}\n{}\n}}",
            prefix_clause(self.schema.prefixes()),
            construct_clause(self.schema),
            where_clause(self.schema),
            filter_clause(self.schema, filters)?,
        ))
    }

    /// Builds a `construct` query anchored to one identifier.
    pub fn build_find_by_identifier(&self, identifier: &str) -> String {
        format!(
            "{}\n\nconstruct {{\n{}\n}}\nwhere {{\n{}\n{}\n}}",
            prefix_clause(self.schema.prefixes()),
            construct_clause(self.schema),
            where_clause(self.schema),
            identifier_anchor(self.schema, identifier),
        )
    }

    /// Builds a `delete`/`where` update removing every resource of the
    /// type.
    pub fn build_delete(&self) -> String {
        let pattern = where_clause(self.schema);
        format!(
            "{}\n\ndelete {{\n{}\n}} where {{\n{}\n}}",
            prefix_clause(self.schema.prefixes()),
            pattern,
            pattern,
        )
    }

    /// Builds a `delete`/`where` update narrowed by equality filters.
    pub fn build_delete_filtered(&self, filters: &FindFilters) -> QueryResult<String> {
        let pattern = where_clause(self.schema);
        Ok(format!(
            "{}\n\ndelete {{\n{}\n}} where {{\n{}\n{}\n}}",
            prefix_clause(self.schema.prefixes()),
            pattern,
            pattern,
            filter_clause(self.schema, filters)?,
        ))
    }

    /// Builds a `delete`/`where` update removing the resource with the
    /// given identifier.
    pub fn build_delete_by_identifier(&self, identifier: &str) -> String {
        let pattern = where_clause(self.schema);
        format!(
            "{}\n\ndelete {{\n{}\n}} where {{\n{}\n{}\n}}",
            prefix_clause(self.schema.prefixes()),
            pattern,
            pattern,
            identifier_anchor(self.schema, identifier),
        )
    }
}
