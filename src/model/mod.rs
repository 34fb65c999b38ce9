//! Resource lifecycle facade
//!
//! [`Model`] is what callers hold: one per resource type, owning the
//! schema, the transport, the schema registry and the pre-save hooks.
//! Every CRUD operation routes through the synthesizer for its query
//! text, the transport for execution, and the codec for decoding the
//! result. Resources handed out by a model are bound back to it, so
//! `save` and `populate` on a resource know their collaborators.

mod populate;

use crate::codec::{parse_nquads, CodecError, LdConverter, ParsedTriple};
use crate::resource::{LdResource, LdResourceList, PropertyValues};
use crate::schema::{ResourceSchema, SchemaRegistry};
use crate::sparql::{limit, FindFilters, QueryBuilder, QueryError, UpdateValues};
use crate::transport::{Transport, TransportError, ACCEPT_NQUADS};
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::{debug, info};

/// Facade-level errors
#[derive(Error, Debug)]
pub enum ModelError {
    /// Query synthesis failed; nothing was sent
    #[error(transparent)]
    Query(#[from] QueryError),

    /// The store's response was not decodable
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The transport failed; passed through untranslated
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// `populate` was called on a property that is not a URI reference
    #[error("property '{0}' is not populatable")]
    NotPopulatable(String),

    /// A referenced resource type has no registered schema
    #[error("referenced resource type '{0}' is not registered")]
    UnknownReference(String),

    /// A pre-save hook rejected the write
    #[error("pre-save hook rejected the resource: {0}")]
    HookRejected(String),

    /// The resource is not bound to a model (it was built by hand rather
    /// than by a model operation)
    #[error("resource is not bound to a model")]
    Detached,
}

pub type ModelResult<T> = Result<T, ModelError>;

/// A pre-save hook: may rewrite the outgoing value set, or abort the
/// write by returning an error message.
pub type PreSaveHook = Arc<dyn Fn(&mut PropertyValues) -> Result<(), String> + Send + Sync>;

pub(crate) struct ModelInner {
    schema: Arc<ResourceSchema>,
    transport: Arc<dyn Transport>,
    registry: SchemaRegistry,
    pre_save: RwLock<Vec<PreSaveHook>>,
}

/// The per-resource-type facade. Cheap to clone; clones share schema,
/// transport and hooks.
#[derive(Clone)]
pub struct Model {
    inner: Arc<ModelInner>,
}

impl Model {
    /// Create a model for a schema and register the schema so other
    /// models can reference it by resource-type name.
    pub fn new(
        schema: ResourceSchema,
        transport: Arc<dyn Transport>,
        registry: SchemaRegistry,
    ) -> Self {
        let schema = Arc::new(schema);
        registry.register(Arc::clone(&schema));
        Self::for_schema(schema, transport, registry)
    }

    pub(crate) fn for_schema(
        schema: Arc<ResourceSchema>,
        transport: Arc<dyn Transport>,
        registry: SchemaRegistry,
    ) -> Self {
        Self {
            inner: Arc::new(ModelInner {
                schema,
                transport,
                registry,
                pre_save: RwLock::new(Vec::new()),
            }),
        }
    }

    /// The schema this model operates on
    pub fn schema(&self) -> &ResourceSchema {
        &self.inner.schema
    }

    pub(crate) fn registry(&self) -> &SchemaRegistry {
        &self.inner.registry
    }

    pub(crate) fn transport(&self) -> &Arc<dyn Transport> {
        &self.inner.transport
    }

    /// Register a pre-save hook. Hooks run in registration order before
    /// every `save`; the first error aborts the write before anything is
    /// sent to the store.
    pub fn pre_save<F>(&self, hook: F)
    where
        F: Fn(&mut PropertyValues) -> Result<(), String> + Send + Sync + 'static,
    {
        self.inner
            .pre_save
            .write()
            .expect("pre-save hook lock poisoned")
            .push(Arc::new(hook));
    }

    fn hooks(&self) -> Vec<PreSaveHook> {
        self.inner
            .pre_save
            .read()
            .expect("pre-save hook lock poisoned")
            .clone()
    }

    /// Build a new, not yet persisted resource from a value set. No
    /// store round trip happens until `save` is called on the result.
    pub fn create(&self, values: &PropertyValues) -> LdResource {
        let converter = LdConverter::new(self.schema());
        let mut resource = converter.initial_resource(values);
        resource.bind(self.clone());
        resource
    }

    /// Find every resource of this type, optionally narrowed by equality
    /// filters. Always returns a collection, possibly empty.
    pub async fn find(&self, filters: Option<&FindFilters>) -> ModelResult<LdResourceList> {
        let builder = QueryBuilder::new(self.schema(), self.registry());
        let query = match filters {
            Some(filters) => builder.build_find_filtered(filters)?,
            None => builder.build_find(),
        };
        let triples = self.run_query(&query).await?;
        let mut list = LdConverter::new(self.schema()).to_resource_list(&triples);
        for resource in &mut list.graph {
            resource.bind(self.clone());
        }
        info!(
            resource_type = %self.schema().resource_type(),
            matches = list.len(),
            "find completed"
        );
        Ok(list)
    }

    /// Find exactly one resource, or the empty resource when nothing
    /// matches.
    pub async fn find_one(&self, filters: Option<&FindFilters>) -> ModelResult<LdResource> {
        let builder = QueryBuilder::new(self.schema(), self.registry());
        let query = match filters {
            Some(filters) => builder.build_find_filtered(filters)?,
            None => builder.build_find(),
        };
        let triples = self.run_query(&limit(1, &query)).await?;
        let mut resource = LdConverter::new(self.schema()).to_resource(&triples);
        resource.bind(self.clone());
        Ok(resource)
    }

    /// Find the resource with the given identifier, or the empty resource
    /// when it does not exist.
    pub async fn find_by_identifier(&self, identifier: &str) -> ModelResult<LdResource> {
        let builder = QueryBuilder::new(self.schema(), self.registry());
        let query = builder.build_find_by_identifier(identifier);
        let triples = self.run_query(&query).await?;
        let mut resource = LdConverter::new(self.schema()).to_resource(&triples);
        resource.bind(self.clone());
        Ok(resource)
    }

    /// Delete every resource of this type, optionally narrowed by
    /// equality filters.
    pub async fn delete(&self, filters: Option<&FindFilters>) -> ModelResult<bool> {
        let builder = QueryBuilder::new(self.schema(), self.registry());
        let query = match filters {
            Some(filters) => builder.build_delete_filtered(filters)?,
            None => builder.build_delete(),
        };
        self.inner.transport.update(&query).await?;
        info!(resource_type = %self.schema().resource_type(), "delete completed");
        Ok(true)
    }

    /// Delete the resource with the given identifier.
    pub async fn delete_by_identifier(&self, identifier: &str) -> ModelResult<bool> {
        let builder = QueryBuilder::new(self.schema(), self.registry());
        let query = builder.build_delete_by_identifier(identifier);
        self.inner.transport.update(&query).await?;
        info!(
            resource_type = %self.schema().resource_type(),
            identifier,
            "delete by identifier completed"
        );
        Ok(true)
    }

    /// Rewrite the given properties on every resource matching the
    /// filters (or on every resource of this type without filters).
    pub async fn update(
        &self,
        values: &UpdateValues,
        filters: Option<&FindFilters>,
    ) -> ModelResult<bool> {
        let builder = QueryBuilder::new(self.schema(), self.registry());
        let query = builder.build_update_filtered(values, filters)?;
        self.inner.transport.update(&query).await?;
        Ok(true)
    }

    /// Rewrite the given properties on the resource with the given
    /// identifier.
    pub async fn update_by_identifier(
        &self,
        identifier: &str,
        values: &UpdateValues,
    ) -> ModelResult<bool> {
        let builder = QueryBuilder::new(self.schema(), self.registry());
        let query = builder.build_update_by_identifier(identifier, values)?;
        self.inner.transport.update(&query).await?;
        Ok(true)
    }

    async fn run_query(&self, query: &str) -> ModelResult<Vec<ParsedTriple>> {
        debug!(query, "executing query");
        let body = self
            .inner
            .transport
            .query(query, Some(ACCEPT_NQUADS))
            .await?;
        Ok(parse_nquads(&body)?)
    }
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("resource_type", &self.schema().resource_type())
            .finish_non_exhaustive()
    }
}

impl LdResource {
    /// Persist the resource: insert when it is new, full
    /// delete-and-reinsert update when it was persisted before. Pre-save
    /// hooks run first and may rewrite or abort the outgoing values;
    /// synthesis errors surface before any transport call.
    pub async fn save(&mut self) -> ModelResult<()> {
        let model = self.model().cloned().ok_or(ModelError::Detached)?;
        let mut values = LdConverter::extract_values(self);
        for hook in model.hooks() {
            hook(&mut values).map_err(ModelError::HookRejected)?;
        }

        let builder = QueryBuilder::new(model.schema(), model.registry());
        let query = if self.is_new() {
            builder.build_insert(&values)?
        } else {
            builder.build_update(&values)?
        };
        model.transport().update(&query).await?;
        info!(
            resource_type = %model.schema().resource_type(),
            id = %self.id,
            new = self.is_new(),
            "resource saved"
        );
        self.mark_persisted();
        Ok(())
    }
}
