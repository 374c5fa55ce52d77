//! Factory definitions.
//!
//! A `FactoryModel` describes how to generate one entity type: the table it is
//! stored in, the field provider, named states and declared relationships. It is
//! assembled once with the chainable definition methods, then frozen into a shared
//! `Builder` with `build()`.

pub mod relation;

use std::sync::Arc;

use indexmap::IndexMap;

use crate::{
    builder::Builder,
    faker::Faker,
    field::Fields,
    model::relation::{Relation, RelationType, RelationshipMeta},
};

/// Arguments handed to a field provider for each generated row.
pub struct FactoryContext<'a> {
    /// Shared fake-data generator.
    pub faker: &'a mut Faker,
    /// `true` for `make` calls, where nothing is persisted.
    pub is_stubbed: bool,
}

pub(crate) type FieldProvider = Arc<dyn Fn(&mut FactoryContext<'_>) -> Fields + Send + Sync>;

pub(crate) type StateCallback = Arc<dyn Fn(&Fields) -> Fields + Send + Sync>;

/// Definition of a factory.
///
/// # Example
///
/// ```rust,ignore
/// let posts = define_factory("post", |ctx| {
///     Fields::new().field("title", ctx.faker.sentence())
/// })
/// .state("nodeArticle", |_| Fields::new().field("title", "NodeJS"))
/// .build();
///
/// let users = define_factory("user", |ctx| {
///     Fields::new().field("email", ctx.faker.email())
/// })
/// .has_many("posts", &posts)
/// .build();
/// ```
pub struct FactoryModel {
    table_name: String,
    provider: FieldProvider,
    states: IndexMap<String, StateCallback>,
    relations: IndexMap<String, RelationshipMeta>,
}

impl FactoryModel {
    /// Creates a definition for `table_name` with no states or relationships.
    ///
    /// # Arguments
    /// - `table_name` - Table the rows are persisted into
    /// - `provider` - Called once per generated row
    pub fn new<F>(table_name: impl Into<String>, provider: F) -> Self
    where
        F: Fn(&mut FactoryContext<'_>) -> Fields + Send + Sync + 'static,
    {
        Self {
            table_name: table_name.into(),
            provider: Arc::new(provider),
            states: IndexMap::new(),
            relations: IndexMap::new(),
        }
    }

    /// Registers a named state.
    ///
    /// The callback receives the row as merged so far and returns the fields to
    /// overwrite. Registering the same name twice replaces the callback.
    pub fn state<F>(mut self, name: impl Into<String>, callback: F) -> Self
    where
        F: Fn(&Fields) -> Fields + Send + Sync + 'static,
    {
        self.states.insert(name.into(), Arc::new(callback));
        self
    }

    /// Declares a has-one relationship.
    pub fn has_one(self, name: impl Into<String>, relation: impl Into<Relation>) -> Self {
        self.relation(name, RelationType::HasOne, relation)
    }

    /// Declares a has-many relationship.
    pub fn has_many(self, name: impl Into<String>, relation: impl Into<Relation>) -> Self {
        self.relation(name, RelationType::HasMany, relation)
    }

    /// Declares a belongs-to relationship.
    pub fn belongs_to(self, name: impl Into<String>, relation: impl Into<Relation>) -> Self {
        self.relation(name, RelationType::BelongsTo, relation)
    }

    fn relation(
        mut self,
        name: impl Into<String>,
        relation_type: RelationType,
        relation: impl Into<Relation>,
    ) -> Self {
        self.relations.insert(
            name.into(),
            RelationshipMeta::new(relation_type, relation.into()),
        );
        self
    }

    /// Freezes the definition into a shared builder.
    pub fn build(self) -> Arc<Builder> {
        Arc::new(Builder::new(self))
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Generates one raw row.
    pub(crate) fn generate(&self, ctx: &mut FactoryContext<'_>) -> Fields {
        (self.provider)(ctx)
    }

    pub(crate) fn state_callback(&self, name: &str) -> Option<&StateCallback> {
        self.states.get(name)
    }

    pub fn has_state(&self, name: &str) -> bool {
        self.states.contains_key(name)
    }

    /// Registered state names in registration order.
    pub fn state_names(&self) -> impl Iterator<Item = &str> {
        self.states.keys().map(String::as_str)
    }

    pub fn relation_meta(&self, name: &str) -> Option<&RelationshipMeta> {
        self.relations.get(name)
    }

    /// Declared relationships in declaration order.
    pub fn relations(&self) -> impl Iterator<Item = (&str, &RelationshipMeta)> {
        self.relations.iter().map(|(name, meta)| (name.as_str(), meta))
    }
}

impl std::fmt::Debug for FactoryModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactoryModel")
            .field("table_name", &self.table_name)
            .field("states", &self.states.keys().collect::<Vec<_>>())
            .field("relations", &self.relations)
            .finish()
    }
}

/// Starts a factory definition.
///
/// Shorthand for `FactoryModel::new(table_name, provider)`.
pub fn define_factory<F>(table_name: impl Into<String>, provider: F) -> FactoryModel
where
    F: Fn(&mut FactoryContext<'_>) -> Fields + Send + Sync + 'static,
{
    FactoryModel::new(table_name, provider)
}
