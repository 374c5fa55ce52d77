//! Relationship metadata declared on a factory definition.
//!
//! A relationship names a related factory through a `FactoryRef`, a deferred
//! accessor resolved only at production time. Two definitions can therefore point
//! at each other regardless of which one is built first.

use std::sync::{Arc, OnceLock, Weak};

use crate::{builder::Builder, error::FactoryError};

/// Local key used when a relationship does not name one.
pub const DEFAULT_LOCAL_KEY: &str = "id";

/// Direction of a relationship, seen from the factory that declares it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationType {
    /// The related row holds a foreign key to the owner; one per owner.
    HasOne,
    /// The related rows hold a foreign key to the owner; many per owner.
    HasMany,
    /// The owner holds a foreign key to the related row.
    BelongsTo,
}

/// When a relationship is produced relative to its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Before the owner rows are persisted; the owner needs the related key.
    Pre,
    /// After the owner rows are persisted; the related rows need the owner key.
    Post,
}

/// Shape of the hydrated relationship field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// A single nested model.
    One,
    /// An ordered list of nested models.
    Many,
}

impl RelationType {
    pub fn phase(self) -> Phase {
        match self {
            Self::BelongsTo => Phase::Pre,
            Self::HasOne | Self::HasMany => Phase::Post,
        }
    }

    pub fn cardinality(self) -> Cardinality {
        match self {
            Self::HasOne | Self::BelongsTo => Cardinality::One,
            Self::HasMany => Cardinality::Many,
        }
    }
}

type Resolver = Arc<dyn Fn() -> Option<Arc<Builder>> + Send + Sync>;

/// Deferred accessor to a related factory builder.
///
/// # Example
///
/// ```rust,ignore
/// static USERS: LazyLock<Arc<Builder>> = LazyLock::new(|| {
///     define_factory("user", |ctx| Fields::new().field("email", ctx.faker.email()))
///         .has_one("account", FactoryRef::new(|| Some(ACCOUNTS.clone())))
///         .build()
/// });
/// ```
#[derive(Clone)]
pub struct FactoryRef {
    resolver: Resolver,
}

impl FactoryRef {
    /// Wraps a resolver closure; it is only called at production time.
    pub fn new<F>(resolver: F) -> Self
    where
        F: Fn() -> Option<Arc<Builder>> + Send + Sync + 'static,
    {
        Self {
            resolver: Arc::new(resolver),
        }
    }

    /// Reference that does not keep the builder alive.
    pub fn weak(builder: &Arc<Builder>) -> Self {
        let weak = Arc::downgrade(builder);
        Self::new(move || weak.upgrade())
    }

    /// The referenced builder, `None` when it has been dropped or never set.
    pub fn resolve(&self) -> Option<Arc<Builder>> {
        (self.resolver)()
    }
}

impl From<&Arc<Builder>> for FactoryRef {
    fn from(builder: &Arc<Builder>) -> Self {
        let builder = builder.clone();
        Self::new(move || Some(builder.clone()))
    }
}

impl From<Arc<Builder>> for FactoryRef {
    fn from(builder: Arc<Builder>) -> Self {
        Self::new(move || Some(builder.clone()))
    }
}

impl std::fmt::Debug for FactoryRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FactoryRef")
    }
}

/// Late-bound slot for a builder that is defined after the factories referencing it.
///
/// The slot holds a weak pointer, so a pair of mutually referencing builders does
/// not form a reference cycle.
///
/// # Example
///
/// ```rust,ignore
/// let users_slot = FactorySlot::new();
/// let accounts = define_factory("account", provider)
///     .belongs_to("user", users_slot.reference())
///     .build();
/// let users = define_factory("user", provider)
///     .has_one("account", &accounts)
///     .build();
/// users_slot.fill(&users);
/// ```
#[derive(Clone, Default)]
pub struct FactorySlot {
    cell: Arc<OnceLock<Weak<Builder>>>,
}

impl FactorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Points the slot at `builder`.
    ///
    /// # Returns
    /// - `true` - The slot was empty and now resolves to `builder`
    /// - `false` - The slot was already filled and is left unchanged
    pub fn fill(&self, builder: &Arc<Builder>) -> bool {
        self.cell.set(Arc::downgrade(builder)).is_ok()
    }

    /// Deferred accessor reading this slot.
    pub fn reference(&self) -> FactoryRef {
        let cell = self.cell.clone();
        FactoryRef::new(move || cell.get().and_then(Weak::upgrade))
    }
}

/// Options for declaring a relationship.
///
/// Anything convertible into a `FactoryRef` converts into `Relation` with the
/// default keys.
#[derive(Debug, Clone)]
pub struct Relation {
    related: FactoryRef,
    local_key: Option<String>,
    foreign_key: Option<String>,
}

impl Relation {
    /// Relationship to `related` with default keys.
    pub fn to(related: impl Into<FactoryRef>) -> Self {
        Self {
            related: related.into(),
            local_key: None,
            foreign_key: None,
        }
    }

    /// Key on the referenced side, `id` by default.
    pub fn local_key(mut self, key: impl Into<String>) -> Self {
        self.local_key = Some(key.into());
        self
    }

    /// Column holding the reference, `<referenced table>_id` by default.
    pub fn foreign_key(mut self, key: impl Into<String>) -> Self {
        self.foreign_key = Some(key.into());
        self
    }
}

impl<T: Into<FactoryRef>> From<T> for Relation {
    fn from(related: T) -> Self {
        Self::to(related)
    }
}

/// Relationship metadata stored on a factory definition.
#[derive(Debug, Clone)]
pub struct RelationshipMeta {
    relation_type: RelationType,
    local_key: String,
    foreign_key: Option<String>,
    related: FactoryRef,
}

impl RelationshipMeta {
    pub(crate) fn new(relation_type: RelationType, relation: Relation) -> Self {
        Self {
            relation_type,
            local_key: relation
                .local_key
                .unwrap_or_else(|| DEFAULT_LOCAL_KEY.to_string()),
            foreign_key: relation.foreign_key,
            related: relation.related,
        }
    }

    pub fn relation_type(&self) -> RelationType {
        self.relation_type
    }

    pub fn local_key(&self) -> &str {
        &self.local_key
    }

    /// Explicit foreign key, if one was declared.
    pub fn explicit_foreign_key(&self) -> Option<&str> {
        self.foreign_key.as_deref()
    }

    /// Foreign key column for this relationship.
    ///
    /// Without an explicit key the column is named after the referenced side: the
    /// owner table for has-one/has-many, the related table for belongs-to.
    ///
    /// # Arguments
    /// - `owner_table` - Table of the factory declaring the relationship
    /// - `related_table` - Table of the related factory
    pub fn foreign_key(&self, owner_table: &str, related_table: &str) -> String {
        if let Some(key) = &self.foreign_key {
            return key.clone();
        }

        let referenced = match self.relation_type {
            RelationType::BelongsTo => related_table,
            RelationType::HasOne | RelationType::HasMany => owner_table,
        };

        format!("{}_id", referenced)
    }

    /// Resolves the related builder.
    ///
    /// # Arguments
    /// - `name` - Relationship name, used in the error message
    ///
    /// # Returns
    /// - `Ok(Arc<Builder>)` - Live related builder
    /// - `Err(FactoryError::UnresolvedFactory)` - The reference no longer resolves
    pub fn resolve(&self, name: &str) -> Result<Arc<Builder>, FactoryError> {
        self.related
            .resolve()
            .ok_or_else(|| FactoryError::UnresolvedFactory(name.to_string()))
    }

    /// Related builder without error reporting, used by the reset cascade.
    pub fn related(&self) -> Option<Arc<Builder>> {
        self.related.resolve()
    }
}
