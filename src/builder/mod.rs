//! Production sessions.
//!
//! A `Builder` wraps one frozen factory definition together with the pending
//! configuration of its next production call: overrides, states and relationship
//! requests. Every terminal call (`create`, `create_many`, `make`, `make_many`)
//! consumes that configuration and leaves the builder reset, whether it succeeded
//! or not.

pub mod relationship_builder;
pub mod states_manager;

use std::sync::{Arc, Mutex, MutexGuard};

use futures::future::{try_join_all, BoxFuture, FutureExt};

use crate::{
    builder::{relationship_builder::RelationshipBuilder, states_manager::StatesManager},
    casing::convert_row,
    config::FactorioConfig,
    error::FactoryError,
    field::{Fields, MergeInput, Row},
    model::{FactoryContext, FactoryModel},
};

/// Configuration pending for the next production call.
#[derive(Debug)]
struct Session {
    merge_input: MergeInput,
    states: StatesManager,
    relationships: RelationshipBuilder,
    is_reset: bool,
}

impl Session {
    fn new() -> Self {
        Self {
            merge_input: MergeInput::default(),
            states: StatesManager::default(),
            relationships: RelationshipBuilder::default(),
            is_reset: true,
        }
    }
}

/// Shared production handle of a factory.
///
/// Configuration methods take `&self` and return `&Self` so calls chain on an
/// `Arc<Builder>`:
///
/// ```rust,ignore
/// let user = users
///     .merge(json!({ "email": "foo@bar.com" }))
///     .apply("easyPassword")
///     .with("posts", 3)?
///     .create(&config)
///     .await?;
/// ```
pub struct Builder {
    factory: FactoryModel,
    session: Mutex<Session>,
}

impl Builder {
    pub(crate) fn new(factory: FactoryModel) -> Self {
        Self {
            factory,
            session: Mutex::new(Session::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// The frozen definition this builder produces.
    pub fn factory(&self) -> &FactoryModel {
        &self.factory
    }

    pub fn table_name(&self) -> &str {
        self.factory.table_name()
    }

    /// Records overrides for the next production call.
    ///
    /// A single object applies to every generated row; a sequence applies
    /// positionally and leaves rows past its end untouched. Replaces any override
    /// recorded earlier in the session.
    ///
    /// # Arguments
    /// - `input` - `Row`, `Vec<Row>` or a JSON object/array
    ///
    /// # Returns
    /// - `&Self` - Builder for method chaining
    pub fn merge(&self, input: impl Into<MergeInput>) -> &Self {
        let mut session = self.lock();
        session.merge_input = input.into();
        session.is_reset = false;
        self
    }

    /// Records a state to apply on the next production call.
    ///
    /// The name is validated when rows are produced.
    pub fn apply(&self, state: impl Into<String>) -> &Self {
        let mut session = self.lock();
        session.states.register(state);
        session.is_reset = false;
        self
    }

    /// Requests `count` related instances per produced row.
    ///
    /// # Arguments
    /// - `name` - Relationship declared on the factory
    /// - `count` - Related instances per owner
    ///
    /// # Returns
    /// - `Ok(&Self)` - Builder for method chaining
    /// - `Err(FactoryError::UnknownRelationship)` - `name` is not declared
    pub fn with(&self, name: &str, count: usize) -> Result<&Self, FactoryError> {
        self.request(name, count, None)
    }

    /// Same as `with`, running `callback` on the related builder right before its
    /// batch is produced.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// users
    ///     .with_callback("posts", 2, |posts| {
    ///         posts.apply("nodeArticle");
    ///     })?
    ///     .create(&config)
    ///     .await?;
    /// ```
    pub fn with_callback<F>(&self, name: &str, count: usize, callback: F) -> Result<&Self, FactoryError>
    where
        F: Fn(&Builder) + Send + Sync + 'static,
    {
        self.request(name, count, Some(Arc::new(callback)))
    }

    fn request(
        &self,
        name: &str,
        count: usize,
        callback: Option<relationship_builder::WithCallback>,
    ) -> Result<&Self, FactoryError> {
        let mut session = self.lock();
        session
            .relationships
            .apply(&self.factory, name, count, callback)?;
        session.is_reset = false;
        Ok(self)
    }

    /// Override that applies to generated row `index` in the current session.
    pub fn merge_attributes_at(&self, index: usize) -> Row {
        self.lock().merge_input.at(index)
    }

    /// Fails when the pending override is neither an object nor an array of objects.
    pub(crate) fn check_merge_input(&self) -> Result<(), FactoryError> {
        match self.lock().merge_input {
            MergeInput::Invalid(kind) => Err(FactoryError::InvalidMergeInput(kind)),
            _ => Ok(()),
        }
    }

    /// Creates and persists one instance.
    ///
    /// # Returns
    /// - `Ok(Row)` - Persisted, hydrated instance in return casing
    /// - `Err(FactoryError::MissingConnection)` - No record store is configured
    /// - `Err(FactoryError)` - Any state, relationship or store failure
    pub async fn create(&self, config: &FactorioConfig) -> Result<Row, FactoryError> {
        let rows = self.create_many(1, config).await?;
        self.single(rows)
    }

    /// Creates and persists `count` instances.
    ///
    /// Fails before generating anything when no record store is configured.
    pub async fn create_many(
        &self,
        count: usize,
        config: &FactorioConfig,
    ) -> Result<Vec<Row>, FactoryError> {
        if config.store().is_none() {
            self.reset();
            return Err(FactoryError::MissingConnection);
        }

        self.instantiate(count, false, config).await
    }

    /// Produces one instance without touching the record store.
    pub async fn make(&self, config: &FactorioConfig) -> Result<Row, FactoryError> {
        let rows = self.make_many(1, config).await?;
        self.single(rows)
    }

    /// Produces `count` instances without touching the record store.
    ///
    /// Relationships are stubbed as well, so identifiers only exist if the field
    /// providers generate them.
    pub async fn make_many(
        &self,
        count: usize,
        config: &FactorioConfig,
    ) -> Result<Vec<Row>, FactoryError> {
        self.instantiate(count, true, config).await
    }

    fn single(&self, rows: Vec<Row>) -> Result<Row, FactoryError> {
        rows.into_iter().next().ok_or_else(|| {
            FactoryError::Store(format!("No row produced for table {}", self.table_name()))
        })
    }

    /// Clears the session and forwards the reset to related builders.
    ///
    /// Related builders already in their reset state are skipped, which stops the
    /// cascade on mutually referencing factories.
    pub fn reset(&self) {
        *self.lock() = Session::new();

        for (_, meta) in self.factory.relations() {
            if let Some(related) = meta.related() {
                if !related.is_reset() {
                    related.reset();
                }
            }
        }
    }

    pub fn is_reset(&self) -> bool {
        self.lock().is_reset
    }

    /// Runs one production call with the pending session.
    ///
    /// The session is taken out of the builder before anything is awaited and the
    /// builder is reset once the call completes, successfully or not. Nested calls
    /// on related builders go through here too, inheriting `stubbed`.
    pub(crate) fn instantiate<'a>(
        &'a self,
        count: usize,
        stubbed: bool,
        config: &'a FactorioConfig,
    ) -> BoxFuture<'a, Result<Vec<Row>, FactoryError>> {
        async move {
            let mut session = std::mem::replace(&mut *self.lock(), Session::new());

            tracing::debug!(
                "Producing {} {} row(s) (stubbed: {})",
                count,
                self.table_name(),
                stubbed
            );

            let result = self.produce(&mut session, count, stubbed, config).await;

            self.reset();

            match &result {
                Ok(rows) => tracing::debug!(
                    "Produced {} {} row(s) (stubbed: {})",
                    rows.len(),
                    self.table_name(),
                    stubbed
                ),
                Err(e) => tracing::debug!("Failed to produce {} rows: {}", self.table_name(), e),
            }

            result
        }
        .boxed()
    }

    async fn produce(
        &self,
        session: &mut Session,
        count: usize,
        stubbed: bool,
        config: &FactorioConfig,
    ) -> Result<Vec<Row>, FactoryError> {
        if let MergeInput::Invalid(kind) = session.merge_input {
            return Err(FactoryError::InvalidMergeInput(kind));
        }

        let insert_casing = config.casing().insert;
        let mut fields = self
            .generate_rows(count, stubbed, config)
            .into_iter()
            .map(|row| row.convert_keys(insert_casing))
            .collect::<Vec<_>>();

        if !session.merge_input.is_empty() {
            for (index, row) in fields.iter_mut().enumerate() {
                row.merge_row(&convert_row(session.merge_input.at(index), insert_casing));
            }
        }

        let fields = session
            .states
            .apply_states(fields, &self.factory, insert_casing)?;

        let mut rows = try_join_all(fields.into_iter().map(|row| row.resolve(config))).await?;

        session
            .relationships
            .create_pre(&self.factory, &mut rows, stubbed, config)
            .await?;

        let mut rows = self.persist(rows, stubbed, config).await?;

        session
            .relationships
            .create_post(&self.factory, &mut rows, stubbed, config)
            .await?;

        let rows = session.relationships.post_hydrate(rows);

        let return_casing = config.casing().return_;
        Ok(rows
            .into_iter()
            .map(|row| convert_row(row, return_casing))
            .collect())
    }

    /// Invokes the field provider once per row.
    ///
    /// The fake-data generator stays locked for the whole batch, so this must not
    /// be awaited across.
    fn generate_rows(&self, count: usize, stubbed: bool, config: &FactorioConfig) -> Vec<Fields> {
        let mut faker = config.faker();
        let mut ctx = FactoryContext {
            faker: &mut *faker,
            is_stubbed: stubbed,
        };

        (0..count).map(|_| self.factory.generate(&mut ctx)).collect()
    }

    /// Writes rows in insert casing, or passes them through when stubbed.
    async fn persist(
        &self,
        rows: Vec<Row>,
        stubbed: bool,
        config: &FactorioConfig,
    ) -> Result<Vec<Row>, FactoryError> {
        let insert_casing = config.casing().insert;
        let rows = rows
            .into_iter()
            .map(|row| convert_row(row, insert_casing))
            .collect::<Vec<_>>();

        if stubbed {
            return Ok(rows);
        }

        let store = config.require_store()?;
        let persisted = store.insert_returning(self.table_name(), rows).await?;

        tracing::debug!("Inserted {} row(s) into {}", persisted.len(), self.table_name());

        Ok(persisted)
    }
}

impl std::fmt::Debug for Builder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Builder")
            .field("table_name", &self.table_name())
            .field("is_reset", &self.is_reset())
            .finish()
    }
}
