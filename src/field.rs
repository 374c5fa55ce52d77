//! Row representations used while a batch is being produced.
//!
//! A field provider returns `Fields`: an ordered map whose values are either
//! literal JSON values or deferred thunks. Overrides and state patches are merged
//! into `Fields`, deferred values are resolved, and the result becomes a plain
//! `Row` ready for the record store.

use std::{fmt, future::Future, sync::Arc};

use futures::future::{BoxFuture, FutureExt};
use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::{
    casing::{convert_case, CasingStrategy},
    config::FactorioConfig,
    error::FactoryError,
};

/// A generated, persisted or stubbed row.
pub type Row = Map<String, Value>;

/// Attribute holding the identifier of a resolved deferred value.
pub const IDENTIFIER: &str = "id";

type DeferredFn =
    Arc<dyn Fn(FactorioConfig) -> BoxFuture<'static, Result<Value, FactoryError>> + Send + Sync>;

/// Value of a single generated field.
#[derive(Clone)]
pub enum FieldValue {
    /// Literal value used as is.
    Value(Value),
    /// Thunk invoked at instantiation time, after overrides and states.
    Deferred(DeferredFn),
}

impl FieldValue {
    /// Wraps an async closure into a deferred field.
    ///
    /// The closure receives the configuration of the production call so it can
    /// create related rows through the same record store.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let user_id = FieldValue::deferred(move |config| {
    ///     let users = users.clone();
    ///     async move { users.create(&config).await.map(Value::Object) }
    /// });
    /// ```
    pub fn deferred<F, Fut>(thunk: F) -> Self
    where
        F: Fn(FactorioConfig) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, FactoryError>> + Send + 'static,
    {
        Self::Deferred(Arc::new(move |config| thunk(config).boxed()))
    }

    /// Literal value, `None` for deferred fields.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            Self::Deferred(_) => None,
        }
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred(_))
    }

    /// Resolves the field to a literal value.
    ///
    /// A deferred result that is an object carrying a non-null `id` collapses to
    /// that identifier, so `|| users.create()` yields a foreign key.
    async fn resolve(self, config: FactorioConfig) -> Result<Value, FactoryError> {
        match self {
            Self::Value(value) => Ok(value),
            Self::Deferred(thunk) => {
                let resolved = thunk(config).await?;
                Ok(match resolved {
                    Value::Object(ref object) => match object.get(IDENTIFIER) {
                        Some(id) if !id.is_null() => id.clone(),
                        _ => resolved,
                    },
                    other => other,
                })
            }
        }
    }
}

impl fmt::Debug for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Deferred(_) => f.write_str("Deferred"),
        }
    }
}

macro_rules! impl_from_literal {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for FieldValue {
                fn from(value: $ty) -> Self {
                    Self::Value(value.into())
                }
            }
        )*
    };
}

impl_from_literal!(
    Value,
    String,
    &str,
    bool,
    i32,
    i64,
    u32,
    u64,
    usize,
    f32,
    f64,
    Row,
    Vec<Value>,
);

/// Ordered set of generated fields.
#[derive(Debug, Clone, Default)]
pub struct Fields(IndexMap<String, FieldValue>);

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field, replacing any previous value.
    ///
    /// # Arguments
    /// - `name` - Field name
    /// - `value` - Literal value or `FieldValue::deferred` thunk
    ///
    /// # Returns
    /// - `Self` - Fields for method chaining
    pub fn field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.0.insert(name.into(), value.into());
    }

    /// Literal value of a field; `None` when absent or still deferred.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name).and_then(FieldValue::as_value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    /// Renames every field with `casing`.
    ///
    /// Generated fields, overrides and state patches all go through the insert
    /// casing before merging, so `isBusinessUser` and `is_business_user` address
    /// the same field. Literal object values are converted deeply.
    pub fn convert_keys(self, casing: CasingStrategy) -> Self {
        if casing == CasingStrategy::None {
            return self;
        }

        self.0
            .into_iter()
            .map(|(key, value)| {
                let value = match value {
                    FieldValue::Value(value) => FieldValue::Value(convert_case(value, casing)),
                    deferred => deferred,
                };
                (casing.convert_key(&key), value)
            })
            .collect()
    }

    /// Merges an override row into these fields.
    ///
    /// Override values win. When both sides hold a JSON object the two objects are
    /// merged recursively instead of being replaced.
    pub fn merge_row(&mut self, overrides: &Row) {
        for (key, value) in overrides {
            match (self.0.get_mut(key), value) {
                (Some(FieldValue::Value(Value::Object(current))), Value::Object(patch)) => {
                    merge_objects(current, patch);
                }
                _ => {
                    self.0.insert(key.clone(), FieldValue::Value(value.clone()));
                }
            }
        }
    }

    /// Merges a state patch into these fields; patch fields win.
    pub fn merge_fields(&mut self, patch: Fields) {
        for (key, value) in patch.0 {
            match (self.0.get_mut(&key), value) {
                (
                    Some(FieldValue::Value(Value::Object(current))),
                    FieldValue::Value(Value::Object(patch)),
                ) => merge_objects(current, &patch),
                (_, value) => {
                    self.0.insert(key, value);
                }
            }
        }
    }

    /// Invokes every deferred field and returns the literal row.
    ///
    /// Fields are resolved one after the other; the caller joins rows.
    pub async fn resolve(self, config: &FactorioConfig) -> Result<Row, FactoryError> {
        let mut row = Row::new();

        for (key, value) in self.0 {
            let resolved = value.resolve(config.clone()).await?;
            row.insert(key, resolved);
        }

        Ok(row)
    }
}

impl From<Row> for Fields {
    fn from(row: Row) -> Self {
        Self(
            row.into_iter()
                .map(|(key, value)| (key, FieldValue::Value(value)))
                .collect(),
        )
    }
}

impl FromIterator<(String, FieldValue)> for Fields {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Recursively merges `patch` into `target`; patch values win.
pub fn merge_objects(target: &mut Row, patch: &Row) {
    for (key, value) in patch {
        match (target.get_mut(key), value) {
            (Some(Value::Object(current)), Value::Object(nested)) => merge_objects(current, nested),
            _ => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Pending overrides of a builder.
#[derive(Debug, Clone, PartialEq)]
pub enum MergeInput {
    /// One object merged into every generated row.
    Single(Row),
    /// Index `i` merges into generated row `i`; extra rows are left untouched.
    Sequence(Vec<Row>),
    /// Value that is neither object nor array, rejected at production time.
    Invalid(&'static str),
}

impl MergeInput {
    /// Override that applies to generated row `index`.
    pub fn at(&self, index: usize) -> Row {
        match self {
            Self::Single(row) => row.clone(),
            Self::Sequence(rows) => rows.get(index).cloned().unwrap_or_default(),
            Self::Invalid(_) => Row::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Single(row) => row.is_empty(),
            Self::Sequence(rows) => rows.is_empty(),
            Self::Invalid(_) => false,
        }
    }
}

impl Default for MergeInput {
    fn default() -> Self {
        Self::Sequence(Vec::new())
    }
}

impl From<Row> for MergeInput {
    fn from(row: Row) -> Self {
        Self::Single(row)
    }
}

impl From<Vec<Row>> for MergeInput {
    fn from(rows: Vec<Row>) -> Self {
        Self::Sequence(rows)
    }
}

impl From<Value> for MergeInput {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(row) => Self::Single(row),
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Object(row) => Some(row),
                    _ => None,
                })
                .collect::<Option<Vec<_>>>()
                .map_or(Self::Invalid("array item"), Self::Sequence),
            Value::Null => Self::Invalid("null"),
            Value::Bool(_) => Self::Invalid("boolean"),
            Value::Number(_) => Self::Invalid("number"),
            Value::String(_) => Self::Invalid("string"),
        }
    }
}
