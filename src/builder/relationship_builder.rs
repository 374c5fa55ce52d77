use std::sync::Arc;

use serde_json::Value;

use crate::{
    builder::Builder,
    casing::{convert_row, CasingStrategy},
    config::FactorioConfig,
    error::FactoryError,
    field::Row,
    model::{
        relation::{Cardinality, Phase, RelationType},
        FactoryModel,
    },
};

/// Callback configuring the related builder of a single `with` request.
pub type WithCallback = Arc<dyn Fn(&Builder) + Send + Sync>;

/// One `with` request.
#[derive(Clone)]
pub struct RelationshipRequest {
    name: String,
    count: usize,
    callback: Option<WithCallback>,
}

impl RelationshipRequest {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

impl std::fmt::Debug for RelationshipRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelationshipRequest")
            .field("name", &self.name)
            .field("count", &self.count)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

/// Belongs-to models kept aside until the owner rows are final.
#[derive(Debug)]
struct PreModels {
    name: String,
    count: usize,
    relations: Vec<Row>,
}

/// Resolves the relationships requested for one production call.
///
/// Belongs-to requests run before the owner rows are persisted so the owners can
/// carry the parent key; has-one and has-many requests run afterwards so the
/// children can carry the owner key. Requests of a phase run one after the other
/// in registration order.
#[derive(Debug, Default)]
pub struct RelationshipBuilder {
    applied: Vec<RelationshipRequest>,
    pre_models: Vec<PreModels>,
}

impl RelationshipBuilder {
    /// Registers a relationship to be created.
    ///
    /// # Arguments
    /// - `factory` - Definition declaring the relationship
    /// - `name` - Relationship name
    /// - `count` - Related instances per owner
    /// - `callback` - Optional configuration of the related builder
    ///
    /// # Returns
    /// - `Ok(())` - Request recorded
    /// - `Err(FactoryError::UnknownRelationship)` - `name` is not declared
    pub fn apply(
        &mut self,
        factory: &FactoryModel,
        name: &str,
        count: usize,
        callback: Option<WithCallback>,
    ) -> Result<(), FactoryError> {
        if factory.relation_meta(name).is_none() {
            return Err(FactoryError::UnknownRelationship(name.to_string()));
        }

        self.applied.push(RelationshipRequest {
            name: name.to_string(),
            count,
            callback,
        });

        Ok(())
    }

    /// Pending requests in registration order.
    pub fn requests(&self) -> &[RelationshipRequest] {
        &self.applied
    }

    pub fn is_empty(&self) -> bool {
        self.applied.is_empty() && self.pre_models.is_empty()
    }

    pub fn reset(&mut self) {
        self.applied.clear();
        self.pre_models.clear();
    }

    fn filter_relationships_by_phase(
        &self,
        factory: &FactoryModel,
        phase: Phase,
    ) -> Vec<RelationshipRequest> {
        self.applied
            .iter()
            .filter(|request| {
                factory
                    .relation_meta(&request.name)
                    .is_some_and(|meta| meta.relation_type().phase() == phase)
            })
            .cloned()
            .collect()
    }

    /// Creates the belongs-to relationships and writes their keys onto `models`.
    ///
    /// For each request `count × models.len()` parents are produced; owner `i`
    /// receives the local key of parent `i`. Parents are kept for `post_hydrate`.
    pub async fn create_pre(
        &mut self,
        factory: &FactoryModel,
        models: &mut [Row],
        stubbed: bool,
        config: &FactorioConfig,
    ) -> Result<(), FactoryError> {
        for request in self.filter_relationships_by_phase(factory, Phase::Pre) {
            let meta = factory
                .relation_meta(&request.name)
                .ok_or_else(|| FactoryError::UnknownRelationship(request.name.clone()))?;
            let related = meta.resolve(&request.name)?;

            if let Some(callback) = &request.callback {
                callback(related.as_ref());
            }

            let relations = related
                .instantiate(request.count * models.len(), stubbed, config)
                .await?;

            let foreign_key = meta.foreign_key(factory.table_name(), related.table_name());
            let foreign_key = config.casing().insert.convert_key(&foreign_key);
            let return_casing = config.casing().return_;

            for (model, relation) in models.iter_mut().zip(relations.iter()) {
                let key = key_value(relation, meta.local_key(), return_casing)
                    .cloned()
                    .unwrap_or(Value::Null);
                model.insert(foreign_key.clone(), key);
            }

            tracing::debug!(
                "Created {} {} parent(s) for {}",
                relations.len(),
                request.name,
                factory.table_name()
            );

            self.pre_models.push(PreModels {
                name: request.name,
                count: request.count,
                relations,
            });
        }

        Ok(())
    }

    /// Creates the has-one/has-many relationships of persisted `models` and
    /// hydrates them.
    ///
    /// Each owner contributes `count` override rows: the related builder's own
    /// override at that index plus the owner key in the foreign key column. An
    /// invalid override set by a callback fails the call before the batch
    /// replaces it.
    pub async fn create_post(
        &mut self,
        factory: &FactoryModel,
        models: &mut [Row],
        stubbed: bool,
        config: &FactorioConfig,
    ) -> Result<(), FactoryError> {
        for request in self.filter_relationships_by_phase(factory, Phase::Post) {
            let meta = factory
                .relation_meta(&request.name)
                .ok_or_else(|| FactoryError::UnknownRelationship(request.name.clone()))?;
            let related = meta.resolve(&request.name)?;

            if let Some(callback) = &request.callback {
                callback(related.as_ref());
            }

            related.check_merge_input()?;

            let insert_casing = config.casing().insert;
            let foreign_key = meta.foreign_key(factory.table_name(), related.table_name());
            let foreign_key = insert_casing.convert_key(&foreign_key);

            let merge_attributes = models
                .iter()
                .flat_map(|model| {
                    let owner_key = key_value(model, meta.local_key(), insert_casing)
                        .cloned()
                        .unwrap_or(Value::Null);

                    (0..request.count)
                        .map(|index| {
                            let mut attributes =
                                convert_row(related.merge_attributes_at(index), insert_casing);
                            attributes.insert(foreign_key.clone(), owner_key.clone());
                            attributes
                        })
                        .collect::<Vec<_>>()
                })
                .collect::<Vec<_>>();

            let relations = related
                .merge(merge_attributes)
                .instantiate(request.count * models.len(), stubbed, config)
                .await?;

            tracing::debug!(
                "Created {} {} child(ren) for {}",
                relations.len(),
                request.name,
                factory.table_name()
            );

            hydrate_relationships(
                models,
                meta.relation_type(),
                &request.name,
                request.count,
                relations,
            );
        }

        Ok(())
    }

    /// Hydrates the belongs-to models created by `create_pre` into the final rows.
    pub fn post_hydrate(&mut self, mut models: Vec<Row>) -> Vec<Row> {
        for pre in self.pre_models.drain(..) {
            hydrate_relationships(
                &mut models,
                RelationType::BelongsTo,
                &pre.name,
                pre.count,
                pre.relations,
            );
        }

        models
    }
}

/// Attaches related models onto their owners under `name`.
///
/// Post relations are produced owner by owner, so owner `i` takes the contiguous
/// slice of `count` models starting at `i × count`. Belongs-to parents are paired
/// with their owner by index, matching the key written in `create_pre`.
fn hydrate_relationships(
    models: &mut [Row],
    relation_type: RelationType,
    name: &str,
    count: usize,
    relations: Vec<Row>,
) {
    let per_owner = match relation_type.phase() {
        Phase::Pre => 1,
        Phase::Post => count,
    };

    let mut relations = relations.into_iter();

    for model in models.iter_mut() {
        let slice = relations.by_ref().take(per_owner).map(Value::Object);

        let value = match relation_type.cardinality() {
            Cardinality::One => slice.take(1).next().unwrap_or(Value::Null),
            Cardinality::Many => Value::Array(slice.collect()),
        };

        model.insert(name.to_string(), value);
    }
}

/// Reads `key` from a row, falling back to its cased spelling.
///
/// Rows coming back from a nested production call are already in return casing
/// while relationship keys are declared in storage casing.
fn key_value<'a>(row: &'a Row, key: &str, casing: CasingStrategy) -> Option<&'a Value> {
    row.get(key).or_else(|| row.get(&casing.convert_key(key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        match value {
            Value::Object(row) => row,
            _ => panic!("expected an object"),
        }
    }

    fn owners(count: usize) -> Vec<Row> {
        (0..count).map(|id| row(json!({ "id": id }))).collect()
    }

    fn related(count: usize) -> Vec<Row> {
        (0..count).map(|id| row(json!({ "id": 100 + id }))).collect()
    }

    #[test]
    fn has_many_takes_contiguous_slices() {
        let mut models = owners(2);

        hydrate_relationships(&mut models, RelationType::HasMany, "posts", 2, related(4));

        assert_eq!(models[0]["posts"], json!([{ "id": 100 }, { "id": 101 }]));
        assert_eq!(models[1]["posts"], json!([{ "id": 102 }, { "id": 103 }]));
    }

    #[test]
    fn has_one_takes_first_of_each_slice() {
        let mut models = owners(2);

        hydrate_relationships(&mut models, RelationType::HasOne, "profile", 1, related(2));

        assert_eq!(models[0]["profile"], json!({ "id": 100 }));
        assert_eq!(models[1]["profile"], json!({ "id": 101 }));
    }

    #[test]
    fn belongs_to_pairs_by_index() {
        let mut models = owners(2);

        hydrate_relationships(&mut models, RelationType::BelongsTo, "user", 2, related(4));

        assert_eq!(models[0]["user"], json!({ "id": 100 }));
        assert_eq!(models[1]["user"], json!({ "id": 101 }));
    }

    #[test]
    fn zero_count_hydrates_empty_values() {
        let mut models = owners(1);

        hydrate_relationships(&mut models, RelationType::HasMany, "posts", 0, Vec::new());
        hydrate_relationships(&mut models, RelationType::HasOne, "profile", 0, Vec::new());

        assert_eq!(models[0]["posts"], json!([]));
        assert_eq!(models[0]["profile"], Value::Null);
    }

    #[test]
    fn key_lookup_falls_back_to_cased_name() {
        let model = row(json!({ "userCode": "abc" }));

        assert_eq!(
            key_value(&model, "user_code", CasingStrategy::Camel),
            Some(&json!("abc"))
        );
        assert_eq!(key_value(&model, "missing", CasingStrategy::Camel), None);
    }
}
