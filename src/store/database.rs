//! SeaORM implementation of the record store.
//!
//! Rows are dynamic JSON maps, so statements are built with sea-query against
//! table and column aliases instead of entity models. Each row is inserted with its
//! own `INSERT ... RETURNING *` statement, which keeps the returned rows in input
//! order and lets every row carry its own column set (missing columns fall back to
//! the database defaults).

use async_trait::async_trait;
use sea_orm::{
    sea_query::{Alias, Asterisk, Expr, ExprTrait as _, Func, Query},
    ConnectionTrait, DatabaseConnection, FromQueryResult, JsonValue, QueryResult,
};
use serde_json::Value;

use crate::{error::FactoryError, field::Row, store::RecordStore};

/// Record store backed by a SeaORM connection.
#[derive(Debug, Clone)]
pub struct SeaOrmStore {
    db: DatabaseConnection,
}

impl SeaOrmStore {
    /// Wraps an open connection.
    ///
    /// # Arguments
    /// - `db` - Connection used for every statement
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// The wrapped connection.
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    async fn insert_one(&self, table: &str, row: Row) -> Result<Row, FactoryError> {
        let mut stmt = Query::insert();
        stmt.into_table(Alias::new(table.to_string()));

        if row.is_empty() {
            stmt.or_default_values();
        } else {
            stmt.columns(row.keys().map(|key| Alias::new(key.clone())));
            stmt.values(row.values().map(|value| to_db_value(value).into()))
                .map_err(|e| FactoryError::Store(e.to_string()))?;
        }

        stmt.returning_all();

        let result = self.db.query_one(&stmt).await?.ok_or_else(|| {
            FactoryError::Store(format!("Insert into \"{}\" returned no row", table))
        })?;

        to_row(&result)
    }
}

#[async_trait]
impl RecordStore for SeaOrmStore {
    async fn insert_returning(&self, table: &str, rows: Vec<Row>) -> Result<Vec<Row>, FactoryError> {
        let mut persisted = Vec::with_capacity(rows.len());

        for row in rows {
            persisted.push(self.insert_one(table, row).await?);
        }

        tracing::trace!("Inserted {} row(s) into {}", persisted.len(), table);

        Ok(persisted)
    }

    async fn count(&self, table: &str, filter: &Row) -> Result<u64, FactoryError> {
        let mut stmt = Query::select();
        stmt.expr_as(Func::count(Expr::col(Asterisk)), Alias::new("count"))
            .from(Alias::new(table.to_string()));

        for (column, value) in filter {
            let column = Expr::col(Alias::new(column.clone()));
            match value {
                Value::Null => stmt.and_where(column.is_null()),
                value => stmt.and_where(column.eq(to_db_value(value))),
            };
        }

        let count = match self.db.query_one(&stmt).await? {
            Some(result) => result.try_get::<i64>("", "count")?,
            None => 0,
        };

        Ok(Ord::max(count, 0) as u64)
    }

    async fn close(&self) -> Result<(), FactoryError> {
        self.db.clone().close().await?;
        Ok(())
    }
}

/// Converts a JSON value into a bindable database value.
///
/// Arrays and objects are bound as their JSON text.
fn to_db_value(value: &Value) -> sea_orm::Value {
    match value {
        Value::Null => sea_orm::Value::String(None),
        Value::Bool(b) => (*b).into(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.into()
            } else if let Some(u) = n.as_u64() {
                u.into()
            } else {
                n.as_f64().unwrap_or_default().into()
            }
        }
        Value::String(s) => s.clone().into(),
        other => other.to_string().into(),
    }
}

fn to_row(result: &QueryResult) -> Result<Row, FactoryError> {
    match JsonValue::from_query_result(result, "")? {
        Value::Object(row) => Ok(row),
        other => Err(FactoryError::Store(format!(
            "Expected a row object from the database, got {}",
            other
        ))),
    }
}
