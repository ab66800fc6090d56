// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::str::FromStr;

use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use indexmap::IndexMap;
use tokio_postgres::{Config, NoTls};
use tracing::{debug, instrument};

use crate::cel::types::CelType;
use crate::error::{ProviderError, WithContext};
use crate::schema::column_type::{ColumnType, FieldSpec, Schema};

/// Read-only schema queries the lowering walker issues while visiting an
/// expression.
///
/// Dotted names resolve through composite fields: `find_field_type("t.a",
/// "b")` descends into the nested schema of the composite column `a` of
/// table `t`. Every "not found" condition is reported as `None`/`false`,
/// never as an error — the walker treats unknown operands as plain,
/// non-JSON, non-array values.
pub trait TypeProvider {
    /// Whether the dotted name resolves to a loaded table or composite.
    fn find_struct(&self, name: &str) -> bool;

    /// Ordered field names of the table/composite, if loaded.
    fn find_field_names(&self, struct_name: &str) -> Option<Vec<&str>>;

    /// The CEL-level type of a field, if the struct and field exist.
    fn find_field_type(&self, struct_name: &str, field_name: &str) -> Option<CelType>;

    /// Raw storage metadata of a field (JSON-ness, repeated flag, declared
    /// JSON shape), if the struct and field exist.
    fn find_field_spec(&self, struct_name: &str, field_name: &str) -> Option<&FieldSpec>;
}

const TABLE_COLUMNS_QUERY: &str = "
  SELECT
    c.column_name::text,
    c.data_type::text,
    c.is_nullable::text,
    c.column_default::text,
    CASE
      WHEN c.data_type = 'ARRAY' THEN
        (SELECT e.data_type::text FROM information_schema.element_types e
          WHERE e.object_name = $1
            AND e.collection_type_identifier = (
              SELECT dtd_identifier FROM information_schema.columns
              WHERE table_name = $1 AND column_name = c.column_name))
      ELSE c.data_type::text
    END AS element_type
  FROM information_schema.columns c
  WHERE c.table_name = $1
  ORDER BY c.ordinal_position";

/// Schema source for the walker: a map of table schemas, optionally backed
/// by a PostgreSQL connection pool for lazy catalogue introspection.
pub struct PgTypeProvider {
    schemas: IndexMap<String, Schema>,
    pool: Option<Pool>,
}

impl PgTypeProvider {
    /// A provider over caller-supplied schemas. No database connection is
    /// held; [`load_table_schema`](Self::load_table_schema) will fail.
    pub fn new(schemas: IndexMap<String, Schema>) -> Self {
        Self {
            schemas,
            pool: None,
        }
    }

    /// A provider that introspects table schemas on demand over a pooled
    /// connection to `url`.
    pub fn connect(url: &str, pool_size: Option<usize>) -> Result<Self, ProviderError> {
        let config = Config::from_str(url)
            .map_err(ProviderError::Delegate)
            .with_context("Failed to parse PostgreSQL connection string".into())?;

        let manager_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };
        let manager = Manager::from_config(config, NoTls, manager_config);

        let pool = Pool::builder(manager);
        let pool = match pool_size {
            Some(pool_size) => pool.max_size(pool_size),
            None => pool,
        }
        .build()
        .map_err(|e| ProviderError::Config(e.to_string()))?;

        Ok(Self {
            schemas: IndexMap::new(),
            pool: Some(pool),
        })
    }

    /// Loads the schema of `table_name` from the database catalogue. Array
    /// columns are recorded with the `repeated` flag and their element type,
    /// not the catalogue's bare `ARRAY` token.
    ///
    /// Callers that need a deadline should wrap the returned future in a
    /// timeout; dropping it cancels the catalogue query.
    #[instrument(skip(self))]
    pub async fn load_table_schema(&mut self, table_name: &str) -> Result<(), ProviderError> {
        let pool = self.pool.as_ref().ok_or(ProviderError::Unconfigured)?;
        let client = pool.get().await?;

        let rows = client
            .query(TABLE_COLUMNS_QUERY, &[&table_name])
            .await
            .map_err(ProviderError::Delegate)
            .with_context(format!("Failed to query schema of table `{table_name}`"))?;

        let mut schema = Schema::new();
        for row in rows {
            let column_name: String = row.try_get("column_name")?;
            let data_type: String = row.try_get("data_type")?;
            let element_type: Option<String> = row.try_get("element_type")?;

            let repeated = data_type == "ARRAY";
            let token = match element_type {
                Some(element_type) if repeated => element_type,
                _ => data_type,
            };

            schema.push(FieldSpec {
                name: column_name,
                typ: ColumnType::from_db_token(&token),
                repeated,
            });
        }

        debug!(
            table = table_name,
            columns = schema.len(),
            "loaded table schema"
        );
        self.schemas.insert(table_name.to_owned(), schema);
        Ok(())
    }

    /// Releases the connection pool, if any. Idempotent.
    pub fn close(&self) {
        if let Some(pool) = &self.pool {
            pool.close();
        }
    }

    /// Resolves a dotted name (`table` or `table.composite.nested`) to its
    /// ordered field list.
    fn find_schema(&self, dotted_name: &str) -> Option<&Schema> {
        let mut segments = dotted_name.split('.');
        let mut schema = self.schemas.get(segments.next()?)?;

        for segment in segments {
            let field = schema.iter().find(|f| f.name == segment)?;
            match &field.typ {
                ColumnType::Composite(nested) => schema = nested,
                _ => return None,
            }
        }
        Some(schema)
    }
}

impl TypeProvider for PgTypeProvider {
    fn find_struct(&self, name: &str) -> bool {
        self.find_schema(name).is_some()
    }

    fn find_field_names(&self, struct_name: &str) -> Option<Vec<&str>> {
        let schema = self.find_schema(struct_name)?;
        Some(schema.iter().map(|f| f.name.as_str()).collect())
    }

    fn find_field_type(&self, struct_name: &str, field_name: &str) -> Option<CelType> {
        self.find_field_spec(struct_name, field_name)
            .map(|spec| spec.cel_type(struct_name))
    }

    fn find_field_spec(&self, struct_name: &str, field_name: &str) -> Option<&FieldSpec> {
        self.find_schema(struct_name)?
            .iter()
            .find(|f| f.name == field_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> PgTypeProvider {
        let users = vec![
            FieldSpec::new("name", ColumnType::String),
            FieldSpec::new("age", ColumnType::Int),
            FieldSpec::new("settings", ColumnType::Jsonb { shape: None }),
            FieldSpec::repeated("nicknames", ColumnType::String),
            FieldSpec::new(
                "address",
                ColumnType::Composite(vec![
                    FieldSpec::new("city", ColumnType::String),
                    FieldSpec::new("zip", ColumnType::String),
                ]),
            ),
        ];
        PgTypeProvider::new(IndexMap::from([("users".to_owned(), users)]))
    }

    #[test]
    fn struct_resolution() {
        let provider = provider();
        assert!(provider.find_struct("users"));
        assert!(provider.find_struct("users.address"));
        assert!(!provider.find_struct("users.name"));
        assert!(!provider.find_struct("orders"));
    }

    #[test]
    fn ordered_field_names() {
        let provider = provider();
        assert_eq!(
            provider.find_field_names("users").unwrap(),
            vec!["name", "age", "settings", "nicknames", "address"]
        );
        assert_eq!(
            provider.find_field_names("users.address").unwrap(),
            vec!["city", "zip"]
        );
    }

    #[test]
    fn field_types() {
        let provider = provider();
        assert_eq!(
            provider.find_field_type("users", "name"),
            Some(CelType::String)
        );
        assert_eq!(provider.find_field_type("users", "age"), Some(CelType::Int));
        assert_eq!(
            provider.find_field_type("users", "settings"),
            Some(CelType::Dyn)
        );
        assert_eq!(
            provider.find_field_type("users", "nicknames"),
            Some(CelType::list(CelType::String))
        );
        assert_eq!(
            provider.find_field_type("users", "address"),
            Some(CelType::Object("users.address".to_owned()))
        );
        assert_eq!(
            provider.find_field_type("users.address", "city"),
            Some(CelType::String)
        );
        assert_eq!(provider.find_field_type("users", "missing"), None);
    }

    #[tokio::test]
    async fn load_without_connection_fails() {
        let mut provider = provider();
        let err = provider.load_table_schema("users").await.unwrap_err();
        assert!(matches!(err, ProviderError::Unconfigured));
    }
}
