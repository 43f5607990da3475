use std::collections::BTreeMap;

use async_trait::async_trait;
use rolegate_application::{
    DirectoryAdminRepository, EntityDirectory, TerritoryQuery, TerritorySummary,
};
use rolegate_core::{AppError, AppResult};
use rolegate_domain::{LinkFieldDeclaration, ScopeEntityRecord, TERRITORY_ENTITY};
use serde_json::Value;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

/// PostgreSQL-backed scoped-entity directory.
///
/// Link-field values live in a JSONB bag per entity; link-field declarations
/// live in their own table and back the introspection query.
#[derive(Clone)]
pub struct PostgresEntityDirectory {
    pool: PgPool,
}

impl PostgresEntityDirectory {
    /// Creates a directory with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct EntityRow {
    entity_type: String,
    entity_id: String,
    fields: Value,
}

#[derive(Debug, FromRow)]
struct TerritoryRow {
    name: String,
    territory_type: Option<String>,
}

fn restore_entity(row: EntityRow) -> AppResult<ScopeEntityRecord> {
    let mut fields = BTreeMap::new();
    if let Value::Object(entries) = row.fields {
        for (name, value) in entries {
            if let Value::String(value) = value {
                fields.insert(name, value);
            }
        }
    }

    ScopeEntityRecord::new(row.entity_type, row.entity_id, fields)
}

#[async_trait]
impl EntityDirectory for PostgresEntityDirectory {
    async fn load(
        &self,
        entity_type: &str,
        entity_id: &str,
    ) -> AppResult<Option<ScopeEntityRecord>> {
        let row = sqlx::query_as::<_, EntityRow>(
            r#"
            SELECT entity_type, entity_id, fields
            FROM scope_entities
            WHERE entity_type = $1 AND entity_id = $2
            "#,
        )
        .bind(entity_type)
        .bind(entity_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load scoped entity: {error}")))?;

        row.map(restore_entity).transpose()
    }

    async fn link_fields(&self, entity_type: &str, target_type: &str) -> AppResult<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT field_name
            FROM scope_link_fields
            WHERE entity_type = $1 AND target_type = $2
            ORDER BY field_name
            "#,
        )
        .bind(entity_type)
        .bind(target_type)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load link fields: {error}")))
    }

    async fn list_territories(&self, query: TerritoryQuery) -> AppResult<Vec<TerritorySummary>> {
        let mut builder = QueryBuilder::<Postgres>::new(
            "SELECT entity_id AS name, fields->>'territory_type' AS territory_type \
             FROM scope_entities WHERE entity_type = ",
        );
        builder.push_bind(TERRITORY_ENTITY);
        if let Some(territory_type) = &query.territory_type {
            builder
                .push(" AND fields->>'territory_type' = ")
                .push_bind(territory_type);
        }
        if let Some(text) = &query.name_contains {
            builder
                .push(" AND entity_id ILIKE ")
                .push_bind(format!("%{text}%"));
        }
        builder.push(" ORDER BY entity_id");
        if query.limit > 0 {
            builder.push(" LIMIT ").push_bind(query.limit as i64);
        }
        builder.push(" OFFSET ").push_bind(query.offset as i64);

        let rows: Vec<TerritoryRow> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to list territories: {error}")))?;

        Ok(rows
            .into_iter()
            .map(|row| TerritorySummary {
                name: row.name,
                territory_type: row.territory_type,
            })
            .collect())
    }
}

#[async_trait]
impl DirectoryAdminRepository for PostgresEntityDirectory {
    async fn upsert_entity(&self, record: ScopeEntityRecord) -> AppResult<()> {
        let fields = Value::Object(
            record
                .fields()
                .iter()
                .map(|(name, value)| (name.clone(), Value::String(value.clone())))
                .collect(),
        );

        sqlx::query(
            r#"
            INSERT INTO scope_entities (entity_type, entity_id, fields)
            VALUES ($1, $2, $3)
            ON CONFLICT (entity_type, entity_id) DO UPDATE
            SET fields = EXCLUDED.fields
            "#,
        )
        .bind(record.entity_type().as_str())
        .bind(record.entity_id().as_str())
        .bind(fields)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to persist scoped entity: {error}")))?;

        Ok(())
    }

    async fn declare_link_fields(
        &self,
        entity_type: &str,
        declarations: Vec<LinkFieldDeclaration>,
    ) -> AppResult<()> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        sqlx::query("DELETE FROM scope_link_fields WHERE entity_type = $1")
            .bind(entity_type)
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to clear link fields: {error}"))
            })?;

        for declaration in &declarations {
            sqlx::query(
                r#"
                INSERT INTO scope_link_fields (entity_type, field_name, target_type)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(entity_type)
            .bind(declaration.field_name.as_str())
            .bind(declaration.target_type.as_str())
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to persist link fields: {error}"))
            })?;
        }

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })
    }
}
