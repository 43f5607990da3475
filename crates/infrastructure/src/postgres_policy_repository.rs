use async_trait::async_trait;
use rolegate_application::{PolicyAdminRepository, PolicyRegistry};
use rolegate_core::{AppError, AppResult};
use rolegate_domain::{RoleLevelPolicy, ScopeRow};
use sqlx::{FromRow, PgPool};

/// PostgreSQL-backed policy registry and administration adapter.
#[derive(Clone)]
pub struct PostgresPolicyRepository {
    pool: PgPool,
}

impl PostgresPolicyRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_scope_rows(&self, role: &str) -> AppResult<Vec<ScopeRow>> {
        let rows = sqlx::query_as::<_, PolicyScopeRow>(
            r#"
            SELECT entity_type, entity_id
            FROM policy_scope_rows
            WHERE role_name = $1
            ORDER BY position
            "#,
        )
        .bind(role)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load policy rows: {error}")))?;

        rows.into_iter()
            .map(|row| ScopeRow::new(row.entity_type, row.entity_id))
            .collect()
    }
}

#[derive(Debug, FromRow)]
struct PolicyRow {
    role_name: String,
    overlappable: bool,
    number_of_actors: Option<i32>,
    territory_type: Option<String>,
}

#[derive(Debug, FromRow)]
struct PolicyScopeRow {
    entity_type: String,
    entity_id: String,
}

fn restore_policy(row: PolicyRow, scope_rows: Vec<ScopeRow>) -> AppResult<RoleLevelPolicy> {
    let number_of_actors = match row.number_of_actors {
        Some(limit) if limit >= 0 => Some(limit as u32),
        Some(limit) => {
            return Err(AppError::Internal(format!(
                "policy for '{}' has negative quota {limit}",
                row.role_name
            )));
        }
        None => None,
    };

    RoleLevelPolicy::new(
        row.role_name,
        row.overlappable,
        number_of_actors,
        row.territory_type,
        scope_rows,
    )
}

#[async_trait]
impl PolicyRegistry for PostgresPolicyRepository {
    async fn get(&self, role: &str) -> AppResult<Option<RoleLevelPolicy>> {
        let row = sqlx::query_as::<_, PolicyRow>(
            r#"
            SELECT role_name, overlappable, number_of_actors, territory_type
            FROM role_level_policies
            WHERE role_name = $1
            "#,
        )
        .bind(role)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load policy: {error}")))?;

        match row {
            Some(row) => {
                let scope_rows = self.fetch_scope_rows(&row.role_name).await?;
                Ok(Some(restore_policy(row, scope_rows)?))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl PolicyAdminRepository for PostgresPolicyRepository {
    async fn upsert_policy(&self, policy: RoleLevelPolicy) -> AppResult<()> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        sqlx::query(
            r#"
            INSERT INTO role_level_policies (role_name, overlappable, number_of_actors, territory_type)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (role_name) DO UPDATE
            SET overlappable = EXCLUDED.overlappable,
                number_of_actors = EXCLUDED.number_of_actors,
                territory_type = EXCLUDED.territory_type
            "#,
        )
        .bind(policy.role().as_str())
        .bind(policy.overlappable())
        .bind(policy.number_of_actors().map(|limit| limit as i32))
        .bind(policy.territory_type().map(|territory_type| territory_type.as_str()))
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to persist policy: {error}")))?;

        sqlx::query("DELETE FROM policy_scope_rows WHERE role_name = $1")
            .bind(policy.role().as_str())
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to clear policy rows: {error}"))
            })?;

        for (position, row) in policy.scope_rows().iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO policy_scope_rows (role_name, position, entity_type, entity_id)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(policy.role().as_str())
            .bind(position as i32)
            .bind(row.entity_type().as_str())
            .bind(row.entity_id().as_str())
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to persist policy rows: {error}"))
            })?;
        }

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })
    }

    async fn list_policies(&self) -> AppResult<Vec<RoleLevelPolicy>> {
        let rows = sqlx::query_as::<_, PolicyRow>(
            r#"
            SELECT role_name, overlappable, number_of_actors, territory_type
            FROM role_level_policies
            ORDER BY role_name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list policies: {error}")))?;

        let mut policies = Vec::with_capacity(rows.len());
        for row in rows {
            let scope_rows = self.fetch_scope_rows(&row.role_name).await?;
            policies.push(restore_policy(row, scope_rows)?);
        }
        Ok(policies)
    }
}
