use std::str::FromStr;

use async_trait::async_trait;
use rolegate_application::{
    AssignmentQuery, AssignmentRepository, ProfileQuery, ProfileRepository, TerritoryMatch,
};
use rolegate_core::{AppError, AppResult, AssignmentId, ProfileId};
use rolegate_domain::{
    LifecycleState, RolePermissionProfile, ScopeRow, UserRoleAssignment,
};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Transaction};

/// PostgreSQL-backed repository for user role assignments.
#[derive(Clone)]
pub struct PostgresAssignmentRepository {
    pool: PgPool,
}

impl PostgresAssignmentRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AssignmentRow {
    id: uuid::Uuid,
    user_name: String,
    role_name: String,
    territory: Option<String>,
    company: Option<String>,
    state: String,
}

#[derive(Debug, FromRow)]
struct ScopeRowRow {
    entity_type: String,
    entity_id: String,
}

async fn fetch_assignment_rows(
    pool: &PgPool,
    assignment_id: uuid::Uuid,
) -> AppResult<Vec<ScopeRow>> {
    let rows = sqlx::query_as::<_, ScopeRowRow>(
        r#"
        SELECT entity_type, entity_id
        FROM assignment_detail_rows
        WHERE assignment_id = $1
        ORDER BY position
        "#,
    )
    .bind(assignment_id)
    .fetch_all(pool)
    .await
    .map_err(|error| AppError::Internal(format!("failed to load assignment rows: {error}")))?;

    rows.into_iter()
        .map(|row| ScopeRow::new(row.entity_type, row.entity_id))
        .collect()
}

fn restore_assignment(row: AssignmentRow, detail_rows: Vec<ScopeRow>) -> AppResult<UserRoleAssignment> {
    UserRoleAssignment::restore(
        AssignmentId::from_uuid(row.id),
        row.user_name,
        row.role_name,
        row.territory,
        row.company,
        detail_rows,
        LifecycleState::from_str(&row.state)?,
    )
}

async fn insert_detail_rows(
    transaction: &mut Transaction<'_, Postgres>,
    table: &str,
    owner_column: &str,
    owner_id: uuid::Uuid,
    rows: &[ScopeRow],
) -> AppResult<()> {
    for (position, row) in rows.iter().enumerate() {
        let statement = format!(
            "INSERT INTO {table} ({owner_column}, position, entity_type, entity_id) \
             VALUES ($1, $2, $3, $4)"
        );
        sqlx::query(&statement)
            .bind(owner_id)
            .bind(position as i32)
            .bind(row.entity_type().as_str())
            .bind(row.entity_id().as_str())
            .execute(&mut **transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to persist scope rows: {error}"))
            })?;
    }

    Ok(())
}

#[async_trait]
impl AssignmentRepository for PostgresAssignmentRepository {
    async fn insert_assignment(&self, assignment: UserRoleAssignment) -> AppResult<()> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        sqlx::query(
            r#"
            INSERT INTO user_role_assignments (id, user_name, role_name, territory, company, state)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(assignment.id().as_uuid())
        .bind(assignment.user().as_str())
        .bind(assignment.role().as_str())
        .bind(assignment.territory().map(|territory| territory.as_str()))
        .bind(assignment.company().map(|company| company.as_str()))
        .bind(assignment.state().as_str())
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to persist assignment: {error}")))?;

        insert_detail_rows(
            &mut transaction,
            "assignment_detail_rows",
            "assignment_id",
            assignment.id().as_uuid(),
            assignment.detail_rows(),
        )
        .await?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })
    }

    async fn find_assignment(&self, id: AssignmentId) -> AppResult<Option<UserRoleAssignment>> {
        let row = sqlx::query_as::<_, AssignmentRow>(
            r#"
            SELECT id, user_name, role_name, territory, company, state
            FROM user_role_assignments
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load assignment: {error}")))?;

        match row {
            Some(row) => {
                let detail_rows = fetch_assignment_rows(&self.pool, row.id).await?;
                Ok(Some(restore_assignment(row, detail_rows)?))
            }
            None => Ok(None),
        }
    }

    async fn list_assignments(&self, query: AssignmentQuery) -> AppResult<Vec<UserRoleAssignment>> {
        let mut builder = QueryBuilder::<Postgres>::new(
            "SELECT id, user_name, role_name, territory, company, state \
             FROM user_role_assignments WHERE TRUE",
        );
        if let Some(user) = &query.user {
            builder.push(" AND user_name = ").push_bind(user);
        }
        if let Some(role) = &query.role {
            builder.push(" AND role_name = ").push_bind(role);
        }
        match &query.territory {
            Some(TerritoryMatch::Is(territory)) => {
                builder.push(" AND territory = ").push_bind(territory);
            }
            Some(TerritoryMatch::Unset) => {
                builder.push(" AND territory IS NULL");
            }
            None => {}
        }
        if let Some(state) = query.state {
            builder.push(" AND state = ").push_bind(state.as_str());
        }
        if let Some(excluded) = query.exclude {
            builder.push(" AND id <> ").push_bind(excluded.as_uuid());
        }
        builder.push(" ORDER BY created_at, id");

        let rows: Vec<AssignmentRow> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to list assignments: {error}")))?;

        let mut assignments = Vec::with_capacity(rows.len());
        for row in rows {
            let detail_rows = fetch_assignment_rows(&self.pool, row.id).await?;
            assignments.push(restore_assignment(row, detail_rows)?);
        }
        Ok(assignments)
    }

    async fn update_assignment_state(
        &self,
        id: AssignmentId,
        state: LifecycleState,
    ) -> AppResult<()> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE user_role_assignments
            SET state = $2
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(state.as_str())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to update assignment state: {error}"))
        })?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!(
                "assignment '{id}' does not exist"
            )));
        }

        Ok(())
    }
}

/// PostgreSQL-backed repository for role permission profiles.
#[derive(Clone)]
pub struct PostgresProfileRepository {
    pool: PgPool,
}

impl PostgresProfileRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_profile_rows(&self, profile_id: uuid::Uuid) -> AppResult<Vec<ScopeRow>> {
        let rows = sqlx::query_as::<_, ScopeRowRow>(
            r#"
            SELECT entity_type, entity_id
            FROM profile_detail_rows
            WHERE profile_id = $1
            ORDER BY position
            "#,
        )
        .bind(profile_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load profile rows: {error}")))?;

        rows.into_iter()
            .map(|row| ScopeRow::new(row.entity_type, row.entity_id))
            .collect()
    }
}

#[derive(Debug, FromRow)]
struct ProfileRow {
    id: uuid::Uuid,
    role_name: String,
    state: String,
}

fn restore_profile(row: ProfileRow, detail_rows: Vec<ScopeRow>) -> AppResult<RolePermissionProfile> {
    RolePermissionProfile::restore(
        ProfileId::from_uuid(row.id),
        row.role_name,
        detail_rows,
        LifecycleState::from_str(&row.state)?,
    )
}

#[async_trait]
impl ProfileRepository for PostgresProfileRepository {
    async fn insert_profile(&self, profile: RolePermissionProfile) -> AppResult<()> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        sqlx::query(
            r#"
            INSERT INTO role_permission_profiles (id, role_name, state)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(profile.id().as_uuid())
        .bind(profile.role().as_str())
        .bind(profile.state().as_str())
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to persist profile: {error}")))?;

        insert_detail_rows(
            &mut transaction,
            "profile_detail_rows",
            "profile_id",
            profile.id().as_uuid(),
            profile.detail_rows(),
        )
        .await?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })
    }

    async fn find_profile(&self, id: ProfileId) -> AppResult<Option<RolePermissionProfile>> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT id, role_name, state
            FROM role_permission_profiles
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load profile: {error}")))?;

        match row {
            Some(row) => {
                let detail_rows = self.fetch_profile_rows(row.id).await?;
                Ok(Some(restore_profile(row, detail_rows)?))
            }
            None => Ok(None),
        }
    }

    async fn list_profiles(&self, query: ProfileQuery) -> AppResult<Vec<RolePermissionProfile>> {
        let mut builder = QueryBuilder::<Postgres>::new(
            "SELECT id, role_name, state FROM role_permission_profiles WHERE TRUE",
        );
        if let Some(role) = &query.role {
            builder.push(" AND role_name = ").push_bind(role);
        }
        if let Some(state) = query.state {
            builder.push(" AND state = ").push_bind(state.as_str());
        }
        if let Some(excluded) = query.exclude {
            builder.push(" AND id <> ").push_bind(excluded.as_uuid());
        }
        builder.push(" ORDER BY created_at, id");

        let rows: Vec<ProfileRow> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to list profiles: {error}")))?;

        let mut profiles = Vec::with_capacity(rows.len());
        for row in rows {
            let detail_rows = self.fetch_profile_rows(row.id).await?;
            profiles.push(restore_profile(row, detail_rows)?);
        }
        Ok(profiles)
    }

    async fn update_profile_state(&self, id: ProfileId, state: LifecycleState) -> AppResult<()> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE role_permission_profiles
            SET state = $2
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(state.as_str())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update profile state: {error}")))?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!("profile '{id}' does not exist")));
        }

        Ok(())
    }
}
