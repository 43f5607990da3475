use async_trait::async_trait;
use rolegate_application::{PermissionRecordStore, RecordChangeSet};
use rolegate_core::{AppError, AppResult, AssignmentId, NonEmptyString, RecordId};
use rolegate_domain::{GrantOrigin, PermissionRecord, RecordFilter};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::debug;

/// PostgreSQL-backed permission record ledger.
///
/// A change set applies inside one transaction; committed rows transition to
/// retracted before physical deletion.
#[derive(Clone)]
pub struct PostgresRecordStore {
    pool: PgPool,
}

impl PostgresRecordStore {
    /// Creates a store with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RecordRow {
    id: uuid::Uuid,
    user_name: String,
    origin_assignment: uuid::Uuid,
    entity_type: Option<String>,
    entity_id: Option<String>,
    is_role_grant: bool,
    role_name: Option<String>,
}

fn restore_record(row: RecordRow) -> AppResult<PermissionRecord> {
    Ok(PermissionRecord::restore(
        RecordId::from_uuid(row.id),
        NonEmptyString::new(row.user_name)?,
        GrantOrigin::assignment(AssignmentId::from_uuid(row.origin_assignment)),
        row.entity_type.map(NonEmptyString::new).transpose()?,
        row.entity_id.map(NonEmptyString::new).transpose()?,
        row.is_role_grant,
        row.role_name.map(NonEmptyString::new).transpose()?,
    ))
}

#[async_trait]
impl PermissionRecordStore for PostgresRecordStore {
    async fn commit(&self, change_set: RecordChangeSet) -> AppResult<()> {
        if change_set.is_empty() {
            return Ok(());
        }

        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        for record in change_set.appends() {
            sqlx::query(
                r#"
                INSERT INTO permission_records
                    (id, user_name, origin_kind, origin_assignment, entity_type, entity_id,
                     is_entity_grant, is_role_grant, role_name, state)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'active')
                "#,
            )
            .bind(record.id().as_uuid())
            .bind(record.user().as_str())
            .bind(record.origin().kind())
            .bind(record.origin().assignment_id().as_uuid())
            .bind(record.entity_type().map(NonEmptyString::as_str))
            .bind(record.entity_id().map(NonEmptyString::as_str))
            .bind(record.is_entity_grant())
            .bind(record.is_role_grant())
            .bind(record.role_name().map(NonEmptyString::as_str))
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to persist permission record: {error}"))
            })?;
        }

        for id in change_set.removals() {
            sqlx::query(
                r#"
                UPDATE permission_records
                SET state = 'retracted'
                WHERE id = $1 AND state = 'active'
                "#,
            )
            .bind(id.as_uuid())
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to retract permission record: {error}"))
            })?;

            // Absent ids fall through as zero affected rows.
            sqlx::query("DELETE FROM permission_records WHERE id = $1")
                .bind(id.as_uuid())
                .execute(&mut *transaction)
                .await
                .map_err(|error| {
                    AppError::Internal(format!("failed to delete permission record: {error}"))
                })?;
        }

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        debug!(
            appended = change_set.appends().len(),
            removed = change_set.removals().len(),
            "permission record change set committed"
        );
        Ok(())
    }

    async fn find(&self, filter: RecordFilter) -> AppResult<Vec<PermissionRecord>> {
        let mut builder = QueryBuilder::<Postgres>::new(
            "SELECT id, user_name, origin_assignment, entity_type, entity_id, \
             is_role_grant, role_name FROM permission_records WHERE TRUE",
        );
        if let Some(user) = &filter.user {
            builder.push(" AND user_name = ").push_bind(user);
        }
        if let Some(assignment_id) = filter.origin_assignment {
            builder
                .push(" AND origin_assignment = ")
                .push_bind(assignment_id.as_uuid());
        }
        if let Some(entity_type) = &filter.entity_type {
            builder.push(" AND entity_type = ").push_bind(entity_type);
        }
        if let Some(entity_id) = &filter.entity_id {
            builder.push(" AND entity_id = ").push_bind(entity_id);
        }
        if let Some(is_role_grant) = filter.is_role_grant {
            builder.push(" AND is_role_grant = ").push_bind(is_role_grant);
        }
        builder.push(" ORDER BY created_at, id");

        let rows: Vec<RecordRow> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to list permission records: {error}"))
            })?;

        rows.into_iter().map(restore_record).collect()
    }
}
