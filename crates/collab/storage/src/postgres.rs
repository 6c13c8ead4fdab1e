//! PostgreSQL adapter for the collaboration store.
//!
//! This adapter is the transactional source-of-truth backend. A commit runs
//! in one transaction: the program row is updated only if its version still
//! matches (which also takes its row lock), then every collaboration row is
//! upserted. Collaboration rows cascade on program deletion, and a partial
//! unique index keeps at most one live row per invitee and program.

use crate::model::{AggregateCommit, ProgramAggregate};
use crate::traits::{AdminDirectory, AggregateStore, CollaborationStore, ProgramStore};
use crate::{StorageError, StorageResult};
use async_trait::async_trait;
use chrono::NaiveDate;
use collab_types::{
    AdminAccount, AdminId, AdminRole, Collaboration, CollaborationId, CollaborationStatus,
    OrganizationId, Program, ProgramId, ProgramStatus,
};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;

const PROGRAM_COLUMNS: &str = "program_id, title, description, category, owning_organization_id, \
     owner_admin_id, event_dates, status, version, created_at, updated_at";

const COLLABORATION_COLUMNS: &str = "collaboration_id, program_id, inviter_admin_id, inviter_org_id, \
     invitee_admin_id, invitee_org_id, status, invited_at, responded_at";

/// PostgreSQL-backed storage adapter.
#[derive(Clone)]
pub struct PostgresCollabStorage {
    pool: PgPool,
}

impl PostgresCollabStorage {
    /// Connect to PostgreSQL and initialize required schema.
    pub async fn connect(database_url: &str) -> StorageResult<Self> {
        Self::connect_with_options(database_url, 10, 5).await
    }

    /// Connect with explicit pool parameters.
    pub async fn connect_with_options(
        database_url: &str,
        max_connections: u32,
        connect_timeout_secs: u64,
    ) -> StorageResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(std::time::Duration::from_secs(connect_timeout_secs))
            .connect(database_url)
            .await
            .map_err(|e| StorageError::Backend(format!("failed to connect postgres: {e}")))?;
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Create adapter from an existing pool.
    pub async fn from_pool(pool: PgPool) -> StorageResult<Self> {
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn init_schema(&self) -> StorageResult<()> {
        let ddl = [
            r#"
            CREATE TABLE IF NOT EXISTS collab_admins (
                admin_id TEXT PRIMARY KEY,
                organization_id TEXT NOT NULL,
                display_name TEXT NOT NULL,
                role TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS collab_programs (
                program_id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                category TEXT NOT NULL,
                owning_organization_id TEXT NOT NULL,
                owner_admin_id TEXT NOT NULL,
                event_dates JSONB NOT NULL,
                status TEXT NOT NULL,
                version BIGINT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS collab_collaborations (
                collaboration_id TEXT PRIMARY KEY,
                program_id TEXT NOT NULL REFERENCES collab_programs (program_id) ON DELETE CASCADE,
                inviter_admin_id TEXT NOT NULL,
                inviter_org_id TEXT NOT NULL,
                invitee_admin_id TEXT NOT NULL,
                invitee_org_id TEXT NOT NULL,
                status TEXT NOT NULL,
                invited_at TIMESTAMPTZ NOT NULL,
                responded_at TIMESTAMPTZ
            )
            "#,
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS collab_collaborations_live_invitee
                ON collab_collaborations (program_id, invitee_admin_id)
             WHERE status IN ('pending', 'accepted')
            "#,
            r#"
            CREATE INDEX IF NOT EXISTS collab_collaborations_invitee
                ON collab_collaborations (invitee_admin_id)
            "#,
            r#"
            CREATE INDEX IF NOT EXISTS collab_collaborations_inviter
                ON collab_collaborations (inviter_admin_id)
            "#,
            r#"
            CREATE INDEX IF NOT EXISTS collab_programs_status
                ON collab_programs (status)
            "#,
        ];

        for stmt in ddl {
            sqlx::query(stmt)
                .execute(&self.pool)
                .await
                .map_err(|e| StorageError::Backend(format!("schema init failed: {e}")))?;
        }
        Ok(())
    }
}

#[async_trait]
impl ProgramStore for PostgresCollabStorage {
    async fn insert_program(&self, program: Program) -> StorageResult<()> {
        let event_dates = serde_json::to_value(&program.event_dates)
            .map_err(|e| StorageError::InvalidData(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO collab_programs
                (program_id, title, description, category, owning_organization_id, owner_admin_id,
                 event_dates, status, version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(program.program_id.as_str())
        .bind(&program.title)
        .bind(&program.description)
        .bind(&program.category)
        .bind(program.owning_organization_id.as_str())
        .bind(program.owner_admin_id.as_str())
        .bind(event_dates)
        .bind(program.status.as_str())
        .bind(to_i64(program.version)?)
        .bind(program.created_at)
        .bind(program.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_conflict)?;

        Ok(())
    }

    async fn get_program(&self, program_id: &ProgramId) -> StorageResult<Option<Program>> {
        let row = sqlx::query(&format!(
            "SELECT {PROGRAM_COLUMNS} FROM collab_programs WHERE program_id = $1"
        ))
        .bind(program_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Backend(e.to_string()))?;

        row.map(program_row_to_record).transpose()
    }

    async fn list_programs_by_status(&self, status: ProgramStatus) -> StorageResult<Vec<Program>> {
        let rows = sqlx::query(&format!(
            "SELECT {PROGRAM_COLUMNS} FROM collab_programs WHERE status = $1 ORDER BY updated_at DESC"
        ))
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Backend(e.to_string()))?;

        rows.into_iter().map(program_row_to_record).collect()
    }

    async fn delete_program(&self, program_id: &ProgramId) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM collab_programs WHERE program_id = $1")
            .bind(program_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl CollaborationStore for PostgresCollabStorage {
    async fn get_collaboration(
        &self,
        collaboration_id: &CollaborationId,
    ) -> StorageResult<Option<Collaboration>> {
        let row = sqlx::query(&format!(
            "SELECT {COLLABORATION_COLUMNS} FROM collab_collaborations WHERE collaboration_id = $1"
        ))
        .bind(collaboration_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Backend(e.to_string()))?;

        row.map(collaboration_row_to_record).transpose()
    }

    async fn list_collaborations_for_program(
        &self,
        program_id: &ProgramId,
    ) -> StorageResult<Vec<Collaboration>> {
        let rows = sqlx::query(&format!(
            "SELECT {COLLABORATION_COLUMNS} FROM collab_collaborations \
              WHERE program_id = $1 ORDER BY invited_at ASC, collaboration_id ASC"
        ))
        .bind(program_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Backend(e.to_string()))?;

        rows.into_iter().map(collaboration_row_to_record).collect()
    }

    async fn list_collaborations_for_admin(
        &self,
        admin_id: &AdminId,
    ) -> StorageResult<Vec<Collaboration>> {
        let rows = sqlx::query(&format!(
            "SELECT {COLLABORATION_COLUMNS} FROM collab_collaborations \
              WHERE inviter_admin_id = $1 OR invitee_admin_id = $1 ORDER BY invited_at DESC"
        ))
        .bind(admin_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Backend(e.to_string()))?;

        rows.into_iter().map(collaboration_row_to_record).collect()
    }
}

#[async_trait]
impl AggregateStore for PostgresCollabStorage {
    async fn load_aggregate(
        &self,
        program_id: &ProgramId,
    ) -> StorageResult<Option<ProgramAggregate>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        let program = sqlx::query(&format!(
            "SELECT {PROGRAM_COLUMNS} FROM collab_programs WHERE program_id = $1"
        ))
        .bind(program_id.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| StorageError::Backend(e.to_string()))?
        .map(program_row_to_record)
        .transpose()?;

        let Some(program) = program else {
            tx.rollback()
                .await
                .map_err(|e| StorageError::Backend(e.to_string()))?;
            return Ok(None);
        };

        let collaborations = sqlx::query(&format!(
            "SELECT {COLLABORATION_COLUMNS} FROM collab_collaborations \
              WHERE program_id = $1 ORDER BY invited_at ASC, collaboration_id ASC"
        ))
        .bind(program_id.as_str())
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| StorageError::Backend(e.to_string()))?
        .into_iter()
        .map(collaboration_row_to_record)
        .collect::<StorageResult<Vec<_>>>()?;

        tx.commit()
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        Ok(Some(ProgramAggregate {
            program,
            collaborations,
        }))
    }

    async fn commit_aggregate(&self, commit: AggregateCommit) -> StorageResult<Program> {
        let AggregateCommit {
            mut program,
            expected_version,
            collaborations,
        } = commit;

        if let Some(stray) = collaborations
            .iter()
            .find(|row| row.program_id != program.program_id)
        {
            return Err(StorageError::InvalidData(format!(
                "collaboration {} belongs to program {}, not {}",
                stray.collaboration_id, stray.program_id, program.program_id
            )));
        }

        let event_dates = serde_json::to_value(&program.event_dates)
            .map_err(|e| StorageError::InvalidData(e.to_string()))?;
        let next_version = expected_version + 1;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        let updated = sqlx::query(
            r#"
            UPDATE collab_programs
               SET title = $1,
                   description = $2,
                   category = $3,
                   event_dates = $4,
                   status = $5,
                   version = $6,
                   updated_at = $7
             WHERE program_id = $8
               AND version = $9
            "#,
        )
        .bind(&program.title)
        .bind(&program.description)
        .bind(&program.category)
        .bind(event_dates)
        .bind(program.status.as_str())
        .bind(to_i64(next_version)?)
        .bind(program.updated_at)
        .bind(program.program_id.as_str())
        .bind(to_i64(expected_version)?)
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::Backend(e.to_string()))?;

        if updated.rows_affected() == 0 {
            let found: Option<i64> =
                sqlx::query_scalar("SELECT version FROM collab_programs WHERE program_id = $1")
                    .bind(program.program_id.as_str())
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(|e| StorageError::Backend(e.to_string()))?;
            tx.rollback()
                .await
                .map_err(|e| StorageError::Backend(e.to_string()))?;
            return Err(match found {
                Some(found) => StorageError::VersionConflict {
                    program_id: program.program_id.to_string(),
                    expected: expected_version,
                    found: from_i64(found)?,
                },
                None => StorageError::NotFound(format!("program {} not found", program.program_id)),
            });
        }

        for row in &collaborations {
            sqlx::query(
                r#"
                INSERT INTO collab_collaborations
                    (collaboration_id, program_id, inviter_admin_id, inviter_org_id,
                     invitee_admin_id, invitee_org_id, status, invited_at, responded_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                ON CONFLICT (collaboration_id) DO UPDATE
                   SET status = EXCLUDED.status,
                       responded_at = EXCLUDED.responded_at
                "#,
            )
            .bind(row.collaboration_id.as_str())
            .bind(row.program_id.as_str())
            .bind(row.inviter_admin_id.as_str())
            .bind(row.inviter_org_id.as_str())
            .bind(row.invitee_admin_id.as_str())
            .bind(row.invitee_org_id.as_str())
            .bind(row.status.as_str())
            .bind(row.invited_at)
            .bind(row.responded_at)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_conflict)?;
        }

        tx.commit()
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        program.version = next_version;
        Ok(program)
    }
}

#[async_trait]
impl AdminDirectory for PostgresCollabStorage {
    async fn upsert_admin(&self, admin: AdminAccount) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO collab_admins (admin_id, organization_id, display_name, role)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (admin_id) DO UPDATE
               SET organization_id = EXCLUDED.organization_id,
                   display_name = EXCLUDED.display_name,
                   role = EXCLUDED.role
            "#,
        )
        .bind(admin.admin_id.as_str())
        .bind(admin.organization_id.as_str())
        .bind(&admin.display_name)
        .bind(admin.role.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(())
    }

    async fn get_admin(&self, admin_id: &AdminId) -> StorageResult<Option<AdminAccount>> {
        let row = sqlx::query(
            "SELECT admin_id, organization_id, display_name, role FROM collab_admins WHERE admin_id = $1",
        )
        .bind(admin_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Backend(e.to_string()))?;

        row.map(|row| {
            let role: String = get(&row, "role")?;
            Ok(AdminAccount {
                admin_id: AdminId::new(get::<String>(&row, "admin_id")?),
                organization_id: OrganizationId::new(get::<String>(&row, "organization_id")?),
                display_name: get(&row, "display_name")?,
                role: AdminRole::parse(&role).ok_or_else(|| {
                    StorageError::InvalidData(format!("unknown admin role `{role}`"))
                })?,
            })
        })
        .transpose()
    }
}

fn get<'r, T>(row: &'r PgRow, column: &str) -> StorageResult<T>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(column)
        .map_err(|e| StorageError::Backend(e.to_string()))
}

fn program_row_to_record(row: PgRow) -> StorageResult<Program> {
    let status: String = get(&row, "status")?;
    let event_dates: serde_json::Value = get(&row, "event_dates")?;
    let event_dates: Vec<NaiveDate> = serde_json::from_value(event_dates)
        .map_err(|e| StorageError::InvalidData(e.to_string()))?;

    Ok(Program {
        program_id: ProgramId::new(get::<String>(&row, "program_id")?),
        title: get(&row, "title")?,
        description: get(&row, "description")?,
        category: get(&row, "category")?,
        owning_organization_id: OrganizationId::new(get::<String>(
            &row,
            "owning_organization_id",
        )?),
        owner_admin_id: AdminId::new(get::<String>(&row, "owner_admin_id")?),
        event_dates,
        status: ProgramStatus::parse(&status)
            .ok_or_else(|| StorageError::InvalidData(format!("unknown program status `{status}`")))?,
        version: from_i64(get(&row, "version")?)?,
        created_at: get(&row, "created_at")?,
        updated_at: get(&row, "updated_at")?,
    })
}

fn collaboration_row_to_record(row: PgRow) -> StorageResult<Collaboration> {
    let status: String = get(&row, "status")?;

    Ok(Collaboration {
        collaboration_id: CollaborationId::new(get::<String>(&row, "collaboration_id")?),
        program_id: ProgramId::new(get::<String>(&row, "program_id")?),
        inviter_admin_id: AdminId::new(get::<String>(&row, "inviter_admin_id")?),
        inviter_org_id: OrganizationId::new(get::<String>(&row, "inviter_org_id")?),
        invitee_admin_id: AdminId::new(get::<String>(&row, "invitee_admin_id")?),
        invitee_org_id: OrganizationId::new(get::<String>(&row, "invitee_org_id")?),
        status: CollaborationStatus::parse(&status).ok_or_else(|| {
            StorageError::InvalidData(format!("unknown collaboration status `{status}`"))
        })?,
        invited_at: get(&row, "invited_at")?,
        responded_at: get(&row, "responded_at")?,
    })
}

fn map_sqlx_conflict(err: sqlx::Error) -> StorageError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23505") {
            return StorageError::Conflict(db_err.message().to_string());
        }
    }
    StorageError::Backend(err.to_string())
}

fn to_i64(value: u64) -> StorageResult<i64> {
    i64::try_from(value).map_err(|_| StorageError::InvalidData("version too large".to_string()))
}

fn from_i64(value: i64) -> StorageResult<u64> {
    u64::try_from(value).map_err(|_| StorageError::InvalidData("negative version".to_string()))
}
