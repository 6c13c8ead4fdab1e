//! In-memory reference implementation of the collaboration store.
//!
//! All tables sit behind one lock, so a commit is a single critical section:
//! the version check, the program write and the row writes are observed
//! together or not at all. Production deployments should use the PostgreSQL
//! adapter as the source of truth.

use crate::model::{AggregateCommit, ProgramAggregate};
use crate::traits::{AdminDirectory, AggregateStore, CollaborationStore, ProgramStore};
use crate::{StorageError, StorageResult};
use async_trait::async_trait;
use collab_types::{
    AdminAccount, AdminId, Collaboration, CollaborationId, Program, ProgramId, ProgramStatus,
};
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Tables {
    programs: HashMap<ProgramId, Program>,
    collaborations: HashMap<CollaborationId, Collaboration>,
    admins: HashMap<AdminId, AdminAccount>,
}

impl Tables {
    fn rows_for(&self, program_id: &ProgramId) -> Vec<Collaboration> {
        let mut rows = self
            .collaborations
            .values()
            .filter(|row| &row.program_id == program_id)
            .cloned()
            .collect::<Vec<_>>();
        rows.sort_by(|a, b| {
            a.invited_at
                .cmp(&b.invited_at)
                .then_with(|| a.collaboration_id.cmp(&b.collaboration_id))
        });
        rows
    }
}

/// In-memory collaboration storage for development and testing.
#[derive(Debug, Default)]
pub struct InMemoryCollabStorage {
    tables: RwLock<Tables>,
}

impl InMemoryCollabStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the admin directory.
    pub async fn with_admins(self, admins: impl IntoIterator<Item = AdminAccount>) -> Self {
        {
            let mut tables = self.tables.write().await;
            for admin in admins {
                tables.admins.insert(admin.admin_id.clone(), admin);
            }
        }
        self
    }
}

#[async_trait]
impl ProgramStore for InMemoryCollabStorage {
    async fn insert_program(&self, program: Program) -> StorageResult<()> {
        let mut tables = self.tables.write().await;
        if tables.programs.contains_key(&program.program_id) {
            return Err(StorageError::Conflict(format!(
                "program {} already exists",
                program.program_id
            )));
        }
        tables.programs.insert(program.program_id.clone(), program);
        Ok(())
    }

    async fn get_program(&self, program_id: &ProgramId) -> StorageResult<Option<Program>> {
        let tables = self.tables.read().await;
        Ok(tables.programs.get(program_id).cloned())
    }

    async fn list_programs_by_status(&self, status: ProgramStatus) -> StorageResult<Vec<Program>> {
        let tables = self.tables.read().await;
        let mut programs = tables
            .programs
            .values()
            .filter(|program| program.status == status)
            .cloned()
            .collect::<Vec<_>>();
        programs.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(programs)
    }

    async fn delete_program(&self, program_id: &ProgramId) -> StorageResult<bool> {
        let mut tables = self.tables.write().await;
        let removed = tables.programs.remove(program_id).is_some();
        tables
            .collaborations
            .retain(|_, row| &row.program_id != program_id);
        Ok(removed)
    }
}

#[async_trait]
impl CollaborationStore for InMemoryCollabStorage {
    async fn get_collaboration(
        &self,
        collaboration_id: &CollaborationId,
    ) -> StorageResult<Option<Collaboration>> {
        let tables = self.tables.read().await;
        Ok(tables.collaborations.get(collaboration_id).cloned())
    }

    async fn list_collaborations_for_program(
        &self,
        program_id: &ProgramId,
    ) -> StorageResult<Vec<Collaboration>> {
        let tables = self.tables.read().await;
        Ok(tables.rows_for(program_id))
    }

    async fn list_collaborations_for_admin(
        &self,
        admin_id: &AdminId,
    ) -> StorageResult<Vec<Collaboration>> {
        let tables = self.tables.read().await;
        let mut rows = tables
            .collaborations
            .values()
            .filter(|row| &row.inviter_admin_id == admin_id || &row.invitee_admin_id == admin_id)
            .cloned()
            .collect::<Vec<_>>();
        rows.sort_by(|a, b| b.invited_at.cmp(&a.invited_at));
        Ok(rows)
    }
}

#[async_trait]
impl AggregateStore for InMemoryCollabStorage {
    async fn load_aggregate(
        &self,
        program_id: &ProgramId,
    ) -> StorageResult<Option<ProgramAggregate>> {
        let tables = self.tables.read().await;
        Ok(tables
            .programs
            .get(program_id)
            .cloned()
            .map(|program| ProgramAggregate {
                collaborations: tables.rows_for(program_id),
                program,
            }))
    }

    async fn commit_aggregate(&self, commit: AggregateCommit) -> StorageResult<Program> {
        let AggregateCommit {
            mut program,
            expected_version,
            collaborations,
        } = commit;

        let mut tables = self.tables.write().await;
        let stored = tables.programs.get(&program.program_id).ok_or_else(|| {
            StorageError::NotFound(format!("program {} not found", program.program_id))
        })?;

        if stored.version != expected_version {
            return Err(StorageError::VersionConflict {
                program_id: program.program_id.to_string(),
                expected: expected_version,
                found: stored.version,
            });
        }

        if let Some(stray) = collaborations
            .iter()
            .find(|row| row.program_id != program.program_id)
        {
            return Err(StorageError::InvalidData(format!(
                "collaboration {} belongs to program {}, not {}",
                stray.collaboration_id, stray.program_id, program.program_id
            )));
        }

        program.version = expected_version + 1;
        tables
            .programs
            .insert(program.program_id.clone(), program.clone());
        for row in collaborations {
            tables.collaborations.insert(row.collaboration_id.clone(), row);
        }

        tracing::trace!(
            program_id = %program.program_id,
            version = program.version,
            "committed program aggregate"
        );
        Ok(program)
    }
}

#[async_trait]
impl AdminDirectory for InMemoryCollabStorage {
    async fn upsert_admin(&self, admin: AdminAccount) -> StorageResult<()> {
        let mut tables = self.tables.write().await;
        tables.admins.insert(admin.admin_id.clone(), admin);
        Ok(())
    }

    async fn get_admin(&self, admin_id: &AdminId) -> StorageResult<Option<AdminAccount>> {
        let tables = self.tables.read().await;
        Ok(tables.admins.get(admin_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use collab_types::{CollaborationStatus, NewProgram, OrganizationId};

    fn program() -> Program {
        Program::draft(
            NewProgram::new("Tree planting"),
            OrganizationId::new("org-a"),
            AdminId::new("alice"),
        )
    }

    fn invite(program: &Program, invitee: &str) -> Collaboration {
        Collaboration::invite(
            program.program_id.clone(),
            AdminId::new("alice"),
            OrganizationId::new("org-a"),
            AdminId::new(invitee),
            OrganizationId::new(format!("org-{invitee}")),
        )
    }

    #[tokio::test]
    async fn commit_bumps_version_and_writes_rows() {
        let storage = InMemoryCollabStorage::new();
        let mut p = program();
        storage.insert_program(p.clone()).await.unwrap();

        p.status = ProgramStatus::PendingCollaboration;
        let row = invite(&p, "bob");
        let committed = storage
            .commit_aggregate(AggregateCommit::new(p.clone(), 0).with_collaborations([row.clone()]))
            .await
            .unwrap();

        assert_eq!(committed.version, 1);
        let aggregate = storage.load_aggregate(&p.program_id).await.unwrap().unwrap();
        assert_eq!(aggregate.program.status, ProgramStatus::PendingCollaboration);
        assert_eq!(aggregate.collaborations, vec![row]);
    }

    #[tokio::test]
    async fn stale_commit_writes_nothing() {
        let storage = InMemoryCollabStorage::new();
        let mut p = program();
        storage.insert_program(p.clone()).await.unwrap();
        storage
            .commit_aggregate(AggregateCommit::new(p.clone(), 0))
            .await
            .unwrap();

        p.status = ProgramStatus::PendingCollaboration;
        let row = invite(&p, "bob");
        let result = storage
            .commit_aggregate(AggregateCommit::new(p.clone(), 0).with_collaborations([row]))
            .await;

        assert!(matches!(
            result,
            Err(StorageError::VersionConflict {
                expected: 0,
                found: 1,
                ..
            })
        ));
        let aggregate = storage.load_aggregate(&p.program_id).await.unwrap().unwrap();
        assert_eq!(aggregate.program.status, ProgramStatus::Draft);
        assert!(aggregate.collaborations.is_empty());
    }

    #[tokio::test]
    async fn rows_of_another_program_are_refused() {
        let storage = InMemoryCollabStorage::new();
        let p = program();
        let other = program();
        storage.insert_program(p.clone()).await.unwrap();

        let result = storage
            .commit_aggregate(AggregateCommit::new(p.clone(), 0).with_collaborations([invite(&other, "bob")]))
            .await;

        assert!(matches!(result, Err(StorageError::InvalidData(_))));
        assert_eq!(storage.get_program(&p.program_id).await.unwrap().unwrap().version, 0);
    }

    #[tokio::test]
    async fn delete_cascades_to_rows() {
        let storage = InMemoryCollabStorage::new();
        let p = program();
        storage.insert_program(p.clone()).await.unwrap();
        let row = invite(&p, "bob");
        storage
            .commit_aggregate(AggregateCommit::new(p.clone(), 0).with_collaborations([row.clone()]))
            .await
            .unwrap();

        assert!(storage.delete_program(&p.program_id).await.unwrap());
        assert!(storage
            .get_collaboration(&row.collaboration_id)
            .await
            .unwrap()
            .is_none());
        assert!(!storage.delete_program(&p.program_id).await.unwrap());
    }

    #[tokio::test]
    async fn admin_listing_covers_both_directions() {
        let storage = InMemoryCollabStorage::new();
        let p = program();
        storage.insert_program(p.clone()).await.unwrap();
        let mut row = invite(&p, "bob");
        row.status = CollaborationStatus::Accepted;
        storage
            .commit_aggregate(AggregateCommit::new(p.clone(), 0).with_collaborations([row]))
            .await
            .unwrap();

        assert_eq!(
            storage
                .list_collaborations_for_admin(&AdminId::new("alice"))
                .await
                .unwrap()
                .len(),
            1
        );
        assert_eq!(
            storage
                .list_collaborations_for_admin(&AdminId::new("bob"))
                .await
                .unwrap()
                .len(),
            1
        );
        assert!(storage
            .list_collaborations_for_admin(&AdminId::new("carol"))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn duplicate_program_insert_conflicts() {
        let storage = InMemoryCollabStorage::new();
        let p = program();
        storage.insert_program(p.clone()).await.unwrap();
        assert!(matches!(
            storage.insert_program(p).await,
            Err(StorageError::Conflict(_))
        ));
    }
}
