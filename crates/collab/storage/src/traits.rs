use crate::model::{AggregateCommit, ProgramAggregate};
use crate::StorageResult;
use async_trait::async_trait;
use collab_types::{
    AdminAccount, AdminId, Collaboration, CollaborationId, Program, ProgramId, ProgramStatus,
};

/// Storage interface for program records.
#[async_trait]
pub trait ProgramStore: Send + Sync {
    /// Insert a newly created program.
    async fn insert_program(&self, program: Program) -> StorageResult<()>;

    /// Get one program by id.
    async fn get_program(&self, program_id: &ProgramId) -> StorageResult<Option<Program>>;

    /// List programs in a given status, most recently updated first.
    async fn list_programs_by_status(&self, status: ProgramStatus) -> StorageResult<Vec<Program>>;

    /// Delete a program and, with it, all of its collaboration rows.
    async fn delete_program(&self, program_id: &ProgramId) -> StorageResult<bool>;
}

/// Read access to collaboration rows.
#[async_trait]
pub trait CollaborationStore: Send + Sync {
    async fn get_collaboration(
        &self,
        collaboration_id: &CollaborationId,
    ) -> StorageResult<Option<Collaboration>>;

    /// Rows of one program, oldest invite first.
    async fn list_collaborations_for_program(
        &self,
        program_id: &ProgramId,
    ) -> StorageResult<Vec<Collaboration>>;

    /// Rows where the admin is inviter or invitee, newest invite first.
    async fn list_collaborations_for_admin(
        &self,
        admin_id: &AdminId,
    ) -> StorageResult<Vec<Collaboration>>;
}

/// Consistent reads and atomic writes of a whole program aggregate.
///
/// The program record is the serialization point: every write goes through
/// [`AggregateStore::commit_aggregate`] with the version it was planned
/// against.
#[async_trait]
pub trait AggregateStore: Send + Sync {
    /// Read a program and all of its rows as one consistent snapshot.
    async fn load_aggregate(&self, program_id: &ProgramId)
        -> StorageResult<Option<ProgramAggregate>>;

    /// Compare-and-swap the aggregate. Returns the program as stored.
    async fn commit_aggregate(&self, commit: AggregateCommit) -> StorageResult<Program>;
}

/// Lookup of admin accounts (role and organization).
#[async_trait]
pub trait AdminDirectory: Send + Sync {
    async fn upsert_admin(&self, admin: AdminAccount) -> StorageResult<()>;
    async fn get_admin(&self, admin_id: &AdminId) -> StorageResult<Option<AdminAccount>>;
}

/// Storage bundle used by the collaboration service.
pub trait CollabStorage:
    ProgramStore + CollaborationStore + AggregateStore + AdminDirectory + Send + Sync
{
}

impl<T> CollabStorage for T where
    T: ProgramStore + CollaborationStore + AggregateStore + AdminDirectory + Send + Sync
{
}
