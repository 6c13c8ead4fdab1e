use collab_types::{Collaboration, CollaborationStatus, Program};
use serde::{Deserialize, Serialize};

/// A program together with every collaboration row it owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramAggregate {
    pub program: Program,
    pub collaborations: Vec<Collaboration>,
}

impl ProgramAggregate {
    /// Row statuses, in row order.
    pub fn statuses(&self) -> Vec<CollaborationStatus> {
        self.collaborations.iter().map(|row| row.status).collect()
    }
}

/// Atomic write of one program aggregate.
///
/// The store compares the persisted program version with `expected_version`,
/// writes `program` with the version bumped and upserts every row in
/// `collaborations`, or writes nothing at all.
#[derive(Debug, Clone)]
pub struct AggregateCommit {
    pub program: Program,
    pub expected_version: u64,
    pub collaborations: Vec<Collaboration>,
}

impl AggregateCommit {
    pub fn new(program: Program, expected_version: u64) -> Self {
        Self {
            program,
            expected_version,
            collaborations: Vec::new(),
        }
    }

    pub fn with_collaborations(mut self, rows: impl IntoIterator<Item = Collaboration>) -> Self {
        self.collaborations.extend(rows);
        self
    }
}
