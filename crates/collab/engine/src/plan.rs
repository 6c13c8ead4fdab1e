//! Transition plans: the explicit output of the state engine
//!
//! A plan lists one program status change and every row change an event
//! causes, including the fan-out of force-closed siblings. Nothing here
//! touches storage; the API layer persists a plan as one atomic unit.

use chrono::{DateTime, Utc};
use collab_types::{
    Collaboration, CollaborationId, CollaborationStatus, Program, ProgramId, ProgramStatus,
    WorkflowEvent,
};
use serde::{Deserialize, Serialize};

/// A `from -> to` status pair
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange<S> {
    pub from: S,
    pub to: S,
}

impl<S: PartialEq + Copy> StatusChange<S> {
    pub fn new(from: S, to: S) -> Self {
        Self { from, to }
    }

    pub fn is_noop(&self) -> bool {
        self.from == self.to
    }
}

/// Status change on one collaboration row
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowChange {
    pub collaboration_id: CollaborationId,
    pub change: StatusChange<CollaborationStatus>,
    /// Set when the row's own invitee acted, which stamps `responded_at`
    pub responded: bool,
}

/// Everything a single accepted event changes
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionPlan {
    pub event: WorkflowEvent,
    pub program_id: ProgramId,
    pub program: StatusChange<ProgramStatus>,
    pub rows: Vec<RowChange>,
}

impl TransitionPlan {
    /// Did this event move the program into superadmin review?
    pub fn escalates(&self) -> bool {
        self.program.from != ProgramStatus::PendingSuperadminApproval
            && self.program.to == ProgramStatus::PendingSuperadminApproval
    }

    /// Rows force-closed as a side effect
    pub fn superseded_rows(&self) -> impl Iterator<Item = &CollaborationId> {
        self.rows
            .iter()
            .filter(|row| row.change.to == CollaborationStatus::Superseded)
            .map(|row| &row.collaboration_id)
    }

    /// Write the plan onto owned copies of the records.
    ///
    /// Returns the ids of the rows that changed. The program version is left
    /// alone; bumping it belongs to the store's commit.
    pub fn apply(
        &self,
        program: &mut Program,
        rows: &mut [Collaboration],
        at: DateTime<Utc>,
    ) -> Vec<CollaborationId> {
        program.status = self.program.to;
        program.updated_at = at;

        let mut touched = Vec::with_capacity(self.rows.len());
        for change in &self.rows {
            if let Some(row) = rows
                .iter_mut()
                .find(|row| row.collaboration_id == change.collaboration_id)
            {
                row.status = change.change.to;
                if change.responded {
                    row.responded_at = Some(at);
                }
                touched.push(row.collaboration_id.clone());
            }
        }
        touched
    }
}
