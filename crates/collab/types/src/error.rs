//! Error taxonomy for the collaboration workflow
//!
//! Every rejection carries enough structure (which row, which guard) for a
//! caller to explain why without re-deriving business rules.

use crate::{
    AdminId, CollaborationId, CollaborationStatus, ProgramId, ProgramStatus, WorkflowEvent,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The rule that refused an event
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "guard")]
pub enum Guard {
    /// The row had to be pending
    RowNotPending { found: CollaborationStatus },
    /// The row had to be accepted
    RowNotAccepted { found: CollaborationStatus },
    /// The row does not belong to the program it was evaluated against
    RowNotInProgram,
    /// The program is rejected or declined
    ProgramClosed { status: ProgramStatus },
    /// The program is approved or later; collaborations are frozen
    ProgramFrozen { status: ProgramStatus },
    /// The program is not in the phase this event belongs to
    ProgramPhaseMismatch {
        expected: Vec<ProgramStatus>,
        found: ProgramStatus,
    },
    /// Approval requires every row to be accepted
    UnanimityBroken { unaccepted: Vec<CollaborationId> },
    /// Rows are still pending or a collaborator withdrew
    CollaboratorsOutstanding { outstanding: Vec<CollaborationId> },
}

impl std::fmt::Display for Guard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Guard::RowNotPending { found } => write!(f, "collaboration is {found}, not pending"),
            Guard::RowNotAccepted { found } => {
                write!(f, "collaboration is {found}, not accepted")
            }
            Guard::RowNotInProgram => f.write_str("collaboration belongs to another program"),
            Guard::ProgramClosed { status } => write!(f, "program is closed ({status})"),
            Guard::ProgramFrozen { status } => {
                write!(f, "program is {status}; collaborations are frozen")
            }
            Guard::ProgramPhaseMismatch { expected, found } => {
                let expected = expected
                    .iter()
                    .map(ProgramStatus::as_str)
                    .collect::<Vec<_>>()
                    .join(" or ");
                write!(f, "program is {found}, expected {expected}")
            }
            Guard::UnanimityBroken { unaccepted } => {
                write!(f, "{} collaboration(s) not accepted", unaccepted.len())
            }
            Guard::CollaboratorsOutstanding { outstanding } => {
                write!(f, "{} collaboration(s) outstanding", outstanding.len())
            }
        }
    }
}

/// A refused state-engine event
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRejection {
    pub program_id: ProgramId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collaboration_id: Option<CollaborationId>,
    pub event: WorkflowEvent,
    #[serde(flatten)]
    pub guard: Guard,
}

impl std::fmt::Display for TransitionRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.collaboration_id {
            Some(row) => write!(
                f,
                "cannot {} collaboration {} on program {}: {}",
                self.event, row, self.program_id, self.guard
            ),
            None => write!(
                f,
                "cannot {} program {}: {}",
                self.event, self.program_id, self.guard
            ),
        }
    }
}

impl std::error::Error for TransitionRejection {}

/// Workflow errors
#[derive(Debug, Error)]
pub enum CollabError {
    /// Event not legal from the current state
    #[error("invalid transition: {0}")]
    InvalidTransition(TransitionRejection),

    /// Actor is not the authorized party
    #[error("forbidden: {actor} may not {action}: {reason}")]
    Forbidden {
        actor: AdminId,
        action: String,
        reason: String,
    },

    /// Referenced record does not exist
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// Commit-time guard re-check failed because the state moved
    #[error("precondition failed on program {program_id}: {reason}")]
    PreconditionFailed {
        program_id: ProgramId,
        reason: String,
        rejection: Option<TransitionRejection>,
    },

    /// Malformed request
    #[error("validation error: {0}")]
    Validation(String),

    /// Store unavailable or failing
    #[error("persistence failure: {0}")]
    Persistence(String),
}

impl CollabError {
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        CollabError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn forbidden(
        actor: &AdminId,
        action: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        CollabError::Forbidden {
            actor: actor.clone(),
            action: action.into(),
            reason: reason.into(),
        }
    }

    /// The structured rejection behind this error, if any
    pub fn rejection(&self) -> Option<&TransitionRejection> {
        match self {
            CollabError::InvalidTransition(rejection) => Some(rejection),
            CollabError::PreconditionFailed { rejection, .. } => rejection.as_ref(),
            _ => None,
        }
    }
}

impl From<TransitionRejection> for CollabError {
    fn from(rejection: TransitionRejection) -> Self {
        CollabError::InvalidTransition(rejection)
    }
}

pub type CollabResult<T> = Result<T, CollabError>;
