//! Collaboration state engine
//!
//! Decides, for one event against a program and its rows, whether the event
//! is legal and what it changes. The engine is pure and synchronous: it never
//! reads or writes storage, never retries and never suppresses a rejection.
//!
//! Row events:
//! - `Pending --accept--> Accepted`; the last pending accept escalates the
//!   program to `PendingSuperadminApproval`, unless a collaborator has
//!   already withdrawn
//! - `Pending --decline--> Declined`; every other live row is force-closed
//!   as `Superseded` and the program becomes `Declined`
//! - `Accepted --opt_out--> OptedOut`; an escalated program falls back to
//!   `PendingCollaboration`
//!
//! Program events:
//! - `invite` (re)opens negotiation
//! - `submit` escalates a program with no outstanding collaborators
//! - `approve` / `reject` are the superadmin decisions

use crate::plan::{RowChange, StatusChange, TransitionPlan};
use collab_types::{
    Collaboration, CollaborationId, CollaborationStatus, Guard, Program, ProgramStatus,
    ResponseDecision, SuperadminDecision, TransitionRejection, WorkflowEvent,
};
use serde::{Deserialize, Serialize};

/// Events acting on a single collaboration row
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowEvent {
    Accept,
    Decline,
    OptOut,
}

impl From<RowEvent> for WorkflowEvent {
    fn from(event: RowEvent) -> Self {
        match event {
            RowEvent::Accept => WorkflowEvent::Accept,
            RowEvent::Decline => WorkflowEvent::Decline,
            RowEvent::OptOut => WorkflowEvent::OptOut,
        }
    }
}

impl From<ResponseDecision> for RowEvent {
    fn from(decision: ResponseDecision) -> Self {
        match decision {
            ResponseDecision::Accept => RowEvent::Accept,
            ResponseDecision::Decline => RowEvent::Decline,
        }
    }
}

/// Events acting on the program as a whole
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgramEvent {
    Invite,
    Submit,
    Approve,
    Reject,
}

impl From<ProgramEvent> for WorkflowEvent {
    fn from(event: ProgramEvent) -> Self {
        match event {
            ProgramEvent::Invite => WorkflowEvent::Invite,
            ProgramEvent::Submit => WorkflowEvent::Submit,
            ProgramEvent::Approve => WorkflowEvent::Approve,
            ProgramEvent::Reject => WorkflowEvent::Reject,
        }
    }
}

impl From<SuperadminDecision> for ProgramEvent {
    fn from(decision: SuperadminDecision) -> Self {
        match decision {
            SuperadminDecision::Approve => ProgramEvent::Approve,
            SuperadminDecision::Reject => ProgramEvent::Reject,
        }
    }
}

/// Pure transition logic for the collaboration workflow
#[derive(Clone, Copy, Debug, Default)]
pub struct StateEngine;

impl StateEngine {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate a row event against the program and all of its rows.
    ///
    /// `rows` must be the complete row set of `program`; sibling effects
    /// (escalation, force-closing) are computed from it.
    pub fn apply_row_event(
        &self,
        program: &Program,
        rows: &[Collaboration],
        collaboration_id: &CollaborationId,
        event: RowEvent,
    ) -> Result<TransitionPlan, TransitionRejection> {
        let reject = |guard: Guard| TransitionRejection {
            program_id: program.program_id.clone(),
            collaboration_id: Some(collaboration_id.clone()),
            event: event.into(),
            guard,
        };

        let target = rows
            .iter()
            .find(|row| &row.collaboration_id == collaboration_id)
            .filter(|row| row.program_id == program.program_id)
            .ok_or_else(|| reject(Guard::RowNotInProgram))?;

        match event {
            RowEvent::Accept | RowEvent::Decline => {
                if target.status != CollaborationStatus::Pending {
                    return Err(reject(Guard::RowNotPending {
                        found: target.status,
                    }));
                }
            }
            RowEvent::OptOut => {
                if target.status != CollaborationStatus::Accepted {
                    return Err(reject(Guard::RowNotAccepted {
                        found: target.status,
                    }));
                }
            }
        }

        if let Some(guard) = program_closed_or_frozen(program.status) {
            return Err(reject(guard));
        }

        let negotiating = [ProgramStatus::PendingCollaboration];
        let opt_out_phases = [
            ProgramStatus::PendingCollaboration,
            ProgramStatus::PendingSuperadminApproval,
        ];
        let allowed: &[ProgramStatus] = match event {
            RowEvent::Accept | RowEvent::Decline => &negotiating,
            RowEvent::OptOut => &opt_out_phases,
        };
        if !allowed.contains(&program.status) {
            return Err(reject(Guard::ProgramPhaseMismatch {
                expected: allowed.to_vec(),
                found: program.status,
            }));
        }

        let own_change = |to: CollaborationStatus| RowChange {
            collaboration_id: target.collaboration_id.clone(),
            change: StatusChange::new(target.status, to),
            responded: true,
        };

        let plan = match event {
            RowEvent::Accept => {
                let siblings = rows
                    .iter()
                    .filter(|row| row.collaboration_id != target.collaboration_id);
                let next = if outstanding_collaborators(siblings).is_empty() {
                    ProgramStatus::PendingSuperadminApproval
                } else {
                    ProgramStatus::PendingCollaboration
                };
                TransitionPlan {
                    event: event.into(),
                    program_id: program.program_id.clone(),
                    program: StatusChange::new(program.status, next),
                    rows: vec![own_change(CollaborationStatus::Accepted)],
                }
            }
            RowEvent::Decline => {
                let mut changes = vec![own_change(CollaborationStatus::Declined)];
                changes.extend(
                    rows.iter()
                        .filter(|row| {
                            row.collaboration_id != target.collaboration_id
                                && row.status.is_live()
                        })
                        .map(|row| RowChange {
                            collaboration_id: row.collaboration_id.clone(),
                            change: StatusChange::new(row.status, CollaborationStatus::Superseded),
                            responded: false,
                        }),
                );
                TransitionPlan {
                    event: event.into(),
                    program_id: program.program_id.clone(),
                    program: StatusChange::new(program.status, ProgramStatus::Declined),
                    rows: changes,
                }
            }
            RowEvent::OptOut => TransitionPlan {
                event: event.into(),
                program_id: program.program_id.clone(),
                // One committed collaborator fewer; review must wait again.
                program: StatusChange::new(program.status, ProgramStatus::PendingCollaboration),
                rows: vec![own_change(CollaborationStatus::OptedOut)],
            },
        };

        Ok(plan)
    }

    /// Evaluate a program-level event.
    ///
    /// For `Invite`, `rows` are the rows that exist before the new one; the
    /// caller adds the new pending row itself.
    pub fn apply_program_event(
        &self,
        program: &Program,
        rows: &[Collaboration],
        event: ProgramEvent,
    ) -> Result<TransitionPlan, TransitionRejection> {
        let reject = |guard: Guard| TransitionRejection {
            program_id: program.program_id.clone(),
            collaboration_id: None,
            event: event.into(),
            guard,
        };

        if let Some(guard) = program_closed_or_frozen(program.status) {
            return Err(reject(guard));
        }

        let (allowed, next): (Vec<ProgramStatus>, ProgramStatus) = match event {
            ProgramEvent::Invite => (
                ProgramStatus::ALL
                    .into_iter()
                    .filter(ProgramStatus::accepts_invites)
                    .collect(),
                ProgramStatus::PendingCollaboration,
            ),
            ProgramEvent::Submit => (
                vec![ProgramStatus::Draft, ProgramStatus::PendingCollaboration],
                ProgramStatus::PendingSuperadminApproval,
            ),
            ProgramEvent::Approve => (
                vec![ProgramStatus::PendingSuperadminApproval],
                ProgramStatus::Approved,
            ),
            ProgramEvent::Reject => (
                vec![ProgramStatus::PendingSuperadminApproval],
                ProgramStatus::Rejected,
            ),
        };

        if !allowed.contains(&program.status) {
            return Err(reject(Guard::ProgramPhaseMismatch {
                expected: allowed,
                found: program.status,
            }));
        }

        match event {
            ProgramEvent::Submit => {
                let outstanding = outstanding_collaborators(rows);
                if !outstanding.is_empty() {
                    return Err(reject(Guard::CollaboratorsOutstanding { outstanding }));
                }
            }
            ProgramEvent::Approve => {
                let unaccepted = ids_where(rows, |status| status != CollaborationStatus::Accepted);
                if !unaccepted.is_empty() {
                    return Err(reject(Guard::UnanimityBroken { unaccepted }));
                }
            }
            ProgramEvent::Invite | ProgramEvent::Reject => {}
        }

        Ok(TransitionPlan {
            event: event.into(),
            program_id: program.program_id.clone(),
            program: StatusChange::new(program.status, next),
            rows: Vec::new(),
        })
    }
}

fn program_closed_or_frozen(status: ProgramStatus) -> Option<Guard> {
    if status.is_closed() {
        Some(Guard::ProgramClosed { status })
    } else if status.is_approved_or_later() {
        Some(Guard::ProgramFrozen { status })
    } else {
        None
    }
}

/// Rows that keep a program out of superadmin review: still undecided, or
/// withdrawn in any way.
fn outstanding_collaborators<'a>(
    rows: impl IntoIterator<Item = &'a Collaboration>,
) -> Vec<CollaborationId> {
    rows.into_iter()
        .filter(|row| {
            row.status == CollaborationStatus::Pending || row.status.is_declined_variant()
        })
        .map(|row| row.collaboration_id.clone())
        .collect()
}

fn ids_where(
    rows: &[Collaboration],
    predicate: impl Fn(CollaborationStatus) -> bool,
) -> Vec<CollaborationId> {
    rows.iter()
        .filter(|row| predicate(row.status))
        .map(|row| row.collaboration_id.clone())
        .collect()
}
