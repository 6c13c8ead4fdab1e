//! Read models returned by the service

use chrono::NaiveDate;
use collab_engine::{allowed_actions, resolve, resolve_program};
use collab_storage::ProgramAggregate;
use collab_types::{
    AdminId, AllowedActions, Collaboration, EffectiveStatus, OrganizationId, Perspective, Program,
    ProgramId, ProgramStatus, RequestType,
};
use serde::{Deserialize, Serialize};

/// Result of a row transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub collaboration: Collaboration,
    pub program: Program,
}

/// Program fields shown next to a collaboration row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramSummary {
    pub program_id: ProgramId,
    pub title: String,
    pub category: String,
    pub owning_organization_id: OrganizationId,
    pub status: ProgramStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub event_dates: Vec<NaiveDate>,
}

impl From<&Program> for ProgramSummary {
    fn from(program: &Program) -> Self {
        Self {
            program_id: program.program_id.clone(),
            title: program.title.clone(),
            category: program.category.clone(),
            owning_organization_id: program.owning_organization_id.clone(),
            status: program.status,
            event_dates: program.event_dates.clone(),
        }
    }
}

/// One row of an admin's collaboration list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollaborationView {
    pub request_type: RequestType,
    pub collaboration: Collaboration,
    pub program: ProgramSummary,
    pub effective_status: EffectiveStatus,
    pub status_label: String,
    pub allowed_actions: AllowedActions,
}

impl CollaborationView {
    /// Build the view of `row` as seen by `viewer`.
    ///
    /// Returns `None` when the viewer is on neither side of the row.
    pub fn for_viewer(viewer: &AdminId, row: Collaboration, program: &Program) -> Option<Self> {
        let request_type = row.request_type_for(viewer)?;
        let perspective = match request_type {
            RequestType::Sent => Perspective::Inviter,
            RequestType::Received => Perspective::Invitee,
        };
        let effective_status = resolve(row.status, program.status, perspective);

        Some(Self {
            request_type,
            allowed_actions: allowed_actions(row.status, program.status, perspective),
            status_label: effective_status.label().to_string(),
            effective_status,
            program: ProgramSummary::from(program),
            collaboration: row,
        })
    }
}

/// A program with all of its collaboration rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramDetail {
    pub program: Program,
    pub collaborations: Vec<Collaboration>,
    pub effective_status: EffectiveStatus,
    pub status_label: String,
}

impl From<ProgramAggregate> for ProgramDetail {
    fn from(aggregate: ProgramAggregate) -> Self {
        let effective_status = resolve_program(aggregate.program.status, &aggregate.statuses());
        Self {
            program: aggregate.program,
            collaborations: aggregate.collaborations,
            status_label: effective_status.label().to_string(),
            effective_status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use collab_types::{CollaborationStatus, NewProgram};

    fn program(status: ProgramStatus) -> Program {
        let mut program = Program::draft(
            NewProgram::new("Beach cleanup"),
            OrganizationId::new("org-a"),
            AdminId::new("alice"),
        );
        program.status = status;
        program
    }

    fn row(program: &Program, status: CollaborationStatus) -> Collaboration {
        let mut row = Collaboration::invite(
            program.program_id.clone(),
            AdminId::new("alice"),
            OrganizationId::new("org-a"),
            AdminId::new("bob"),
            OrganizationId::new("org-b"),
        );
        row.status = status;
        row
    }

    #[test]
    fn invitee_sees_pending_response_with_actions() {
        let p = program(ProgramStatus::PendingCollaboration);
        let view =
            CollaborationView::for_viewer(&AdminId::new("bob"), row(&p, CollaborationStatus::Pending), &p)
                .unwrap();
        assert_eq!(view.request_type, RequestType::Received);
        assert_eq!(view.effective_status, EffectiveStatus::PendingResponse);
        assert_eq!(view.status_label, "Pending Response");
        assert!(view.allowed_actions.can_accept && view.allowed_actions.can_decline);
    }

    #[test]
    fn inviter_sees_rejection_without_actions() {
        let p = program(ProgramStatus::Rejected);
        let view = CollaborationView::for_viewer(
            &AdminId::new("alice"),
            row(&p, CollaborationStatus::Accepted),
            &p,
        )
        .unwrap();
        assert_eq!(view.request_type, RequestType::Sent);
        assert_eq!(view.effective_status, EffectiveStatus::RejectedBySuperadmin);
        assert!(!view.allowed_actions.any());
    }

    #[test]
    fn strangers_get_no_view() {
        let p = program(ProgramStatus::PendingCollaboration);
        assert!(CollaborationView::for_viewer(
            &AdminId::new("mallory"),
            row(&p, CollaborationStatus::Pending),
            &p
        )
        .is_none());
    }

    #[test]
    fn detail_resolves_aggregate_status() {
        let p = program(ProgramStatus::PendingSuperadminApproval);
        let detail = ProgramDetail::from(ProgramAggregate {
            collaborations: vec![row(&p, CollaborationStatus::Accepted)],
            program: p,
        });
        assert_eq!(detail.effective_status, EffectiveStatus::PendingSuperadminApproval);
    }
}
