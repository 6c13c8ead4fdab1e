//! Derived, user-facing status
//!
//! [`EffectiveStatus`] is computed from the two stored status dimensions on
//! every read. It is never persisted.

use serde::{Deserialize, Serialize};

/// The single combined status shown to a viewer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectiveStatus {
    Draft,
    PendingResponse,
    WaitingOnCollaborators,
    PendingSuperadminApproval,
    Approved,
    Active,
    Completed,
    Declined,
    OptedOut,
    RejectedBySuperadmin,
    /// Negotiation holds a withdrawn row and cannot reach review
    CollaboratorWithdrawn,
    /// Fallback for combinations the engine never produces
    Indeterminate,
}

impl EffectiveStatus {
    pub fn label(&self) -> &'static str {
        match self {
            EffectiveStatus::Draft => "Draft",
            EffectiveStatus::PendingResponse => "Pending Response",
            EffectiveStatus::WaitingOnCollaborators => "Waiting on other collaborators",
            EffectiveStatus::PendingSuperadminApproval => "Pending Superadmin Approval",
            EffectiveStatus::Approved => "Approved",
            EffectiveStatus::Active => "Active",
            EffectiveStatus::Completed => "Completed",
            EffectiveStatus::Declined => "Declined",
            EffectiveStatus::OptedOut => "Opted Out",
            EffectiveStatus::RejectedBySuperadmin => "Rejected by Superadmin",
            EffectiveStatus::CollaboratorWithdrawn => "Collaborator Withdrawn",
            EffectiveStatus::Indeterminate => "Status Unavailable",
        }
    }
}

impl std::fmt::Display for EffectiveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Which side of a collaboration row the viewer is on
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Perspective {
    Inviter,
    Invitee,
}

/// What the viewer may still do with a collaboration row
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowedActions {
    pub can_accept: bool,
    pub can_decline: bool,
    pub can_opt_out: bool,
}

impl AllowedActions {
    pub const NONE: AllowedActions = AllowedActions {
        can_accept: false,
        can_decline: false,
        can_opt_out: false,
    };

    pub fn any(&self) -> bool {
        self.can_accept || self.can_decline || self.can_opt_out
    }
}
