//! Collaboration rows: one per invited organization, per program

use crate::{AdminId, CollaborationId, OrganizationId, ProgramId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-row invitation status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollaborationStatus {
    /// Waiting for the invitee to respond
    Pending,
    /// The invitee committed to co-host
    Accepted,
    /// The invitee declined; kills the collaborative attempt
    Declined,
    /// The invitee withdrew after accepting
    OptedOut,
    /// Force-closed because a sibling row declined
    Superseded,
}

impl CollaborationStatus {
    pub const ALL: [CollaborationStatus; 5] = [
        CollaborationStatus::Pending,
        CollaborationStatus::Accepted,
        CollaborationStatus::Declined,
        CollaborationStatus::OptedOut,
        CollaborationStatus::Superseded,
    ];

    /// Pending or Accepted: the row still takes part in the program
    pub fn is_live(&self) -> bool {
        matches!(
            self,
            CollaborationStatus::Pending | CollaborationStatus::Accepted
        )
    }

    /// Counts as a decline when aggregating rows of a program
    pub fn is_declined_variant(&self) -> bool {
        matches!(
            self,
            CollaborationStatus::Declined
                | CollaborationStatus::OptedOut
                | CollaborationStatus::Superseded
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CollaborationStatus::Pending => "pending",
            CollaborationStatus::Accepted => "accepted",
            CollaborationStatus::Declined => "declined",
            CollaborationStatus::OptedOut => "opted_out",
            CollaborationStatus::Superseded => "superseded",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == raw)
    }
}

impl std::fmt::Display for CollaborationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One invited organization's participation record on a program
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Collaboration {
    pub collaboration_id: CollaborationId,
    pub program_id: ProgramId,
    pub inviter_admin_id: AdminId,
    pub inviter_org_id: OrganizationId,
    pub invitee_admin_id: AdminId,
    pub invitee_org_id: OrganizationId,
    pub status: CollaborationStatus,
    pub invited_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responded_at: Option<DateTime<Utc>>,
}

impl Collaboration {
    /// A fresh pending invite
    pub fn invite(
        program_id: ProgramId,
        inviter_admin_id: AdminId,
        inviter_org_id: OrganizationId,
        invitee_admin_id: AdminId,
        invitee_org_id: OrganizationId,
    ) -> Self {
        Self {
            collaboration_id: CollaborationId::generate(),
            program_id,
            inviter_admin_id,
            inviter_org_id,
            invitee_admin_id,
            invitee_org_id,
            status: CollaborationStatus::Pending,
            invited_at: Utc::now(),
            responded_at: None,
        }
    }

    /// Which side of this row the given admin is on, if any
    pub fn request_type_for(&self, admin_id: &AdminId) -> Option<RequestType> {
        if &self.invitee_admin_id == admin_id {
            Some(RequestType::Received)
        } else if &self.inviter_admin_id == admin_id {
            Some(RequestType::Sent)
        } else {
            None
        }
    }
}

/// Direction of a collaboration relative to the viewing admin
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    Sent,
    Received,
}
