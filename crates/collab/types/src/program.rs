//! Programs: the aggregate root of the collaboration workflow
//!
//! The program row is the serialization point for every transition. Its
//! `version` is bumped on each committed change and used as the optimistic
//! concurrency token for the whole invite set.

use crate::{AdminId, OrganizationId, ProgramId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ── Program Status ───────────────────────────────────────────────────

/// Overall program status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgramStatus {
    /// Created, not yet shared with anyone
    Draft,
    /// At least one collaborator has not committed yet
    PendingCollaboration,
    /// Every collaborator accepted; waiting for a superadmin
    PendingSuperadminApproval,
    /// Approved by a superadmin
    Approved,
    /// Rejected by a superadmin
    Rejected,
    /// A collaborator declined; the collaborative attempt is over
    Declined,
    /// Running (separate lifecycle)
    Active,
    /// Finished (separate lifecycle)
    Completed,
}

impl ProgramStatus {
    pub const ALL: [ProgramStatus; 8] = [
        ProgramStatus::Draft,
        ProgramStatus::PendingCollaboration,
        ProgramStatus::PendingSuperadminApproval,
        ProgramStatus::Approved,
        ProgramStatus::Rejected,
        ProgramStatus::Declined,
        ProgramStatus::Active,
        ProgramStatus::Completed,
    ];

    /// Approved or any later lifecycle stage. Collaborations are frozen.
    pub fn is_approved_or_later(&self) -> bool {
        matches!(
            self,
            ProgramStatus::Approved | ProgramStatus::Active | ProgramStatus::Completed
        )
    }

    /// Dead: no further workflow transitions are possible
    pub fn is_closed(&self) -> bool {
        matches!(self, ProgramStatus::Rejected | ProgramStatus::Declined)
    }

    /// Whether new collaborators may still be invited
    pub fn accepts_invites(&self) -> bool {
        matches!(
            self,
            ProgramStatus::Draft
                | ProgramStatus::PendingCollaboration
                | ProgramStatus::PendingSuperadminApproval
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProgramStatus::Draft => "draft",
            ProgramStatus::PendingCollaboration => "pending_collaboration",
            ProgramStatus::PendingSuperadminApproval => "pending_superadmin_approval",
            ProgramStatus::Approved => "approved",
            ProgramStatus::Rejected => "rejected",
            ProgramStatus::Declined => "declined",
            ProgramStatus::Active => "active",
            ProgramStatus::Completed => "completed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == raw)
    }
}

impl std::fmt::Display for ProgramStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Program ──────────────────────────────────────────────────────────

/// A volunteer program, owned by one organization
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub program_id: ProgramId,
    pub title: String,
    pub description: String,
    pub category: String,
    pub owning_organization_id: OrganizationId,
    /// The admin who created the program
    pub owner_admin_id: AdminId,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub event_dates: Vec<NaiveDate>,
    pub status: ProgramStatus,
    /// Optimistic concurrency token, bumped on every committed change
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Program {
    /// Create a draft program from a creation request
    pub fn draft(
        request: NewProgram,
        owning_organization_id: OrganizationId,
        owner_admin_id: AdminId,
    ) -> Self {
        let now = Utc::now();
        Self {
            program_id: ProgramId::generate(),
            title: request.title,
            description: request.description,
            category: request.category,
            owning_organization_id,
            owner_admin_id,
            event_dates: request.event_dates,
            status: ProgramStatus::Draft,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Program creation request
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NewProgram {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub event_dates: Vec<NaiveDate>,
}

impl NewProgram {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_event_date(mut self, date: NaiveDate) -> Self {
        self.event_dates.push(date);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_its_storage_name() {
        for status in ProgramStatus::ALL {
            assert_eq!(ProgramStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ProgramStatus::parse("archived"), None);
    }

    #[test]
    fn only_open_programs_accept_invites() {
        assert!(ProgramStatus::Draft.accepts_invites());
        assert!(ProgramStatus::PendingSuperadminApproval.accepts_invites());
        assert!(!ProgramStatus::Approved.accepts_invites());
        assert!(!ProgramStatus::Declined.accepts_invites());
    }

    #[test]
    fn draft_starts_at_version_zero() {
        let program = Program::draft(
            NewProgram::new("Beach cleanup").with_category("environment"),
            OrganizationId::new("org-a"),
            AdminId::new("admin-a"),
        );
        assert_eq!(program.status, ProgramStatus::Draft);
        assert_eq!(program.version, 0);
        assert_eq!(program.category, "environment");
    }

    #[test]
    fn status_uses_snake_case_on_the_wire() {
        let json = serde_json::to_string(&ProgramStatus::PendingSuperadminApproval).unwrap();
        assert_eq!(json, "\"pending_superadmin_approval\"");
    }
}
