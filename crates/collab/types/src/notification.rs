//! Change signals emitted after committed transitions
//!
//! The transport is someone else's concern. The contract is that exactly one
//! [`ProgramChanged`] is published per successful transition and none for a
//! rejected or no-op call.

use crate::{AdminId, ProgramId, ProgramStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The transition that produced a change
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    Created,
    Invited,
    Accepted,
    Declined,
    OptedOut,
    Submitted,
    Approved,
    Rejected,
}

/// A cached view that must be refreshed
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "admin_id")]
pub enum Audience {
    Admin(AdminId),
    SuperadminQueue,
}

/// "Program `program_id` state changed"
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProgramChanged {
    pub program_id: ProgramId,
    /// Program version after the change
    pub version: u64,
    pub transition: TransitionKind,
    pub program_status: ProgramStatus,
    pub audiences: Vec<Audience>,
    pub occurred_at: DateTime<Utc>,
}

impl ProgramChanged {
    pub fn addresses(&self, admin_id: &AdminId) -> bool {
        self.audiences
            .iter()
            .any(|audience| matches!(audience, Audience::Admin(id) if id == admin_id))
    }

    pub fn addresses_superadmin_queue(&self) -> bool {
        self.audiences.contains(&Audience::SuperadminQueue)
    }
}
