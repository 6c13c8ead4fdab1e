//! Workflow events and caller decisions

use crate::TransitionKind;
use serde::{Deserialize, Serialize};

/// An event fed to the state engine
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowEvent {
    /// A new collaborator row is added to the program
    Invite,
    Accept,
    Decline,
    OptOut,
    /// The owner sends a program with no outstanding invites to review
    Submit,
    Approve,
    Reject,
}

impl WorkflowEvent {
    pub fn transition_kind(&self) -> TransitionKind {
        match self {
            WorkflowEvent::Invite => TransitionKind::Invited,
            WorkflowEvent::Accept => TransitionKind::Accepted,
            WorkflowEvent::Decline => TransitionKind::Declined,
            WorkflowEvent::OptOut => TransitionKind::OptedOut,
            WorkflowEvent::Submit => TransitionKind::Submitted,
            WorkflowEvent::Approve => TransitionKind::Approved,
            WorkflowEvent::Reject => TransitionKind::Rejected,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowEvent::Invite => "invite",
            WorkflowEvent::Accept => "accept",
            WorkflowEvent::Decline => "decline",
            WorkflowEvent::OptOut => "opt_out",
            WorkflowEvent::Submit => "submit",
            WorkflowEvent::Approve => "approve",
            WorkflowEvent::Reject => "reject",
        }
    }
}

impl std::fmt::Display for WorkflowEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An invitee's answer to an invite
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseDecision {
    Accept,
    Decline,
}

impl From<ResponseDecision> for WorkflowEvent {
    fn from(decision: ResponseDecision) -> Self {
        match decision {
            ResponseDecision::Accept => WorkflowEvent::Accept,
            ResponseDecision::Decline => WorkflowEvent::Decline,
        }
    }
}

/// A superadmin's final decision on a program
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuperadminDecision {
    Approve,
    Reject,
}

impl From<SuperadminDecision> for WorkflowEvent {
    fn from(decision: SuperadminDecision) -> Self {
        match decision {
            SuperadminDecision::Approve => WorkflowEvent::Approve,
            SuperadminDecision::Reject => WorkflowEvent::Reject,
        }
    }
}
