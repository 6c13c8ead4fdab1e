//! Domain types for the program collaboration workflow
//!
//! A program is owned by one organization. Its owner may invite admins of
//! other organizations to co-host it; every invite is a [`Collaboration`]
//! row. Only once every row is accepted does the program escalate to a
//! superadmin for a final decision.
//!
//! Two independent status dimensions exist:
//! - [`CollaborationStatus`] on each row
//! - [`ProgramStatus`] on the aggregate root
//!
//! They are reconciled into an [`EffectiveStatus`] by the resolver in
//! `collab-engine`. The effective status is never stored.

#![deny(unsafe_code)]

pub mod admin;
pub mod collaboration;
pub mod error;
pub mod event;
pub mod ids;
pub mod notification;
pub mod program;
pub mod status;

pub use admin::{Actor, AdminAccount, AdminRole};
pub use collaboration::{Collaboration, CollaborationStatus, RequestType};
pub use error::{CollabError, CollabResult, Guard, TransitionRejection};
pub use event::{ResponseDecision, SuperadminDecision, WorkflowEvent};
pub use ids::{AdminId, CollaborationId, OrganizationId, ProgramId};
pub use notification::{Audience, ProgramChanged, TransitionKind};
pub use program::{NewProgram, Program, ProgramStatus};
pub use status::{AllowedActions, EffectiveStatus, Perspective};
