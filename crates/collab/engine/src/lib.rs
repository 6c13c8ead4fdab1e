//! Collaboration state engine for the volunteer portal
//!
//! Two pure components:
//!
//! - [`StateEngine`] validates one event against a program and its rows
//!   and produces an explicit [`TransitionPlan`] (one program change plus
//!   every row change, including force-closed siblings)
//! - [`resolver`] derives the single [`EffectiveStatus`] a viewer sees
//!   from the row status and the program status
//!
//! Neither component reads or writes storage. Persisting a plan atomically
//! is the API layer's job.
//!
//! # Example
//!
//! ```rust
//! use collab_engine::{RowEvent, StateEngine};
//! use collab_types::*;
//!
//! let mut program = Program::draft(
//!     NewProgram::new("River cleanup"),
//!     OrganizationId::new("org-a"),
//!     AdminId::new("alice"),
//! );
//! program.status = ProgramStatus::PendingCollaboration;
//!
//! let row = Collaboration::invite(
//!     program.program_id.clone(),
//!     AdminId::new("alice"),
//!     OrganizationId::new("org-a"),
//!     AdminId::new("bob"),
//!     OrganizationId::new("org-b"),
//! );
//!
//! let plan = StateEngine::new()
//!     .apply_row_event(&program, &[row.clone()], &row.collaboration_id, RowEvent::Accept)
//!     .unwrap();
//!
//! // The only pending row accepted: the program escalates.
//! assert!(plan.escalates());
//! ```
//!
//! [`EffectiveStatus`]: collab_types::EffectiveStatus

#![deny(unsafe_code)]

pub mod engine;
pub mod plan;
pub mod resolver;

pub use engine::{ProgramEvent, RowEvent, StateEngine};
pub use plan::{RowChange, StatusChange, TransitionPlan};
pub use resolver::{allowed_actions, resolve, resolve_program};
