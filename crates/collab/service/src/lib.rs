//! Collaboration API layer
//!
//! [`CollaborationService`] is the only entry point for workflow writes. Each
//! operation authorizes the actor, reads the program aggregate, asks the
//! state engine for a plan and commits the plan against the version it was
//! read at. A lost race re-runs the whole cycle from a fresh read.
//!
//! Every committed transition publishes exactly one
//! [`ProgramChanged`](collab_types::ProgramChanged) through the configured
//! [`ChangeNotifier`].

#![deny(unsafe_code)]

pub mod config;
pub mod notifier;
pub mod service;
pub mod views;

pub use config::WorkflowConfig;
pub use notifier::{BroadcastNotifier, ChangeNotifier};
pub use service::CollaborationService;
pub use views::{CollaborationView, ProgramDetail, ProgramSummary, TransitionOutcome};
