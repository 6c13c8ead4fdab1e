//! REST API (`/api/v1`)

pub mod actor;
pub mod handlers;
pub mod router;
pub mod state;
