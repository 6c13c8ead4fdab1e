//! API request handlers

mod collaborations;
mod events;
mod health;
mod programs;
mod superadmin;

pub use collaborations::*;
pub use events::*;
pub use health::*;
pub use programs::*;
pub use superadmin::*;
