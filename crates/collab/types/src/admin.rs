//! Admin accounts and actors
//!
//! Authentication happens upstream. An [`Actor`] is the already
//! authenticated caller; its role and organization are looked up in the
//! admin directory.

use crate::{AdminId, OrganizationId};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    OrganizationAdmin,
    Superadmin,
}

impl AdminRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminRole::OrganizationAdmin => "organization_admin",
            AdminRole::Superadmin => "superadmin",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "organization_admin" => Some(AdminRole::OrganizationAdmin),
            "superadmin" => Some(AdminRole::Superadmin),
            _ => None,
        }
    }
}

/// Directory entry for an admin
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminAccount {
    pub admin_id: AdminId,
    pub organization_id: OrganizationId,
    #[serde(default)]
    pub display_name: String,
    pub role: AdminRole,
}

impl AdminAccount {
    pub fn organization_admin(
        admin_id: impl Into<String>,
        organization_id: impl Into<String>,
    ) -> Self {
        Self {
            admin_id: AdminId::new(admin_id),
            organization_id: OrganizationId::new(organization_id),
            display_name: String::new(),
            role: AdminRole::OrganizationAdmin,
        }
    }

    pub fn superadmin(admin_id: impl Into<String>) -> Self {
        Self {
            admin_id: AdminId::new(admin_id),
            organization_id: OrganizationId::new("platform"),
            display_name: String::new(),
            role: AdminRole::Superadmin,
        }
    }

    pub fn is_superadmin(&self) -> bool {
        self.role == AdminRole::Superadmin
    }
}

/// Authenticated caller of a workflow operation
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    pub admin_id: AdminId,
}

impl Actor {
    pub fn new(admin_id: impl Into<String>) -> Self {
        Self {
            admin_id: AdminId::new(admin_id),
        }
    }
}

impl From<AdminId> for Actor {
    fn from(admin_id: AdminId) -> Self {
        Self { admin_id }
    }
}

impl std::fmt::Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.admin_id)
    }
}
