//! Identifiers
//!
//! All identifiers are opaque strings. Generated ids are UUID v4, but ids
//! coming from upstream systems (admin accounts, organizations) are taken
//! as-is.

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }
    };
}

string_id!(
    /// Unique identifier for a program
    ProgramId
);

string_id!(
    /// Unique identifier for a collaboration row
    CollaborationId
);

string_id!(
    /// Identifier of an admin account (organization admin or superadmin)
    AdminId
);

string_id!(
    /// Identifier of an organization
    OrganizationId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(ProgramId::generate(), ProgramId::generate());
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = OrganizationId::new("org-food-bank");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"org-food-bank\"");
    }
}
