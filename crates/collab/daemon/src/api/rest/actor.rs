//! Calling admin, taken from the `x-admin-id` header.
//!
//! Authentication is done by the gateway in front of the daemon; the header
//! carries the already verified admin id.

use crate::error::ApiError;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use collab_types::Actor;

pub const ADMIN_HEADER: &str = "x-admin-id";

/// Extractor for the authenticated caller
#[derive(Debug, Clone)]
pub struct CallingAdmin(pub Actor);

#[async_trait]
impl<S> FromRequestParts<S> for CallingAdmin
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(ADMIN_HEADER)
            .ok_or_else(|| ApiError::Unauthenticated(format!("missing {ADMIN_HEADER} header")))?;
        let admin_id = raw
            .to_str()
            .map_err(|_| ApiError::BadRequest(format!("{ADMIN_HEADER} is not valid text")))?
            .trim();
        if admin_id.is_empty() {
            return Err(ApiError::Unauthenticated(format!("empty {ADMIN_HEADER} header")));
        }
        Ok(CallingAdmin(Actor::new(admin_id)))
    }
}
