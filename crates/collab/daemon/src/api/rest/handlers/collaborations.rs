//! Collaboration handlers

use crate::api::rest::actor::CallingAdmin;
use crate::api::rest::state::AppState;
use crate::error::ApiResult;
use axum::{
    extract::{Path, State},
    Json,
};
use collab_service::{CollaborationView, TransitionOutcome};
use collab_types::{AdminId, CollabError, CollaborationId, ResponseDecision};
use serde::Deserialize;

/// Respond request
#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    pub decision: ResponseDecision,
}

/// Accept or decline an invite
pub async fn respond_to_collaboration(
    State(state): State<AppState>,
    CallingAdmin(actor): CallingAdmin,
    Path(collaboration_id): Path<CollaborationId>,
    Json(request): Json<RespondRequest>,
) -> ApiResult<Json<TransitionOutcome>> {
    let outcome = state
        .service
        .respond_to_collaboration(&actor, &collaboration_id, request.decision)
        .await?;
    Ok(Json(outcome))
}

/// Withdraw an accepted collaboration
pub async fn opt_out_of_collaboration(
    State(state): State<AppState>,
    CallingAdmin(actor): CallingAdmin,
    Path(collaboration_id): Path<CollaborationId>,
) -> ApiResult<Json<TransitionOutcome>> {
    let outcome = state
        .service
        .opt_out_of_collaboration(&actor, &collaboration_id)
        .await?;
    Ok(Json(outcome))
}

/// List the caller's sent and received collaborations
pub async fn list_admin_collaborations(
    State(state): State<AppState>,
    CallingAdmin(actor): CallingAdmin,
    Path(admin_id): Path<AdminId>,
) -> ApiResult<Json<Vec<CollaborationView>>> {
    if actor.admin_id != admin_id {
        return Err(CollabError::forbidden(
            &actor.admin_id,
            "list collaborations",
            format!("cannot view the collaborations of {admin_id}"),
        )
        .into());
    }
    Ok(Json(
        state.service.list_collaborations_for_admin(&admin_id).await?,
    ))
}
