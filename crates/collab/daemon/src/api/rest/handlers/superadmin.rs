//! Superadmin review handlers

use crate::api::rest::actor::CallingAdmin;
use crate::api::rest::state::AppState;
use crate::error::ApiResult;
use axum::{
    extract::{Path, State},
    Json,
};
use collab_service::ProgramDetail;
use collab_types::{Program, ProgramId, SuperadminDecision};
use serde::Deserialize;

/// Decision request
#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    pub decision: SuperadminDecision,
}

/// Programs awaiting review
pub async fn superadmin_queue(
    State(state): State<AppState>,
    CallingAdmin(actor): CallingAdmin,
) -> ApiResult<Json<Vec<ProgramDetail>>> {
    Ok(Json(state.service.superadmin_queue(&actor).await?))
}

/// Approve or reject a program
pub async fn decide_program(
    State(state): State<AppState>,
    CallingAdmin(actor): CallingAdmin,
    Path(program_id): Path<ProgramId>,
    Json(request): Json<DecisionRequest>,
) -> ApiResult<Json<Program>> {
    let program = state
        .service
        .superadmin_decide(&actor, &program_id, request.decision)
        .await?;
    Ok(Json(program))
}
