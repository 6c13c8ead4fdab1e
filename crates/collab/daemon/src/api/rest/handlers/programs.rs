//! Program handlers

use crate::api::rest::actor::CallingAdmin;
use crate::api::rest::state::AppState;
use crate::error::ApiResult;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use collab_service::ProgramDetail;
use collab_types::{AdminId, Collaboration, NewProgram, Program, ProgramId};
use serde::Deserialize;

/// Invite request
#[derive(Debug, Deserialize)]
pub struct InviteRequest {
    pub invitee_admin_id: AdminId,
}

/// Create a draft program
pub async fn create_program(
    State(state): State<AppState>,
    CallingAdmin(actor): CallingAdmin,
    Json(request): Json<NewProgram>,
) -> ApiResult<(StatusCode, Json<Program>)> {
    let program = state.service.create_program(&actor, request).await?;
    Ok((StatusCode::CREATED, Json(program)))
}

/// Get a program with its collaborations
pub async fn get_program(
    State(state): State<AppState>,
    CallingAdmin(actor): CallingAdmin,
    Path(program_id): Path<ProgramId>,
) -> ApiResult<Json<ProgramDetail>> {
    Ok(Json(
        state.service.program_detail_for(&actor, &program_id).await?,
    ))
}

/// Invite a collaborator
pub async fn invite_collaborator(
    State(state): State<AppState>,
    CallingAdmin(actor): CallingAdmin,
    Path(program_id): Path<ProgramId>,
    Json(request): Json<InviteRequest>,
) -> ApiResult<Json<Collaboration>> {
    let row = state
        .service
        .invite_collaborator(&actor, &program_id, &request.invitee_admin_id)
        .await?;
    Ok(Json(row))
}

/// Send a program to superadmin review
pub async fn submit_program(
    State(state): State<AppState>,
    CallingAdmin(actor): CallingAdmin,
    Path(program_id): Path<ProgramId>,
) -> ApiResult<Json<Program>> {
    Ok(Json(
        state.service.submit_for_approval(&actor, &program_id).await?,
    ))
}
