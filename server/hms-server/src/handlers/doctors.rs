use auth_rbac::{Operation, RecordId, ResourceType, Role};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use database_layer::{Doctor, DoctorChanges, NewDoctor};
use tracing::info;

use super::common;
use crate::error::{ApiError, ApiResult, MessageResponse};
use crate::middleware::{parse_body, Caller};
use crate::server::HmsServer;
use crate::types::PaginationParams;

const RESOURCE: ResourceType = ResourceType::Doctor;

pub async fn list_doctors(
    State(server): State<HmsServer>,
    caller: Caller,
    params: Option<Query<PaginationParams>>,
) -> ApiResult<Json<Vec<Doctor>>> {
    let params = params.map(|Query(p)| p).unwrap_or_default();
    common::list_records(&server, &caller, server.repos.doctors.as_ref(), RESOURCE, params).await
}

pub async fn get_doctor(
    State(server): State<HmsServer>,
    caller: Caller,
    Path(id): Path<RecordId>,
) -> ApiResult<Json<Doctor>> {
    let doctor = common::load_authorized(
        &server,
        &caller,
        server.repos.doctors.as_ref(),
        RESOURCE,
        Operation::Read,
        id,
    )
    .await?;
    Ok(Json(doctor))
}

/// A linked login account must exist and carry the doctor role
async fn check_account_link(server: &HmsServer, user_id: Option<RecordId>) -> ApiResult<()> {
    let Some(user_id) = user_id else {
        return Ok(());
    };

    match server.repos.users.find_by_id(user_id).await? {
        Some(user) if user.role == Role::Doctor => Ok(()),
        Some(_) => Err(ApiError::validation(
            "Linked account must have the doctor role",
        )),
        None => Err(ApiError::validation("Linked account does not exist")),
    }
}

pub async fn create_doctor(
    State(server): State<HmsServer>,
    caller: Caller,
    payload: Result<Json<NewDoctor>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Doctor>)> {
    common::authorize(&server, &caller, Operation::Create, RESOURCE, None).await?;

    let new_doctor = parse_body(payload)?;
    new_doctor.validate()?;
    check_account_link(&server, new_doctor.user_id).await?;

    let doctor = server.repos.doctors.create(new_doctor).await?;
    info!(
        doctor_id = doctor.id,
        user_id = ?doctor.user_id,
        "Doctor created"
    );
    Ok((StatusCode::CREATED, Json(doctor)))
}

pub async fn update_doctor(
    State(server): State<HmsServer>,
    caller: Caller,
    Path(id): Path<RecordId>,
    payload: Result<Json<DoctorChanges>, JsonRejection>,
) -> ApiResult<Json<Doctor>> {
    common::load_authorized::<Doctor, _>(
        &server,
        &caller,
        server.repos.doctors.as_ref(),
        RESOURCE,
        Operation::Update,
        id,
    )
    .await?;

    let changes = parse_body(payload)?;
    changes.validate()?;
    check_account_link(&server, changes.user_id).await?;

    server
        .repos
        .doctors
        .update(id, changes)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Doctor"))
}

pub async fn delete_doctor(
    State(server): State<HmsServer>,
    caller: Caller,
    Path(id): Path<RecordId>,
) -> ApiResult<Json<MessageResponse>> {
    common::delete_record::<Doctor, _>(
        &server,
        &caller,
        server.repos.doctors.as_ref(),
        RESOURCE,
        id,
    )
    .await
}
