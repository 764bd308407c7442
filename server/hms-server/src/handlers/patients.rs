use auth_rbac::{Operation, RecordId, ResourceType};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use database_layer::{NewPatient, Patient, PatientChanges};
use tracing::info;

use super::common;
use crate::error::{ApiError, ApiResult, MessageResponse};
use crate::middleware::{parse_body, Caller};
use crate::server::HmsServer;
use crate::types::PaginationParams;

const RESOURCE: ResourceType = ResourceType::Patient;

pub async fn list_patients(
    State(server): State<HmsServer>,
    caller: Caller,
    params: Option<Query<PaginationParams>>,
) -> ApiResult<Json<Vec<Patient>>> {
    let params = params.map(|Query(p)| p).unwrap_or_default();
    common::list_records(&server, &caller, server.repos.patients.as_ref(), RESOURCE, params).await
}

pub async fn get_patient(
    State(server): State<HmsServer>,
    caller: Caller,
    Path(id): Path<RecordId>,
) -> ApiResult<Json<Patient>> {
    let patient = common::load_authorized(
        &server,
        &caller,
        server.repos.patients.as_ref(),
        RESOURCE,
        Operation::Read,
        id,
    )
    .await?;
    Ok(Json(patient))
}

pub async fn create_patient(
    State(server): State<HmsServer>,
    caller: Caller,
    payload: Result<Json<NewPatient>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Patient>)> {
    common::authorize(&server, &caller, Operation::Create, RESOURCE, None).await?;

    let new_patient = parse_body(payload)?;
    new_patient.validate()?;

    let patient = server.repos.patients.create(new_patient).await?;
    info!(patient_id = patient.id, "Patient created");
    Ok((StatusCode::CREATED, Json(patient)))
}

pub async fn update_patient(
    State(server): State<HmsServer>,
    caller: Caller,
    Path(id): Path<RecordId>,
    payload: Result<Json<PatientChanges>, JsonRejection>,
) -> ApiResult<Json<Patient>> {
    common::load_authorized::<Patient, _>(
        &server,
        &caller,
        server.repos.patients.as_ref(),
        RESOURCE,
        Operation::Update,
        id,
    )
    .await?;

    let changes = parse_body(payload)?;
    changes.validate()?;

    server
        .repos
        .patients
        .update(id, changes)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Patient"))
}

pub async fn delete_patient(
    State(server): State<HmsServer>,
    caller: Caller,
    Path(id): Path<RecordId>,
) -> ApiResult<Json<MessageResponse>> {
    common::delete_record::<Patient, _>(
        &server,
        &caller,
        server.repos.patients.as_ref(),
        RESOURCE,
        id,
    )
    .await
}
