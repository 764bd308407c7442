use auth_rbac::{Decision, Operation, RecordId, ResourceRef, ResourceType};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use database_layer::{NewPrescription, Prescription, PrescriptionChanges};
use serde::Deserialize;
use tracing::info;

use super::common;
use crate::error::{ApiError, ApiResult, MessageResponse};
use crate::middleware::{parse_body, Caller};
use crate::server::HmsServer;
use crate::types::{PaginationParams, WithRelated};

const RESOURCE: ResourceType = ResourceType::Prescription;

/// Create payload; `doctorId` may be omitted by a doctor writing their own
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePrescriptionRequest {
    pub patient_id: RecordId,
    pub doctor_id: Option<RecordId>,
    pub appointment_id: Option<RecordId>,
    pub diagnosis: String,
    pub medications: serde_json::Value,
    pub frequency: String,
    pub notes: Option<String>,
}

/// Doctors only see the prescriptions they wrote
pub async fn list_prescriptions(
    State(server): State<HmsServer>,
    caller: Caller,
    params: Option<Query<PaginationParams>>,
) -> ApiResult<Json<Vec<WithRelated<Prescription>>>> {
    let params = params.map(|Query(p)| p).unwrap_or_default();
    let Json(rows) = common::list_records::<Prescription, _>(
        &server,
        &caller,
        server.repos.prescriptions.as_ref(),
        RESOURCE,
        params,
    )
    .await?;
    Ok(Json(common::with_related(&server.repos, rows).await?))
}

pub async fn get_prescription(
    State(server): State<HmsServer>,
    caller: Caller,
    Path(id): Path<RecordId>,
) -> ApiResult<Json<WithRelated<Prescription>>> {
    let prescription = common::load_authorized::<Prescription, _>(
        &server,
        &caller,
        server.repos.prescriptions.as_ref(),
        RESOURCE,
        Operation::Read,
        id,
    )
    .await?;
    Ok(Json(common::with_related_one(&server.repos, prescription).await?))
}

pub async fn create_prescription(
    State(server): State<HmsServer>,
    caller: Caller,
    payload: Result<Json<CreatePrescriptionRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Prescription>)> {
    common::precheck(&server, &caller, Operation::Create, RESOURCE)?;

    let request = parse_body(payload)?;
    let draft = ResourceRef::PrescriptionDraft {
        doctor_id: request.doctor_id,
    };
    let decision =
        common::authorize(&server, &caller, Operation::Create, RESOURCE, Some(&draft)).await?;

    // A doctor's prescription is always stamped with their own id
    let doctor_id = match decision {
        Decision::AllowedAsOwner { doctor_id } => doctor_id,
        _ => request
            .doctor_id
            .ok_or_else(|| ApiError::validation("doctorId is required"))?,
    };

    let new_prescription = NewPrescription {
        patient_id: request.patient_id,
        doctor_id,
        appointment_id: request.appointment_id,
        diagnosis: request.diagnosis,
        medications: request.medications,
        frequency: request.frequency,
        notes: request.notes,
    };
    new_prescription.validate()?;

    let prescription = server.repos.prescriptions.create(new_prescription).await?;
    info!(
        prescription_id = prescription.id,
        doctor_id = prescription.doctor_id,
        "Prescription created"
    );
    Ok((StatusCode::CREATED, Json(prescription)))
}

pub async fn update_prescription(
    State(server): State<HmsServer>,
    caller: Caller,
    Path(id): Path<RecordId>,
    payload: Result<Json<PrescriptionChanges>, JsonRejection>,
) -> ApiResult<Json<Prescription>> {
    common::load_authorized::<Prescription, _>(
        &server,
        &caller,
        server.repos.prescriptions.as_ref(),
        RESOURCE,
        Operation::Update,
        id,
    )
    .await?;

    let changes = parse_body(payload)?;
    changes.validate()?;

    server
        .repos
        .prescriptions
        .update(id, changes)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Prescription"))
}

pub async fn delete_prescription(
    State(server): State<HmsServer>,
    caller: Caller,
    Path(id): Path<RecordId>,
) -> ApiResult<Json<MessageResponse>> {
    common::delete_record::<Prescription, _>(
        &server,
        &caller,
        server.repos.prescriptions.as_ref(),
        RESOURCE,
        id,
    )
    .await
}
