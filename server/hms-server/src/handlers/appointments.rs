use auth_rbac::{Operation, RecordId, ResourceType};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use database_layer::{Appointment, AppointmentChanges, NewAppointment};
use tracing::info;

use super::common;
use crate::error::{ApiError, ApiResult, MessageResponse};
use crate::middleware::{parse_body, Caller};
use crate::server::HmsServer;
use crate::types::{PaginationParams, WithRelated};

const RESOURCE: ResourceType = ResourceType::Appointment;

/// Doctors only see their own appointments
pub async fn list_appointments(
    State(server): State<HmsServer>,
    caller: Caller,
    params: Option<Query<PaginationParams>>,
) -> ApiResult<Json<Vec<WithRelated<Appointment>>>> {
    let params = params.map(|Query(p)| p).unwrap_or_default();
    let Json(rows) = common::list_records::<Appointment, _>(
        &server,
        &caller,
        server.repos.appointments.as_ref(),
        RESOURCE,
        params,
    )
    .await?;
    Ok(Json(common::with_related(&server.repos, rows).await?))
}

pub async fn get_appointment(
    State(server): State<HmsServer>,
    caller: Caller,
    Path(id): Path<RecordId>,
) -> ApiResult<Json<WithRelated<Appointment>>> {
    let appointment = common::load_authorized::<Appointment, _>(
        &server,
        &caller,
        server.repos.appointments.as_ref(),
        RESOURCE,
        Operation::Read,
        id,
    )
    .await?;
    Ok(Json(common::with_related_one(&server.repos, appointment).await?))
}

pub async fn create_appointment(
    State(server): State<HmsServer>,
    caller: Caller,
    payload: Result<Json<NewAppointment>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Appointment>)> {
    common::authorize(&server, &caller, Operation::Create, RESOURCE, None).await?;

    let new_appointment = parse_body(payload)?;
    new_appointment.validate()?;

    let appointment = server.repos.appointments.create(new_appointment).await?;
    info!(
        appointment_id = appointment.id,
        doctor_id = appointment.doctor_id,
        "Appointment scheduled"
    );
    Ok((StatusCode::CREATED, Json(appointment)))
}

/// Doctors may change the status of their own appointments and nothing else
pub async fn update_appointment(
    State(server): State<HmsServer>,
    caller: Caller,
    Path(id): Path<RecordId>,
    payload: Result<Json<AppointmentChanges>, JsonRejection>,
) -> ApiResult<Json<Appointment>> {
    common::load_authorized::<Appointment, _>(
        &server,
        &caller,
        server.repos.appointments.as_ref(),
        RESOURCE,
        Operation::Update,
        id,
    )
    .await?;

    let changes = parse_body(payload)?;
    server.engine.authorize_fields(
        caller.identity(),
        RESOURCE,
        Operation::Update,
        &changes.touched_fields(),
    )?;
    changes.validate()?;

    server
        .repos
        .appointments
        .update(id, changes)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Appointment"))
}

pub async fn delete_appointment(
    State(server): State<HmsServer>,
    caller: Caller,
    Path(id): Path<RecordId>,
) -> ApiResult<Json<MessageResponse>> {
    common::delete_record::<Appointment, _>(
        &server,
        &caller,
        server.repos.appointments.as_ref(),
        RESOURCE,
        id,
    )
    .await
}
