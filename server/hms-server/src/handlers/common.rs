//! Authorization plumbing shared by the entity handlers
//!
//! Handlers never look at roles themselves. Every check goes through the
//! [`AuthorizationEngine`](auth_rbac::AuthorizationEngine) held by the server,
//! and a denial becomes the canonical 401 or 403 body.

use std::collections::{BTreeSet, HashMap};

use auth_rbac::{Decision, Effect, Operation, RecordId, ResourceRef, ResourceType};
use axum::Json;
use database_layer::{Entity, Repositories, Repository};

use crate::error::{ApiError, ApiResult, MessageResponse};
use crate::middleware::Caller;
use crate::server::HmsServer;
use crate::types::{DoctorSummary, PaginationParams, PatientSummary, Related, WithRelated};

/// Role-only check, before anything is loaded
pub fn precheck(
    server: &HmsServer,
    caller: &Caller,
    operation: Operation,
    resource_type: ResourceType,
) -> ApiResult<Effect> {
    Ok(server
        .engine
        .precheck(caller.identity(), operation, resource_type)?)
}

/// Full decision, denials mapped to `ApiError`
pub async fn authorize(
    server: &HmsServer,
    caller: &Caller,
    operation: Operation,
    resource_type: ResourceType,
    resource_ref: Option<&ResourceRef>,
) -> ApiResult<Decision> {
    Ok(server
        .engine
        .authorize(caller.identity(), operation, resource_type, resource_ref)
        .await
        .into_result()?)
}

/// Page of records the caller may see, with the doctor filter applied
pub async fn list_records<E, R>(
    server: &HmsServer,
    caller: &Caller,
    repo: &R,
    resource_type: ResourceType,
    params: PaginationParams,
) -> ApiResult<Json<Vec<E>>>
where
    E: Entity,
    R: Repository<E> + ?Sized,
{
    let decision = authorize(server, caller, Operation::ReadList, resource_type, None).await?;
    let query = params
        .to_list_query()
        .for_doctor(decision.row_filter().map(|filter| filter.doctor_id));

    Ok(Json(repo.list(&query).await?))
}

/// Load a record and authorize `operation` on it
///
/// The role check runs first, so a caller without the capability gets 403
/// whether or not the id exists.
pub async fn load_authorized<E, R>(
    server: &HmsServer,
    caller: &Caller,
    repo: &R,
    resource_type: ResourceType,
    operation: Operation,
    id: RecordId,
) -> ApiResult<E>
where
    E: Entity,
    R: Repository<E> + ?Sized,
{
    precheck(server, caller, operation, resource_type)?;

    let record = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(E::NAME))?;

    authorize(
        server,
        caller,
        operation,
        resource_type,
        Some(&record.resource_ref()),
    )
    .await?;

    Ok(record)
}

pub async fn delete_record<E, R>(
    server: &HmsServer,
    caller: &Caller,
    repo: &R,
    resource_type: ResourceType,
    id: RecordId,
) -> ApiResult<Json<MessageResponse>>
where
    E: Entity,
    R: Repository<E> + ?Sized,
{
    load_authorized::<E, R>(server, caller, repo, resource_type, Operation::Delete, id).await?;

    if !repo.delete(id).await? {
        return Err(ApiError::not_found(E::NAME));
    }

    Ok(Json(MessageResponse::new(format!(
        "{} deleted successfully",
        E::NAME
    ))))
}

/// Attach patient and doctor summaries, one lookup per distinct id
pub async fn with_related<T: Related>(
    repos: &Repositories,
    records: Vec<T>,
) -> ApiResult<Vec<WithRelated<T>>> {
    let patient_ids: BTreeSet<RecordId> = records.iter().map(Related::patient_id).collect();
    let doctor_ids: BTreeSet<RecordId> = records.iter().filter_map(Related::doctor_id).collect();

    let mut patients = HashMap::new();
    for id in patient_ids {
        if let Some(patient) = repos.patients.find_by_id(id).await? {
            patients.insert(id, PatientSummary::from(patient));
        }
    }

    let mut doctors = HashMap::new();
    for id in doctor_ids {
        if let Some(doctor) = repos.doctors.find_by_id(id).await? {
            doctors.insert(id, DoctorSummary::from(doctor));
        }
    }

    Ok(records
        .into_iter()
        .map(|record| WithRelated {
            patient: patients.get(&record.patient_id()).cloned(),
            doctor: record.doctor_id().and_then(|id| doctors.get(&id).cloned()),
            record,
        })
        .collect())
}

pub async fn with_related_one<T: Related>(
    repos: &Repositories,
    record: T,
) -> ApiResult<WithRelated<T>> {
    with_related(repos, vec![record])
        .await?
        .pop()
        .ok_or_else(|| ApiError::internal("related lookup returned no record"))
}
