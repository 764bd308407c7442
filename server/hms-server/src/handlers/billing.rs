use auth_rbac::{Operation, RecordId, ResourceType};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use database_layer::{Billing, BillingChanges, NewBilling};
use tracing::info;

use super::common;
use crate::error::{ApiError, ApiResult, MessageResponse};
use crate::middleware::{parse_body, Caller};
use crate::server::HmsServer;
use crate::types::{PaginationParams, WithRelated};

const RESOURCE: ResourceType = ResourceType::Billing;

pub async fn list_billing(
    State(server): State<HmsServer>,
    caller: Caller,
    params: Option<Query<PaginationParams>>,
) -> ApiResult<Json<Vec<WithRelated<Billing>>>> {
    let params = params.map(|Query(p)| p).unwrap_or_default();
    let Json(rows) = common::list_records::<Billing, _>(
        &server,
        &caller,
        server.repos.billing.as_ref(),
        RESOURCE,
        params,
    )
    .await?;
    Ok(Json(common::with_related(&server.repos, rows).await?))
}

pub async fn get_billing(
    State(server): State<HmsServer>,
    caller: Caller,
    Path(id): Path<RecordId>,
) -> ApiResult<Json<WithRelated<Billing>>> {
    let bill = common::load_authorized::<Billing, _>(
        &server,
        &caller,
        server.repos.billing.as_ref(),
        RESOURCE,
        Operation::Read,
        id,
    )
    .await?;
    Ok(Json(common::with_related_one(&server.repos, bill).await?))
}

pub async fn create_billing(
    State(server): State<HmsServer>,
    caller: Caller,
    payload: Result<Json<NewBilling>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Billing>)> {
    common::authorize(&server, &caller, Operation::Create, RESOURCE, None).await?;

    let new_bill = parse_body(payload)?;
    new_bill.validate()?;

    let bill = server.repos.billing.create(new_bill).await?;
    info!(billing_id = bill.id, patient_id = bill.patient_id, "Billing record created");
    Ok((StatusCode::CREATED, Json(bill)))
}

pub async fn update_billing(
    State(server): State<HmsServer>,
    caller: Caller,
    Path(id): Path<RecordId>,
    payload: Result<Json<BillingChanges>, JsonRejection>,
) -> ApiResult<Json<Billing>> {
    common::load_authorized::<Billing, _>(
        &server,
        &caller,
        server.repos.billing.as_ref(),
        RESOURCE,
        Operation::Update,
        id,
    )
    .await?;

    let changes = parse_body(payload)?;
    changes.validate()?;

    server
        .repos
        .billing
        .update(id, changes)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Billing record"))
}

pub async fn delete_billing(
    State(server): State<HmsServer>,
    caller: Caller,
    Path(id): Path<RecordId>,
) -> ApiResult<Json<MessageResponse>> {
    common::delete_record::<Billing, _>(
        &server,
        &caller,
        server.repos.billing.as_ref(),
        RESOURCE,
        id,
    )
    .await
}
