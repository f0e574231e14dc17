use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use service::catalog_service;

use crate::errors::JsonApiError;
use crate::routes::auth::ServerState;

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct CatalogQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CreateServiceInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub commission_pct: f64,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct UpdateServiceInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub active: Option<bool>,
    pub commission_pct: Option<f64>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CreateSubServiceInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct UpdateSubServiceInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CommissionInput {
    pub percentage: f64,
}

#[utoipa::path(get, path = "/admin/services", tag = "catalog", params(CatalogQuery), responses((status = 200, description = "List OK")))]
pub async fn list_services(
    State(state): State<ServerState>,
    Query(q): Query<CatalogQuery>,
) -> Result<Json<Vec<models::service::Model>>, JsonApiError> {
    catalog_service::list_services(&state.db, q.include_inactive)
        .await
        .map(Json)
        .map_err(JsonApiError::from_service)
}

#[utoipa::path(post, path = "/admin/services", tag = "catalog", request_body = crate::openapi::CreateServiceRequest, responses((status = 200, description = "Created"), (status = 400, description = "Validation Error")))]
pub async fn create_service(
    State(state): State<ServerState>,
    Json(input): Json<CreateServiceInput>,
) -> Result<Json<models::service::Model>, JsonApiError> {
    let created = catalog_service::create_service(
        &state.db,
        &input.name,
        input.description.as_deref(),
        input.commission_pct,
    )
    .await
    .map_err(JsonApiError::from_service)?;
    info!(service_id = %created.id, name = %created.name, "service created");
    Ok(Json(created))
}

#[utoipa::path(get, path = "/admin/services/{id}", tag = "catalog", params(("id" = Uuid, Path, description = "Service ID")), responses((status = 200, description = "OK"), (status = 404, description = "Not Found")))]
pub async fn get_service(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<models::service::Model>, StatusCode> {
    match catalog_service::get_service(&state.db, id).await {
        Ok(Some(m)) => Ok(Json(m)),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

#[utoipa::path(put, path = "/admin/services/{id}", tag = "catalog", params(("id" = Uuid, Path, description = "Service ID")), request_body = crate::openapi::UpdateServiceRequest, responses((status = 200, description = "Updated"), (status = 404, description = "Not Found")))]
pub async fn update_service(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateServiceInput>,
) -> Result<Json<models::service::Model>, JsonApiError> {
    catalog_service::update_service(
        &state.db,
        id,
        input.name.as_deref(),
        input.description.as_deref(),
        input.active,
        input.commission_pct,
    )
    .await
    .map(Json)
    .map_err(JsonApiError::from_service)
}

#[utoipa::path(delete, path = "/admin/services/{id}", tag = "catalog", params(("id" = Uuid, Path, description = "Service ID")), responses((status = 204, description = "Deleted"), (status = 404, description = "Not Found")))]
pub async fn delete_service(State(state): State<ServerState>, Path(id): Path<Uuid>) -> StatusCode {
    match catalog_service::delete_service(&state.db, id).await {
        Ok(true) => StatusCode::NO_CONTENT,
        Ok(false) => StatusCode::NOT_FOUND,
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[utoipa::path(get, path = "/admin/services/{id}/sub-services", tag = "catalog", params(("id" = Uuid, Path, description = "Service ID"), CatalogQuery), responses((status = 200, description = "List OK")))]
pub async fn list_sub_services(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Query(q): Query<CatalogQuery>,
) -> Result<Json<Vec<models::sub_service::Model>>, JsonApiError> {
    catalog_service::list_sub_services(&state.db, id, q.include_inactive)
        .await
        .map(Json)
        .map_err(JsonApiError::from_service)
}

#[utoipa::path(post, path = "/admin/services/{id}/sub-services", tag = "catalog", params(("id" = Uuid, Path, description = "Service ID")), request_body = crate::openapi::CreateSubServiceRequest, responses((status = 200, description = "Created"), (status = 404, description = "Service Not Found")))]
pub async fn create_sub_service(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(input): Json<CreateSubServiceInput>,
) -> Result<Json<models::sub_service::Model>, JsonApiError> {
    catalog_service::create_sub_service(&state.db, id, &input.name, input.description.as_deref())
        .await
        .map(Json)
        .map_err(JsonApiError::from_service)
}

#[utoipa::path(put, path = "/admin/sub-services/{id}", tag = "catalog", params(("id" = Uuid, Path, description = "Sub-service ID")), request_body = crate::openapi::UpdateSubServiceRequest, responses((status = 200, description = "Updated"), (status = 404, description = "Not Found")))]
pub async fn update_sub_service(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateSubServiceInput>,
) -> Result<Json<models::sub_service::Model>, JsonApiError> {
    catalog_service::update_sub_service(
        &state.db,
        id,
        input.name.as_deref(),
        input.description.as_deref(),
        input.active,
    )
    .await
    .map(Json)
    .map_err(JsonApiError::from_service)
}

#[utoipa::path(delete, path = "/admin/sub-services/{id}", tag = "catalog", params(("id" = Uuid, Path, description = "Sub-service ID")), responses((status = 204, description = "Deleted"), (status = 404, description = "Not Found")))]
pub async fn delete_sub_service(State(state): State<ServerState>, Path(id): Path<Uuid>) -> StatusCode {
    match catalog_service::delete_sub_service(&state.db, id).await {
        Ok(true) => StatusCode::NO_CONTENT,
        Ok(false) => StatusCode::NOT_FOUND,
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[utoipa::path(put, path = "/admin/sub-services/{id}/commission", tag = "catalog", params(("id" = Uuid, Path, description = "Sub-service ID")), request_body = crate::openapi::CommissionRequest, responses((status = 200, description = "Override set"), (status = 404, description = "Not Found")))]
pub async fn set_commission(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(input): Json<CommissionInput>,
) -> Result<Json<models::commission_tier::Model>, JsonApiError> {
    let tier = catalog_service::set_commission_override(&state.db, id, input.percentage)
        .await
        .map_err(JsonApiError::from_service)?;
    info!(sub_service_id = %id, percentage = tier.percentage, "commission override set");
    Ok(Json(tier))
}

#[utoipa::path(delete, path = "/admin/sub-services/{id}/commission", tag = "catalog", params(("id" = Uuid, Path, description = "Sub-service ID")), responses((status = 204, description = "Override cleared"), (status = 404, description = "No override present")))]
pub async fn clear_commission(State(state): State<ServerState>, Path(id): Path<Uuid>) -> StatusCode {
    match catalog_service::clear_commission_override(&state.db, id).await {
        Ok(true) => StatusCode::NO_CONTENT,
        Ok(false) => StatusCode::NOT_FOUND,
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
