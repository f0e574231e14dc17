use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use common::pagination::Pagination;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use service::{lead_service, referral_service};

use crate::errors::JsonApiError;
use crate::routes::auth::{AuthContext, ServerState};

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl PageQuery {
    pub fn pagination(&self) -> Pagination {
        let d = Pagination::default();
        Pagination {
            page: self.page.unwrap_or(d.page),
            per_page: self.per_page.unwrap_or(d.per_page),
        }
    }
}

#[utoipa::path(get, path = "/dashboard/links", tag = "dashboard", responses((status = 200, description = "Partner's links")))]
pub async fn list_links(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<Vec<models::referral_link::Model>>, JsonApiError> {
    referral_service::list_links(&state.db, ctx.partner_id)
        .await
        .map(Json)
        .map_err(JsonApiError::from_service)
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CreateLinkInput {
    pub name: String,
}

#[utoipa::path(post, path = "/dashboard/links", tag = "dashboard", request_body = crate::openapi::CreateLinkRequest, responses((status = 200, description = "Created"), (status = 400, description = "Validation Error")))]
pub async fn create_link(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
    Json(input): Json<CreateLinkInput>,
) -> Result<Json<models::referral_link::Model>, JsonApiError> {
    referral_service::create_link(&state.db, ctx.partner_id, &input.name)
        .await
        .map(Json)
        .map_err(JsonApiError::from_service)
}

#[derive(Debug, Deserialize, Serialize)]
pub struct UpdateLinkInput {
    pub active: bool,
}

#[utoipa::path(
    put, path = "/dashboard/links/{id}", tag = "dashboard",
    params(("id" = Uuid, Path, description = "Link ID")),
    request_body = crate::openapi::UpdateLinkRequest,
    responses((status = 200, description = "Updated"), (status = 404, description = "Not Found"))
)]
pub async fn update_link(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateLinkInput>,
) -> Result<Json<models::referral_link::Model>, JsonApiError> {
    referral_service::set_link_active(&state.db, id, ctx.partner_id, input.active)
        .await
        .map(Json)
        .map_err(JsonApiError::from_service)
}

#[utoipa::path(get, path = "/dashboard/leads", tag = "dashboard", params(PageQuery), responses((status = 200, description = "Leads attributed to the partner")))]
pub async fn list_leads(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
    Query(q): Query<PageQuery>,
) -> Result<Json<Vec<models::lead::Model>>, JsonApiError> {
    lead_service::leads_for_partner(&state.db, ctx.partner_id, q.pagination())
        .await
        .map(Json)
        .map_err(JsonApiError::from_service)
}

#[utoipa::path(get, path = "/dashboard/stats", tag = "dashboard", responses((status = 200, description = "Per-link click and lead counts")))]
pub async fn stats(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<Vec<referral_service::LinkStats>>, JsonApiError> {
    referral_service::partner_stats(&state.db, ctx.partner_id)
        .await
        .map(Json)
        .map_err(JsonApiError::from_service)
}
