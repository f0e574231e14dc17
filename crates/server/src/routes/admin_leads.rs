use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use service::lead_service;

use crate::errors::JsonApiError;
use crate::routes::auth::{AuthContext, ServerState};
use crate::routes::dashboard::PageQuery;

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct LeadListQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub status: Option<String>,
    /// Substring search over contact fields.
    pub q: Option<String>,
}

#[utoipa::path(get, path = "/admin/leads", tag = "leads", params(LeadListQuery), responses((status = 200, description = "List OK")))]
pub async fn list_leads(
    State(state): State<ServerState>,
    Query(q): Query<LeadListQuery>,
) -> Result<Json<Vec<models::lead::Model>>, JsonApiError> {
    let page = PageQuery { page: q.page, per_page: q.per_page };
    lead_service::list_leads(&state.db, page.pagination(), q.status.as_deref(), q.q.as_deref())
        .await
        .map(Json)
        .map_err(JsonApiError::from_service)
}

#[utoipa::path(
    get, path = "/admin/leads/{id}", tag = "leads",
    params(("id" = Uuid, Path, description = "Lead ID")),
    responses((status = 200, description = "Lead with resolved commission"), (status = 404, description = "Not Found"))
)]
pub async fn lead_detail(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<lead_service::LeadDetail>, JsonApiError> {
    lead_service::lead_detail(&state.db, id)
        .await
        .map(Json)
        .map_err(JsonApiError::from_service)
}

#[derive(Debug, Deserialize, Serialize)]
pub struct UpdateStatusInput {
    pub status: String,
}

#[utoipa::path(
    put, path = "/admin/leads/{id}/status", tag = "leads",
    params(("id" = Uuid, Path, description = "Lead ID")),
    request_body = crate::openapi::UpdateStatusRequest,
    responses((status = 200, description = "Updated"), (status = 400, description = "Unknown status"), (status = 404, description = "Not Found"))
)]
pub async fn update_status(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateStatusInput>,
) -> Result<Json<models::lead::Model>, JsonApiError> {
    let updated = lead_service::update_status(&state.db, id, &input.status, Some(&ctx.email))
        .await
        .map_err(JsonApiError::from_service)?;
    info!(lead_id = %id, status = %updated.status, actor = %ctx.email, "lead status updated");
    Ok(Json(updated))
}

#[derive(Debug, Deserialize, Serialize)]
pub struct AddAttachmentInput {
    pub file_name: String,
    pub content_type: String,
}

#[derive(Serialize)]
pub struct AttachmentOutput {
    #[serde(flatten)]
    pub attachment: models::lead_attachment::Model,
    /// Time-limited upload/view URL for the external store.
    pub signed_url: String,
}

#[utoipa::path(
    post, path = "/admin/leads/{id}/attachments", tag = "leads",
    params(("id" = Uuid, Path, description = "Lead ID")),
    request_body = crate::openapi::AddAttachmentRequest,
    responses((status = 200, description = "Attachment registered"), (status = 404, description = "Lead Not Found"))
)]
pub async fn add_attachment(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(input): Json<AddAttachmentInput>,
) -> Result<Json<AttachmentOutput>, JsonApiError> {
    let attachment = lead_service::add_attachment(&state.db, id, &input.file_name, &input.content_type)
        .await
        .map_err(JsonApiError::from_service)?;
    let signed_url = state
        .storage_signer
        .signed_url(&attachment.storage_key)
        .map_err(JsonApiError::from_service)?;
    Ok(Json(AttachmentOutput { attachment, signed_url }))
}

#[derive(Serialize)]
pub struct SignedUrlOutput {
    pub signed_url: String,
}

#[utoipa::path(
    get, path = "/admin/attachments/{id}/url", tag = "leads",
    params(("id" = Uuid, Path, description = "Attachment ID")),
    responses((status = 200, description = "Signed URL"), (status = 404, description = "Not Found"))
)]
pub async fn attachment_url(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SignedUrlOutput>, JsonApiError> {
    let attachment = lead_service::get_attachment(&state.db, id)
        .await
        .map_err(JsonApiError::from_service)?
        .ok_or_else(|| JsonApiError::new(
            axum::http::StatusCode::NOT_FOUND,
            "Not Found",
            Some("attachment not found".into()),
        ))?;
    let signed_url = state
        .storage_signer
        .signed_url(&attachment.storage_key)
        .map_err(JsonApiError::from_service)?;
    Ok(Json(SignedUrlOutput { signed_url }))
}
