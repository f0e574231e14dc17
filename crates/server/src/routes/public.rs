use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use sea_orm::EntityTrait;
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use common::webhook;
use service::{area_service, catalog_service, lead_service, referral_service};
use service::lead_service::AddressInput;
use service::referral_service::UtmParams;

use crate::errors::JsonApiError;
use crate::metrics;
use crate::routes::auth::ServerState;

#[derive(Serialize)]
pub struct ServiceWithSubs {
    #[serde(flatten)]
    pub service: models::service::Model,
    pub sub_services: Vec<models::sub_service::Model>,
}

#[derive(Serialize)]
pub struct SiteInfo {
    pub site_url: String,
    pub maps_api_key: Option<String>,
}

#[derive(Serialize)]
pub struct ReferralBootstrap {
    pub slug: String,
    pub partner_name: String,
    pub click_counted: bool,
    pub services: Vec<ServiceWithSubs>,
    pub site: SiteInfo,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct UtmQuery {
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
}

/// Best-effort client address; the service sits behind a proxy, so headers
/// win over the socket address.
fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

async fn active_catalog(state: &ServerState) -> Result<Vec<ServiceWithSubs>, JsonApiError> {
    let services = catalog_service::list_services(&state.db, false)
        .await
        .map_err(JsonApiError::from_service)?;
    let mut out = Vec::with_capacity(services.len());
    for s in services {
        let sub_services = catalog_service::list_sub_services(&state.db, s.id, false)
            .await
            .map_err(JsonApiError::from_service)?;
        out.push(ServiceWithSubs { service: s, sub_services });
    }
    Ok(out)
}

#[utoipa::path(
    get, path = "/r/{slug}", tag = "public",
    params(("slug" = String, Path, description = "Partner tracking slug"), UtmQuery),
    responses(
        (status = 200, description = "Form bootstrap payload"),
        (status = 404, description = "Unknown or inactive slug")
    )
)]
pub async fn referral_landing(
    State(state): State<ServerState>,
    Path(slug): Path<String>,
    Query(utm): Query<UtmQuery>,
    headers: HeaderMap,
) -> Result<Json<ReferralBootstrap>, JsonApiError> {
    let ip = client_ip(&headers);
    let user_agent = headers.get("user-agent").and_then(|v| v.to_str().ok());
    let outcome = referral_service::record_click(
        &state.db,
        &slug,
        &ip,
        user_agent,
        UtmParams { source: utm.utm_source, medium: utm.utm_medium, campaign: utm.utm_campaign },
    )
    .await
    .map_err(JsonApiError::from_service)?;
    if outcome.counted {
        metrics::REFERRAL_CLICKS_TOTAL.inc();
    } else {
        metrics::REFERRAL_CLICKS_DEDUPED_TOTAL.inc();
    }

    let partner = models::partner::Entity::find_by_id(outcome.link.partner_id)
        .one(&state.db)
        .await
        .map_err(|e| JsonApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "DB Error", Some(e.to_string())))?;
    let partner_name = partner
        .map(|p| p.company_name.unwrap_or(p.name))
        .unwrap_or_default();

    Ok(Json(ReferralBootstrap {
        slug: outcome.link.slug,
        partner_name,
        click_counted: outcome.counted,
        services: active_catalog(&state).await?,
        site: SiteInfo {
            site_url: state.site.site_url.clone(),
            maps_api_key: state.site.maps_api_key.clone(),
        },
    }))
}

#[utoipa::path(get, path = "/services", tag = "public", responses((status = 200, description = "Active catalog")))]
pub async fn list_services(
    State(state): State<ServerState>,
) -> Result<Json<Vec<ServiceWithSubs>>, JsonApiError> {
    Ok(Json(active_catalog(&state).await?))
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct CoverageQuery {
    /// Empty string means "service-level view".
    pub sub_service_id: Option<String>,
    pub zip: String,
}

#[derive(Serialize)]
pub struct CoverageOutput {
    pub covered: bool,
}

/// Treat an absent or empty `sub_service_id` as the bare service view.
pub fn parse_sub_service_id(raw: Option<&str>) -> Result<Option<Uuid>, JsonApiError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => Uuid::parse_str(s).map(Some).map_err(|_| {
            JsonApiError::new(StatusCode::BAD_REQUEST, "Validation Error", Some("malformed sub_service_id".into()))
        }),
    }
}

#[utoipa::path(
    get, path = "/services/{id}/coverage", tag = "public",
    params(("id" = Uuid, Path, description = "Service ID"), CoverageQuery),
    responses((status = 200, description = "Coverage verdict"), (status = 404, description = "Unknown service or ZIP"))
)]
pub async fn coverage_check(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Query(q): Query<CoverageQuery>,
) -> Result<Json<CoverageOutput>, JsonApiError> {
    if catalog_service::get_service(&state.db, id)
        .await
        .map_err(JsonApiError::from_service)?
        .is_none()
    {
        return Err(JsonApiError::new(StatusCode::NOT_FOUND, "Not Found", Some("service not found".into())));
    }
    let sub_service_id = parse_sub_service_id(q.sub_service_id.as_deref())?;
    let covered = area_service::covers_zip(&state.db, id, sub_service_id, &q.zip)
        .await
        .map_err(JsonApiError::from_service)?;
    Ok(Json(CoverageOutput { covered }))
}

#[derive(Debug, Deserialize, Serialize)]
pub struct StartLeadInput {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub referral_slug: Option<String>,
}

#[utoipa::path(post, path = "/leads", tag = "leads", request_body = crate::openapi::StartLeadRequest, responses((status = 200, description = "Lead captured"), (status = 400, description = "Validation Error")))]
pub async fn start_lead(
    State(state): State<ServerState>,
    Json(input): Json<StartLeadInput>,
) -> Result<Json<models::lead::Model>, JsonApiError> {
    let referral_link_id = match input.referral_slug.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(slug) => referral_service::find_active_by_slug(&state.db, slug)
            .await
            .map_err(JsonApiError::from_service)?
            .map(|l| l.id),
        None => None,
    };
    let lead = lead_service::start_lead(&state.db, referral_link_id, &input.full_name, &input.email, &input.phone)
        .await
        .map_err(JsonApiError::from_service)?;
    Ok(Json(lead))
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SelectServiceInput {
    pub service_id: Uuid,
    #[serde(default)]
    pub sub_service_id: Option<Uuid>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub street_address: Option<String>,
    #[serde(default)]
    pub city_name: Option<String>,
    #[serde(default)]
    pub state_code: Option<String>,
    #[serde(default)]
    pub zip: Option<String>,
}

#[utoipa::path(
    put, path = "/leads/{id}/service", tag = "leads",
    params(("id" = Uuid, Path, description = "Lead ID")),
    request_body = crate::openapi::SelectServiceRequest,
    responses((status = 200, description = "Updated"), (status = 404, description = "Not Found"), (status = 409, description = "Already submitted"))
)]
pub async fn select_service(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(input): Json<SelectServiceInput>,
) -> Result<Json<models::lead::Model>, JsonApiError> {
    let lead = lead_service::select_service(
        &state.db,
        id,
        input.service_id,
        input.sub_service_id,
        input.details.as_deref(),
        AddressInput {
            street_address: input.street_address,
            city_name: input.city_name,
            state_code: input.state_code,
            zip: input.zip,
        },
    )
    .await
    .map_err(JsonApiError::from_service)?;
    Ok(Json(lead))
}

#[utoipa::path(
    post, path = "/leads/{id}/submit", tag = "leads",
    params(("id" = Uuid, Path, description = "Lead ID")),
    responses((status = 200, description = "Submitted"), (status = 404, description = "Not Found"), (status = 409, description = "Already submitted"))
)]
pub async fn submit_lead(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<models::lead::Model>, JsonApiError> {
    let lead = lead_service::submit_lead(&state.db, id, None)
        .await
        .map_err(JsonApiError::from_service)?;
    metrics::LEADS_SUBMITTED_TOTAL.inc();
    info!(lead_id = %lead.id, "lead submitted via public funnel");

    // best-effort notification; a webhook failure never fails the submit
    if let Some(url) = state.lead_webhook_url.clone() {
        let payload = serde_json::json!({
            "event": "lead.submitted",
            "lead_id": lead.id,
            "full_name": lead.full_name,
            "service_id": lead.service_id,
            "sub_service_id": lead.sub_service_id,
            "referral_link_id": lead.referral_link_id,
        });
        tokio::spawn(async move {
            if let Err(e) = webhook::post_json(&url, &payload).await {
                metrics::LEAD_WEBHOOK_FAILURES_TOTAL.inc();
                error!(err = %e, "lead webhook delivery failed");
            }
        });
    }
    Ok(Json(lead))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_ip_prefers_forwarded_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());
        assert_eq!(client_ip(&headers), "203.0.113.7");

        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", "198.51.100.2".parse().unwrap());
        assert_eq!(client_ip(&headers), "198.51.100.2");

        assert_eq!(client_ip(&HeaderMap::new()), "unknown");
    }

    #[test]
    fn empty_sub_service_id_means_service_view() {
        assert_eq!(parse_sub_service_id(None).unwrap(), None);
        assert_eq!(parse_sub_service_id(Some("")).unwrap(), None);
        assert_eq!(parse_sub_service_id(Some("  ")).unwrap(), None);
        let id = Uuid::new_v4();
        assert_eq!(parse_sub_service_id(Some(&id.to_string())).unwrap(), Some(id));
        assert!(parse_sub_service_id(Some("not-a-uuid")).is_err());
    }
}
