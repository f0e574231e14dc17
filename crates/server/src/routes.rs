use axum::http::StatusCode;
use axum::middleware;
use axum::{
    routing::{delete, get, post, put},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::types::Health;

use crate::metrics;
use crate::openapi;

pub mod auth;
pub mod public;
pub mod dashboard;
pub mod admin_catalog;
pub mod admin_areas;
pub mod admin_leads;
pub mod geo;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK")))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn metrics_endpoint() -> (StatusCode, String) {
    metrics::encode_metrics()
}

/// Build the full application router: public funnel, auth, partner
/// dashboard, and the admin surface behind the role gate.
pub fn build_router(cors: CorsLayer, state: auth::ServerState) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics_endpoint))
        .route("/r/:slug", get(public::referral_landing))
        .route("/services", get(public::list_services))
        .route("/services/:id/coverage", get(public::coverage_check))
        .route("/leads", post(public::start_lead))
        .route("/leads/:id/service", put(public::select_service))
        .route("/leads/:id/submit", post(public::submit_lead));

    let auth_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me));

    let dashboard_routes = Router::new()
        .route("/dashboard/links", get(dashboard::list_links).post(dashboard::create_link))
        .route("/dashboard/links/:id", put(dashboard::update_link))
        .route("/dashboard/leads", get(dashboard::list_leads))
        .route("/dashboard/stats", get(dashboard::stats));

    // Admin routes: bearer middleware runs first (outer), then the role gate
    let admin_routes = Router::new()
        .route("/admin/services", get(admin_catalog::list_services).post(admin_catalog::create_service))
        .route(
            "/admin/services/:id",
            get(admin_catalog::get_service)
                .put(admin_catalog::update_service)
                .delete(admin_catalog::delete_service),
        )
        .route(
            "/admin/services/:id/sub-services",
            get(admin_catalog::list_sub_services).post(admin_catalog::create_sub_service),
        )
        .route(
            "/admin/sub-services/:id",
            put(admin_catalog::update_sub_service).delete(admin_catalog::delete_sub_service),
        )
        .route(
            "/admin/sub-services/:id/commission",
            put(admin_catalog::set_commission).delete(admin_catalog::clear_commission),
        )
        .route("/admin/service-areas", get(admin_areas::list_areas).post(admin_areas::add_area))
        .route("/admin/service-areas/:id", delete(admin_areas::remove_area))
        .route("/admin/geo/states", get(geo::list_states))
        .route("/admin/geo/counties", get(geo::list_counties))
        .route("/admin/geo/cities", get(geo::list_cities))
        .route("/admin/geo/zip/:zip", get(geo::resolve_zip))
        .route("/admin/geo/search", get(geo::search_cities))
        .route("/admin/leads", get(admin_leads::list_leads))
        .route("/admin/leads/:id", get(admin_leads::lead_detail))
        .route("/admin/leads/:id/status", put(admin_leads::update_status))
        .route("/admin/leads/:id/attachments", post(admin_leads::add_attachment))
        .route("/admin/attachments/:id/url", get(admin_leads::attachment_url))
        .route_layer(middleware::from_fn(auth::require_admin));

    public
        .merge(auth_routes)
        .merge(dashboard_routes)
        .merge(admin_routes)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()))
        .layer(middleware::from_fn_with_state(state.clone(), auth::require_bearer_token_state))
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_request(
                    DefaultOnRequest::new()
                        .level(Level::INFO),
                )
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_failure(
                    DefaultOnFailure::new()
                        .level(Level::ERROR),
                ),
        )
}
