use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use service::geo_service;

use crate::errors::JsonApiError;
use crate::routes::auth::ServerState;

#[utoipa::path(get, path = "/admin/geo/states", tag = "geo", responses((status = 200, description = "List OK")))]
pub async fn list_states(
    State(state): State<ServerState>,
) -> Result<Json<Vec<models::state::Model>>, JsonApiError> {
    geo_service::list_states(&state.db)
        .await
        .map(Json)
        .map_err(JsonApiError::from_service)
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct CountyQuery {
    pub state: String,
}

#[utoipa::path(get, path = "/admin/geo/counties", tag = "geo", params(CountyQuery), responses((status = 200, description = "List OK")))]
pub async fn list_counties(
    State(state): State<ServerState>,
    Query(q): Query<CountyQuery>,
) -> Result<Json<Vec<models::county::Model>>, JsonApiError> {
    geo_service::list_counties(&state.db, &q.state)
        .await
        .map(Json)
        .map_err(JsonApiError::from_service)
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct CityQuery {
    pub county_id: Uuid,
}

#[utoipa::path(get, path = "/admin/geo/cities", tag = "geo", params(CityQuery), responses((status = 200, description = "List OK")))]
pub async fn list_cities(
    State(state): State<ServerState>,
    Query(q): Query<CityQuery>,
) -> Result<Json<Vec<models::city::Model>>, JsonApiError> {
    geo_service::list_cities(&state.db, q.county_id)
        .await
        .map(Json)
        .map_err(JsonApiError::from_service)
}

#[utoipa::path(get, path = "/admin/geo/zip/{zip}", tag = "geo", params(("zip" = String, Path, description = "ZIP code")), responses((status = 200, description = "City for ZIP"), (status = 404, description = "Unknown ZIP")))]
pub async fn resolve_zip(
    State(state): State<ServerState>,
    Path(zip): Path<String>,
) -> Result<Json<models::city::Model>, JsonApiError> {
    let city = geo_service::find_city_by_zip(&state.db, &zip)
        .await
        .map_err(JsonApiError::from_service)?
        .ok_or_else(|| JsonApiError::new(StatusCode::NOT_FOUND, "Not Found", Some("unknown zip".into())))?;
    Ok(Json(city))
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct CitySearchQuery {
    pub q: String,
}

#[utoipa::path(get, path = "/admin/geo/search", tag = "geo", params(CitySearchQuery), responses((status = 200, description = "Matching cities")))]
pub async fn search_cities(
    State(state): State<ServerState>,
    Query(q): Query<CitySearchQuery>,
) -> Result<Json<Vec<models::city::Model>>, JsonApiError> {
    geo_service::search_cities(&state.db, &q.q, 25)
        .await
        .map(Json)
        .map_err(JsonApiError::from_service)
}
