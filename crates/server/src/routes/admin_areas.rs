use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use models::service_area_mapping::{AreaScope, GeoRef};
use service::area_service;

use crate::errors::JsonApiError;
use crate::routes::auth::ServerState;
use crate::routes::public::parse_sub_service_id;

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct AreaListQuery {
    pub service_id: Uuid,
    /// Empty string means "service-level view".
    pub sub_service_id: Option<String>,
}

#[utoipa::path(
    get, path = "/admin/service-areas", tag = "areas",
    params(AreaListQuery),
    responses((status = 200, description = "Resolved coverage with provenance tags"))
)]
pub async fn list_areas(
    State(state): State<ServerState>,
    Query(q): Query<AreaListQuery>,
) -> Result<Json<Vec<area_service::ResolvedArea>>, JsonApiError> {
    let sub_service_id = parse_sub_service_id(q.sub_service_id.as_deref())?;
    area_service::resolve_areas(&state.db, q.service_id, sub_service_id)
        .await
        .map(Json)
        .map_err(JsonApiError::from_service)
}

#[derive(Debug, Deserialize, Serialize)]
pub struct AddAreaInput {
    pub service_id: Uuid,
    /// Omitted or empty: add a service-level default area.
    #[serde(default)]
    pub sub_service_id: Option<Uuid>,
    /// With a sub-service selected: true carves the area out instead of
    /// adding it.
    #[serde(default)]
    pub exclude: bool,
    #[serde(default)]
    pub city_id: Option<Uuid>,
    #[serde(default)]
    pub county_id: Option<Uuid>,
    #[serde(default)]
    pub state_code: Option<String>,
}

impl AddAreaInput {
    /// Exactly one geographic unit per mapping row.
    pub fn geo_ref(&self) -> Result<GeoRef, JsonApiError> {
        let refs = [self.city_id.is_some(), self.county_id.is_some(), self.state_code.is_some()];
        if refs.iter().filter(|set| **set).count() != 1 {
            return Err(JsonApiError::new(
                StatusCode::BAD_REQUEST,
                "Validation Error",
                Some("provide exactly one of city_id, county_id, state_code".into()),
            ));
        }
        if let Some(id) = self.city_id {
            return Ok(GeoRef::City(id));
        }
        if let Some(id) = self.county_id {
            return Ok(GeoRef::County(id));
        }
        Ok(GeoRef::State(self.state_code.clone().unwrap_or_default()))
    }

    pub fn scope(&self) -> Result<AreaScope, JsonApiError> {
        match (self.sub_service_id, self.exclude) {
            (None, false) => Ok(AreaScope::ServiceDefault),
            (None, true) => Err(JsonApiError::new(
                StatusCode::BAD_REQUEST,
                "Validation Error",
                Some("exclusions require a sub-service".into()),
            )),
            (Some(_), false) => Ok(AreaScope::SubServiceInclusion),
            (Some(_), true) => Ok(AreaScope::SubServiceExclusion),
        }
    }
}

#[utoipa::path(
    post, path = "/admin/service-areas", tag = "areas",
    request_body = crate::openapi::AddAreaRequest,
    responses(
        (status = 200, description = "Mapping created"),
        (status = 400, description = "Validation Error"),
        (status = 409, description = "Duplicate mapping")
    )
)]
pub async fn add_area(
    State(state): State<ServerState>,
    Json(input): Json<AddAreaInput>,
) -> Result<Json<models::service_area_mapping::Model>, JsonApiError> {
    let scope = input.scope()?;
    let geo = input.geo_ref()?;
    let (service_id, sub_service_id) = match scope {
        AreaScope::ServiceDefault => (Some(input.service_id), None),
        _ => (None, input.sub_service_id),
    };
    area_service::add_area(&state.db, scope, service_id, sub_service_id, geo)
        .await
        .map(Json)
        .map_err(JsonApiError::from_service)
}

#[utoipa::path(
    delete, path = "/admin/service-areas/{id}", tag = "areas",
    params(("id" = Uuid, Path, description = "Mapping ID")),
    responses((status = 204, description = "Removed"), (status = 404, description = "Not Found"))
)]
pub async fn remove_area(State(state): State<ServerState>, Path(id): Path<Uuid>) -> StatusCode {
    match area_service::remove_area(&state.db, id).await {
        Ok(true) => StatusCode::NO_CONTENT,
        Ok(false) => StatusCode::NOT_FOUND,
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_input() -> AddAreaInput {
        AddAreaInput {
            service_id: Uuid::new_v4(),
            sub_service_id: None,
            exclude: false,
            city_id: None,
            county_id: None,
            state_code: None,
        }
    }

    #[test]
    fn scope_derivation() {
        let mut input = base_input();
        assert_eq!(input.scope().unwrap(), AreaScope::ServiceDefault);

        input.sub_service_id = Some(Uuid::new_v4());
        assert_eq!(input.scope().unwrap(), AreaScope::SubServiceInclusion);

        input.exclude = true;
        assert_eq!(input.scope().unwrap(), AreaScope::SubServiceExclusion);

        input.sub_service_id = None;
        assert!(input.scope().is_err());
    }

    #[test]
    fn exactly_one_geo_unit() {
        let mut input = base_input();
        assert!(input.geo_ref().is_err());

        input.city_id = Some(Uuid::new_v4());
        assert!(matches!(input.geo_ref().unwrap(), GeoRef::City(_)));

        input.state_code = Some("OR".into());
        assert!(input.geo_ref().is_err());
    }
}
