use std::collections::HashMap;

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use models::{city, county, state, zip_code};

use crate::errors::ServiceError;

/// List all states, alphabetically.
pub async fn list_states(db: &DatabaseConnection) -> Result<Vec<state::Model>, ServiceError> {
    state::Entity::find()
        .order_by_asc(state::Column::Name)
        .all(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))
}

/// List counties of a state.
pub async fn list_counties(
    db: &DatabaseConnection,
    state_code: &str,
) -> Result<Vec<county::Model>, ServiceError> {
    county::Entity::find()
        .filter(county::Column::StateCode.eq(state_code))
        .order_by_asc(county::Column::Name)
        .all(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))
}

/// List cities of a county.
pub async fn list_cities(
    db: &DatabaseConnection,
    county_id: Uuid,
) -> Result<Vec<city::Model>, ServiceError> {
    city::Entity::find()
        .filter(city::Column::CountyId.eq(county_id))
        .order_by_asc(city::Column::Name)
        .all(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))
}

/// Resolve a ZIP to its city, if the ZIP is known.
pub async fn find_city_by_zip(
    db: &DatabaseConnection,
    zip: &str,
) -> Result<Option<city::Model>, ServiceError> {
    let row = zip_code::Entity::find_by_id(zip.to_string())
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?;
    let Some(row) = row else { return Ok(None) };
    city::Entity::find_by_id(row.city_id)
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))
}

/// Batched city lookup keyed by id; one query for the whole id set.
pub async fn cities_by_ids(
    db: &DatabaseConnection,
    ids: &[Uuid],
) -> Result<HashMap<Uuid, city::Model>, ServiceError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = city::Entity::find()
        .filter(city::Column::Id.is_in(ids.iter().copied()))
        .all(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?;
    Ok(rows.into_iter().map(|c| (c.id, c)).collect())
}

/// Batched county lookup keyed by id.
pub async fn counties_by_ids(
    db: &DatabaseConnection,
    ids: &[Uuid],
) -> Result<HashMap<Uuid, county::Model>, ServiceError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = county::Entity::find()
        .filter(county::Column::Id.is_in(ids.iter().copied()))
        .all(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?;
    Ok(rows.into_iter().map(|c| (c.id, c)).collect())
}

/// All cities belonging to any of the given counties.
pub async fn cities_for_counties(
    db: &DatabaseConnection,
    county_ids: &[Uuid],
) -> Result<Vec<city::Model>, ServiceError> {
    if county_ids.is_empty() {
        return Ok(Vec::new());
    }
    city::Entity::find()
        .filter(city::Column::CountyId.is_in(county_ids.iter().copied()))
        .all(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))
}

/// All cities belonging to any of the given states.
pub async fn cities_for_states(
    db: &DatabaseConnection,
    state_codes: &[String],
) -> Result<Vec<city::Model>, ServiceError> {
    if state_codes.is_empty() {
        return Ok(Vec::new());
    }
    city::Entity::find()
        .filter(city::Column::StateCode.is_in(state_codes.iter().cloned()))
        .all(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))
}

/// Substring search over city names, for admin area pickers.
pub async fn search_cities(
    db: &DatabaseConnection,
    q: &str,
    limit: u64,
) -> Result<Vec<city::Model>, ServiceError> {
    use sea_orm::QuerySelect;
    if q.trim().is_empty() {
        return Ok(Vec::new());
    }
    city::Entity::find()
        .filter(city::Column::Name.contains(q.trim()))
        .order_by_asc(city::Column::Name)
        .limit(limit)
        .all(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))
}
