use std::collections::HashSet;

use sea_orm::{ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use models::service_area_mapping::{self, AreaLevel, AreaScope, GeoRef};
use models::{city, county, state};

use crate::errors::ServiceError;
use crate::geo_service;

/// Why an area shows up in a coverage view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Service-level default seen from a sub-service view.
    Inherited,
    /// Service-level default seen from the bare service view.
    Service,
    /// Sub-service inclusion.
    Added,
    /// Sub-service exclusion; displayed as a carve-out, not removed.
    Excluded,
}

/// A mapping row resolved to display names.
#[derive(Clone, Debug, Serialize)]
pub struct ResolvedArea {
    pub mapping_id: Uuid,
    pub scope: AreaScope,
    pub level: AreaLevel,
    pub state_code: Option<String>,
    pub county_id: Option<Uuid>,
    pub county_name: Option<String>,
    pub city_id: Option<Uuid>,
    pub city_name: Option<String>,
    pub provenance: Provenance,
}

/// Service-default rows read differently depending on the view.
pub fn tag_provenance(scope: AreaScope, sub_service_view: bool) -> Provenance {
    match scope {
        AreaScope::ServiceDefault => {
            if sub_service_view { Provenance::Inherited } else { Provenance::Service }
        }
        AreaScope::SubServiceInclusion => Provenance::Added,
        AreaScope::SubServiceExclusion => Provenance::Excluded,
    }
}

async fn fetch_defaults(
    db: &DatabaseConnection,
    service_id: Uuid,
) -> Result<Vec<service_area_mapping::Model>, ServiceError> {
    service_area_mapping::Entity::find()
        .filter(service_area_mapping::Column::Scope.eq(AreaScope::ServiceDefault.as_str()))
        .filter(service_area_mapping::Column::ServiceId.eq(service_id))
        .order_by_asc(service_area_mapping::Column::CreatedAt)
        .all(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))
}

async fn fetch_overrides(
    db: &DatabaseConnection,
    sub_service_id: Uuid,
    scope: AreaScope,
) -> Result<Vec<service_area_mapping::Model>, ServiceError> {
    service_area_mapping::Entity::find()
        .filter(service_area_mapping::Column::Scope.eq(scope.as_str()))
        .filter(service_area_mapping::Column::SubServiceId.eq(sub_service_id))
        .order_by_asc(service_area_mapping::Column::CreatedAt)
        .all(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))
}

/// Resolve the coverage view for a service, or for one of its sub-services.
///
/// Service-default rows come back tagged `inherited` (sub-service view) or
/// `service` (bare view); inclusions `added`; exclusions `excluded`.
/// Display names are fetched with one batched query per referenced table.
pub async fn resolve_areas(
    db: &DatabaseConnection,
    service_id: Uuid,
    sub_service_id: Option<Uuid>,
) -> Result<Vec<ResolvedArea>, ServiceError> {
    let mut mappings = fetch_defaults(db, service_id).await?;
    if let Some(ssid) = sub_service_id {
        mappings.extend(fetch_overrides(db, ssid, AreaScope::SubServiceInclusion).await?);
        mappings.extend(fetch_overrides(db, ssid, AreaScope::SubServiceExclusion).await?);
    }

    // Collect referenced ids first, then resolve names in one pass each.
    let city_ids: Vec<Uuid> = mappings.iter().filter_map(|m| m.city_id).collect();
    let county_ids: Vec<Uuid> = mappings.iter().filter_map(|m| m.county_id).collect();
    let cities = geo_service::cities_by_ids(db, &city_ids).await?;
    let counties = geo_service::counties_by_ids(db, &county_ids).await?;

    let sub_view = sub_service_id.is_some();
    let mut out = Vec::with_capacity(mappings.len());
    for m in mappings {
        let Some(scope) = m.scope_parsed() else {
            return Err(ServiceError::Db(format!("mapping {} has unknown scope {}", m.id, m.scope)));
        };
        let Some(level) = m.level_parsed() else {
            return Err(ServiceError::Db(format!("mapping {} has unknown level {}", m.id, m.level)));
        };
        let city = m.city_id.and_then(|id| cities.get(&id));
        let county = m.county_id.and_then(|id| counties.get(&id));
        let state_code = match level {
            AreaLevel::State => m.state_code.clone(),
            AreaLevel::County => county.map(|c| c.state_code.clone()),
            AreaLevel::City => city.map(|c| c.state_code.clone()),
        };
        out.push(ResolvedArea {
            mapping_id: m.id,
            scope,
            level,
            state_code,
            county_id: m.county_id,
            county_name: county.map(|c| c.name.clone()),
            city_id: m.city_id,
            city_name: city.map(|c| c.name.clone()),
            provenance: tag_provenance(scope, sub_view),
        });
    }
    Ok(out)
}

/// Expand a set of mappings to city ids, resolving county- and state-level
/// rows through batched queries.
async fn expand_to_city_ids(
    db: &DatabaseConnection,
    mappings: &[service_area_mapping::Model],
) -> Result<HashSet<Uuid>, ServiceError> {
    let mut out: HashSet<Uuid> = mappings.iter().filter_map(|m| m.city_id).collect();
    let county_ids: Vec<Uuid> = mappings.iter().filter_map(|m| m.county_id).collect();
    let state_codes: Vec<String> = mappings.iter().filter_map(|m| m.state_code.clone()).collect();
    for c in geo_service::cities_for_counties(db, &county_ids).await? {
        out.insert(c.id);
    }
    for c in geo_service::cities_for_states(db, &state_codes).await? {
        out.insert(c.id);
    }
    Ok(out)
}

/// Effective coverage at city granularity:
/// (service defaults plus sub-service inclusions) minus exclusions.
///
/// Exclusions belong to one sub-service only and never affect siblings.
pub async fn effective_city_ids(
    db: &DatabaseConnection,
    service_id: Uuid,
    sub_service_id: Option<Uuid>,
) -> Result<HashSet<Uuid>, ServiceError> {
    let mut include = fetch_defaults(db, service_id).await?;
    let mut exclude = Vec::new();
    if let Some(ssid) = sub_service_id {
        include.extend(fetch_overrides(db, ssid, AreaScope::SubServiceInclusion).await?);
        exclude = fetch_overrides(db, ssid, AreaScope::SubServiceExclusion).await?;
    }
    let mut covered = expand_to_city_ids(db, &include).await?;
    if !exclude.is_empty() {
        let excluded = expand_to_city_ids(db, &exclude).await?;
        covered.retain(|id| !excluded.contains(id));
    }
    Ok(covered)
}

/// ZIP-level coverage check: resolve the ZIP to its city and test membership
/// in the effective set.
pub async fn covers_zip(
    db: &DatabaseConnection,
    service_id: Uuid,
    sub_service_id: Option<Uuid>,
    zip: &str,
) -> Result<bool, ServiceError> {
    let city = geo_service::find_city_by_zip(db, zip)
        .await?
        .ok_or_else(|| ServiceError::not_found("zip"))?;
    let covered = effective_city_ids(db, service_id, sub_service_id).await?;
    Ok(covered.contains(&city.id))
}

async fn geo_unit_exists(db: &DatabaseConnection, geo: &GeoRef) -> Result<bool, ServiceError> {
    let found = match geo {
        GeoRef::City(id) => city::Entity::find_by_id(*id)
            .one(db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))?
            .is_some(),
        GeoRef::County(id) => county::Entity::find_by_id(*id)
            .one(db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))?
            .is_some(),
        GeoRef::State(code) => state::Entity::find_by_id(code.clone())
            .one(db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))?
            .is_some(),
    };
    Ok(found)
}

fn geo_condition(geo: &GeoRef) -> Condition {
    match geo {
        GeoRef::City(id) => Condition::all().add(service_area_mapping::Column::CityId.eq(*id)),
        GeoRef::County(id) => Condition::all().add(service_area_mapping::Column::CountyId.eq(*id)),
        GeoRef::State(code) => {
            Condition::all().add(service_area_mapping::Column::StateCode.eq(code.clone()))
        }
    }
}

/// Insert a mapping after a point-lookup duplicate check.
///
/// The check-then-insert is not transactional; two concurrent admins can
/// race a duplicate in (accepted, single-admin-at-a-time usage).
pub async fn add_area(
    db: &DatabaseConnection,
    scope: AreaScope,
    service_id: Option<Uuid>,
    sub_service_id: Option<Uuid>,
    geo: GeoRef,
) -> Result<service_area_mapping::Model, ServiceError> {
    service_area_mapping::validate_owner(scope, service_id, sub_service_id)?;
    if !geo_unit_exists(db, &geo).await? {
        return Err(ServiceError::not_found("geographic unit"));
    }

    let mut cond = Condition::all()
        .add(service_area_mapping::Column::Scope.eq(scope.as_str()))
        .add(geo_condition(&geo));
    cond = match scope {
        AreaScope::ServiceDefault => {
            cond.add(service_area_mapping::Column::ServiceId.eq(service_id))
        }
        _ => cond.add(service_area_mapping::Column::SubServiceId.eq(sub_service_id)),
    };
    let duplicate = service_area_mapping::Entity::find()
        .filter(cond)
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?;
    if duplicate.is_some() {
        return Err(ServiceError::Conflict("area already mapped for this scope".into()));
    }

    let created = service_area_mapping::create(db, scope, service_id, sub_service_id, geo).await?;
    info!(mapping_id = %created.id, scope = %created.scope, level = %created.level, "area_mapping_created");
    Ok(created)
}

/// Delete a mapping row by id. Removing an exclusion reinstates the
/// inherited area; the client renders that action as "Add Back".
pub async fn remove_area(db: &DatabaseConnection, id: Uuid) -> Result<bool, ServiceError> {
    let res = service_area_mapping::Entity::delete_by_id(id)
        .exec(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?;
    if res.rows_affected > 0 {
        info!(mapping_id = %id, "area_mapping_removed");
    }
    Ok(res.rows_affected > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog_service;
    use crate::test_support::get_db;
    use rand::Rng;
    use sea_orm::{ActiveModelTrait, Set};
    use models::zip_code;

    #[test]
    fn provenance_depends_on_view() {
        assert_eq!(tag_provenance(AreaScope::ServiceDefault, false), Provenance::Service);
        assert_eq!(tag_provenance(AreaScope::ServiceDefault, true), Provenance::Inherited);
        assert_eq!(tag_provenance(AreaScope::SubServiceInclusion, true), Provenance::Added);
        assert_eq!(tag_provenance(AreaScope::SubServiceExclusion, true), Provenance::Excluded);
    }

    async fn ensure_state(db: &sea_orm::DatabaseConnection, code: &str, name: &str) {
        if state::Entity::find_by_id(code.to_string()).one(db).await.expect("find state").is_none() {
            state::ActiveModel { code: Set(code.to_string()), name: Set(name.to_string()) }
                .insert(db)
                .await
                .expect("insert state");
        }
    }

    async fn insert_county(db: &sea_orm::DatabaseConnection, state_code: &str, name: &str) -> county::Model {
        county::ActiveModel {
            id: Set(Uuid::new_v4()),
            state_code: Set(state_code.to_string()),
            name: Set(name.to_string()),
        }
        .insert(db)
        .await
        .expect("insert county")
    }

    async fn insert_city(db: &sea_orm::DatabaseConnection, c: &county::Model, name: &str) -> city::Model {
        city::ActiveModel {
            id: Set(Uuid::new_v4()),
            county_id: Set(c.id),
            state_code: Set(c.state_code.clone()),
            name: Set(name.to_string()),
        }
        .insert(db)
        .await
        .expect("insert city")
    }

    async fn insert_zip(db: &sea_orm::DatabaseConnection, city: &city::Model) -> String {
        // random 9-digit code keeps reruns collision-free
        let zip = format!("{:09}", rand::thread_rng().gen_range(0..1_000_000_000u64));
        zip_code::ActiveModel { zip: Set(zip.clone()), city_id: Set(city.id) }
            .insert(db)
            .await
            .expect("insert zip");
        zip
    }

    #[tokio::test]
    async fn exclusion_removes_city_for_one_sub_service_only() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;

        ensure_state(&db, "OR", "Oregon").await;
        let county = insert_county(&db, "OR", &format!("Multnomah {}", Uuid::new_v4())).await;
        let portland = insert_city(&db, &county, "Portland").await;
        let zip = insert_zip(&db, &portland).await;

        let svc = catalog_service::create_service(&db, &format!("Roofing {}", Uuid::new_v4()), None, 10.0).await?;
        let repair = catalog_service::create_sub_service(&db, svc.id, "Roof Repair", None).await?;
        let replacement = catalog_service::create_sub_service(&db, svc.id, "Roof Replacement", None).await?;

        // service-level default covers the whole county
        add_area(&db, AreaScope::ServiceDefault, Some(svc.id), None, GeoRef::County(county.id)).await?;
        // carve Portland out of Roof Repair only
        add_area(&db, AreaScope::SubServiceExclusion, None, Some(repair.id), GeoRef::City(portland.id)).await?;

        let repair_set = effective_city_ids(&db, svc.id, Some(repair.id)).await?;
        assert!(!repair_set.contains(&portland.id));
        let replacement_set = effective_city_ids(&db, svc.id, Some(replacement.id)).await?;
        assert!(replacement_set.contains(&portland.id));

        assert!(!covers_zip(&db, svc.id, Some(repair.id), &zip).await?);
        assert!(covers_zip(&db, svc.id, Some(replacement.id), &zip).await?);

        catalog_service::delete_service(&db, svc.id).await?;
        Ok(())
    }

    #[tokio::test]
    async fn resolution_tags_and_batching() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;

        ensure_state(&db, "WA", "Washington").await;
        let county = insert_county(&db, "WA", &format!("King {}", Uuid::new_v4())).await;
        let seattle = insert_city(&db, &county, "Seattle").await;
        let renton = insert_city(&db, &county, "Renton").await;

        let svc = catalog_service::create_service(&db, &format!("Siding {}", Uuid::new_v4()), None, 8.0).await?;
        let install = catalog_service::create_sub_service(&db, svc.id, "Siding Install", None).await?;

        add_area(&db, AreaScope::ServiceDefault, Some(svc.id), None, GeoRef::City(seattle.id)).await?;
        add_area(&db, AreaScope::SubServiceInclusion, None, Some(install.id), GeoRef::City(renton.id)).await?;
        add_area(&db, AreaScope::SubServiceExclusion, None, Some(install.id), GeoRef::City(seattle.id)).await?;

        // bare service view: only the default, tagged `service`
        let service_view = resolve_areas(&db, svc.id, None).await?;
        assert_eq!(service_view.len(), 1);
        assert_eq!(service_view[0].provenance, Provenance::Service);
        assert_eq!(service_view[0].city_name.as_deref(), Some("Seattle"));
        assert_eq!(service_view[0].state_code.as_deref(), Some("WA"));

        // sub-service view: inherited + added + excluded, all displayed
        let sub_view = resolve_areas(&db, svc.id, Some(install.id)).await?;
        assert_eq!(sub_view.len(), 3);
        let tags: Vec<Provenance> = sub_view.iter().map(|a| a.provenance).collect();
        assert!(tags.contains(&Provenance::Inherited));
        assert!(tags.contains(&Provenance::Added));
        assert!(tags.contains(&Provenance::Excluded));

        // the exclusion carves Seattle out but keeps Renton
        let effective = effective_city_ids(&db, svc.id, Some(install.id)).await?;
        assert!(!effective.contains(&seattle.id));
        assert!(effective.contains(&renton.id));

        catalog_service::delete_service(&db, svc.id).await?;
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_mapping_conflicts_and_remove_reinstates() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;

        ensure_state(&db, "CA", "California").await;
        let county = insert_county(&db, "CA", &format!("Orange {}", Uuid::new_v4())).await;
        let irvine = insert_city(&db, &county, "Irvine").await;

        let svc = catalog_service::create_service(&db, &format!("HVAC {}", Uuid::new_v4()), None, 12.0).await?;
        let repair = catalog_service::create_sub_service(&db, svc.id, "AC Repair", None).await?;

        add_area(&db, AreaScope::ServiceDefault, Some(svc.id), None, GeoRef::City(irvine.id)).await?;
        let dup = add_area(&db, AreaScope::ServiceDefault, Some(svc.id), None, GeoRef::City(irvine.id)).await;
        assert!(matches!(dup, Err(ServiceError::Conflict(_))));

        let excl = add_area(&db, AreaScope::SubServiceExclusion, None, Some(repair.id), GeoRef::City(irvine.id)).await?;
        let covered = effective_city_ids(&db, svc.id, Some(repair.id)).await?;
        assert!(!covered.contains(&irvine.id));

        // removing the exclusion is the "Add Back" action
        assert!(remove_area(&db, excl.id).await?);
        let covered = effective_city_ids(&db, svc.id, Some(repair.id)).await?;
        assert!(covered.contains(&irvine.id));

        catalog_service::delete_service(&db, svc.id).await?;
        Ok(())
    }

    #[tokio::test]
    async fn owner_mismatch_rejected() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let err = add_area(&db, AreaScope::ServiceDefault, None, None, GeoRef::State("OR".into())).await;
        assert!(matches!(err, Err(ServiceError::Model(_))));
        Ok(())
    }
}
