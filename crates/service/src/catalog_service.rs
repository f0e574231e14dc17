use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use models::{commission_tier, service, sub_service};

use crate::errors::ServiceError;

/// Applied when neither a sub-service override nor a service default exists.
pub const FALLBACK_COMMISSION_PCT: f64 = 10.0;

/// Create a service category.
pub async fn create_service(
    db: &DatabaseConnection,
    name: &str,
    description: Option<&str>,
    commission_pct: f64,
) -> Result<service::Model, ServiceError> {
    let created = service::create(db, name, description, commission_pct).await?;
    Ok(created)
}

/// List services, optionally including inactive ones.
pub async fn list_services(
    db: &DatabaseConnection,
    include_inactive: bool,
) -> Result<Vec<service::Model>, ServiceError> {
    let mut q = service::Entity::find().order_by_asc(service::Column::Name);
    if !include_inactive {
        q = q.filter(service::Column::Active.eq(true));
    }
    q.all(db).await.map_err(|e| ServiceError::Db(e.to_string()))
}

/// Get service by id.
pub async fn get_service(db: &DatabaseConnection, id: Uuid) -> Result<Option<service::Model>, ServiceError> {
    service::Entity::find_by_id(id).one(db).await.map_err(|e| ServiceError::Db(e.to_string()))
}

/// Update service fields; `None` leaves a field untouched.
pub async fn update_service(
    db: &DatabaseConnection,
    id: Uuid,
    name: Option<&str>,
    description: Option<&str>,
    active: Option<bool>,
    commission_pct: Option<f64>,
) -> Result<service::Model, ServiceError> {
    let mut am: service::ActiveModel = service::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?
        .ok_or_else(|| ServiceError::not_found("service"))?
        .into();
    if let Some(name) = name {
        service::validate_name(name)?;
        am.name = Set(name.to_string());
    }
    if let Some(description) = description {
        am.description = Set(Some(description.to_string()));
    }
    if let Some(active) = active {
        am.active = Set(active);
    }
    if let Some(pct) = commission_pct {
        service::validate_commission(pct)?;
        am.commission_pct = Set(pct);
    }
    am.updated_at = Set(Utc::now().into());
    am.update(db).await.map_err(|e| ServiceError::Db(e.to_string()))
}

/// Hard delete a service; sub-services and mappings cascade.
pub async fn delete_service(db: &DatabaseConnection, id: Uuid) -> Result<bool, ServiceError> {
    let res = service::Entity::delete_by_id(id)
        .exec(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?;
    Ok(res.rows_affected > 0)
}

/// Create a sub-service under an existing service.
pub async fn create_sub_service(
    db: &DatabaseConnection,
    service_id: Uuid,
    name: &str,
    description: Option<&str>,
) -> Result<sub_service::Model, ServiceError> {
    let parent = get_service(db, service_id).await?;
    if parent.is_none() {
        return Err(ServiceError::not_found("service"));
    }
    let created = sub_service::create(db, service_id, name, description).await?;
    Ok(created)
}

/// List sub-services of a service.
pub async fn list_sub_services(
    db: &DatabaseConnection,
    service_id: Uuid,
    include_inactive: bool,
) -> Result<Vec<sub_service::Model>, ServiceError> {
    let mut q = sub_service::Entity::find()
        .filter(sub_service::Column::ServiceId.eq(service_id))
        .order_by_asc(sub_service::Column::Name);
    if !include_inactive {
        q = q.filter(sub_service::Column::Active.eq(true));
    }
    q.all(db).await.map_err(|e| ServiceError::Db(e.to_string()))
}

pub async fn get_sub_service(
    db: &DatabaseConnection,
    id: Uuid,
) -> Result<Option<sub_service::Model>, ServiceError> {
    sub_service::Entity::find_by_id(id).one(db).await.map_err(|e| ServiceError::Db(e.to_string()))
}

pub async fn update_sub_service(
    db: &DatabaseConnection,
    id: Uuid,
    name: Option<&str>,
    description: Option<&str>,
    active: Option<bool>,
) -> Result<sub_service::Model, ServiceError> {
    let mut am: sub_service::ActiveModel = sub_service::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?
        .ok_or_else(|| ServiceError::not_found("sub-service"))?
        .into();
    if let Some(name) = name {
        service::validate_name(name)?;
        am.name = Set(name.to_string());
    }
    if let Some(description) = description {
        am.description = Set(Some(description.to_string()));
    }
    if let Some(active) = active {
        am.active = Set(active);
    }
    am.updated_at = Set(Utc::now().into());
    am.update(db).await.map_err(|e| ServiceError::Db(e.to_string()))
}

pub async fn delete_sub_service(db: &DatabaseConnection, id: Uuid) -> Result<bool, ServiceError> {
    let res = sub_service::Entity::delete_by_id(id)
        .exec(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?;
    Ok(res.rows_affected > 0)
}

/// Set or replace a sub-service commission override.
pub async fn set_commission_override(
    db: &DatabaseConnection,
    sub_service_id: Uuid,
    percentage: f64,
) -> Result<commission_tier::Model, ServiceError> {
    service::validate_commission(percentage)?;
    if get_sub_service(db, sub_service_id).await?.is_none() {
        return Err(ServiceError::not_found("sub-service"));
    }
    let existing = commission_tier::Entity::find()
        .filter(commission_tier::Column::SubServiceId.eq(sub_service_id))
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?;
    let now = Utc::now().into();
    match existing {
        Some(m) => {
            let mut am: commission_tier::ActiveModel = m.into();
            am.percentage = Set(percentage);
            am.updated_at = Set(now);
            am.update(db).await.map_err(|e| ServiceError::Db(e.to_string()))
        }
        None => {
            let am = commission_tier::ActiveModel {
                id: Set(Uuid::new_v4()),
                sub_service_id: Set(sub_service_id),
                percentage: Set(percentage),
                created_at: Set(now),
                updated_at: Set(now),
            };
            am.insert(db).await.map_err(|e| ServiceError::Db(e.to_string()))
        }
    }
}

/// Remove a commission override; the sub-service falls back to inheriting.
pub async fn clear_commission_override(
    db: &DatabaseConnection,
    sub_service_id: Uuid,
) -> Result<bool, ServiceError> {
    let res = commission_tier::Entity::delete_many()
        .filter(commission_tier::Column::SubServiceId.eq(sub_service_id))
        .exec(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?;
    Ok(res.rows_affected > 0)
}

/// Inheritance rule: override wins, then the service default, then the
/// hard-coded fallback.
pub fn pick_commission(override_pct: Option<f64>, service_default: Option<f64>) -> f64 {
    override_pct.or(service_default).unwrap_or(FALLBACK_COMMISSION_PCT)
}

/// Resolve the commission displayed for a service/sub-service pair.
pub async fn resolve_commission(
    db: &DatabaseConnection,
    service_id: Option<Uuid>,
    sub_service_id: Option<Uuid>,
) -> Result<f64, ServiceError> {
    let override_pct = match sub_service_id {
        Some(ssid) => commission_tier::Entity::find()
            .filter(commission_tier::Column::SubServiceId.eq(ssid))
            .one(db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))?
            .map(|t| t.percentage),
        None => None,
    };
    let service_default = match service_id {
        Some(sid) => get_service(db, sid).await?.map(|s| s.commission_pct),
        None => None,
    };
    Ok(pick_commission(override_pct, service_default))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::get_db;

    #[test]
    fn pick_commission_prefers_override() {
        assert_eq!(pick_commission(Some(6.0), Some(10.0)), 6.0);
        assert_eq!(pick_commission(None, Some(12.5)), 12.5);
        assert_eq!(pick_commission(None, None), FALLBACK_COMMISSION_PCT);
    }

    #[tokio::test]
    async fn commission_inheritance_and_override() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;

        let s = create_service(&db, &format!("Roofing {}", Uuid::new_v4()), None, 10.0).await?;
        let repair = create_sub_service(&db, s.id, "Roof Repair", None).await?;

        // no override row: inherits the parent's percentage
        let pct = resolve_commission(&db, Some(s.id), Some(repair.id)).await?;
        assert_eq!(pct, 10.0);

        // override wins without touching the service default
        set_commission_override(&db, repair.id, 6.0).await?;
        let pct = resolve_commission(&db, Some(s.id), Some(repair.id)).await?;
        assert_eq!(pct, 6.0);
        let parent = get_service(&db, s.id).await?.unwrap();
        assert_eq!(parent.commission_pct, 10.0);

        // clearing the override restores inheritance
        assert!(clear_commission_override(&db, repair.id).await?);
        let pct = resolve_commission(&db, Some(s.id), Some(repair.id)).await?;
        assert_eq!(pct, 10.0);

        delete_service(&db, s.id).await?;
        Ok(())
    }

    #[tokio::test]
    async fn sub_service_requires_existing_parent() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let err = create_sub_service(&db, Uuid::new_v4(), "Orphan", None).await;
        assert!(matches!(err, Err(ServiceError::NotFound(_))));
        Ok(())
    }
}
