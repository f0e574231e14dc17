use chrono::Utc;
use common::pagination::Pagination;
use sea_orm::{ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set};
use serde::Serialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use models::{audit_log, lead, lead_attachment, referral_link, sub_service};

use crate::catalog_service;
use crate::errors::ServiceError;

/// Address fields collected at the review step; all optional.
#[derive(Clone, Debug, Default)]
pub struct AddressInput {
    pub street_address: Option<String>,
    pub city_name: Option<String>,
    pub state_code: Option<String>,
    pub zip: Option<String>,
}

/// Step 1: persist contact info immediately so abandoned forms still
/// surface as leads.
pub async fn start_lead(
    db: &DatabaseConnection,
    referral_link_id: Option<Uuid>,
    full_name: &str,
    email: &str,
    phone: &str,
) -> Result<lead::Model, ServiceError> {
    if let Some(link_id) = referral_link_id {
        let link = referral_link::Entity::find_by_id(link_id)
            .one(db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))?;
        if link.is_none() {
            return Err(ServiceError::not_found("referral link"));
        }
    }
    let created = lead::create(db, referral_link_id, full_name, email, phone).await?;
    info!(lead_id = %created.id, "lead_started");
    Ok(created)
}

/// Step 2: record the service selection and job details.
pub async fn select_service(
    db: &DatabaseConnection,
    lead_id: Uuid,
    service_id: Uuid,
    sub_service_id: Option<Uuid>,
    details: Option<&str>,
    address: AddressInput,
) -> Result<lead::Model, ServiceError> {
    let found = get_lead(db, lead_id).await?.ok_or_else(|| ServiceError::not_found("lead"))?;
    if found.completion_status.as_deref() == Some(lead::COMPLETION_SUBMITTED) {
        return Err(ServiceError::Conflict("lead already submitted".into()));
    }
    if catalog_service::get_service(db, service_id).await?.is_none() {
        return Err(ServiceError::not_found("service"));
    }
    if let Some(ssid) = sub_service_id {
        let sub = sub_service::Entity::find_by_id(ssid)
            .one(db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))?
            .ok_or_else(|| ServiceError::not_found("sub-service"))?;
        if sub.service_id != service_id {
            return Err(ServiceError::Validation(
                "sub-service does not belong to the selected service".into(),
            ));
        }
    }

    let mut am: lead::ActiveModel = found.into();
    am.service_id = Set(Some(service_id));
    am.sub_service_id = Set(sub_service_id);
    if let Some(details) = details {
        am.details = Set(Some(details.to_string()));
    }
    if address.street_address.is_some() {
        am.street_address = Set(address.street_address);
    }
    if address.city_name.is_some() {
        am.city_name = Set(address.city_name);
    }
    if address.state_code.is_some() {
        am.state_code = Set(address.state_code);
    }
    if address.zip.is_some() {
        am.zip = Set(address.zip);
    }
    am.updated_at = Set(Utc::now().into());
    am.update(db).await.map_err(|e| ServiceError::Db(e.to_string()))
}

/// Step 3: final submission. Rejects a second submit on an already
/// submitted lead and appends the audit row.
pub async fn submit_lead(
    db: &DatabaseConnection,
    lead_id: Uuid,
    actor: Option<&str>,
) -> Result<lead::Model, ServiceError> {
    let found = get_lead(db, lead_id).await?.ok_or_else(|| ServiceError::not_found("lead"))?;
    if found.completion_status.as_deref() == Some(lead::COMPLETION_SUBMITTED) {
        return Err(ServiceError::Conflict("lead already submitted".into()));
    }
    if found.service_id.is_none() {
        return Err(ServiceError::Validation("select a service before submitting".into()));
    }

    let now = Utc::now();
    let mut am: lead::ActiveModel = found.clone().into();
    am.completion_status = Set(Some(lead::COMPLETION_SUBMITTED.to_string()));
    am.submitted_at = Set(Some(now.into()));
    am.updated_at = Set(now.into());
    let updated = am.update(db).await.map_err(|e| ServiceError::Db(e.to_string()))?;

    audit_log::record(
        db,
        "lead",
        updated.id,
        "lead_submitted",
        actor,
        Some(json!({
            "service_id": updated.service_id,
            "sub_service_id": updated.sub_service_id,
            "referral_link_id": updated.referral_link_id,
        })),
    )
    .await?;
    info!(lead_id = %updated.id, "lead_submitted");
    Ok(updated)
}

pub async fn get_lead(db: &DatabaseConnection, id: Uuid) -> Result<Option<lead::Model>, ServiceError> {
    lead::Entity::find_by_id(id).one(db).await.map_err(|e| ServiceError::Db(e.to_string()))
}

/// Admin list with status filter and substring search over contact fields.
pub async fn list_leads(
    db: &DatabaseConnection,
    opts: Pagination,
    status: Option<&str>,
    q: Option<&str>,
) -> Result<Vec<lead::Model>, ServiceError> {
    let (page_idx, per_page) = opts.normalize();
    let mut query = lead::Entity::find().order_by_desc(lead::Column::CreatedAt);
    if let Some(status) = status {
        lead::validate_status(status)?;
        query = query.filter(lead::Column::Status.eq(status));
    }
    if let Some(q) = q.map(str::trim).filter(|q| !q.is_empty()) {
        query = query.filter(
            Condition::any()
                .add(lead::Column::FullName.contains(q))
                .add(lead::Column::Email.contains(q))
                .add(lead::Column::Phone.contains(q))
                .add(lead::Column::StreetAddress.contains(q))
                .add(lead::Column::CityName.contains(q)),
        );
    }
    query
        .paginate(db, per_page)
        .fetch_page(page_idx)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))
}

/// Admin lifecycle transition with an audit trail entry.
pub async fn update_status(
    db: &DatabaseConnection,
    id: Uuid,
    status: &str,
    actor: Option<&str>,
) -> Result<lead::Model, ServiceError> {
    lead::validate_status(status)?;
    let found = get_lead(db, id).await?.ok_or_else(|| ServiceError::not_found("lead"))?;
    let previous = found.status.clone();
    let mut am: lead::ActiveModel = found.into();
    am.status = Set(status.to_string());
    am.updated_at = Set(Utc::now().into());
    let updated = am.update(db).await.map_err(|e| ServiceError::Db(e.to_string()))?;

    audit_log::record(
        db,
        "lead",
        updated.id,
        "lead_status_changed",
        actor,
        Some(json!({ "from": previous, "to": status })),
    )
    .await?;
    Ok(updated)
}

/// Leads attributed to any of a partner's links.
pub async fn leads_for_partner(
    db: &DatabaseConnection,
    partner_id: Uuid,
    opts: Pagination,
) -> Result<Vec<lead::Model>, ServiceError> {
    let link_ids: Vec<Uuid> = referral_link::Entity::find()
        .filter(referral_link::Column::PartnerId.eq(partner_id))
        .all(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?
        .into_iter()
        .map(|l| l.id)
        .collect();
    if link_ids.is_empty() {
        return Ok(Vec::new());
    }
    let (page_idx, per_page) = opts.normalize();
    lead::Entity::find()
        .filter(lead::Column::ReferralLinkId.is_in(link_ids))
        .order_by_desc(lead::Column::CreatedAt)
        .paginate(db, per_page)
        .fetch_page(page_idx)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))
}

/// Register attachment metadata; the bytes live in external storage under
/// the returned storage key.
pub async fn add_attachment(
    db: &DatabaseConnection,
    lead_id: Uuid,
    file_name: &str,
    content_type: &str,
) -> Result<lead_attachment::Model, ServiceError> {
    if file_name.trim().is_empty() {
        return Err(ServiceError::Validation("file name required".into()));
    }
    if get_lead(db, lead_id).await?.is_none() {
        return Err(ServiceError::not_found("lead"));
    }
    let id = Uuid::new_v4();
    let am = lead_attachment::ActiveModel {
        id: Set(id),
        lead_id: Set(lead_id),
        file_name: Set(file_name.to_string()),
        content_type: Set(content_type.to_string()),
        storage_key: Set(format!("leads/{lead_id}/{id}/{file_name}")),
        created_at: Set(Utc::now().into()),
    };
    am.insert(db).await.map_err(|e| ServiceError::Db(e.to_string()))
}

pub async fn get_attachment(
    db: &DatabaseConnection,
    id: Uuid,
) -> Result<Option<lead_attachment::Model>, ServiceError> {
    lead_attachment::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))
}

/// Admin review payload: the lead with its resolved commission and files.
#[derive(Clone, Debug, Serialize)]
pub struct LeadDetail {
    pub lead: lead::Model,
    pub commission_pct: f64,
    pub attachments: Vec<lead_attachment::Model>,
}

pub async fn lead_detail(db: &DatabaseConnection, id: Uuid) -> Result<LeadDetail, ServiceError> {
    let found = get_lead(db, id).await?.ok_or_else(|| ServiceError::not_found("lead"))?;
    let commission_pct =
        catalog_service::resolve_commission(db, found.service_id, found.sub_service_id).await?;
    let attachments = lead_attachment::Entity::find()
        .filter(lead_attachment::Column::LeadId.eq(id))
        .order_by_asc(lead_attachment::Column::CreatedAt)
        .all(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?;
    Ok(LeadDetail { lead: found, commission_pct, attachments })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::get_db;

    #[tokio::test]
    async fn funnel_walks_step1_to_submitted_once() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;

        let svc = catalog_service::create_service(&db, &format!("Plumbing {}", Uuid::new_v4()), None, 9.0).await?;
        let drains = catalog_service::create_sub_service(&db, svc.id, "Drain Cleaning", None).await?;

        let l = start_lead(&db, None, "Homer Owner", "homer@example.com", "555-0100").await?;
        assert_eq!(l.completion_status.as_deref(), Some(lead::COMPLETION_STEP1));
        assert_eq!(l.status, "new");
        assert!(l.submitted_at.is_none());

        let l = select_service(
            &db,
            l.id,
            svc.id,
            Some(drains.id),
            Some("kitchen sink backs up"),
            AddressInput { zip: Some("97201".into()), ..Default::default() },
        )
        .await?;
        assert_eq!(l.service_id, Some(svc.id));

        let l = submit_lead(&db, l.id, None).await?;
        assert_eq!(l.completion_status.as_deref(), Some(lead::COMPLETION_SUBMITTED));
        assert!(l.submitted_at.is_some());

        // a second submit must be rejected
        let err = submit_lead(&db, l.id, None).await;
        assert!(matches!(err, Err(ServiceError::Conflict(_))));

        // audit row landed
        let audits = audit_log::Entity::find()
            .filter(audit_log::Column::EntityId.eq(l.id))
            .filter(audit_log::Column::Action.eq("lead_submitted"))
            .all(&db)
            .await?;
        assert_eq!(audits.len(), 1);

        lead::Entity::delete_by_id(l.id).exec(&db).await?;
        catalog_service::delete_service(&db, svc.id).await?;
        Ok(())
    }

    #[tokio::test]
    async fn submit_requires_service_selection() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;

        let l = start_lead(&db, None, "No Service", "ns@example.com", "555-0101").await?;
        let err = submit_lead(&db, l.id, None).await;
        assert!(matches!(err, Err(ServiceError::Validation(_))));

        lead::Entity::delete_by_id(l.id).exec(&db).await?;
        Ok(())
    }

    #[tokio::test]
    async fn status_updates_are_validated_and_audited() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;

        let l = start_lead(&db, None, "Status Case", "sc@example.com", "555-0102").await?;
        let err = update_status(&db, l.id, "archived", Some("admin@example.com")).await;
        assert!(matches!(err, Err(ServiceError::Model(_))));

        let updated = update_status(&db, l.id, "contacted", Some("admin@example.com")).await?;
        assert_eq!(updated.status, "contacted");

        lead::Entity::delete_by_id(l.id).exec(&db).await?;
        Ok(())
    }

    #[tokio::test]
    async fn commission_in_detail_follows_inheritance() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;

        let svc = catalog_service::create_service(&db, &format!("Roofing {}", Uuid::new_v4()), None, 10.0).await?;
        let repair = catalog_service::create_sub_service(&db, svc.id, "Roof Repair", None).await?;

        let l = start_lead(&db, None, "Comm Case", "cc@example.com", "555-0103").await?;
        let l = select_service(&db, l.id, svc.id, Some(repair.id), None, AddressInput::default()).await?;

        let detail = lead_detail(&db, l.id).await?;
        assert_eq!(detail.commission_pct, 10.0);

        catalog_service::set_commission_override(&db, repair.id, 6.0).await?;
        let detail = lead_detail(&db, l.id).await?;
        assert_eq!(detail.commission_pct, 6.0);

        lead::Entity::delete_by_id(l.id).exec(&db).await?;
        catalog_service::delete_service(&db, svc.id).await?;
        Ok(())
    }
}
