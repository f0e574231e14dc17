use sea_orm::{entity::prelude::*, DatabaseConnection, Set};
use serde::{Deserialize, Serialize};
use chrono::Utc;
use uuid::Uuid;

use crate::{errors, partner, referral_link, service, sub_service};

/// Form progress markers; the column is NULL until step 1 persists.
pub const COMPLETION_STEP1: &str = "step1_complete";
pub const COMPLETION_SUBMITTED: &str = "submitted";

/// Admin lifecycle statuses.
pub const STATUSES: &[&str] = &["new", "contacted", "quoted", "won", "lost"];

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "lead")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub referral_link_id: Option<Uuid>,
    pub service_id: Option<Uuid>,
    pub sub_service_id: Option<Uuid>,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub street_address: Option<String>,
    pub city_name: Option<String>,
    pub state_code: Option<String>,
    pub zip: Option<String>,
    pub details: Option<String>,
    pub completion_status: Option<String>,
    pub status: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub submitted_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    ReferralLink,
    Service,
    SubService,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::ReferralLink => Entity::belongs_to(referral_link::Entity)
                .from(Column::ReferralLinkId)
                .to(referral_link::Column::Id)
                .into(),
            Relation::Service => Entity::belongs_to(service::Entity)
                .from(Column::ServiceId)
                .to(service::Column::Id)
                .into(),
            Relation::SubService => Entity::belongs_to(sub_service::Entity)
                .from(Column::SubServiceId)
                .to(sub_service::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate_status(status: &str) -> Result<(), errors::ModelError> {
    if !STATUSES.contains(&status) {
        return Err(errors::ModelError::Validation(format!("unknown lead status: {status}")));
    }
    Ok(())
}

pub async fn create(
    db: &DatabaseConnection,
    referral_link_id: Option<Uuid>,
    full_name: &str,
    email: &str,
    phone: &str,
) -> Result<Model, errors::ModelError> {
    partner::validate_email(email)?;
    partner::validate_name(full_name)?;
    if phone.trim().is_empty() {
        return Err(errors::ModelError::Validation("phone required".into()));
    }
    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        referral_link_id: Set(referral_link_id),
        service_id: Set(None),
        sub_service_id: Set(None),
        full_name: Set(full_name.to_string()),
        email: Set(email.to_string()),
        phone: Set(phone.to_string()),
        street_address: Set(None),
        city_name: Set(None),
        state_code: Set(None),
        zip: Set(None),
        details: Set(None),
        completion_status: Set(Some(COMPLETION_STEP1.to_string())),
        status: Set("new".into()),
        created_at: Set(now),
        updated_at: Set(now),
        submitted_at: Set(None),
    };
    am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_validation() {
        for s in STATUSES {
            assert!(validate_status(s).is_ok());
        }
        assert!(validate_status("archived").is_err());
    }
}
