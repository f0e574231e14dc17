use sea_orm::{entity::prelude::*, DatabaseConnection, Set};
use serde::{Deserialize, Serialize};
use chrono::Utc;
use uuid::Uuid;

use crate::{errors, partner};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "referral_link")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub partner_id: Uuid,
    pub slug: String,
    pub active: bool,
    pub click_count: i64,
    pub last_clicked_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Partner,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Partner => Entity::belongs_to(partner::Entity)
                .from(Column::PartnerId)
                .to(partner::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Slugs are lowercase alphanumerics and hyphens, 3..=64 chars.
pub fn validate_slug(slug: &str) -> Result<(), errors::ModelError> {
    if slug.len() < 3 || slug.len() > 64 {
        return Err(errors::ModelError::Validation("slug must be 3..=64 chars".into()));
    }
    if !slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-') {
        return Err(errors::ModelError::Validation(
            "slug may only contain lowercase letters, digits and hyphens".into(),
        ));
    }
    if slug.starts_with('-') || slug.ends_with('-') {
        return Err(errors::ModelError::Validation("slug may not start or end with a hyphen".into()));
    }
    Ok(())
}

pub async fn create(
    db: &DatabaseConnection,
    partner_id: Uuid,
    slug: &str,
) -> Result<Model, errors::ModelError> {
    validate_slug(slug)?;
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        partner_id: Set(partner_id),
        slug: Set(slug.to_string()),
        active: Set(true),
        click_count: Set(0),
        last_clicked_at: Set(None),
        created_at: Set(Utc::now().into()),
    };
    am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}
