use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::referral_link;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "referral_click")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub link_id: Uuid,
    pub ip: String,
    pub user_agent: Option<String>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub counted: bool,
    pub clicked_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Link,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Link => Entity::belongs_to(referral_link::Entity)
                .from(Column::LinkId)
                .to(referral_link::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}
