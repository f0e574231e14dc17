use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{county, state};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "city")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub county_id: Uuid,
    pub state_code: String,
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    County,
    State,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::County => Entity::belongs_to(county::Entity)
                .from(Column::CountyId)
                .to(county::Column::Id)
                .into(),
            Relation::State => Entity::belongs_to(state::Entity)
                .from(Column::StateCode)
                .to(state::Column::Code)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}
