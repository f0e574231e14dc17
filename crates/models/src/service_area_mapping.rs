use sea_orm::{entity::prelude::*, DatabaseConnection, Set};
use serde::{Deserialize, Serialize};
use chrono::Utc;
use uuid::Uuid;

use crate::{errors, service, sub_service};

/// What a mapping row means for coverage resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaScope {
    ServiceDefault,
    SubServiceInclusion,
    SubServiceExclusion,
}

impl AreaScope {
    pub fn as_str(self) -> &'static str {
        match self {
            AreaScope::ServiceDefault => "service_default",
            AreaScope::SubServiceInclusion => "sub_service_inclusion",
            AreaScope::SubServiceExclusion => "sub_service_exclusion",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "service_default" => Some(AreaScope::ServiceDefault),
            "sub_service_inclusion" => Some(AreaScope::SubServiceInclusion),
            "sub_service_exclusion" => Some(AreaScope::SubServiceExclusion),
            _ => None,
        }
    }
}

/// Granularity of the referenced geographic unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaLevel {
    City,
    County,
    State,
}

impl AreaLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            AreaLevel::City => "city",
            AreaLevel::County => "county",
            AreaLevel::State => "state",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "city" => Some(AreaLevel::City),
            "county" => Some(AreaLevel::County),
            "state" => Some(AreaLevel::State),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "service_area_mapping")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub scope: String,
    pub service_id: Option<Uuid>,
    pub sub_service_id: Option<Uuid>,
    pub level: String,
    pub city_id: Option<Uuid>,
    pub county_id: Option<Uuid>,
    pub state_code: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Service,
    SubService,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
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

/// The geographic reference of a mapping row, exactly one unit per row.
#[derive(Clone, Debug, PartialEq)]
pub enum GeoRef {
    City(Uuid),
    County(Uuid),
    State(String),
}

impl GeoRef {
    pub fn level(&self) -> AreaLevel {
        match self {
            GeoRef::City(_) => AreaLevel::City,
            GeoRef::County(_) => AreaLevel::County,
            GeoRef::State(_) => AreaLevel::State,
        }
    }
}

impl Model {
    pub fn scope_parsed(&self) -> Option<AreaScope> {
        AreaScope::parse(&self.scope)
    }

    pub fn level_parsed(&self) -> Option<AreaLevel> {
        AreaLevel::parse(&self.level)
    }

    pub fn geo_ref(&self) -> Option<GeoRef> {
        match self.level_parsed()? {
            AreaLevel::City => self.city_id.map(GeoRef::City),
            AreaLevel::County => self.county_id.map(GeoRef::County),
            AreaLevel::State => self.state_code.clone().map(GeoRef::State),
        }
    }
}

/// Owner consistency: service defaults hang off a service, overrides off a
/// sub-service.
pub fn validate_owner(
    scope: AreaScope,
    service_id: Option<Uuid>,
    sub_service_id: Option<Uuid>,
) -> Result<(), errors::ModelError> {
    match scope {
        AreaScope::ServiceDefault => {
            if service_id.is_none() || sub_service_id.is_some() {
                return Err(errors::ModelError::Validation(
                    "service_default mappings must reference a service only".into(),
                ));
            }
        }
        AreaScope::SubServiceInclusion | AreaScope::SubServiceExclusion => {
            if sub_service_id.is_none() {
                return Err(errors::ModelError::Validation(
                    "inclusion/exclusion mappings must reference a sub-service".into(),
                ));
            }
        }
    }
    Ok(())
}

pub async fn create(
    db: &DatabaseConnection,
    scope: AreaScope,
    service_id: Option<Uuid>,
    sub_service_id: Option<Uuid>,
    geo: GeoRef,
) -> Result<Model, errors::ModelError> {
    validate_owner(scope, service_id, sub_service_id)?;
    let (city_id, county_id, state_code) = match &geo {
        GeoRef::City(id) => (Some(*id), None, None),
        GeoRef::County(id) => (None, Some(*id), None),
        GeoRef::State(code) => (None, None, Some(code.clone())),
    };
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        scope: Set(scope.as_str().to_string()),
        service_id: Set(service_id),
        sub_service_id: Set(sub_service_id),
        level: Set(geo.level().as_str().to_string()),
        city_id: Set(city_id),
        county_id: Set(county_id),
        state_code: Set(state_code),
        created_at: Set(Utc::now().into()),
    };
    am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}
