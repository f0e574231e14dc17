//! Create `service_area_mapping` table.
//!
//! One row per (scope, geographic unit). Scope is `service_default`
//! (carries service_id), `sub_service_inclusion` or `sub_service_exclusion`
//! (carry sub_service_id). Exactly one of city_id/county_id/state_code is
//! set, matching `level`; enforced at the model layer.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ServiceAreaMapping::Table)
                    .if_not_exists()
                    .col(uuid(ServiceAreaMapping::Id).primary_key())
                    .col(string_len(ServiceAreaMapping::Scope, 32).not_null())
                    .col(
                        ColumnDef::new(ServiceAreaMapping::ServiceId)
                            .uuid()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ServiceAreaMapping::SubServiceId)
                            .uuid()
                            .null(),
                    )
                    .col(string_len(ServiceAreaMapping::Level, 16).not_null())
                    .col(
                        ColumnDef::new(ServiceAreaMapping::CityId)
                            .uuid()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ServiceAreaMapping::CountyId)
                            .uuid()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ServiceAreaMapping::StateCode)
                            .string_len(2)
                            .null(),
                    )
                    .col(timestamp_with_time_zone(ServiceAreaMapping::CreatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_areamapping_service")
                            .from(ServiceAreaMapping::Table, ServiceAreaMapping::ServiceId)
                            .to(Service::Table, Service::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_areamapping_subservice")
                            .from(ServiceAreaMapping::Table, ServiceAreaMapping::SubServiceId)
                            .to(SubService::Table, SubService::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_areamapping_city")
                            .from(ServiceAreaMapping::Table, ServiceAreaMapping::CityId)
                            .to(City::Table, City::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_areamapping_county")
                            .from(ServiceAreaMapping::Table, ServiceAreaMapping::CountyId)
                            .to(County::Table, County::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_areamapping_state")
                            .from(ServiceAreaMapping::Table, ServiceAreaMapping::StateCode)
                            .to(State::Table, State::Code)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(ServiceAreaMapping::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum ServiceAreaMapping { Table, Id, Scope, ServiceId, SubServiceId, Level, CityId, CountyId, StateCode, CreatedAt }

#[derive(DeriveIden)]
enum Service { Table, Id }

#[derive(DeriveIden)]
enum SubService { Table, Id }

#[derive(DeriveIden)]
enum City { Table, Id }

#[derive(DeriveIden)]
enum County { Table, Id }

#[derive(DeriveIden)]
enum State { Table, Code }
