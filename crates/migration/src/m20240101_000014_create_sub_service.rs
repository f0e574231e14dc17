//! Create `sub_service` table with FK to `service`.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SubService::Table)
                    .if_not_exists()
                    .col(uuid(SubService::Id).primary_key())
                    .col(uuid(SubService::ServiceId).not_null())
                    .col(string_len(SubService::Name, 128).not_null())
                    .col(
                        ColumnDef::new(SubService::Description)
                            .text()
                            .null(),
                    )
                    .col(boolean(SubService::Active).not_null())
                    .col(timestamp_with_time_zone(SubService::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(SubService::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_subservice_service")
                            .from(SubService::Table, SubService::ServiceId)
                            .to(Service::Table, Service::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(SubService::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum SubService { Table, Id, ServiceId, Name, Description, Active, CreatedAt, UpdatedAt }

#[derive(DeriveIden)]
enum Service { Table, Id }
