//! Create `commission_tier` table.
//!
//! Per-sub-service commission override; a sub-service without a row
//! inherits its parent service's percentage.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CommissionTier::Table)
                    .if_not_exists()
                    .col(uuid(CommissionTier::Id).primary_key())
                    .col(uuid(CommissionTier::SubServiceId).not_null())
                    .col(double(CommissionTier::Percentage).not_null())
                    .col(timestamp_with_time_zone(CommissionTier::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(CommissionTier::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_commission_subservice")
                            .from(CommissionTier::Table, CommissionTier::SubServiceId)
                            .to(SubService::Table, SubService::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(CommissionTier::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum CommissionTier { Table, Id, SubServiceId, Percentage, CreatedAt, UpdatedAt }

#[derive(DeriveIden)]
enum SubService { Table, Id }
