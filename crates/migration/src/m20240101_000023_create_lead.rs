//! Create `lead` table.
//!
//! Persisted from step 1 of the public form so abandoned submissions are
//! still captured; `completion_status` walks NULL -> step1_complete ->
//! submitted, while `status` tracks the admin lifecycle.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Lead::Table)
                    .if_not_exists()
                    .col(uuid(Lead::Id).primary_key())
                    .col(
                        ColumnDef::new(Lead::ReferralLinkId)
                            .uuid()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Lead::ServiceId)
                            .uuid()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Lead::SubServiceId)
                            .uuid()
                            .null(),
                    )
                    .col(string_len(Lead::FullName, 128).not_null())
                    .col(string_len(Lead::Email, 255).not_null())
                    .col(string_len(Lead::Phone, 32).not_null())
                    .col(
                        ColumnDef::new(Lead::StreetAddress)
                            .string_len(255)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Lead::CityName)
                            .string_len(128)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Lead::StateCode)
                            .string_len(2)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Lead::Zip)
                            .string_len(10)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Lead::Details)
                            .text()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Lead::CompletionStatus)
                            .string_len(32)
                            .null(),
                    )
                    .col(string_len(Lead::Status, 16).not_null())
                    .col(timestamp_with_time_zone(Lead::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Lead::UpdatedAt).not_null())
                    .col(
                        ColumnDef::new(Lead::SubmittedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_lead_referrallink")
                            .from(Lead::Table, Lead::ReferralLinkId)
                            .to(ReferralLink::Table, ReferralLink::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_lead_service")
                            .from(Lead::Table, Lead::ServiceId)
                            .to(Service::Table, Service::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_lead_subservice")
                            .from(Lead::Table, Lead::SubServiceId)
                            .to(SubService::Table, SubService::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Lead::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Lead {
    Table, Id, ReferralLinkId, ServiceId, SubServiceId, FullName, Email, Phone,
    StreetAddress, CityName, StateCode, Zip, Details, CompletionStatus, Status,
    CreatedAt, UpdatedAt, SubmittedAt,
}

#[derive(DeriveIden)]
enum ReferralLink { Table, Id }

#[derive(DeriveIden)]
enum Service { Table, Id }

#[derive(DeriveIden)]
enum SubService { Table, Id }
