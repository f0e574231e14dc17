//! Create `partner` table.
//!
//! Referral-partner accounts; admins are partners with role `admin`.
//! Includes soft-delete timestamp.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Partner::Table)
                    .if_not_exists()
                    .col(uuid(Partner::Id).primary_key())
                    .col(string_len(Partner::Email, 255).unique_key().not_null())
                    .col(string_len(Partner::Name, 128).not_null())
                    .col(
                        ColumnDef::new(Partner::CompanyName)
                            .string_len(128)
                            .null(),
                    )
                    .col(string_len(Partner::Role, 16).not_null())
                    .col(boolean(Partner::AdminView).not_null())
                    .col(string_len(Partner::Status, 32).not_null())
                    .col(timestamp_with_time_zone(Partner::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Partner::UpdatedAt).not_null())
                    .col(
                        ColumnDef::new(Partner::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Partner::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Partner { Table, Id, Email, Name, CompanyName, Role, AdminView, Status, CreatedAt, UpdatedAt, DeletedAt }
