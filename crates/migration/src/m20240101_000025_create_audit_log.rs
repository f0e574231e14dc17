//! Create `audit_log` table.
//!
//! Append-only; written on lead submission and admin status changes.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AuditLog::Table)
                    .if_not_exists()
                    .col(big_integer(AuditLog::Id).primary_key().auto_increment())
                    .col(string_len(AuditLog::EntityType, 64).not_null())
                    .col(uuid(AuditLog::EntityId).not_null())
                    .col(string_len(AuditLog::Action, 64).not_null())
                    .col(
                        ColumnDef::new(AuditLog::Actor)
                            .string_len(255)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(AuditLog::Detail)
                            .json_binary()
                            .null(),
                    )
                    .col(timestamp_with_time_zone(AuditLog::CreatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(AuditLog::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum AuditLog { Table, Id, EntityType, EntityId, Action, Actor, Detail, CreatedAt }
