//! Create `lead_attachment` table; files live in external storage, rows
//! hold the storage key used for signed-URL generation.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LeadAttachment::Table)
                    .if_not_exists()
                    .col(uuid(LeadAttachment::Id).primary_key())
                    .col(uuid(LeadAttachment::LeadId).not_null())
                    .col(string_len(LeadAttachment::FileName, 255).not_null())
                    .col(string_len(LeadAttachment::ContentType, 128).not_null())
                    .col(string_len(LeadAttachment::StorageKey, 255).not_null())
                    .col(timestamp_with_time_zone(LeadAttachment::CreatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_attachment_lead")
                            .from(LeadAttachment::Table, LeadAttachment::LeadId)
                            .to(Lead::Table, Lead::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(LeadAttachment::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum LeadAttachment { Table, Id, LeadId, FileName, ContentType, StorageKey, CreatedAt }

#[derive(DeriveIden)]
enum Lead { Table, Id }
