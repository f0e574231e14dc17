//! Create `partner_credentials` table keyed by partner id.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PartnerCredentials::Table)
                    .if_not_exists()
                    .col(uuid(PartnerCredentials::PartnerId).primary_key())
                    .col(string_len(PartnerCredentials::PasswordHash, 255).not_null())
                    .col(string_len(PartnerCredentials::PasswordAlgorithm, 32).not_null())
                    .col(timestamp_with_time_zone(PartnerCredentials::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_credentials_partner")
                            .from(PartnerCredentials::Table, PartnerCredentials::PartnerId)
                            .to(Partner::Table, Partner::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(PartnerCredentials::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum PartnerCredentials { Table, PartnerId, PasswordHash, PasswordAlgorithm, UpdatedAt }

#[derive(DeriveIden)]
enum Partner { Table, Id }
