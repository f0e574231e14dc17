//! Create `referral_link` table with FK to `partner`.
//!
//! The slug is the partner's public tracking URL segment.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ReferralLink::Table)
                    .if_not_exists()
                    .col(uuid(ReferralLink::Id).primary_key())
                    .col(uuid(ReferralLink::PartnerId).not_null())
                    .col(string_len(ReferralLink::Slug, 64).unique_key().not_null())
                    .col(boolean(ReferralLink::Active).not_null())
                    .col(big_integer(ReferralLink::ClickCount).not_null())
                    .col(
                        ColumnDef::new(ReferralLink::LastClickedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(timestamp_with_time_zone(ReferralLink::CreatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_referrallink_partner")
                            .from(ReferralLink::Table, ReferralLink::PartnerId)
                            .to(Partner::Table, Partner::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(ReferralLink::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum ReferralLink { Table, Id, PartnerId, Slug, Active, ClickCount, LastClickedAt, CreatedAt }

#[derive(DeriveIden)]
enum Partner { Table, Id }
