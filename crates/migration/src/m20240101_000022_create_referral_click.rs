//! Create `referral_click` table with FK to `referral_link`.
//!
//! One row per click event; `counted` records whether the click fell
//! outside the dedup window and incremented the link counter.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ReferralClick::Table)
                    .if_not_exists()
                    .col(big_integer(ReferralClick::Id).primary_key().auto_increment())
                    .col(uuid(ReferralClick::LinkId).not_null())
                    .col(string_len(ReferralClick::Ip, 64).not_null())
                    .col(
                        ColumnDef::new(ReferralClick::UserAgent)
                            .text()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ReferralClick::UtmSource)
                            .string_len(128)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ReferralClick::UtmMedium)
                            .string_len(128)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ReferralClick::UtmCampaign)
                            .string_len(128)
                            .null(),
                    )
                    .col(boolean(ReferralClick::Counted).not_null())
                    .col(timestamp_with_time_zone(ReferralClick::ClickedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_referralclick_link")
                            .from(ReferralClick::Table, ReferralClick::LinkId)
                            .to(ReferralLink::Table, ReferralLink::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(ReferralClick::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum ReferralClick { Table, Id, LinkId, Ip, UserAgent, UtmSource, UtmMedium, UtmCampaign, Counted, ClickedAt }

#[derive(DeriveIden)]
enum ReferralLink { Table, Id }
