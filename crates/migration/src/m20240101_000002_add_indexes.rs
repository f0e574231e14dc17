use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // SubService: index on service_id
        manager
            .create_index(
                Index::create()
                    .name("idx_subservice_service")
                    .table(SubService::Table)
                    .col(SubService::ServiceId)
                    .to_owned(),
            )
            .await?;

        // CommissionTier: one override per sub-service
        manager
            .create_index(
                Index::create()
                    .name("uniq_commission_subservice")
                    .table(CommissionTier::Table)
                    .col(CommissionTier::SubServiceId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ServiceAreaMapping: scope lookups by owner
        manager
            .create_index(
                Index::create()
                    .name("idx_areamapping_service")
                    .table(ServiceAreaMapping::Table)
                    .col(ServiceAreaMapping::ServiceId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_areamapping_subservice")
                    .table(ServiceAreaMapping::Table)
                    .col(ServiceAreaMapping::SubServiceId)
                    .to_owned(),
            )
            .await?;

        // Geography: expansion joins
        manager
            .create_index(
                Index::create()
                    .name("idx_county_state")
                    .table(County::Table)
                    .col(County::StateCode)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_city_county")
                    .table(City::Table)
                    .col(City::CountyId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_city_state")
                    .table(City::Table)
                    .col(City::StateCode)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_zip_city")
                    .table(ZipCode::Table)
                    .col(ZipCode::CityId)
                    .to_owned(),
            )
            .await?;

        // ReferralClick: dedup window point lookup (link_id, ip, clicked_at)
        manager
            .create_index(
                Index::create()
                    .name("idx_click_link_ip_time")
                    .table(ReferralClick::Table)
                    .col(ReferralClick::LinkId)
                    .col(ReferralClick::Ip)
                    .col(ReferralClick::ClickedAt)
                    .to_owned(),
            )
            .await?;

        // Lead: dashboard and admin filters
        manager
            .create_index(
                Index::create()
                    .name("idx_lead_referrallink")
                    .table(Lead::Table)
                    .col(Lead::ReferralLinkId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_lead_status")
                    .table(Lead::Table)
                    .col(Lead::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_subservice_service").table(SubService::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("uniq_commission_subservice").table(CommissionTier::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_areamapping_service").table(ServiceAreaMapping::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_areamapping_subservice").table(ServiceAreaMapping::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_county_state").table(County::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_city_county").table(City::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_city_state").table(City::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_zip_city").table(ZipCode::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_click_link_ip_time").table(ReferralClick::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_lead_referrallink").table(Lead::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_lead_status").table(Lead::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum SubService { Table, ServiceId }

#[derive(DeriveIden)]
enum CommissionTier { Table, SubServiceId }

#[derive(DeriveIden)]
enum ServiceAreaMapping { Table, ServiceId, SubServiceId }

#[derive(DeriveIden)]
enum County { Table, StateCode }

#[derive(DeriveIden)]
enum City { Table, CountyId, StateCode }

#[derive(DeriveIden)]
enum ZipCode { Table, CityId }

#[derive(DeriveIden)]
enum ReferralClick { Table, LinkId, Ip, ClickedAt }

#[derive(DeriveIden)]
enum Lead { Table, ReferralLinkId, Status }
