//! Migrator registering entity-specific migrations in dependency order.
//! Indexes are applied last.
pub use sea_orm_migration::prelude::*;

mod m20240101_000011_create_partner;
mod m20240101_000012_create_partner_credentials;
mod m20240101_000013_create_service;
mod m20240101_000014_create_sub_service;
mod m20240101_000015_create_commission_tier;
mod m20240101_000016_create_state;
mod m20240101_000017_create_county;
mod m20240101_000018_create_city;
mod m20240101_000019_create_zip_code;
mod m20240101_000020_create_service_area_mapping;
mod m20240101_000021_create_referral_link;
mod m20240101_000022_create_referral_click;
mod m20240101_000023_create_lead;
mod m20240101_000024_create_lead_attachment;
mod m20240101_000025_create_audit_log;
mod m20240101_000002_add_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000011_create_partner::Migration),
            Box::new(m20240101_000012_create_partner_credentials::Migration),
            Box::new(m20240101_000013_create_service::Migration),
            Box::new(m20240101_000014_create_sub_service::Migration),
            Box::new(m20240101_000015_create_commission_tier::Migration),
            Box::new(m20240101_000016_create_state::Migration),
            Box::new(m20240101_000017_create_county::Migration),
            Box::new(m20240101_000018_create_city::Migration),
            Box::new(m20240101_000019_create_zip_code::Migration),
            Box::new(m20240101_000020_create_service_area_mapping::Migration),
            Box::new(m20240101_000021_create_referral_link::Migration),
            Box::new(m20240101_000022_create_referral_click::Migration),
            Box::new(m20240101_000023_create_lead::Migration),
            Box::new(m20240101_000024_create_lead_attachment::Migration),
            Box::new(m20240101_000025_create_audit_log::Migration),
            // Indexes should always be applied last
            Box::new(m20240101_000002_add_indexes::Migration),
        ]
    }
}
