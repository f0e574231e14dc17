//! Create `zip_code` reference table; each ZIP resolves to a city.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ZipCode::Table)
                    .if_not_exists()
                    .col(string_len(ZipCode::Zip, 10).primary_key())
                    .col(uuid(ZipCode::CityId).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_zip_city")
                            .from(ZipCode::Table, ZipCode::CityId)
                            .to(City::Table, City::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(ZipCode::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum ZipCode { Table, Zip, CityId }

#[derive(DeriveIden)]
enum City { Table, Id }
