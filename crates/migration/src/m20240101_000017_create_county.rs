//! Create `county` reference table with FK to `state`.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(County::Table)
                    .if_not_exists()
                    .col(uuid(County::Id).primary_key())
                    .col(string_len(County::StateCode, 2).not_null())
                    .col(string_len(County::Name, 128).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_county_state")
                            .from(County::Table, County::StateCode)
                            .to(State::Table, State::Code)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(County::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum County { Table, Id, StateCode, Name }

#[derive(DeriveIden)]
enum State { Table, Code }
