use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TaxOffices::Table)
                    .if_not_exists()
                    .col(pk_auto(TaxOffices::Id))
                    .col(string(TaxOffices::Code).unique_key())
                    .col(string(TaxOffices::Name))
                    .col(string_null(TaxOffices::CityName))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Cities::Table)
                    .if_not_exists()
                    .col(pk_auto(Cities::Id))
                    .col(integer(Cities::PlateCode).unique_key())
                    .col(string(Cities::Name))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Districts::Table)
                    .if_not_exists()
                    .col(pk_auto(Districts::Id))
                    .col(integer(Districts::CityId))
                    .col(string(Districts::Name))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_districts_city")
                            .from(Districts::Table, Districts::CityId)
                            .to(Cities::Table, Cities::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ActivityCodes::Table)
                    .if_not_exists()
                    .col(pk_auto(ActivityCodes::Id))
                    .col(string(ActivityCodes::Code).unique_key())
                    .col(text(ActivityCodes::Description))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ActivityCodes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Districts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Cities::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TaxOffices::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum TaxOffices {
    Table,
    Id,
    Code,
    Name,
    CityName,
}

#[derive(DeriveIden)]
enum Cities {
    Table,
    Id,
    PlateCode,
    Name,
}

#[derive(DeriveIden)]
enum Districts {
    Table,
    Id,
    CityId,
    Name,
}

#[derive(DeriveIden)]
enum ActivityCodes {
    Table,
    Id,
    Code,
    Description,
}
