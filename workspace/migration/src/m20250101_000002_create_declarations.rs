use crate::entity_iden::EntityIden;
use model::entities::prelude::*;
use model::entities::{customer, declaration_setting, declaration_type, tax_return};
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create declaration_types table (the catalog)
        manager
            .create_table(
                Table::create()
                    .table(DeclarationType::table())
                    .if_not_exists()
                    .col(pk_auto(DeclarationType::column(declaration_type::Column::Id)))
                    .col(string(DeclarationType::column(declaration_type::Column::Name)).unique_key())
                    .col(boolean(DeclarationType::column(declaration_type::Column::Enabled)).default(true))
                    .col(string_len(DeclarationType::column(declaration_type::Column::Frequency), 10))
                    .col(integer(DeclarationType::column(declaration_type::Column::DueDay)))
                    .col(integer(DeclarationType::column(declaration_type::Column::DueHour)))
                    .col(integer(DeclarationType::column(declaration_type::Column::DueMinute)))
                    .col(integer_null(DeclarationType::column(declaration_type::Column::DueMonth)))
                    .col(integer_null(DeclarationType::column(declaration_type::Column::QuarterOffset)))
                    .col(integer_null(DeclarationType::column(declaration_type::Column::YearlyCount)))
                    .col(integer_null(DeclarationType::column(declaration_type::Column::SkipQuarter)))
                    .to_owned(),
            )
            .await?;

        // Create declaration_settings table
        manager
            .create_table(
                Table::create()
                    .table(DeclarationSetting::table())
                    .if_not_exists()
                    .col(pk_auto(DeclarationSetting::column(declaration_setting::Column::Id)))
                    .col(integer(DeclarationSetting::column(declaration_setting::Column::CustomerId)))
                    .col(string(DeclarationSetting::column(declaration_setting::Column::DeclarationType)))
                    .col(boolean(DeclarationSetting::column(declaration_setting::Column::Enabled)))
                    .col(string_len(DeclarationSetting::column(declaration_setting::Column::Frequency), 10))
                    .col(integer(DeclarationSetting::column(declaration_setting::Column::DueDay)))
                    .col(integer(DeclarationSetting::column(declaration_setting::Column::DueHour)))
                    .col(integer(DeclarationSetting::column(declaration_setting::Column::DueMinute)))
                    .col(integer_null(DeclarationSetting::column(declaration_setting::Column::DueMonth)))
                    .col(integer_null(DeclarationSetting::column(declaration_setting::Column::QuarterOffset)))
                    .col(integer_null(DeclarationSetting::column(declaration_setting::Column::YearlyCount)))
                    .col(integer_null(DeclarationSetting::column(declaration_setting::Column::SkipQuarter)))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_declaration_settings_customer")
                            .from(
                                DeclarationSetting::table(),
                                DeclarationSetting::column(declaration_setting::Column::CustomerId),
                            )
                            .to(Customer::table(), Customer::column(customer::Column::Id))
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_declaration_settings_customer_type")
                    .table(DeclarationSetting::table())
                    .col(DeclarationSetting::column(declaration_setting::Column::CustomerId))
                    .col(DeclarationSetting::column(declaration_setting::Column::DeclarationType))
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create tax_returns table
        manager
            .create_table(
                Table::create()
                    .table(TaxReturn::table())
                    .if_not_exists()
                    .col(pk_auto(TaxReturn::column(tax_return::Column::Id)))
                    .col(integer(TaxReturn::column(tax_return::Column::CustomerId)))
                    .col(string(TaxReturn::column(tax_return::Column::DeclarationType)))
                    .col(string_len(TaxReturn::column(tax_return::Column::Period), 7))
                    .col(date_time(TaxReturn::column(tax_return::Column::DueDate)))
                    .col(date_time_null(TaxReturn::column(tax_return::Column::SubmittedDate)))
                    .col(boolean(TaxReturn::column(tax_return::Column::IsSubmitted)).default(false))
                    .col(text_null(TaxReturn::column(tax_return::Column::Notes)))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tax_returns_customer")
                            .from(
                                TaxReturn::table(),
                                TaxReturn::column(tax_return::Column::CustomerId),
                            )
                            .to(Customer::table(), Customer::column(customer::Column::Id))
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One return per (customer, declaration, period)
        manager
            .create_index(
                Index::create()
                    .name("idx_tax_returns_customer_type_period")
                    .table(TaxReturn::table())
                    .col(TaxReturn::column(tax_return::Column::CustomerId))
                    .col(TaxReturn::column(tax_return::Column::DeclarationType))
                    .col(TaxReturn::column(tax_return::Column::Period))
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TaxReturn::table()).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DeclarationSetting::table()).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DeclarationType::table()).to_owned())
            .await?;

        Ok(())
    }
}
