use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create customers table
        manager
            .create_table(
                Table::create()
                    .table(Customers::Table)
                    .if_not_exists()
                    .col(pk_auto(Customers::Id))
                    .col(string(Customers::CompanyName))
                    .col(string_len(Customers::CompanyType, 24))
                    .col(string(Customers::TaxNumber))
                    .col(integer_null(Customers::TaxOfficeId))
                    .col(string_null(Customers::ActivityCode))
                    .col(string_null(Customers::Email))
                    .col(string_null(Customers::Phone))
                    .col(string_null(Customers::Address))
                    .col(integer_null(Customers::CityId))
                    .col(integer_null(Customers::DistrictId))
                    .col(date_null(Customers::EstablishedOn))
                    .col(date_null(Customers::MembershipStart))
                    .col(date_null(Customers::MembershipEnd))
                    .col(text_null(Customers::Logo))
                    .col(text_null(Customers::Notes))
                    .col(boolean(Customers::IsActive).default(true))
                    .col(date_time(Customers::CreatedAt))
                    .col(date_time(Customers::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        // Create authorized_persons table
        manager
            .create_table(
                Table::create()
                    .table(AuthorizedPersons::Table)
                    .if_not_exists()
                    .col(pk_auto(AuthorizedPersons::Id))
                    .col(integer(AuthorizedPersons::CustomerId))
                    .col(string(AuthorizedPersons::FullName))
                    .col(string_null(AuthorizedPersons::NationalId))
                    .col(string_null(AuthorizedPersons::Title))
                    .col(string_null(AuthorizedPersons::Phone))
                    .col(string_null(AuthorizedPersons::Email))
                    .col(decimal_null(AuthorizedPersons::ShareRatio).decimal_len(5, 2))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_authorized_persons_customer")
                            .from(AuthorizedPersons::Table, AuthorizedPersons::CustomerId)
                            .to(Customers::Table, Customers::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create branches table
        manager
            .create_table(
                Table::create()
                    .table(Branches::Table)
                    .if_not_exists()
                    .col(pk_auto(Branches::Id))
                    .col(integer(Branches::CustomerId))
                    .col(string(Branches::Name))
                    .col(string_null(Branches::Address))
                    .col(integer_null(Branches::CityId))
                    .col(integer_null(Branches::DistrictId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_branches_customer")
                            .from(Branches::Table, Branches::CustomerId)
                            .to(Customers::Table, Customers::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create customer_documents table
        manager
            .create_table(
                Table::create()
                    .table(CustomerDocuments::Table)
                    .if_not_exists()
                    .col(pk_auto(CustomerDocuments::Id))
                    .col(integer(CustomerDocuments::CustomerId))
                    .col(string(CustomerDocuments::Name))
                    .col(text(CustomerDocuments::DataUrl))
                    .col(date_time(CustomerDocuments::UploadedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_customer_documents_customer")
                            .from(CustomerDocuments::Table, CustomerDocuments::CustomerId)
                            .to(Customers::Table, Customers::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create customer_credentials table
        manager
            .create_table(
                Table::create()
                    .table(CustomerCredentials::Table)
                    .if_not_exists()
                    .col(pk_auto(CustomerCredentials::Id))
                    .col(integer(CustomerCredentials::CustomerId))
                    .col(string(CustomerCredentials::System))
                    .col(string(CustomerCredentials::Username))
                    .col(string(CustomerCredentials::Password))
                    .col(string_null(CustomerCredentials::Notes))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_customer_credentials_customer")
                            .from(CustomerCredentials::Table, CustomerCredentials::CustomerId)
                            .to(Customers::Table, Customers::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CustomerCredentials::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CustomerDocuments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Branches::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AuthorizedPersons::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Customers::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Customers {
    Table,
    Id,
    CompanyName,
    CompanyType,
    TaxNumber,
    TaxOfficeId,
    ActivityCode,
    Email,
    Phone,
    Address,
    CityId,
    DistrictId,
    EstablishedOn,
    MembershipStart,
    MembershipEnd,
    Logo,
    Notes,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum AuthorizedPersons {
    Table,
    Id,
    CustomerId,
    FullName,
    NationalId,
    Title,
    Phone,
    Email,
    ShareRatio,
}

#[derive(DeriveIden)]
enum Branches {
    Table,
    Id,
    CustomerId,
    Name,
    Address,
    CityId,
    DistrictId,
}

#[derive(DeriveIden)]
enum CustomerDocuments {
    Table,
    Id,
    CustomerId,
    Name,
    DataUrl,
    UploadedAt,
}

#[derive(DeriveIden)]
enum CustomerCredentials {
    Table,
    Id,
    CustomerId,
    System,
    Username,
    Password,
    Notes,
}
