//! This file serves as the root for all SeaORM entity modules.
//! We define the data models of the bookkeeping office here: customers and
//! everything edited on the customer form, the declaration catalog, generated
//! tax returns, marketing-site content and reference lookups.

pub mod activity_code;
pub mod authorized_person;
pub mod branch;
pub mod city;
pub mod content_item;
pub mod content_section;
pub mod customer;
pub mod customer_credential;
pub mod customer_document;
pub mod declaration_setting;
pub mod declaration_type;
pub mod district;
pub mod tax_office;
pub mod tax_return;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::activity_code::Entity as ActivityCode;
    pub use super::authorized_person::Entity as AuthorizedPerson;
    pub use super::branch::Entity as Branch;
    pub use super::city::Entity as City;
    pub use super::content_item::Entity as ContentItem;
    pub use super::content_section::Entity as ContentSection;
    pub use super::customer::Entity as Customer;
    pub use super::customer_credential::Entity as CustomerCredential;
    pub use super::customer_document::Entity as CustomerDocument;
    pub use super::declaration_setting::Entity as DeclarationSetting;
    pub use super::declaration_type::Entity as DeclarationType;
    pub use super::district::Entity as District;
    pub use super::tax_office::Entity as TaxOffice;
    pub use super::tax_return::Entity as TaxReturn;
}

#[cfg(test)]
mod test {
    use chrono::{NaiveDate, Utc};
    use migration::{Migrator, MigratorTrait};
    use rust_decimal::Decimal;
    use sea_orm::{
        ActiveModelTrait, ColumnTrait, ConnectionTrait, Database, DatabaseConnection, DbErr,
        EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set,
    };

    use super::*;
    use prelude::*;

    async fn setup_db() -> Result<DatabaseConnection, DbErr> {
        // Connect to the SQLite database
        let db = Database::connect("sqlite::memory:").await?;

        // Enable foreign keys
        db.execute_unprepared("PRAGMA foreign_keys = ON;").await?;

        Migrator::up(&db, None).await.expect("Migrations failed.");
        Ok(db)
    }

    async fn insert_customer(db: &DatabaseConnection, name: &str) -> Result<customer::Model, DbErr> {
        customer::ActiveModel {
            company_name: Set(name.to_string()),
            company_type: Set(customer::CompanyType::Limited),
            tax_number: Set("1234567890".to_string()),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    #[tokio::test]
    async fn test_customer_timestamps_are_maintained() -> Result<(), DbErr> {
        let db = setup_db().await?;

        let before = Utc::now().naive_utc();
        let created = insert_customer(&db, "Anadolu Gıda Ltd. Şti.").await?;
        assert!(created.created_at >= before - chrono::Duration::seconds(1));
        assert_eq!(created.created_at, created.updated_at);

        let mut update: customer::ActiveModel = created.clone().into();
        update.phone = Set(Some("+90 212 555 00 00".to_string()));
        let updated = update.update(&db).await?;

        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
        Ok(())
    }

    #[tokio::test]
    async fn test_customer_children_cascade_on_delete() -> Result<(), DbErr> {
        let db = setup_db().await?;
        let customer = insert_customer(&db, "Ege Tekstil A.Ş.").await?;

        authorized_person::ActiveModel {
            customer_id: Set(customer.id),
            full_name: Set("Ayşe Yılmaz".to_string()),
            share_ratio: Set(Some(Decimal::new(5000, 2))),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        branch::ActiveModel {
            customer_id: Set(customer.id),
            name: Set("İzmir Şubesi".to_string()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let document = customer_document::ActiveModel {
            customer_id: Set(customer.id),
            name: Set("vergi-levhasi.pdf".to_string()),
            data_url: Set("data:application/pdf;base64,JVBERi0=".to_string()),
            ..Default::default()
        }
        .insert(&db)
        .await?;
        assert!(document.uploaded_at <= Utc::now().naive_utc());

        tax_return::ActiveModel {
            customer_id: Set(customer.id),
            declaration_type: Set("KDV1 Beyannamesi".to_string()),
            period: Set("2025-01".to_string()),
            due_date: Set(NaiveDate::from_ymd_opt(2025, 1, 28)
                .unwrap()
                .and_hms_opt(23, 59, 0)
                .unwrap()),
            is_submitted: Set(false),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let people = customer.find_related(AuthorizedPerson).all(&db).await?;
        assert_eq!(people.len(), 1);
        assert_eq!(people[0].share_ratio, Some(Decimal::new(5000, 2)));

        customer.delete(&db).await?;

        assert!(AuthorizedPerson::find().all(&db).await?.is_empty());
        assert!(Branch::find().all(&db).await?.is_empty());
        assert!(CustomerDocument::find().all(&db).await?.is_empty());
        assert!(TaxReturn::find().all(&db).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_tax_return_period_is_unique_per_customer_and_type() -> Result<(), DbErr> {
        let db = setup_db().await?;
        let customer = insert_customer(&db, "Marmara Lojistik Ltd. Şti.").await?;

        let due = NaiveDate::from_ymd_opt(2025, 5, 17)
            .unwrap()
            .and_hms_opt(23, 59, 0)
            .unwrap();
        let draft = |period: &str| tax_return::ActiveModel {
            customer_id: Set(customer.id),
            declaration_type: Set("Gelir Geçici Vergi Beyannamesi".to_string()),
            period: Set(period.to_string()),
            due_date: Set(due),
            is_submitted: Set(false),
            ..Default::default()
        };

        draft("2025-Q1").insert(&db).await?;
        let duplicate = draft("2025-Q1").insert(&db).await;
        assert!(duplicate.is_err(), "a second 2025-Q1 return must be rejected");

        draft("2025-Q2").insert(&db).await?;
        let stored = TaxReturn::find()
            .filter(tax_return::Column::CustomerId.eq(customer.id))
            .all(&db)
            .await?;
        assert_eq!(stored.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_content_items_keep_kind_and_order() -> Result<(), DbErr> {
        let db = setup_db().await?;

        for (position, title) in ["Temel", "Profesyonel"].iter().enumerate() {
            content_item::ActiveModel {
                kind: Set(content_item::ContentKind::Pricing),
                position: Set(position as i32),
                title: Set(title.to_string()),
                price: Set(Some(Decimal::new(250000, 2))),
                extra: Set(serde_json::json!({ "features": ["e-Defter"] })),
                ..Default::default()
            }
            .insert(&db)
            .await?;
        }
        content_item::ActiveModel {
            kind: Set(content_item::ContentKind::Team),
            position: Set(0),
            title: Set("Mehmet Kaya".to_string()),
            extra: Set(serde_json::json!({})),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let pricing = ContentItem::find()
            .filter(content_item::Column::Kind.eq(content_item::ContentKind::Pricing))
            .order_by_asc(content_item::Column::Position)
            .all(&db)
            .await?;
        let titles: Vec<_> = pricing.iter().map(|item| item.title.as_str()).collect();
        assert_eq!(titles, vec!["Temel", "Profesyonel"]);
        assert_eq!(pricing[0].extra["features"][0], "e-Defter");
        Ok(())
    }

    #[test]
    fn test_content_kind_slugs_round_trip() {
        use sea_orm::Iterable;
        for kind in content_item::ContentKind::iter() {
            assert_eq!(content_item::ContentKind::from_slug(kind.slug()), Some(kind));
        }
        assert_eq!(content_item::ContentKind::from_slug("blog"), None);
    }
}
