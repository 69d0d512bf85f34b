use anyhow::{Context, Result};
use model::entities::{activity_code, city, district, prelude::*, tax_office};
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, Database, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, error, info, trace};

use crate::handlers::declarations::{replace_catalog, DeclarationTypePayload};

/// Contents of a seed file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SeedFile {
    pub declaration_types: Vec<DeclarationTypePayload>,
    pub tax_offices: Vec<SeedTaxOffice>,
    pub cities: Vec<SeedCity>,
    pub activity_codes: Vec<SeedActivityCode>,
}

#[derive(Debug, Deserialize)]
pub struct SeedTaxOffice {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub city_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SeedCity {
    pub plate_code: i32,
    pub name: String,
    #[serde(default)]
    pub districts: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SeedActivityCode {
    pub code: String,
    pub description: String,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub declaration_types: usize,
    pub tax_offices: usize,
    pub cities: usize,
    pub districts: usize,
    pub activity_codes: usize,
}

pub fn read_seed_file(path: &Path) -> Result<SeedFile> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read seed file {}", path.display()))?;
    serde_yaml::from_str(&text).with_context(|| format!("Invalid seed file {}", path.display()))
}

async fn upsert_tax_office<C: ConnectionTrait>(db: &C, office: &SeedTaxOffice) -> Result<()> {
    let existing = TaxOffice::find()
        .filter(tax_office::Column::Code.eq(office.code.as_str()))
        .one(db)
        .await?;
    let mut row = match existing {
        Some(found) => tax_office::ActiveModel {
            id: ActiveValue::Unchanged(found.id),
            ..Default::default()
        },
        None => tax_office::ActiveModel {
            code: Set(office.code.clone()),
            ..Default::default()
        },
    };
    row.name = Set(office.name.clone());
    row.city_name = Set(office.city_name.clone());
    row.save(db).await?;
    Ok(())
}

/// Returns the number of districts added to the city.
async fn upsert_city<C: ConnectionTrait>(db: &C, seed: &SeedCity) -> Result<usize> {
    let existing = City::find()
        .filter(city::Column::PlateCode.eq(seed.plate_code))
        .one(db)
        .await?;
    let city_id = match existing {
        Some(found) => {
            city::ActiveModel {
                id: ActiveValue::Unchanged(found.id),
                name: Set(seed.name.clone()),
                ..Default::default()
            }
            .update(db)
            .await?;
            found.id
        }
        None => {
            city::ActiveModel {
                plate_code: Set(seed.plate_code),
                name: Set(seed.name.clone()),
                ..Default::default()
            }
            .insert(db)
            .await?
            .id
        }
    };

    let known: Vec<String> = District::find()
        .filter(district::Column::CityId.eq(city_id))
        .all(db)
        .await?
        .into_iter()
        .map(|d| d.name)
        .collect();

    let mut added = 0;
    for name in &seed.districts {
        if known.contains(name) {
            continue;
        }
        district::ActiveModel {
            city_id: Set(city_id),
            name: Set(name.clone()),
            ..Default::default()
        }
        .insert(db)
        .await?;
        added += 1;
    }
    Ok(added)
}

async fn upsert_activity_code<C: ConnectionTrait>(db: &C, seed: &SeedActivityCode) -> Result<()> {
    let existing = ActivityCode::find()
        .filter(activity_code::Column::Code.eq(seed.code.as_str()))
        .one(db)
        .await?;
    let mut row = match existing {
        Some(found) => activity_code::ActiveModel {
            id: ActiveValue::Unchanged(found.id),
            ..Default::default()
        },
        None => activity_code::ActiveModel {
            code: Set(seed.code.clone()),
            ..Default::default()
        },
    };
    row.description = Set(seed.description.clone());
    row.save(db).await?;
    Ok(())
}

/// Writes the seed into the database. Rows are matched by their natural
/// key and never deleted.
pub async fn apply_seed<C: TransactionTrait>(db: &C, seed: &SeedFile) -> Result<SeedSummary> {
    let txn = db.begin().await?;
    let mut summary = SeedSummary::default();

    summary.declaration_types = replace_catalog(&txn, &seed.declaration_types, false)
        .await?
        .len();
    trace!("Catalog holds {} entries", summary.declaration_types);

    for office in &seed.tax_offices {
        upsert_tax_office(&txn, office).await?;
    }
    summary.tax_offices = seed.tax_offices.len();

    for city in &seed.cities {
        summary.districts += upsert_city(&txn, city).await?;
    }
    summary.cities = seed.cities.len();

    for code in &seed.activity_codes {
        upsert_activity_code(&txn, code).await?;
    }
    summary.activity_codes = seed.activity_codes.len();

    txn.commit().await?;
    Ok(summary)
}

pub async fn seed(path: &str, database_url: &str) -> Result<()> {
    trace!("Entering seed function");
    info!("Seeding database from {}", path);
    debug!("Database URL: {}", database_url);

    let seed = read_seed_file(Path::new(path))?;
    let db = match Database::connect(database_url).await {
        Ok(connection) => connection,
        Err(e) => {
            error!("Failed to connect to database '{}': {}", database_url, e);
            return Err(e.into());
        }
    };

    match apply_seed(&db, &seed).await {
        Ok(summary) => {
            info!(
                "Seed applied: {} declaration types, {} tax offices, {} cities ({} new districts), {} activity codes",
                summary.declaration_types,
                summary.tax_offices,
                summary.cities,
                summary.districts,
                summary.activity_codes
            );
            Ok(())
        }
        Err(e) => {
            error!("Failed to apply seed: {}", e);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::initdb::migrate;
    use sea_orm::PaginatorTrait;

    const SEED: &str = r#"
declaration_types:
  - name: KDV1 Beyannamesi
    enabled: true
    frequency: monthly
    due_day: 28
    due_hour: 23
    due_minute: 59
  - name: Gelir Vergisi Beyannamesi
    enabled: true
    frequency: yearly
    due_day: 31
    due_hour: 23
    due_minute: 59
    due_month: 3
tax_offices:
  - code: "034250"
    name: Kadıköy Vergi Dairesi
    city_name: İstanbul
cities:
  - plate_code: 34
    name: İstanbul
    districts: [Kadıköy, Beşiktaş]
activity_codes:
  - code: "69.20.01"
    description: Muhasebe ve mali müşavirlik faaliyetleri
"#;

    #[test]
    fn test_parse_seed() {
        let seed: SeedFile = serde_yaml::from_str(SEED).unwrap();
        assert_eq!(seed.declaration_types.len(), 2);
        assert_eq!(seed.declaration_types[1].due_month, Some(3));
        assert_eq!(seed.cities[0].districts, vec!["Kadıköy", "Beşiktaş"]);
    }

    #[test]
    fn test_default_seed_file_parses() {
        let seed = read_seed_file(Path::new("seed/default.yaml")).unwrap();
        assert!(seed
            .declaration_types
            .iter()
            .any(|entry| entry.name == "Gelir Geçici Vergi Beyannamesi"));
        assert!(!seed.cities.is_empty());
    }

    #[tokio::test]
    async fn test_apply_seed_twice_keeps_one_row_per_key() {
        let db = migrate("sqlite::memory:").await.unwrap();
        let seed: SeedFile = serde_yaml::from_str(SEED).unwrap();

        let first = apply_seed(&db, &seed).await.unwrap();
        assert_eq!(first.districts, 2);

        let second = apply_seed(&db, &seed).await.unwrap();
        assert_eq!(second.districts, 0);
        assert_eq!(second.declaration_types, 2);

        assert_eq!(TaxOffice::find().count(&db).await.unwrap(), 1);
        assert_eq!(City::find().count(&db).await.unwrap(), 1);
        assert_eq!(District::find().count(&db).await.unwrap(), 2);
        assert_eq!(ActivityCode::find().count(&db).await.unwrap(), 1);
    }
}
