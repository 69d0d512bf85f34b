//! Turns stored declaration settings into tax return rows.

use chrono::Datelike;
use model::entities::{customer, declaration_setting, declaration_type, prelude::*, tax_return};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set, TransactionTrait,
};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, instrument, trace};

use crate::error::{ComputeError, Result};
use crate::schedule::{DayOverflow, DeclarationSchedule, Frequency, ScheduleCalculator, TaxReturnDraft};

/// Outcome of generating a customer's tax returns for one year.
#[derive(Debug, Clone, Default)]
pub struct GenerationReport {
    /// Rows inserted by this run.
    pub created: Vec<tax_return::Model>,
    /// Drafts that already had a stored return.
    pub skipped: Vec<TaxReturnDraft>,
}

/// Returns the schedules of a customer's enabled settings, leaving out
/// declaration types disabled in the catalog.
///
/// A yearly setting without a due month takes the catalog's due month.
#[instrument(skip(db))]
pub async fn effective_schedules<C: ConnectionTrait>(
    db: &C,
    customer_id: i32,
) -> Result<Vec<DeclarationSchedule>> {
    let settings = DeclarationSetting::find()
        .filter(declaration_setting::Column::CustomerId.eq(customer_id))
        .filter(declaration_setting::Column::Enabled.eq(true))
        .order_by_asc(declaration_setting::Column::Id)
        .all(db)
        .await?;

    let catalog: HashMap<String, declaration_type::Model> = DeclarationType::find()
        .all(db)
        .await?
        .into_iter()
        .map(|entry| (entry.name.clone(), entry))
        .collect();

    let mut schedules = Vec::with_capacity(settings.len());
    for setting in &settings {
        let entry = catalog.get(&setting.declaration_type);
        if entry.is_some_and(|entry| !entry.enabled) {
            trace!("{} is disabled in the catalog", setting.declaration_type);
            continue;
        }

        let mut schedule = DeclarationSchedule::from_setting(setting)?;
        if schedule.frequency == Frequency::Yearly && schedule.due_month.is_none() {
            schedule.due_month = entry
                .and_then(|entry| entry.due_month)
                .and_then(|month| u32::try_from(month).ok());
        }
        schedules.push(schedule);
    }

    debug!(
        "Customer {} has {} effective schedules out of {} settings",
        customer_id,
        schedules.len(),
        settings.len()
    );
    Ok(schedules)
}

async fn load_customer<C: ConnectionTrait>(db: &C, customer_id: i32) -> Result<customer::Model> {
    Customer::find_by_id(customer_id)
        .one(db)
        .await?
        .ok_or(ComputeError::NotFound {
            entity: "Customer",
            id: customer_id,
        })
}

async fn drafts_for<C: ConnectionTrait>(
    db: &C,
    customer_id: i32,
    year: i32,
    day_overflow: DayOverflow,
) -> Result<Vec<TaxReturnDraft>> {
    let customer = load_customer(db, customer_id).await?;
    let schedules = effective_schedules(db, customer_id).await?;
    ScheduleCalculator::new(year)
        .with_day_overflow(day_overflow)
        .with_establishment(customer.established_on)
        .expand_all(customer.id, &schedules)
}

/// Computes the drafts a generation run would consider, without writing.
#[instrument(skip(db))]
pub async fn preview_tax_returns(
    db: &DatabaseConnection,
    customer_id: i32,
    year: i32,
    day_overflow: DayOverflow,
) -> Result<Vec<TaxReturnDraft>> {
    drafts_for(db, customer_id, year, day_overflow).await
}

/// Stores every draft of `year` that has no tax return yet.
///
/// Runs in one transaction, so a failing schedule leaves nothing behind.
/// Calling it again for the same year creates nothing.
#[instrument(skip(db))]
pub async fn generate_tax_returns(
    db: &DatabaseConnection,
    customer_id: i32,
    year: i32,
    day_overflow: DayOverflow,
) -> Result<GenerationReport> {
    let txn = db.begin().await?;
    let drafts = drafts_for(&txn, customer_id, year, day_overflow).await?;

    let existing: HashSet<(String, String)> = TaxReturn::find()
        .filter(tax_return::Column::CustomerId.eq(customer_id))
        .all(&txn)
        .await?
        .into_iter()
        .map(|row| (row.declaration_type, row.period))
        .collect();

    let mut report = GenerationReport::default();
    for draft in drafts {
        let key = (draft.declaration_type.clone(), draft.period.to_string());
        if existing.contains(&key) {
            report.skipped.push(draft);
            continue;
        }

        match insert_draft(&txn, &draft).await? {
            Some(row) => report.created.push(row),
            None => {
                debug!(
                    "{} {} was stored concurrently, skipping",
                    draft.declaration_type, draft.period
                );
                report.skipped.push(draft);
            }
        }
    }

    txn.commit().await?;
    info!(
        "Generated {} tax returns for customer {} in {} ({} already present)",
        report.created.len(),
        customer_id,
        year,
        report.skipped.len()
    );
    Ok(report)
}

/// Inserts one draft unless a return with the same customer, type and period
/// exists. Returns `None` when the unique index already holds the row, which
/// leaves the surrounding transaction usable.
async fn insert_draft<C: ConnectionTrait>(
    db: &C,
    draft: &TaxReturnDraft,
) -> Result<Option<tax_return::Model>> {
    let period = draft.period.to_string();
    let row = tax_return::ActiveModel {
        customer_id: Set(draft.customer_id),
        declaration_type: Set(draft.declaration_type.clone()),
        period: Set(period.clone()),
        due_date: Set(draft.due_date),
        submitted_date: Set(None),
        is_submitted: Set(false),
        notes: Set(None),
        ..Default::default()
    };

    let inserted = match TaxReturn::insert(row)
        .on_conflict(
            OnConflict::columns([
                tax_return::Column::CustomerId,
                tax_return::Column::DeclarationType,
                tax_return::Column::Period,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(db)
        .await
    {
        Ok(rows) => rows,
        Err(DbErr::RecordNotInserted) => 0,
        Err(err) => return Err(err.into()),
    };
    if inserted == 0 {
        return Ok(None);
    }

    let stored = TaxReturn::find()
        .filter(tax_return::Column::CustomerId.eq(draft.customer_id))
        .filter(tax_return::Column::DeclarationType.eq(draft.declaration_type.as_str()))
        .filter(tax_return::Column::Period.eq(period))
        .one(db)
        .await?;
    Ok(stored)
}

/// Generates tax returns for every active customer.
#[instrument(skip(db))]
pub async fn generate_for_active_customers(
    db: &DatabaseConnection,
    year: i32,
    day_overflow: DayOverflow,
) -> Result<Vec<(i32, GenerationReport)>> {
    let customers = Customer::find()
        .filter(customer::Column::IsActive.eq(true))
        .order_by_asc(customer::Column::Id)
        .all(db)
        .await?;

    let mut reports = Vec::with_capacity(customers.len());
    for customer in customers {
        if customer
            .membership_end
            .is_some_and(|end| end.year() < year)
        {
            trace!("Customer {} left before {}", customer.id, year);
            continue;
        }
        let report = generate_tax_returns(db, customer.id, year, day_overflow).await?;
        reports.push((customer.id, report));
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use common::Period;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{ActiveModelTrait, Database, PaginatorTrait};

    async fn setup_db() -> std::result::Result<DatabaseConnection, DbErr> {
        let db = Database::connect("sqlite::memory:").await?;
        Migrator::up(&db, None).await?;
        Ok(db)
    }

    async fn insert_customer(
        db: &DatabaseConnection,
        established_on: Option<NaiveDate>,
    ) -> std::result::Result<customer::Model, DbErr> {
        customer::ActiveModel {
            company_name: Set("Kapadokya Turizm Ltd. Şti.".to_string()),
            company_type: Set(customer::CompanyType::Limited),
            tax_number: Set("4810012345".to_string()),
            established_on: Set(established_on),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    async fn insert_catalog(
        db: &DatabaseConnection,
        name: &str,
        frequency: declaration_type::Frequency,
        enabled: bool,
        due_month: Option<i32>,
    ) -> std::result::Result<(), DbErr> {
        declaration_type::ActiveModel {
            name: Set(name.to_string()),
            enabled: Set(enabled),
            frequency: Set(frequency),
            due_day: Set(26),
            due_hour: Set(23),
            due_minute: Set(59),
            due_month: Set(due_month),
            ..Default::default()
        }
        .insert(db)
        .await?;
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn insert_setting(
        db: &DatabaseConnection,
        customer_id: i32,
        name: &str,
        frequency: declaration_type::Frequency,
        due_day: i32,
        quarter_offset: Option<i32>,
        yearly_count: Option<i32>,
        skip_quarter: Option<i32>,
    ) -> std::result::Result<(), DbErr> {
        declaration_setting::ActiveModel {
            customer_id: Set(customer_id),
            declaration_type: Set(name.to_string()),
            enabled: Set(true),
            frequency: Set(frequency),
            due_day: Set(due_day),
            due_hour: Set(23),
            due_minute: Set(59),
            due_month: Set(None),
            quarter_offset: Set(quarter_offset),
            yearly_count: Set(yearly_count),
            skip_quarter: Set(skip_quarter),
            ..Default::default()
        }
        .insert(db)
        .await?;
        Ok(())
    }

    fn at(year: i32, month: u32, day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(23, 59, 0)
            .unwrap()
    }

    #[tokio::test]
    async fn test_generation_creates_gelir_gecici_returns() {
        let db = setup_db().await.unwrap();
        let customer = insert_customer(&db, None).await.unwrap();
        insert_setting(
            &db,
            customer.id,
            "Gelir Geçici Vergi Beyannamesi",
            declaration_type::Frequency::Quarterly,
            17,
            Some(2),
            Some(3),
            Some(4),
        )
        .await
        .unwrap();

        let report = generate_tax_returns(&db, customer.id, 2025, DayOverflow::Clamp)
            .await
            .unwrap();

        let created: Vec<_> = report
            .created
            .iter()
            .map(|row| (row.period.as_str(), row.due_date, row.is_submitted))
            .collect();
        assert_eq!(
            created,
            vec![
                ("2025-Q1", at(2025, 5, 17), false),
                ("2025-Q2", at(2025, 8, 17), false),
                ("2025-Q3", at(2025, 11, 17), false),
            ]
        );
        assert!(report.skipped.is_empty());
    }

    #[tokio::test]
    async fn test_generation_twice_creates_no_duplicates() {
        let db = setup_db().await.unwrap();
        let customer = insert_customer(&db, None).await.unwrap();
        insert_setting(
            &db,
            customer.id,
            "KDV1 Beyannamesi",
            declaration_type::Frequency::Monthly,
            28,
            None,
            None,
            None,
        )
        .await
        .unwrap();

        let first = generate_tax_returns(&db, customer.id, 2025, DayOverflow::Clamp)
            .await
            .unwrap();
        assert_eq!(first.created.len(), 12);

        let second = generate_tax_returns(&db, customer.id, 2025, DayOverflow::Clamp)
            .await
            .unwrap();
        assert!(second.created.is_empty());
        assert_eq!(second.skipped.len(), 12);

        let stored = TaxReturn::find().count(&db).await.unwrap();
        assert_eq!(stored, 12);
    }

    #[tokio::test]
    async fn test_insert_draft_skips_row_stored_by_another_run() {
        let db = setup_db().await.unwrap();
        let customer = insert_customer(&db, None).await.unwrap();
        let draft = TaxReturnDraft {
            customer_id: customer.id,
            declaration_type: "KDV1 Beyannamesi".to_string(),
            period: "2025-04".parse::<Period>().unwrap(),
            due_date: at(2025, 5, 28),
        };

        let txn = db.begin().await.unwrap();
        let first = insert_draft(&txn, &draft).await.unwrap();
        assert_eq!(first.map(|row| row.period), Some("2025-04".to_string()));

        let second = insert_draft(&txn, &draft).await.unwrap();
        assert!(second.is_none());

        // The transaction is still usable after the conflict.
        let next = TaxReturnDraft {
            period: "2025-05".parse::<Period>().unwrap(),
            due_date: at(2025, 6, 28),
            ..draft
        };
        assert!(insert_draft(&txn, &next).await.unwrap().is_some());
        txn.commit().await.unwrap();

        let stored = TaxReturn::find().count(&db).await.unwrap();
        assert_eq!(stored, 2);
    }

    #[tokio::test]
    async fn test_disabled_catalog_entries_are_ignored() {
        let db = setup_db().await.unwrap();
        let customer = insert_customer(&db, None).await.unwrap();
        insert_catalog(
            &db,
            "Damga Vergisi Beyannamesi",
            declaration_type::Frequency::Monthly,
            false,
            None,
        )
        .await
        .unwrap();
        insert_setting(
            &db,
            customer.id,
            "Damga Vergisi Beyannamesi",
            declaration_type::Frequency::Monthly,
            26,
            None,
            None,
            None,
        )
        .await
        .unwrap();

        let schedules = effective_schedules(&db, customer.id).await.unwrap();
        assert!(schedules.is_empty());
    }

    #[tokio::test]
    async fn test_yearly_due_month_falls_back_to_catalog() {
        let db = setup_db().await.unwrap();
        let customer = insert_customer(&db, None).await.unwrap();
        insert_catalog(
            &db,
            "Kurumlar Vergisi Beyannamesi",
            declaration_type::Frequency::Yearly,
            true,
            Some(4),
        )
        .await
        .unwrap();
        insert_setting(
            &db,
            customer.id,
            "Kurumlar Vergisi Beyannamesi",
            declaration_type::Frequency::Yearly,
            30,
            None,
            None,
            None,
        )
        .await
        .unwrap();

        let drafts = preview_tax_returns(&db, customer.id, 2025, DayOverflow::Clamp)
            .await
            .unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].period, Period::year(2025));
        assert_eq!(drafts[0].due_date, at(2025, 4, 30));

        // Preview never writes.
        assert_eq!(TaxReturn::find().count(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_failed_generation_writes_nothing() {
        let db = setup_db().await.unwrap();
        let customer = insert_customer(&db, None).await.unwrap();
        insert_setting(
            &db,
            customer.id,
            "KDV1 Beyannamesi",
            declaration_type::Frequency::Monthly,
            28,
            None,
            None,
            None,
        )
        .await
        .unwrap();
        // Yearly with no due month anywhere.
        insert_setting(
            &db,
            customer.id,
            "Özel Beyan",
            declaration_type::Frequency::Yearly,
            30,
            None,
            None,
            None,
        )
        .await
        .unwrap();

        let err = generate_tax_returns(&db, customer.id, 2025, DayOverflow::Clamp)
            .await
            .unwrap_err();
        assert!(matches!(err, ComputeError::MissingDueMonth(_)));
        assert_eq!(TaxReturn::find().count(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_establishment_date_limits_generation() {
        let db = setup_db().await.unwrap();
        let customer = insert_customer(&db, NaiveDate::from_ymd_opt(2025, 10, 1))
            .await
            .unwrap();
        insert_setting(
            &db,
            customer.id,
            "Muhtasar ve Prim Hizmet Beyannamesi",
            declaration_type::Frequency::Monthly,
            26,
            None,
            None,
            None,
        )
        .await
        .unwrap();

        let report = generate_tax_returns(&db, customer.id, 2025, DayOverflow::Clamp)
            .await
            .unwrap();
        let periods: Vec<_> = report.created.iter().map(|r| r.period.as_str()).collect();
        assert_eq!(periods, vec!["2025-10", "2025-11", "2025-12"]);
    }

    #[tokio::test]
    async fn test_unknown_customer_is_not_found() {
        let db = setup_db().await.unwrap();
        let err = generate_tax_returns(&db, 404, 2025, DayOverflow::Clamp)
            .await
            .unwrap_err();
        assert!(matches!(err, ComputeError::NotFound { id: 404, .. }));
    }

    #[tokio::test]
    async fn test_generation_for_active_customers() {
        let db = setup_db().await.unwrap();
        let active = insert_customer(&db, None).await.unwrap();
        insert_setting(
            &db,
            active.id,
            "KDV1 Beyannamesi",
            declaration_type::Frequency::Monthly,
            28,
            None,
            None,
            None,
        )
        .await
        .unwrap();

        let inactive = insert_customer(&db, None).await.unwrap();
        let mut inactive: customer::ActiveModel = inactive.into();
        inactive.is_active = Set(false);
        let inactive = inactive.update(&db).await.unwrap();
        insert_setting(
            &db,
            inactive.id,
            "KDV1 Beyannamesi",
            declaration_type::Frequency::Monthly,
            28,
            None,
            None,
            None,
        )
        .await
        .unwrap();

        let reports = generate_for_active_customers(&db, 2025, DayOverflow::Clamp)
            .await
            .unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].0, active.id);
        assert_eq!(reports[0].1.created.len(), 12);
    }
}
