use anyhow::Result;
use compute::{generate_for_active_customers, generate_tax_returns};
use sea_orm::Database;
use tracing::{debug, error, info, trace, warn};

use crate::config::AppConfig;

pub async fn generate_returns(config: &AppConfig, year: i32, customer_id: Option<i32>) -> Result<()> {
    trace!("Entering generate_returns function");
    let day_overflow = config.day_overflow();
    debug!("Year: {}, customer: {:?}, overflow: {:?}", year, customer_id, day_overflow);

    let db = match Database::connect(&config.database_url).await {
        Ok(connection) => connection,
        Err(e) => {
            error!("Failed to connect to database '{}': {}", config.database_url, e);
            return Err(e.into());
        }
    };

    let reports = match customer_id {
        Some(id) => vec![(id, generate_tax_returns(&db, id, year, day_overflow).await?)],
        None => generate_for_active_customers(&db, year, day_overflow).await?,
    };

    if reports.is_empty() {
        warn!("No active customers for {}", year);
    }

    let mut created = 0;
    let mut skipped = 0;
    for (customer_id, report) in &reports {
        debug!(
            "Customer {}: {} created, {} already present",
            customer_id,
            report.created.len(),
            report.skipped.len()
        );
        created += report.created.len();
        skipped += report.skipped.len();
    }

    info!(
        "Generated {} tax returns for {} customers in {} ({} already present)",
        created,
        reports.len(),
        year,
        skipped
    );
    Ok(())
}
