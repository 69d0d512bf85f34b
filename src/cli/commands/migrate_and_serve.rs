use anyhow::Result;
use tracing::{info, trace};

use super::initdb::migrate;
use super::serve::serve;
use crate::config::AppConfig;

pub async fn migrate_and_serve(config: &AppConfig) -> Result<()> {
    trace!("Entering migrate_and_serve function");
    info!("Applying database migrations and starting server");

    // The migration connection is closed before the server opens its pool.
    let db = migrate(&config.database_url).await?;
    db.close().await?;

    serve(config).await
}
