#[cfg(test)]
pub mod test_utils {
    use crate::config::AppConfig;
    use crate::handlers::declarations::{replace_catalog, DeclarationTypePayload};
    use crate::router::create_router;
    use crate::schemas::AppState;
    use axum::Router;
    use migration::{Migrator, MigratorTrait};
    use moka::future::Cache;
    use sea_orm::{Database, DatabaseConnection};
    use std::sync::Arc;
    use tracing::Level;
    use tracing_subscriber::FmtSubscriber;

    /// Create an in-memory SQLite database for testing
    pub async fn setup_test_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to connect to in-memory database");

        // Run migrations
        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        db
    }

    fn catalog_entry(
        name: &str,
        frequency: &str,
        due_day: i32,
        due_month: Option<i32>,
    ) -> DeclarationTypePayload {
        DeclarationTypePayload {
            name: name.to_string(),
            enabled: true,
            frequency: frequency.to_string(),
            due_day,
            due_hour: 23,
            due_minute: 59,
            due_month,
            quarter_offset: None,
            yearly_count: None,
            skip_quarter: None,
        }
    }

    /// Declaration catalog used by the integration tests
    pub fn test_catalog() -> Vec<DeclarationTypePayload> {
        vec![
            catalog_entry("KDV1 Beyannamesi", "monthly", 28, None),
            DeclarationTypePayload {
                quarter_offset: Some(2),
                yearly_count: Some(3),
                skip_quarter: Some(4),
                ..catalog_entry("Gelir Geçici Vergi Beyannamesi", "quarterly", 17, None)
            },
            catalog_entry("Gelir Vergisi Beyannamesi", "yearly", 31, Some(3)),
        ]
    }

    /// Create AppState for testing
    pub async fn setup_test_app_state() -> AppState {
        let db = setup_test_db().await;

        replace_catalog(&db, &test_catalog(), false)
            .await
            .expect("Failed to seed the declaration catalog");

        let cache = Cache::new(100);

        AppState {
            db,
            cache,
            config: Arc::new(AppConfig::default()),
        }
    }

    /// Initialize tracing for tests with output to STDERR.
    ///
    /// The log level is taken from RUST_LOG and defaults to WARN.
    fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
        let log_level = std::env::var("RUST_LOG")
            .ok()
            .and_then(|level| match level.to_uppercase().as_str() {
                "ERROR" => Some(Level::ERROR),
                "WARN" => Some(Level::WARN),
                "INFO" => Some(Level::INFO),
                "DEBUG" => Some(Level::DEBUG),
                "TRACE" => Some(Level::TRACE),
                _ => None,
            })
            .unwrap_or(Level::WARN);

        let subscriber = FmtSubscriber::builder()
            .with_max_level(log_level)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    /// Create axum app for testing
    pub async fn setup_test_app() -> Router {
        let _ = init_test_tracing();

        let state = setup_test_app_state().await;
        create_router(state)
    }
}
