use crate::handlers::{
    content,
    customers::{create_customer, delete_customer, get_customers, update_customer},
    declarations::{get_declarations_config, put_declarations_config},
    health::health_check,
    lookups::{get_activity_codes, get_cities, get_districts, get_tax_offices},
    tax_returns::{
        create_tax_return, delete_tax_return, generate, get_tax_returns, preview,
        update_tax_return,
    },
};
use crate::schemas::{ApiDoc, AppState, IdQuery};
use axum::{
    extract::{DefaultBodyLimit, Query, State},
    routing::{get, post},
    Json, Router,
};
use model::entities::content_item::ContentKind;
use sea_orm::Iterable;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Routes of one content collection, bound to its kind.
fn content_routes(kind: ContentKind) -> Router<AppState> {
    let base = format!("/api/content/{}", kind.slug());
    let section = format!("{}/section", base);

    Router::new()
        .route(
            &base,
            get(move |State(state): State<AppState>| content::list_items(state, kind))
                .post(move |State(state): State<AppState>, Json(item): Json<content::ContentItemPayload>| {
                    content::create_item(state, kind, item)
                })
                .put(move |State(state): State<AppState>, Json(request): Json<content::ReplaceContentRequest>| {
                    content::replace_items(state, kind, request)
                })
                .delete(
                    move |State(state): State<AppState>, Query(IdQuery { id }): Query<IdQuery>| {
                        content::delete_item(state, kind, id)
                    },
                ),
        )
        .route(
            &section,
            get(move |State(state): State<AppState>| content::get_section(state, kind)).put(
                move |State(state): State<AppState>, Json(payload): Json<content::SectionPayload>| {
                    content::put_section(state, kind, payload)
                },
            ),
        )
}

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config.request_timeout_secs);
    let body_limit = state.config.max_body_bytes;

    let mut router = Router::new()
        // Health check
        .route("/health", get(health_check))
        // Customers, selected by `?id=`
        .route(
            "/api/customers",
            get(get_customers)
                .post(create_customer)
                .patch(update_customer)
                .delete(delete_customer),
        )
        // Tax returns
        .route(
            "/api/tax-returns",
            get(get_tax_returns)
                .post(create_tax_return)
                .patch(update_tax_return)
                .delete(delete_tax_return),
        )
        .route("/api/tax-returns/generate", post(generate))
        .route("/api/tax-returns/preview", get(preview))
        // Reference data
        .route("/api/tax-offices", get(get_tax_offices))
        .route("/api/cities", get(get_cities))
        .route("/api/districts", get(get_districts))
        .route("/api/activity-codes", get(get_activity_codes))
        .route(
            "/api/declarations-config",
            get(get_declarations_config).put(put_declarations_config),
        );

    // Slugs may contain a slash, so each collection gets its own routes.
    for kind in ContentKind::iter() {
        router = router.merge(content_routes(kind));
    }

    router
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(timeout))
                .layer(CorsLayer::permissive()),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
