//! Marketing-site collections: services, pricing plans, team and so on.
//!
//! Every collection is served under `/api/content/{section}` where the section
//! is a [`ContentKind`] slug. The router registers the routes once per kind.

use crate::error::{AppError, AppResult};
use crate::helpers::data_url::check_data_url;
use crate::schemas::{ApiResponse, AppState, ErrorResponse, IdQuery};
use axum::{http::StatusCode, response::Json};
use chrono::{NaiveDateTime, Utc};
use compute::reconcile::plan_reconciliation;
use model::entities::{
    content_item::{self, ContentKind},
    content_section,
    prelude::*,
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::ToSchema;
use validator::Validate;

/// One item of a content collection
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
pub struct ContentItemPayload {
    /// Id of a stored item; items without one are created
    pub id: Option<i32>,
    #[validate(length(min = 1, max = 255, message = "title is required"))]
    pub title: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    /// Only for `pricing` and `pricing/additional-services`
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,
    /// Image as a base64 data URL
    pub image: Option<String>,
    /// Free-form attributes such as a feature list, rating or icon
    #[schema(value_type = Option<Object>)]
    pub extra: Option<serde_json::Value>,
}

/// Heading texts shown above a collection
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
pub struct SectionPayload {
    #[validate(length(min = 1, max = 255, message = "title is required"))]
    pub title: String,
    pub paragraph: Option<String>,
    pub footer: Option<String>,
}

/// Full desired state of a collection, in display order
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ReplaceContentRequest {
    pub items: Vec<ContentItemPayload>,
    pub section: Option<SectionPayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ContentItemResponse {
    pub id: i32,
    pub position: i32,
    pub title: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,
    pub image: Option<String>,
    #[schema(value_type = Object)]
    pub extra: serde_json::Value,
}

impl From<content_item::Model> for ContentItemResponse {
    fn from(model: content_item::Model) -> Self {
        Self {
            id: model.id,
            position: model.position,
            title: model.title,
            subtitle: model.subtitle,
            description: model.description,
            price: model.price,
            image: model.image,
            extra: model.extra,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SectionResponse {
    pub section: String,
    pub title: String,
    pub paragraph: Option<String>,
    pub footer: Option<String>,
    pub updated_at: NaiveDateTime,
}

impl From<content_section::Model> for SectionResponse {
    fn from(model: content_section::Model) -> Self {
        Self {
            section: model.kind,
            title: model.title,
            paragraph: model.paragraph,
            footer: model.footer,
            updated_at: model.updated_at,
        }
    }
}

/// Collection after a replace-all
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ContentCollectionResponse {
    pub items: Vec<ContentItemResponse>,
    pub section: Option<SectionResponse>,
}

fn check_item(kind: ContentKind, item: &ContentItemPayload) -> AppResult<()> {
    item.validate()?;
    if item.title.trim().is_empty() {
        return Err(AppError::Validation("title is required".to_string()));
    }
    match item.price {
        Some(_) if !kind.is_priced() => {
            return Err(AppError::Validation(format!(
                "Items of '{}' have no price",
                kind.slug()
            )));
        }
        Some(price) if price.is_sign_negative() => {
            return Err(AppError::Validation("price must not be negative".to_string()));
        }
        _ => {}
    }
    if let Some(extra) = &item.extra {
        if !extra.is_object() {
            return Err(AppError::Validation("extra must be a JSON object".to_string()));
        }
    }
    check_data_url("image", item.image.as_deref())
}

fn item_fields(
    mut row: content_item::ActiveModel,
    kind: ContentKind,
    position: usize,
    item: &ContentItemPayload,
) -> content_item::ActiveModel {
    row.kind = Set(kind);
    row.position = Set(position as i32);
    row.title = Set(item.title.trim().to_string());
    row.subtitle = Set(item.subtitle.clone());
    row.description = Set(item.description.clone());
    row.price = Set(item.price);
    row.image = Set(item.image.clone());
    row.extra = Set(item.extra.clone().unwrap_or_else(|| serde_json::json!({})));
    row
}

async fn load_items<C: ConnectionTrait>(db: &C, kind: ContentKind) -> AppResult<Vec<ContentItemResponse>> {
    let items = ContentItem::find()
        .filter(content_item::Column::Kind.eq(kind))
        .order_by_asc(content_item::Column::Position)
        .order_by_asc(content_item::Column::Id)
        .all(db)
        .await?;
    Ok(items.into_iter().map(ContentItemResponse::from).collect())
}

async fn upsert_section<C: ConnectionTrait>(
    db: &C,
    kind: ContentKind,
    payload: &SectionPayload,
) -> AppResult<content_section::Model> {
    let now = Utc::now().naive_utc();
    let existing = ContentSection::find_by_id(kind.slug().to_string()).one(db).await?;
    let model = match existing {
        Some(existing) => {
            let mut row: content_section::ActiveModel = existing.into();
            row.title = Set(payload.title.trim().to_string());
            row.paragraph = Set(payload.paragraph.clone());
            row.footer = Set(payload.footer.clone());
            row.updated_at = Set(now);
            row.update(db).await?
        }
        None => {
            content_section::ActiveModel {
                kind: Set(kind.slug().to_string()),
                title: Set(payload.title.trim().to_string()),
                paragraph: Set(payload.paragraph.clone()),
                footer: Set(payload.footer.clone()),
                updated_at: Set(now),
            }
            .insert(db)
            .await?
        }
    };
    Ok(model)
}

/// List the items of a collection in display order
#[utoipa::path(
    get,
    path = "/api/content/{section}",
    tag = "content",
    params(("section" = String, Path, description = "Collection slug, e.g. `services` or `pricing/additional-services`")),
    responses(
        (status = 200, description = "Items retrieved successfully", body = ApiResponse<Vec<ContentItemResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn list_items(
    state: AppState,
    kind: ContentKind,
) -> AppResult<Json<ApiResponse<Vec<ContentItemResponse>>>> {
    trace!("Entering list_items for {}", kind.slug());
    let items = load_items(&state.db, kind).await?;
    debug!("Retrieved {} {} items", items.len(), kind.slug());
    Ok(Json(ApiResponse::ok(items, "Items retrieved successfully")))
}

/// Append one item to the end of a collection
#[utoipa::path(
    post,
    path = "/api/content/{section}",
    tag = "content",
    params(("section" = String, Path, description = "Collection slug")),
    request_body = ContentItemPayload,
    responses(
        (status = 201, description = "Item created successfully", body = ApiResponse<ContentItemResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, item), fields(title = %item.title))]
pub async fn create_item(
    state: AppState,
    kind: ContentKind,
    item: ContentItemPayload,
) -> AppResult<(StatusCode, Json<ApiResponse<ContentItemResponse>>)> {
    trace!("Entering create_item for {}", kind.slug());
    check_item(kind, &item)?;

    let last: Option<i32> = ContentItem::find()
        .select_only()
        .column(content_item::Column::Position)
        .filter(content_item::Column::Kind.eq(kind))
        .order_by_desc(content_item::Column::Position)
        .into_tuple()
        .one(&state.db)
        .await?;
    let position = last.map(|p| p as usize + 1).unwrap_or(0);

    let created = item_fields(<content_item::ActiveModel as Default>::default(), kind, position, &item)
        .insert(&state.db)
        .await?;
    info!("Created {} item {} at position {}", kind.slug(), created.id, position);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(ContentItemResponse::from(created), "Item created successfully")),
    ))
}

/// Replace a collection with the given ordered list in one transaction
///
/// Items with a stored id are updated, the rest are created, and stored
/// items missing from the list are deleted. Positions follow list order.
#[utoipa::path(
    put,
    path = "/api/content/{section}",
    tag = "content",
    params(("section" = String, Path, description = "Collection slug")),
    request_body = ReplaceContentRequest,
    responses(
        (status = 200, description = "Collection replaced successfully", body = ApiResponse<ContentCollectionResponse>),
        (status = 400, description = "Invalid request or duplicate item id", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request), fields(items = request.items.len()))]
pub async fn replace_items(
    state: AppState,
    kind: ContentKind,
    request: ReplaceContentRequest,
) -> AppResult<Json<ApiResponse<ContentCollectionResponse>>> {
    trace!("Entering replace_items for {}", kind.slug());
    for item in &request.items {
        check_item(kind, item)?;
    }
    if let Some(section) = &request.section {
        section.validate()?;
    }

    let txn = state.db.begin().await?;
    let existing: Vec<i32> = ContentItem::find()
        .select_only()
        .column(content_item::Column::Id)
        .filter(content_item::Column::Kind.eq(kind))
        .into_tuple()
        .all(&txn)
        .await?;
    let desired: Vec<Option<i32>> = request.items.iter().map(|item| item.id).collect();
    let plan = plan_reconciliation(&existing, &desired)?;
    debug!(
        "Plan for {}: {} updates, {} inserts, {} deletes",
        kind.slug(),
        plan.updates.len(),
        plan.inserts.len(),
        plan.deletes.len()
    );

    if !plan.deletes.is_empty() {
        ContentItem::delete_many()
            .filter(content_item::Column::Id.is_in(plan.deletes.clone()))
            .exec(&txn)
            .await?;
    }
    for (id, index) in &plan.updates {
        let row = content_item::ActiveModel {
            id: ActiveValue::Unchanged(*id),
            ..Default::default()
        };
        item_fields(row, kind, *index, &request.items[*index])
            .update(&txn)
            .await?;
    }
    for index in &plan.inserts {
        item_fields(<content_item::ActiveModel as Default>::default(), kind, *index, &request.items[*index])
            .insert(&txn)
            .await?;
    }
    let section = match &request.section {
        Some(section) => Some(upsert_section(&txn, kind, section).await?),
        None => None,
    };
    let items = load_items(&txn, kind).await?;
    txn.commit().await?;

    info!("Replaced {} collection with {} items", kind.slug(), items.len());
    Ok(Json(ApiResponse::ok(
        ContentCollectionResponse {
            items,
            section: section.map(SectionResponse::from),
        },
        "Collection replaced successfully",
    )))
}

/// Remove one item from a collection
#[utoipa::path(
    delete,
    path = "/api/content/{section}",
    tag = "content",
    params(
        ("section" = String, Path, description = "Collection slug"),
        IdQuery
    ),
    responses(
        (status = 200, description = "Item deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Item not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_item(
    state: AppState,
    kind: ContentKind,
    id: i32,
) -> AppResult<Json<ApiResponse<String>>> {
    trace!("Entering delete_item for {} item {}", kind.slug(), id);
    let result = ContentItem::delete_many()
        .filter(content_item::Column::Id.eq(id))
        .filter(content_item::Column::Kind.eq(kind))
        .exec(&state.db)
        .await?;
    if result.rows_affected == 0 {
        warn!("{} item {} not found", kind.slug(), id);
        return Err(AppError::not_found("Content item", id));
    }

    info!("Deleted {} item {}", kind.slug(), id);
    Ok(Json(ApiResponse::ok(
        format!("Item {} deleted", id),
        "Item deleted successfully",
    )))
}

/// Get the heading texts of a collection
#[utoipa::path(
    get,
    path = "/api/content/{section}/section",
    tag = "content",
    params(("section" = String, Path, description = "Collection slug")),
    responses(
        (status = 200, description = "Section retrieved; `data` is null when never saved", body = ApiResponse<Option<SectionResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_section(
    state: AppState,
    kind: ContentKind,
) -> AppResult<Json<ApiResponse<Option<SectionResponse>>>> {
    let section = ContentSection::find_by_id(kind.slug().to_string())
        .one(&state.db)
        .await?
        .map(SectionResponse::from);
    Ok(Json(ApiResponse::ok(section, "Section retrieved successfully")))
}

/// Create or update the heading texts of a collection
#[utoipa::path(
    put,
    path = "/api/content/{section}/section",
    tag = "content",
    params(("section" = String, Path, description = "Collection slug")),
    request_body = SectionPayload,
    responses(
        (status = 200, description = "Section saved successfully", body = ApiResponse<SectionResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, payload))]
pub async fn put_section(
    state: AppState,
    kind: ContentKind,
    payload: SectionPayload,
) -> AppResult<Json<ApiResponse<SectionResponse>>> {
    payload.validate()?;
    let saved = upsert_section(&state.db, kind, &payload).await?;
    info!("Saved section text of {}", kind.slug());
    Ok(Json(ApiResponse::ok(
        SectionResponse::from(saved),
        "Section saved successfully",
    )))
}
