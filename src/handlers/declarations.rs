use crate::error::{AppError, AppResult};
use crate::schemas::{ApiResponse, AppState, CachedData, ErrorResponse};
use axum::{extract::State, response::Json};
use compute::reconcile::plan_reconciliation;
use compute::{DeclarationSchedule, Frequency};
use model::entities::{declaration_type, prelude::*};
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, instrument, trace};
use utoipa::ToSchema;

pub(crate) const CATALOG_CACHE_KEY: &str = "declarations_config";

/// Catalog entry with the legal default schedule of a declaration
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeclarationTypePayload {
    /// e.g. "KDV1 Beyannamesi"
    pub name: String,
    /// Whether the declaration is offered to customers
    pub enabled: bool,
    /// `monthly`, `quarterly` or `yearly`
    pub frequency: String,
    pub due_day: i32,
    pub due_hour: i32,
    pub due_minute: i32,
    pub due_month: Option<i32>,
    pub quarter_offset: Option<i32>,
    pub yearly_count: Option<i32>,
    pub skip_quarter: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeclarationTypeResponse {
    pub id: i32,
    pub name: String,
    pub enabled: bool,
    pub frequency: String,
    pub due_day: i32,
    pub due_hour: i32,
    pub due_minute: i32,
    pub due_month: Option<i32>,
    pub quarter_offset: Option<i32>,
    pub yearly_count: Option<i32>,
    pub skip_quarter: Option<i32>,
}

impl From<declaration_type::Model> for DeclarationTypeResponse {
    fn from(model: declaration_type::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            enabled: model.enabled,
            frequency: Frequency::from(model.frequency).as_str().to_string(),
            due_day: model.due_day,
            due_hour: model.due_hour,
            due_minute: model.due_minute,
            due_month: model.due_month,
            quarter_offset: model.quarter_offset,
            yearly_count: model.yearly_count,
            skip_quarter: model.skip_quarter,
        }
    }
}

/// Checks an entry and turns it into the column values of the catalog.
fn to_model(id: i32, payload: &DeclarationTypePayload) -> AppResult<declaration_type::Model> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }
    let frequency = payload
        .frequency
        .parse::<Frequency>()
        .map_err(AppError::Validation)?;

    let model = declaration_type::Model {
        id,
        name: name.to_string(),
        enabled: payload.enabled,
        frequency: frequency.into(),
        due_day: payload.due_day,
        due_hour: payload.due_hour,
        due_minute: payload.due_minute,
        due_month: payload.due_month,
        quarter_offset: payload.quarter_offset,
        yearly_count: payload.yearly_count,
        skip_quarter: payload.skip_quarter,
    };
    DeclarationSchedule::from_catalog(&model)?;
    Ok(model)
}

fn write_fields(mut row: declaration_type::ActiveModel, model: declaration_type::Model) -> declaration_type::ActiveModel {
    row.name = Set(model.name);
    row.enabled = Set(model.enabled);
    row.frequency = Set(model.frequency);
    row.due_day = Set(model.due_day);
    row.due_hour = Set(model.due_hour);
    row.due_minute = Set(model.due_minute);
    row.due_month = Set(model.due_month);
    row.quarter_offset = Set(model.quarter_offset);
    row.yearly_count = Set(model.yearly_count);
    row.skip_quarter = Set(model.skip_quarter);
    row
}

/// Inserts, updates and deletes catalog entries so that the catalog
/// matches `entries` by name.
pub(crate) async fn replace_catalog<C: ConnectionTrait>(
    db: &C,
    entries: &[DeclarationTypePayload],
    delete_missing: bool,
) -> AppResult<Vec<declaration_type::Model>> {
    let existing: HashMap<String, i32> = DeclarationType::find()
        .all(db)
        .await?
        .into_iter()
        .map(|entry| (entry.name, entry.id))
        .collect();

    let mut names = HashSet::new();
    let mut models = Vec::with_capacity(entries.len());
    for entry in entries {
        let model = to_model(0, entry)?;
        if !names.insert(model.name.clone()) {
            return Err(AppError::Validation(format!(
                "Declaration '{}' is listed twice",
                model.name
            )));
        }
        models.push(model);
    }

    let desired: Vec<Option<i32>> = models
        .iter()
        .map(|model| existing.get(&model.name).copied())
        .collect();
    let stored: Vec<i32> = existing.values().copied().collect();
    let plan = plan_reconciliation(&stored, &desired)?;
    trace!(
        "Catalog plan: {} updates, {} inserts, {} deletes",
        plan.updates.len(),
        plan.inserts.len(),
        plan.deletes.len()
    );

    if delete_missing && !plan.deletes.is_empty() {
        DeclarationType::delete_many()
            .filter(declaration_type::Column::Id.is_in(plan.deletes.clone()))
            .exec(db)
            .await?;
    }
    for (id, index) in &plan.updates {
        let row = declaration_type::ActiveModel {
            id: ActiveValue::Unchanged(*id),
            ..Default::default()
        };
        write_fields(row, models[*index].clone()).update(db).await?;
    }
    for index in &plan.inserts {
        write_fields(<declaration_type::ActiveModel as Default>::default(), models[*index].clone())
            .insert(db)
            .await?;
    }

    Ok(DeclarationType::find()
        .order_by_asc(declaration_type::Column::Name)
        .all(db)
        .await?)
}

/// Get the declaration catalog
#[utoipa::path(
    get,
    path = "/api/declarations-config",
    tag = "declarations",
    responses(
        (status = 200, description = "Catalog retrieved successfully", body = ApiResponse<Vec<DeclarationTypeResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_declarations_config(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<DeclarationTypeResponse>>>> {
    let key = CATALOG_CACHE_KEY.to_string();
    if let Some(CachedData::DeclarationsConfig(catalog)) = state.cache.get(&key).await {
        trace!("Serving declaration catalog from cache");
        return Ok(Json(ApiResponse::ok(catalog, "Catalog retrieved successfully")));
    }

    let catalog: Vec<DeclarationTypeResponse> = DeclarationType::find()
        .order_by_asc(declaration_type::Column::Name)
        .all(&state.db)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    debug!("Loaded {} catalog entries", catalog.len());
    state
        .cache
        .insert(key, CachedData::DeclarationsConfig(catalog.clone()))
        .await;
    Ok(Json(ApiResponse::ok(catalog, "Catalog retrieved successfully")))
}

/// Replace the declaration catalog
///
/// Entries are matched by name; entries missing from the body are removed.
#[utoipa::path(
    put,
    path = "/api/declarations-config",
    tag = "declarations",
    request_body = Vec<DeclarationTypePayload>,
    responses(
        (status = 200, description = "Catalog replaced successfully", body = ApiResponse<Vec<DeclarationTypeResponse>>),
        (status = 400, description = "Invalid catalog entry", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, entries), fields(entries = entries.len()))]
pub async fn put_declarations_config(
    State(state): State<AppState>,
    Json(entries): Json<Vec<DeclarationTypePayload>>,
) -> AppResult<Json<ApiResponse<Vec<DeclarationTypeResponse>>>> {
    let txn = state.db.begin().await?;
    let catalog = replace_catalog(&txn, &entries, true).await?;
    txn.commit().await?;

    state.cache.invalidate(CATALOG_CACHE_KEY).await;
    info!("Declaration catalog replaced with {} entries", catalog.len());
    Ok(Json(ApiResponse::ok(
        catalog.into_iter().map(Into::into).collect(),
        "Catalog replaced successfully",
    )))
}
