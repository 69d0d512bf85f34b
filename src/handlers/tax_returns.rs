use crate::error::{AppError, AppResult};
use crate::handlers::customers::require_text;
use crate::schemas::{ApiResponse, AppState, ErrorResponse, IdQuery};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use chrono::{NaiveDateTime, Utc};
use common::{Page, Period};
use compute::{generate_tax_returns, preview_tax_returns, TaxReturnDraft};
use model::entities::{prelude::*, tax_return};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Request body for storing one tax return
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateTaxReturnRequest {
    pub customer_id: i32,
    #[validate(length(min = 1, max = 255, message = "declaration_type is required"))]
    pub declaration_type: String,
    /// `YYYY-MM`, `YYYY-Qn` or `YYYY`
    pub period: String,
    pub due_date: NaiveDateTime,
    pub notes: Option<String>,
}

/// Request body for updating a tax return
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct UpdateTaxReturnRequest {
    pub is_submitted: Option<bool>,
    /// Setting it marks the return submitted. Without it, a first submit is
    /// stamped with now and a repeated one keeps the stored stamp.
    pub submitted_date: Option<NaiveDateTime>,
    pub due_date: Option<NaiveDateTime>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TaxReturnResponse {
    pub id: i32,
    pub customer_id: i32,
    pub declaration_type: String,
    pub period: String,
    pub due_date: NaiveDateTime,
    pub submitted_date: Option<NaiveDateTime>,
    pub is_submitted: bool,
    pub notes: Option<String>,
}

impl From<tax_return::Model> for TaxReturnResponse {
    fn from(model: tax_return::Model) -> Self {
        Self {
            id: model.id,
            customer_id: model.customer_id,
            declaration_type: model.declaration_type,
            period: model.period,
            due_date: model.due_date,
            submitted_date: model.submitted_date,
            is_submitted: model.is_submitted,
            notes: model.notes,
        }
    }
}

/// A computed tax return that is not stored
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TaxReturnDraftResponse {
    pub customer_id: i32,
    pub declaration_type: String,
    pub period: String,
    pub due_date: NaiveDateTime,
}

impl From<TaxReturnDraft> for TaxReturnDraftResponse {
    fn from(draft: TaxReturnDraft) -> Self {
        Self {
            customer_id: draft.customer_id,
            declaration_type: draft.declaration_type,
            period: draft.period.to_string(),
            due_date: draft.due_date,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GenerationResponse {
    pub created: Vec<TaxReturnResponse>,
    /// Drafts that already had a stored tax return
    pub skipped: Vec<TaxReturnDraftResponse>,
}

/// Query parameters for listing tax returns
#[derive(Debug, Deserialize, ToSchema, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct TaxReturnQuery {
    pub customer_id: Option<i32>,
    /// Calendar year of the period
    #[validate(range(min = 1900, max = 9999))]
    pub year: Option<i32>,
    pub is_submitted: Option<bool>,
    #[validate(range(min = 1, max = 10000))]
    pub page: Option<u64>,
    #[validate(range(min = 1, max = 200))]
    pub page_size: Option<u64>,
}

/// Customer and year to expand declaration settings for
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct GenerateRequest {
    pub customer_id: i32,
    #[validate(range(min = 1900, max = 9999))]
    pub year: i32,
}

/// Store one tax return
#[utoipa::path(
    post,
    path = "/api/tax-returns",
    tag = "tax-returns",
    request_body = CreateTaxReturnRequest,
    responses(
        (status = 201, description = "Tax return created successfully", body = ApiResponse<TaxReturnResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Customer not found", body = ErrorResponse),
        (status = 409, description = "A tax return for this customer, type and period exists", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_tax_return(
    State(state): State<AppState>,
    Json(request): Json<CreateTaxReturnRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<TaxReturnResponse>>)> {
    trace!("Entering create_tax_return function");
    request.validate()?;
    require_text("declaration_type", &request.declaration_type)?;
    let declaration_type = request.declaration_type.trim().to_string();
    let period: Period = request
        .period
        .parse()
        .map_err(|e| AppError::Validation(format!("Invalid period: {}", e)))?;

    if Customer::find_by_id(request.customer_id)
        .one(&state.db)
        .await?
        .is_none()
    {
        warn!("Customer with ID {} not found", request.customer_id);
        return Err(AppError::not_found("Customer", request.customer_id));
    }

    let conflict_message = format!(
        "{} for {} already exists for customer {}",
        declaration_type, period, request.customer_id
    );
    let created = tax_return::ActiveModel {
        customer_id: Set(request.customer_id),
        declaration_type: Set(declaration_type),
        period: Set(period.to_string()),
        due_date: Set(request.due_date),
        submitted_date: Set(None),
        is_submitted: Set(false),
        notes: Set(request.notes.clone()),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(|e| AppError::conflict_on_unique(e, "TAX_RETURN_EXISTS", conflict_message))?;

    info!("Tax return created successfully with ID: {}", created.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            TaxReturnResponse::from(created),
            "Tax return created successfully",
        )),
    ))
}

/// List tax returns by customer, year and submission state
#[utoipa::path(
    get,
    path = "/api/tax-returns",
    tag = "tax-returns",
    params(TaxReturnQuery),
    responses(
        (status = 200, description = "Tax returns retrieved successfully", body = ApiResponse<Page<TaxReturnResponse>>),
        (status = 400, description = "Invalid query", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_tax_returns(
    State(state): State<AppState>,
    Valid(Query(query)): Valid<Query<TaxReturnQuery>>,
) -> AppResult<Json<ApiResponse<Page<TaxReturnResponse>>>> {
    trace!("Entering get_tax_returns function");
    let page = query.page.unwrap_or(1);
    let page_size = query.page_size.unwrap_or(50);

    let mut select = TaxReturn::find();
    if let Some(customer_id) = query.customer_id {
        select = select.filter(tax_return::Column::CustomerId.eq(customer_id));
    }
    if let Some(year) = query.year {
        select = select.filter(tax_return::Column::Period.starts_with(format!("{:04}", year)));
    }
    if let Some(is_submitted) = query.is_submitted {
        select = select.filter(tax_return::Column::IsSubmitted.eq(is_submitted));
    }

    let paginator = select
        .order_by_asc(tax_return::Column::DueDate)
        .order_by_asc(tax_return::Column::Id)
        .paginate(&state.db, page_size);
    let totals = paginator.num_items_and_pages().await?;
    let rows = paginator.fetch_page(page - 1).await?;
    debug!("Fetched {} of {} tax returns", rows.len(), totals.number_of_items);

    let page = Page {
        items: rows.into_iter().map(TaxReturnResponse::from).collect(),
        total: totals.number_of_items,
        page,
        page_size,
        total_pages: totals.number_of_pages,
    };
    Ok(Json(ApiResponse::ok(page, "Tax returns retrieved successfully")))
}

/// Mark a tax return as submitted or not, or edit its notes
#[utoipa::path(
    patch,
    path = "/api/tax-returns",
    tag = "tax-returns",
    params(IdQuery),
    request_body = UpdateTaxReturnRequest,
    responses(
        (status = 200, description = "Tax return updated successfully", body = ApiResponse<TaxReturnResponse>),
        (status = 400, description = "submitted_date given with is_submitted false", body = ErrorResponse),
        (status = 404, description = "Tax return not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_tax_return(
    State(state): State<AppState>,
    Query(IdQuery { id }): Query<IdQuery>,
    Json(request): Json<UpdateTaxReturnRequest>,
) -> AppResult<Json<ApiResponse<TaxReturnResponse>>> {
    trace!("Entering update_tax_return function for ID: {}", id);
    let existing = TaxReturn::find_by_id(id).one(&state.db).await?.ok_or_else(|| {
        warn!("Tax return with ID {} not found", id);
        AppError::not_found("Tax return", id)
    })?;

    let stamped = existing.submitted_date.filter(|_| existing.is_submitted);
    let mut active: tax_return::ActiveModel = existing.into();
    match (request.is_submitted, request.submitted_date) {
        (Some(false), Some(_)) => {
            return Err(AppError::Validation(
                "submitted_date cannot be set on a return marked as not submitted".to_string(),
            ));
        }
        (Some(false), None) => {
            active.is_submitted = Set(false);
            active.submitted_date = Set(None);
        }
        (_, Some(submitted)) => {
            active.is_submitted = Set(true);
            active.submitted_date = Set(Some(submitted));
        }
        (Some(true), None) => {
            // A repeated submit keeps the first stamp.
            let submitted = stamped.unwrap_or_else(|| Utc::now().naive_utc());
            active.is_submitted = Set(true);
            active.submitted_date = Set(Some(submitted));
        }
        (None, None) => {}
    }
    if let Some(due_date) = request.due_date {
        active.due_date = Set(due_date);
    }
    if request.notes.is_some() {
        active.notes = Set(request.notes.clone());
    }

    let updated = active.update(&state.db).await?;
    info!("Tax return {} updated, submitted: {}", id, updated.is_submitted);
    Ok(Json(ApiResponse::ok(
        TaxReturnResponse::from(updated),
        "Tax return updated successfully",
    )))
}

/// Delete a tax return
#[utoipa::path(
    delete,
    path = "/api/tax-returns",
    tag = "tax-returns",
    params(IdQuery),
    responses(
        (status = 200, description = "Tax return deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Tax return not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_tax_return(
    State(state): State<AppState>,
    Query(IdQuery { id }): Query<IdQuery>,
) -> AppResult<Json<ApiResponse<String>>> {
    let result = TaxReturn::delete_by_id(id).exec(&state.db).await?;
    if result.rows_affected == 0 {
        warn!("Tax return with ID {} not found for deletion", id);
        return Err(AppError::not_found("Tax return", id));
    }
    info!("Tax return {} deleted", id);
    Ok(Json(ApiResponse::ok(
        format!("Tax return {} deleted", id),
        "Tax return deleted successfully",
    )))
}

/// Store the missing tax returns of a customer for one year
#[utoipa::path(
    post,
    path = "/api/tax-returns/generate",
    tag = "tax-returns",
    request_body = GenerateRequest,
    responses(
        (status = 200, description = "Tax returns generated", body = ApiResponse<GenerationResponse>),
        (status = 400, description = "A declaration setting cannot be scheduled", body = ErrorResponse),
        (status = 404, description = "Customer not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> AppResult<Json<ApiResponse<GenerationResponse>>> {
    trace!("Entering generate function");
    request.validate()?;

    let report = generate_tax_returns(
        &state.db,
        request.customer_id,
        request.year,
        state.config.day_overflow(),
    )
    .await?;

    let message = format!(
        "{} tax returns created, {} already present",
        report.created.len(),
        report.skipped.len()
    );
    info!("{}", message);
    Ok(Json(ApiResponse::ok(
        GenerationResponse {
            created: report.created.into_iter().map(Into::into).collect(),
            skipped: report.skipped.into_iter().map(Into::into).collect(),
        },
        message,
    )))
}

/// Compute the tax returns of a customer for one year without storing them
#[utoipa::path(
    get,
    path = "/api/tax-returns/preview",
    tag = "tax-returns",
    params(GenerateRequest),
    responses(
        (status = 200, description = "Drafts computed", body = ApiResponse<Vec<TaxReturnDraftResponse>>),
        (status = 400, description = "A declaration setting cannot be scheduled", body = ErrorResponse),
        (status = 404, description = "Customer not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn preview(
    State(state): State<AppState>,
    Valid(Query(request)): Valid<Query<GenerateRequest>>,
) -> AppResult<Json<ApiResponse<Vec<TaxReturnDraftResponse>>>> {
    let drafts = preview_tax_returns(
        &state.db,
        request.customer_id,
        request.year,
        state.config.day_overflow(),
    )
    .await?;
    debug!("Previewed {} drafts", drafts.len());
    Ok(Json(ApiResponse::ok(
        drafts.into_iter().map(Into::into).collect(),
        "Drafts computed successfully",
    )))
}
