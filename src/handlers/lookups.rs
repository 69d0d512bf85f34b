use crate::error::AppResult;
use crate::schemas::{ApiResponse, AppState, CachedData, ErrorResponse};
use axum::{
    extract::{Query, State},
    response::Json,
};
use compute::listing::fold;
use model::entities::{activity_code, city, district, prelude::*, tax_office};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TaxOfficeResponse {
    pub id: i32,
    pub code: String,
    pub name: String,
    pub city_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CityResponse {
    pub id: i32,
    pub plate_code: i32,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DistrictResponse {
    pub id: i32,
    pub city_id: i32,
    pub name: String,
}

/// NACE activity code
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ActivityCodeResponse {
    pub id: i32,
    pub code: String,
    pub description: String,
}

impl From<tax_office::Model> for TaxOfficeResponse {
    fn from(model: tax_office::Model) -> Self {
        Self {
            id: model.id,
            code: model.code,
            name: model.name,
            city_name: model.city_name,
        }
    }
}

impl From<city::Model> for CityResponse {
    fn from(model: city::Model) -> Self {
        Self {
            id: model.id,
            plate_code: model.plate_code,
            name: model.name,
        }
    }
}

impl From<district::Model> for DistrictResponse {
    fn from(model: district::Model) -> Self {
        Self {
            id: model.id,
            city_id: model.city_id,
            name: model.name,
        }
    }
}

impl From<activity_code::Model> for ActivityCodeResponse {
    fn from(model: activity_code::Model) -> Self {
        Self {
            id: model.id,
            code: model.code,
            description: model.description,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DistrictQuery {
    /// Only districts of this city
    pub city_id: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ActivityCodeQuery {
    /// Matched against code and description
    pub search: Option<String>,
}

/// List tax offices
#[utoipa::path(
    get,
    path = "/api/tax-offices",
    tag = "lookups",
    responses(
        (status = 200, description = "Tax offices retrieved successfully", body = ApiResponse<Vec<TaxOfficeResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_tax_offices(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<TaxOfficeResponse>>>> {
    let key = "tax_offices".to_string();
    if let Some(CachedData::TaxOffices(offices)) = state.cache.get(&key).await {
        trace!("Serving tax offices from cache");
        return Ok(Json(ApiResponse::ok(offices, "Tax offices retrieved successfully")));
    }

    let offices: Vec<TaxOfficeResponse> = TaxOffice::find()
        .order_by_asc(tax_office::Column::Name)
        .all(&state.db)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    debug!("Loaded {} tax offices", offices.len());
    state
        .cache
        .insert(key, CachedData::TaxOffices(offices.clone()))
        .await;
    Ok(Json(ApiResponse::ok(offices, "Tax offices retrieved successfully")))
}

/// List cities ordered by plate code
#[utoipa::path(
    get,
    path = "/api/cities",
    tag = "lookups",
    responses(
        (status = 200, description = "Cities retrieved successfully", body = ApiResponse<Vec<CityResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_cities(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<CityResponse>>>> {
    let key = "cities".to_string();
    if let Some(CachedData::Cities(cities)) = state.cache.get(&key).await {
        trace!("Serving cities from cache");
        return Ok(Json(ApiResponse::ok(cities, "Cities retrieved successfully")));
    }

    let cities: Vec<CityResponse> = City::find()
        .order_by_asc(city::Column::PlateCode)
        .all(&state.db)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    state.cache.insert(key, CachedData::Cities(cities.clone())).await;
    Ok(Json(ApiResponse::ok(cities, "Cities retrieved successfully")))
}

/// List districts, optionally of one city
#[utoipa::path(
    get,
    path = "/api/districts",
    tag = "lookups",
    params(DistrictQuery),
    responses(
        (status = 200, description = "Districts retrieved successfully", body = ApiResponse<Vec<DistrictResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_districts(
    State(state): State<AppState>,
    Query(query): Query<DistrictQuery>,
) -> AppResult<Json<ApiResponse<Vec<DistrictResponse>>>> {
    let key = match query.city_id {
        Some(city_id) => format!("districts:{}", city_id),
        None => "districts".to_string(),
    };
    if let Some(CachedData::Districts(districts)) = state.cache.get(&key).await {
        trace!("Serving {} from cache", key);
        return Ok(Json(ApiResponse::ok(districts, "Districts retrieved successfully")));
    }

    let mut select = District::find();
    if let Some(city_id) = query.city_id {
        select = select.filter(district::Column::CityId.eq(city_id));
    }
    let districts: Vec<DistrictResponse> = select
        .order_by_asc(district::Column::Name)
        .all(&state.db)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    state
        .cache
        .insert(key, CachedData::Districts(districts.clone()))
        .await;
    Ok(Json(ApiResponse::ok(districts, "Districts retrieved successfully")))
}

/// List activity codes, optionally filtered by a search term
#[utoipa::path(
    get,
    path = "/api/activity-codes",
    tag = "lookups",
    params(ActivityCodeQuery),
    responses(
        (status = 200, description = "Activity codes retrieved successfully", body = ApiResponse<Vec<ActivityCodeResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_activity_codes(
    State(state): State<AppState>,
    Query(query): Query<ActivityCodeQuery>,
) -> AppResult<Json<ApiResponse<Vec<ActivityCodeResponse>>>> {
    let key = "activity_codes".to_string();
    let codes = match state.cache.get(&key).await {
        Some(CachedData::ActivityCodes(codes)) => codes,
        _ => {
            let codes: Vec<ActivityCodeResponse> = ActivityCode::find()
                .order_by_asc(activity_code::Column::Code)
                .all(&state.db)
                .await?
                .into_iter()
                .map(Into::into)
                .collect();
            state
                .cache
                .insert(key, CachedData::ActivityCodes(codes.clone()))
                .await;
            codes
        }
    };

    let codes = match query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(search) => {
            let needle = fold(search);
            codes
                .into_iter()
                .filter(|c| c.code.contains(search) || fold(&c.description).contains(&needle))
                .collect()
        }
        None => codes,
    };
    debug!("Returning {} activity codes", codes.len());
    Ok(Json(ApiResponse::ok(codes, "Activity codes retrieved successfully")))
}
