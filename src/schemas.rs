use crate::config::AppConfig;
use crate::handlers::{
    content::{
        ContentCollectionResponse, ContentItemPayload, ContentItemResponse, ReplaceContentRequest,
        SectionPayload, SectionResponse,
    },
    customers::{
        AuthorizedPersonPayload, AuthorizedPersonResponse, BranchPayload, BranchResponse,
        CreateCustomerRequest, CredentialPayload, CredentialResponse, CustomerDetailResponse,
        CustomerLookup, CustomerResponse, DeclarationSettingPayload, DeclarationSettingResponse,
        DocumentPayload, DocumentResponse, UpdateCustomerRequest,
    },
    declarations::{DeclarationTypePayload, DeclarationTypeResponse},
    lookups::{ActivityCodeResponse, CityResponse, DistrictResponse, TaxOfficeResponse},
    tax_returns::{
        CreateTaxReturnRequest, GenerateRequest, GenerationResponse, TaxReturnDraftResponse,
        TaxReturnResponse, UpdateTaxReturnRequest,
    },
};
use moka::future::Cache;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, OpenApi, ToSchema};

pub use common::{ApiResponse, Page};

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Cache for lookups and the declaration catalog
    pub cache: Cache<String, CachedData>,
    pub config: Arc<AppConfig>,
}

/// Cached data types
#[derive(Clone, Debug)]
pub enum CachedData {
    TaxOffices(Vec<TaxOfficeResponse>),
    Cities(Vec<CityResponse>),
    Districts(Vec<DistrictResponse>),
    ActivityCodes(Vec<ActivityCodeResponse>),
    DeclarationsConfig(Vec<DeclarationTypeResponse>),
}

/// `?id=` selecting one record
#[derive(Debug, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct IdQuery {
    pub id: i32,
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code, e.g. `VALIDATION_ERROR`
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

/// Health check response
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::customers::get_customers,
        crate::handlers::customers::create_customer,
        crate::handlers::customers::update_customer,
        crate::handlers::customers::delete_customer,
        crate::handlers::tax_returns::create_tax_return,
        crate::handlers::tax_returns::get_tax_returns,
        crate::handlers::tax_returns::update_tax_return,
        crate::handlers::tax_returns::delete_tax_return,
        crate::handlers::tax_returns::generate,
        crate::handlers::tax_returns::preview,
        crate::handlers::content::list_items,
        crate::handlers::content::create_item,
        crate::handlers::content::replace_items,
        crate::handlers::content::delete_item,
        crate::handlers::content::get_section,
        crate::handlers::content::put_section,
        crate::handlers::lookups::get_tax_offices,
        crate::handlers::lookups::get_cities,
        crate::handlers::lookups::get_districts,
        crate::handlers::lookups::get_activity_codes,
        crate::handlers::declarations::get_declarations_config,
        crate::handlers::declarations::put_declarations_config,
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            IdQuery,
            CreateCustomerRequest,
            UpdateCustomerRequest,
            AuthorizedPersonPayload,
            BranchPayload,
            DocumentPayload,
            CredentialPayload,
            DeclarationSettingPayload,
            CustomerResponse,
            CustomerDetailResponse,
            CustomerLookup,
            AuthorizedPersonResponse,
            BranchResponse,
            DocumentResponse,
            CredentialResponse,
            DeclarationSettingResponse,
            CreateTaxReturnRequest,
            UpdateTaxReturnRequest,
            TaxReturnResponse,
            TaxReturnDraftResponse,
            GenerateRequest,
            GenerationResponse,
            ContentItemPayload,
            ContentItemResponse,
            ReplaceContentRequest,
            SectionPayload,
            SectionResponse,
            ContentCollectionResponse,
            TaxOfficeResponse,
            CityResponse,
            DistrictResponse,
            ActivityCodeResponse,
            DeclarationTypePayload,
            DeclarationTypeResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "customers", description = "Customers of the bookkeeping office"),
        (name = "tax-returns", description = "Tax returns and their generation from declaration settings"),
        (name = "content", description = "Marketing site collections"),
        (name = "lookups", description = "Tax offices, cities, districts and activity codes"),
        (name = "declarations", description = "Declaration catalog"),
    ),
    info(
        title = "TaxDesk API",
        description = "Bookkeeping office console API: customers, declaration schedules and tax returns",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
