use crate::error::{AppError, AppResult};
use crate::helpers::data_url::check_data_url;
use crate::schemas::{ApiResponse, AppState, ErrorResponse, IdQuery};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use chrono::{NaiveDate, NaiveDateTime};
use common::Page;
use compute::listing::{paginate, ListQuery, Listable, SortDirection, SortKey};
use compute::{DeclarationSchedule, Frequency};
use model::entities::{
    authorized_person, branch, customer, customer_credential, customer_document,
    declaration_setting, declaration_type, prelude::*,
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, instrument, trace, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Authorized person as sent by the customer form
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
pub struct AuthorizedPersonPayload {
    #[validate(length(min = 1, message = "full_name is required"))]
    pub full_name: String,
    /// T.C. identity number
    pub national_id: Option<String>,
    pub title: Option<String>,
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    /// Share in the company, in percent
    #[schema(value_type = Option<String>)]
    pub share_ratio: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
pub struct BranchPayload {
    #[validate(length(min = 1, message = "branch name is required"))]
    pub name: String,
    pub address: Option<String>,
    pub city_id: Option<i32>,
    pub district_id: Option<i32>,
}

/// Uploaded document; `data_url` holds the base64 file
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
pub struct DocumentPayload {
    #[validate(length(min = 1, message = "document name is required"))]
    pub name: String,
    pub data_url: String,
}

/// Login for a government or bank portal kept on behalf of the customer
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
pub struct CredentialPayload {
    #[validate(length(min = 1, message = "system is required"))]
    pub system: String,
    #[validate(length(min = 1, message = "username is required"))]
    pub username: String,
    pub password: String,
    pub notes: Option<String>,
}

/// Declaration setting; omitted schedule fields come from the catalog
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
pub struct DeclarationSettingPayload {
    #[validate(length(min = 1, message = "declaration_type is required"))]
    pub declaration_type: String,
    pub enabled: Option<bool>,
    /// `monthly`, `quarterly` or `yearly`
    pub frequency: Option<String>,
    pub due_day: Option<i32>,
    pub due_hour: Option<i32>,
    pub due_minute: Option<i32>,
    pub due_month: Option<i32>,
    pub quarter_offset: Option<i32>,
    pub yearly_count: Option<i32>,
    pub skip_quarter: Option<i32>,
}

/// Request body for creating a customer
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateCustomerRequest {
    #[validate(length(min = 1, max = 255, message = "company_name is required"))]
    pub company_name: String,
    /// `sole_proprietorship`, `limited`, `joint_stock` or `other`
    pub company_type: String,
    #[validate(length(min = 1, max = 11, message = "tax_number is required"))]
    pub tax_number: String,
    pub tax_office_id: Option<i32>,
    pub activity_code: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city_id: Option<i32>,
    pub district_id: Option<i32>,
    pub established_on: Option<NaiveDate>,
    pub membership_start: Option<NaiveDate>,
    pub membership_end: Option<NaiveDate>,
    /// Logo as a base64 data URL
    pub logo: Option<String>,
    pub notes: Option<String>,
    pub is_active: Option<bool>,
    pub authorized_persons: Option<Vec<AuthorizedPersonPayload>>,
    pub branches: Option<Vec<BranchPayload>>,
    pub documents: Option<Vec<DocumentPayload>>,
    pub credentials: Option<Vec<CredentialPayload>>,
    pub declaration_settings: Option<Vec<DeclarationSettingPayload>>,
}

/// Request body for a partial customer update
///
/// A child list that is present replaces the stored collection.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema, Validate)]
pub struct UpdateCustomerRequest {
    #[validate(length(min = 1, max = 255, message = "company_name must not be empty"))]
    pub company_name: Option<String>,
    pub company_type: Option<String>,
    #[validate(length(min = 1, max = 11, message = "tax_number must not be empty"))]
    pub tax_number: Option<String>,
    pub tax_office_id: Option<i32>,
    pub activity_code: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city_id: Option<i32>,
    pub district_id: Option<i32>,
    pub established_on: Option<NaiveDate>,
    pub membership_start: Option<NaiveDate>,
    pub membership_end: Option<NaiveDate>,
    pub logo: Option<String>,
    pub notes: Option<String>,
    pub is_active: Option<bool>,
    pub authorized_persons: Option<Vec<AuthorizedPersonPayload>>,
    pub branches: Option<Vec<BranchPayload>>,
    pub documents: Option<Vec<DocumentPayload>>,
    pub credentials: Option<Vec<CredentialPayload>>,
    pub declaration_settings: Option<Vec<DeclarationSettingPayload>>,
}

/// Customer row shown in the customer list
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CustomerResponse {
    pub id: i32,
    pub company_name: String,
    pub company_type: String,
    pub tax_number: String,
    pub tax_office_id: Option<i32>,
    pub activity_code: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub city_id: Option<i32>,
    pub district_id: Option<i32>,
    pub established_on: Option<NaiveDate>,
    pub membership_start: Option<NaiveDate>,
    pub membership_end: Option<NaiveDate>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<&customer::Model> for CustomerResponse {
    fn from(model: &customer::Model) -> Self {
        Self {
            id: model.id,
            company_name: model.company_name.clone(),
            company_type: company_type_name(model.company_type).to_string(),
            tax_number: model.tax_number.clone(),
            tax_office_id: model.tax_office_id,
            activity_code: model.activity_code.clone(),
            email: model.email.clone(),
            phone: model.phone.clone(),
            city_id: model.city_id,
            district_id: model.district_id,
            established_on: model.established_on,
            membership_start: model.membership_start,
            membership_end: model.membership_end,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl Listable for CustomerResponse {
    fn sortable_fields() -> &'static [&'static str] {
        &[
            "company_name",
            "company_type",
            "tax_number",
            "established_on",
            "membership_end",
            "created_at",
        ]
    }

    fn search_text(&self) -> Vec<&str> {
        let mut text = vec![self.company_name.as_str(), self.tax_number.as_str()];
        text.extend(self.email.as_deref());
        text.extend(self.phone.as_deref());
        text.extend(self.activity_code.as_deref());
        text
    }

    fn sort_key(&self, field: &str) -> Option<SortKey> {
        match field {
            "company_name" => Some(SortKey::text(&self.company_name)),
            "company_type" => Some(SortKey::text(&self.company_type)),
            "tax_number" => Some(SortKey::text(&self.tax_number)),
            "established_on" => Some(SortKey::optional_date(self.established_on)),
            "membership_end" => Some(SortKey::optional_date(self.membership_end)),
            "created_at" => Some(SortKey::DateTime(self.created_at)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthorizedPersonResponse {
    pub id: i32,
    pub full_name: String,
    pub national_id: Option<String>,
    pub title: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    #[schema(value_type = Option<String>)]
    pub share_ratio: Option<Decimal>,
}

impl From<authorized_person::Model> for AuthorizedPersonResponse {
    fn from(model: authorized_person::Model) -> Self {
        Self {
            id: model.id,
            full_name: model.full_name,
            national_id: model.national_id,
            title: model.title,
            phone: model.phone,
            email: model.email,
            share_ratio: model.share_ratio,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BranchResponse {
    pub id: i32,
    pub name: String,
    pub address: Option<String>,
    pub city_id: Option<i32>,
    pub district_id: Option<i32>,
}

impl From<branch::Model> for BranchResponse {
    fn from(model: branch::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            address: model.address,
            city_id: model.city_id,
            district_id: model.district_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DocumentResponse {
    pub id: i32,
    pub name: String,
    pub data_url: String,
    pub uploaded_at: NaiveDateTime,
}

impl From<customer_document::Model> for DocumentResponse {
    fn from(model: customer_document::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            data_url: model.data_url,
            uploaded_at: model.uploaded_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CredentialResponse {
    pub id: i32,
    pub system: String,
    pub username: String,
    pub password: String,
    pub notes: Option<String>,
}

impl From<customer_credential::Model> for CredentialResponse {
    fn from(model: customer_credential::Model) -> Self {
        Self {
            id: model.id,
            system: model.system,
            username: model.username,
            password: model.password,
            notes: model.notes,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeclarationSettingResponse {
    pub id: i32,
    pub declaration_type: String,
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

impl From<declaration_setting::Model> for DeclarationSettingResponse {
    fn from(model: declaration_setting::Model) -> Self {
        Self {
            id: model.id,
            declaration_type: model.declaration_type,
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

/// Body of `GET /api/customers`: one customer's details when `id` is given,
/// otherwise a page of customers
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(untagged)]
pub enum CustomerLookup {
    Detail(CustomerDetailResponse),
    Page(Page<CustomerResponse>),
}

/// Customer with everything edited on the customer form
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CustomerDetailResponse {
    pub customer: CustomerResponse,
    pub address: Option<String>,
    pub logo: Option<String>,
    pub notes: Option<String>,
    pub authorized_persons: Vec<AuthorizedPersonResponse>,
    pub branches: Vec<BranchResponse>,
    pub documents: Vec<DocumentResponse>,
    pub credentials: Vec<CredentialResponse>,
    pub declaration_settings: Vec<DeclarationSettingResponse>,
}

/// Query parameters for `GET /api/customers`
#[derive(Debug, Deserialize, ToSchema, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct CustomerQuery {
    /// Return this customer with all details instead of a list
    pub id: Option<i32>,
    /// Matched against name, tax number, e-mail, phone and activity code
    pub search: Option<String>,
    pub sort_by: Option<String>,
    /// `asc` or `desc`
    pub direction: Option<String>,
    #[validate(range(min = 1, max = 10000))]
    pub page: Option<u64>,
    #[validate(range(min = 1, max = 200))]
    pub page_size: Option<u64>,
}

pub(crate) fn company_type_name(company_type: customer::CompanyType) -> &'static str {
    match company_type {
        customer::CompanyType::SoleProprietorship => "sole_proprietorship",
        customer::CompanyType::Limited => "limited",
        customer::CompanyType::JointStock => "joint_stock",
        customer::CompanyType::Other => "other",
    }
}

fn parse_company_type(value: &str) -> AppResult<customer::CompanyType> {
    match value {
        "sole_proprietorship" => Ok(customer::CompanyType::SoleProprietorship),
        "limited" => Ok(customer::CompanyType::Limited),
        "joint_stock" => Ok(customer::CompanyType::JointStock),
        "other" => Ok(customer::CompanyType::Other),
        _ => Err(AppError::Validation(format!("Unknown company_type '{}'", value))),
    }
}

pub(crate) fn require_text(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

fn check_membership(start: Option<NaiveDate>, end: Option<NaiveDate>) -> AppResult<()> {
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            return Err(AppError::InvalidMembershipPeriod { start, end });
        }
    }
    Ok(())
}

/// Validation shared by create and update for the child collections.
fn check_children(
    persons: Option<&[AuthorizedPersonPayload]>,
    branches: Option<&[BranchPayload]>,
    documents: Option<&[DocumentPayload]>,
    credentials: Option<&[CredentialPayload]>,
    settings: Option<&[DeclarationSettingPayload]>,
) -> AppResult<()> {
    for person in persons.unwrap_or_default() {
        person.validate()?;
        require_text("full_name", &person.full_name)?;
    }
    for branch in branches.unwrap_or_default() {
        branch.validate()?;
        require_text("branch name", &branch.name)?;
    }
    for document in documents.unwrap_or_default() {
        document.validate()?;
        check_data_url(&document.name, Some(&document.data_url))?;
    }
    for credential in credentials.unwrap_or_default() {
        credential.validate()?;
        require_text("system", &credential.system)?;
        require_text("username", &credential.username)?;
    }
    for setting in settings.unwrap_or_default() {
        setting.validate()?;
        require_text("declaration_type", &setting.declaration_type)?;
    }
    Ok(())
}

/// Resolves a setting payload against the catalog into a stored row.
fn build_setting(
    customer_id: i32,
    payload: &DeclarationSettingPayload,
    catalog: &HashMap<String, declaration_type::Model>,
) -> AppResult<declaration_setting::ActiveModel> {
    let entry = catalog.get(&payload.declaration_type);

    let frequency = match (&payload.frequency, entry) {
        (Some(frequency), _) => frequency
            .parse::<Frequency>()
            .map_err(AppError::Validation)?,
        (None, Some(entry)) => Frequency::from(entry.frequency),
        (None, None) => {
            return Err(AppError::Validation(format!(
                "frequency is required for '{}', which is not in the catalog",
                payload.declaration_type
            )));
        }
    };

    let pick = |own: Option<i32>, default: Option<i32>| own.or(default);
    let due_day = pick(payload.due_day, entry.map(|e| e.due_day)).ok_or_else(|| {
        AppError::Validation(format!("due_day is required for '{}'", payload.declaration_type))
    })?;

    let model = declaration_setting::Model {
        id: 0,
        customer_id,
        declaration_type: payload.declaration_type.trim().to_string(),
        enabled: payload.enabled.unwrap_or(true),
        frequency: frequency.into(),
        due_day,
        due_hour: pick(payload.due_hour, entry.map(|e| e.due_hour)).unwrap_or(23),
        due_minute: pick(payload.due_minute, entry.map(|e| e.due_minute)).unwrap_or(59),
        due_month: pick(payload.due_month, entry.and_then(|e| e.due_month)),
        quarter_offset: pick(payload.quarter_offset, entry.and_then(|e| e.quarter_offset)),
        yearly_count: pick(payload.yearly_count, entry.and_then(|e| e.yearly_count)),
        skip_quarter: pick(payload.skip_quarter, entry.and_then(|e| e.skip_quarter)),
    };
    DeclarationSchedule::from_setting(&model)?;

    Ok(declaration_setting::ActiveModel {
        customer_id: Set(model.customer_id),
        declaration_type: Set(model.declaration_type),
        enabled: Set(model.enabled),
        frequency: Set(model.frequency),
        due_day: Set(model.due_day),
        due_hour: Set(model.due_hour),
        due_minute: Set(model.due_minute),
        due_month: Set(model.due_month),
        quarter_offset: Set(model.quarter_offset),
        yearly_count: Set(model.yearly_count),
        skip_quarter: Set(model.skip_quarter),
        ..Default::default()
    })
}

/// Child collections of one request; `None` leaves a collection untouched.
struct Children<'a> {
    persons: Option<&'a [AuthorizedPersonPayload]>,
    branches: Option<&'a [BranchPayload]>,
    documents: Option<&'a [DocumentPayload]>,
    credentials: Option<&'a [CredentialPayload]>,
    settings: Option<&'a [DeclarationSettingPayload]>,
}

async fn replace_children(txn: &DatabaseTransaction, customer_id: i32, children: Children<'_>) -> AppResult<()> {
    if let Some(persons) = children.persons {
        trace!("Replacing {} authorized persons", persons.len());
        AuthorizedPerson::delete_many()
            .filter(authorized_person::Column::CustomerId.eq(customer_id))
            .exec(txn)
            .await?;
        for person in persons {
            authorized_person::ActiveModel {
                customer_id: Set(customer_id),
                full_name: Set(person.full_name.trim().to_string()),
                national_id: Set(person.national_id.clone()),
                title: Set(person.title.clone()),
                phone: Set(person.phone.clone()),
                email: Set(person.email.clone()),
                share_ratio: Set(person.share_ratio),
                ..Default::default()
            }
            .insert(txn)
            .await?;
        }
    }

    if let Some(branches) = children.branches {
        trace!("Replacing {} branches", branches.len());
        Branch::delete_many()
            .filter(branch::Column::CustomerId.eq(customer_id))
            .exec(txn)
            .await?;
        for item in branches {
            branch::ActiveModel {
                customer_id: Set(customer_id),
                name: Set(item.name.trim().to_string()),
                address: Set(item.address.clone()),
                city_id: Set(item.city_id),
                district_id: Set(item.district_id),
                ..Default::default()
            }
            .insert(txn)
            .await?;
        }
    }

    if let Some(documents) = children.documents {
        trace!("Replacing {} documents", documents.len());
        CustomerDocument::delete_many()
            .filter(customer_document::Column::CustomerId.eq(customer_id))
            .exec(txn)
            .await?;
        for document in documents {
            let mut row = customer_document::ActiveModel::new();
            row.customer_id = Set(customer_id);
            row.name = Set(document.name.clone());
            row.data_url = Set(document.data_url.clone());
            row.insert(txn).await?;
        }
    }

    if let Some(credentials) = children.credentials {
        trace!("Replacing {} credentials", credentials.len());
        CustomerCredential::delete_many()
            .filter(customer_credential::Column::CustomerId.eq(customer_id))
            .exec(txn)
            .await?;
        for credential in credentials {
            customer_credential::ActiveModel {
                customer_id: Set(customer_id),
                system: Set(credential.system.trim().to_string()),
                username: Set(credential.username.clone()),
                password: Set(credential.password.clone()),
                notes: Set(credential.notes.clone()),
                ..Default::default()
            }
            .insert(txn)
            .await?;
        }
    }

    if let Some(settings) = children.settings {
        trace!("Replacing {} declaration settings", settings.len());
        let catalog: HashMap<String, declaration_type::Model> = DeclarationType::find()
            .all(txn)
            .await?
            .into_iter()
            .map(|entry| (entry.name.clone(), entry))
            .collect();

        let mut seen = std::collections::HashSet::new();
        let mut rows = Vec::with_capacity(settings.len());
        for setting in settings {
            if !seen.insert(setting.declaration_type.trim().to_string()) {
                return Err(AppError::Validation(format!(
                    "Declaration '{}' is listed twice",
                    setting.declaration_type
                )));
            }
            rows.push(build_setting(customer_id, setting, &catalog)?);
        }

        DeclarationSetting::delete_many()
            .filter(declaration_setting::Column::CustomerId.eq(customer_id))
            .exec(txn)
            .await?;
        for row in rows {
            row.insert(txn).await?;
        }
    }

    Ok(())
}

pub(crate) async fn load_customer_detail<C: ConnectionTrait>(
    db: &C,
    customer_id: i32,
) -> AppResult<CustomerDetailResponse> {
    let model = Customer::find_by_id(customer_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::not_found("Customer", customer_id))?;

    let persons = model
        .find_related(AuthorizedPerson)
        .order_by_asc(authorized_person::Column::Id)
        .all(db)
        .await?;
    let branches = model
        .find_related(Branch)
        .order_by_asc(branch::Column::Id)
        .all(db)
        .await?;
    let documents = model
        .find_related(CustomerDocument)
        .order_by_asc(customer_document::Column::Id)
        .all(db)
        .await?;
    let credentials = model
        .find_related(CustomerCredential)
        .order_by_asc(customer_credential::Column::Id)
        .all(db)
        .await?;
    let settings = model
        .find_related(DeclarationSetting)
        .order_by_asc(declaration_setting::Column::Id)
        .all(db)
        .await?;

    Ok(CustomerDetailResponse {
        customer: CustomerResponse::from(&model),
        address: model.address,
        logo: model.logo,
        notes: model.notes,
        authorized_persons: persons.into_iter().map(Into::into).collect(),
        branches: branches.into_iter().map(Into::into).collect(),
        documents: documents.into_iter().map(Into::into).collect(),
        credentials: credentials.into_iter().map(Into::into).collect(),
        declaration_settings: settings.into_iter().map(Into::into).collect(),
    })
}

/// Get one customer with details, or a filtered page of customers
#[utoipa::path(
    get,
    path = "/api/customers",
    tag = "customers",
    params(CustomerQuery),
    responses(
        (status = 200, description = "CustomerDetailResponse when `id` is given, otherwise Page<CustomerResponse>", body = ApiResponse<CustomerLookup>),
        (status = 400, description = "Invalid query", body = ErrorResponse),
        (status = 404, description = "Customer not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_customers(
    State(state): State<AppState>,
    Valid(Query(query)): Valid<Query<CustomerQuery>>,
) -> AppResult<Json<ApiResponse<CustomerLookup>>> {
    trace!("Entering get_customers function");

    if let Some(id) = query.id {
        debug!("Fetching customer with ID: {}", id);
        let detail = load_customer_detail(&state.db, id).await?;
        info!("Successfully retrieved customer with ID: {}", id);
        return Ok(Json(ApiResponse::ok(
            CustomerLookup::Detail(detail),
            "Customer retrieved successfully",
        )));
    }

    let direction = match query.direction.as_deref() {
        Some(direction) => direction.parse::<SortDirection>().map_err(AppError::Validation)?,
        None => SortDirection::Asc,
    };
    let list_query = ListQuery {
        search: query.search.clone(),
        sort_by: query.sort_by.clone().or_else(|| Some("company_name".to_string())),
        direction,
        page: query.page.unwrap_or(1),
        page_size: query.page_size.unwrap_or(20),
    };

    let customers: Vec<CustomerResponse> = Customer::find()
        .order_by_asc(customer::Column::Id)
        .all(&state.db)
        .await?
        .iter()
        .map(CustomerResponse::from)
        .collect();
    debug!("Loaded {} customers before filtering", customers.len());

    let page = paginate(customers, &list_query)?;
    info!("Returning {} of {} customers", page.items.len(), page.total);
    Ok(Json(ApiResponse::ok(
        CustomerLookup::Page(page),
        "Customers retrieved successfully",
    )))
}

/// Create a customer together with its child collections
#[utoipa::path(
    post,
    path = "/api/customers",
    tag = "customers",
    request_body = CreateCustomerRequest,
    responses(
        (status = 201, description = "Customer created successfully", body = ApiResponse<CustomerDetailResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request), fields(company_name = %request.company_name))]
pub async fn create_customer(
    State(state): State<AppState>,
    Json(request): Json<CreateCustomerRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<CustomerDetailResponse>>)> {
    trace!("Entering create_customer function");

    request.validate()?;
    require_text("company_name", &request.company_name)?;
    require_text("tax_number", &request.tax_number)?;
    let company_type = parse_company_type(&request.company_type)?;
    check_membership(request.membership_start, request.membership_end)?;
    check_data_url("logo", request.logo.as_deref())?;
    check_children(
        request.authorized_persons.as_deref(),
        request.branches.as_deref(),
        request.documents.as_deref(),
        request.credentials.as_deref(),
        request.declaration_settings.as_deref(),
    )?;

    let txn = state.db.begin().await?;
    let created = customer::ActiveModel {
        company_name: Set(request.company_name.trim().to_string()),
        company_type: Set(company_type),
        tax_number: Set(request.tax_number.trim().to_string()),
        tax_office_id: Set(request.tax_office_id),
        activity_code: Set(request.activity_code.clone()),
        email: Set(request.email.clone()),
        phone: Set(request.phone.clone()),
        address: Set(request.address.clone()),
        city_id: Set(request.city_id),
        district_id: Set(request.district_id),
        established_on: Set(request.established_on),
        membership_start: Set(request.membership_start),
        membership_end: Set(request.membership_end),
        logo: Set(request.logo.clone()),
        notes: Set(request.notes.clone()),
        is_active: Set(request.is_active.unwrap_or(true)),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    replace_children(
        &txn,
        created.id,
        Children {
            persons: request.authorized_persons.as_deref(),
            branches: request.branches.as_deref(),
            documents: request.documents.as_deref(),
            credentials: request.credentials.as_deref(),
            settings: request.declaration_settings.as_deref(),
        },
    )
    .await?;
    txn.commit().await?;

    info!("Customer created successfully with ID: {}", created.id);
    let detail = load_customer_detail(&state.db, created.id).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(detail, "Customer created successfully")),
    ))
}

/// Partially update a customer
#[utoipa::path(
    patch,
    path = "/api/customers",
    tag = "customers",
    params(IdQuery),
    request_body = UpdateCustomerRequest,
    responses(
        (status = 200, description = "Customer updated successfully", body = ApiResponse<CustomerDetailResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Customer not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn update_customer(
    State(state): State<AppState>,
    Query(IdQuery { id }): Query<IdQuery>,
    Json(request): Json<UpdateCustomerRequest>,
) -> AppResult<Json<ApiResponse<CustomerDetailResponse>>> {
    trace!("Entering update_customer function for ID: {}", id);

    request.validate()?;
    if let Some(name) = &request.company_name {
        require_text("company_name", name)?;
    }
    if let Some(tax_number) = &request.tax_number {
        require_text("tax_number", tax_number)?;
    }
    check_data_url("logo", request.logo.as_deref())?;
    check_children(
        request.authorized_persons.as_deref(),
        request.branches.as_deref(),
        request.documents.as_deref(),
        request.credentials.as_deref(),
        request.declaration_settings.as_deref(),
    )?;

    let txn = state.db.begin().await?;
    let existing = Customer::find_by_id(id).one(&txn).await?.ok_or_else(|| {
        warn!("Customer with ID {} not found", id);
        AppError::not_found("Customer", id)
    })?;

    check_membership(
        request.membership_start.or(existing.membership_start),
        request.membership_end.or(existing.membership_end),
    )?;

    let mut active: customer::ActiveModel = existing.into();
    if let Some(name) = &request.company_name {
        active.company_name = Set(name.trim().to_string());
    }
    if let Some(company_type) = &request.company_type {
        active.company_type = Set(parse_company_type(company_type)?);
    }
    if let Some(tax_number) = &request.tax_number {
        active.tax_number = Set(tax_number.trim().to_string());
    }
    if request.tax_office_id.is_some() {
        active.tax_office_id = Set(request.tax_office_id);
    }
    if request.activity_code.is_some() {
        active.activity_code = Set(request.activity_code.clone());
    }
    if request.email.is_some() {
        active.email = Set(request.email.clone());
    }
    if request.phone.is_some() {
        active.phone = Set(request.phone.clone());
    }
    if request.address.is_some() {
        active.address = Set(request.address.clone());
    }
    if request.city_id.is_some() {
        active.city_id = Set(request.city_id);
    }
    if request.district_id.is_some() {
        active.district_id = Set(request.district_id);
    }
    if request.established_on.is_some() {
        active.established_on = Set(request.established_on);
    }
    if request.membership_start.is_some() {
        active.membership_start = Set(request.membership_start);
    }
    if request.membership_end.is_some() {
        active.membership_end = Set(request.membership_end);
    }
    if request.logo.is_some() {
        active.logo = Set(request.logo.clone());
    }
    if request.notes.is_some() {
        active.notes = Set(request.notes.clone());
    }
    if let Some(is_active) = request.is_active {
        active.is_active = Set(is_active);
    }
    active.update(&txn).await?;

    replace_children(
        &txn,
        id,
        Children {
            persons: request.authorized_persons.as_deref(),
            branches: request.branches.as_deref(),
            documents: request.documents.as_deref(),
            credentials: request.credentials.as_deref(),
            settings: request.declaration_settings.as_deref(),
        },
    )
    .await?;
    txn.commit().await?;

    info!("Customer {} updated successfully", id);
    let detail = load_customer_detail(&state.db, id).await?;
    Ok(Json(ApiResponse::ok(detail, "Customer updated successfully")))
}

/// Delete a customer with all children and tax returns
#[utoipa::path(
    delete,
    path = "/api/customers",
    tag = "customers",
    params(IdQuery),
    responses(
        (status = 200, description = "Customer deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Customer not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_customer(
    State(state): State<AppState>,
    Query(IdQuery { id }): Query<IdQuery>,
) -> AppResult<Json<ApiResponse<String>>> {
    trace!("Entering delete_customer function for ID: {}", id);

    let result = Customer::delete_by_id(id).exec(&state.db).await?;
    if result.rows_affected == 0 {
        warn!("Customer with ID {} not found for deletion", id);
        return Err(AppError::not_found("Customer", id));
    }

    info!("Customer {} deleted successfully", id);
    Ok(Json(ApiResponse::ok(
        format!("Customer {} deleted", id),
        "Customer deleted successfully",
    )))
}
