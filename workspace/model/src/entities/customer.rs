use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, ConnectionTrait};

use super::{
    authorized_person, branch, customer_credential, customer_document, declaration_setting,
    tax_return,
};

/// Legal form of a customer company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(24))")]
pub enum CompanyType {
    #[sea_orm(string_value = "sole_proprietorship")]
    SoleProprietorship,
    #[sea_orm(string_value = "limited")]
    Limited,
    #[sea_orm(string_value = "joint_stock")]
    JointStock,
    #[sea_orm(string_value = "other")]
    Other,
}

/// A company whose books are kept by the office.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "customers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub company_name: String,
    pub company_type: CompanyType,
    /// Tax identification number (VKN/TCKN).
    pub tax_number: String,
    /// Soft reference to `tax_offices`; lookups are re-seedable.
    pub tax_office_id: Option<i32>,
    pub activity_code: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city_id: Option<i32>,
    pub district_id: Option<i32>,
    /// Company establishment date. Filing periods ending before it are not generated.
    pub established_on: Option<NaiveDate>,
    pub membership_start: Option<NaiveDate>,
    pub membership_end: Option<NaiveDate>,
    /// Logo as a base64 data URL.
    #[sea_orm(column_type = "Text", nullable)]
    pub logo: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    #[sea_orm(default_value = "true")]
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "authorized_person::Entity")]
    AuthorizedPerson,
    #[sea_orm(has_many = "branch::Entity")]
    Branch,
    #[sea_orm(has_many = "customer_document::Entity")]
    Document,
    #[sea_orm(has_many = "customer_credential::Entity")]
    Credential,
    #[sea_orm(has_many = "declaration_setting::Entity")]
    DeclarationSetting,
    #[sea_orm(has_many = "tax_return::Entity")]
    TaxReturn,
}

impl Related<authorized_person::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AuthorizedPerson.def()
    }
}

impl Related<branch::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Branch.def()
    }
}

impl Related<customer_document::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Document.def()
    }
}

impl Related<customer_credential::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Credential.def()
    }
}

impl Related<declaration_setting::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DeclarationSetting.def()
    }
}

impl Related<tax_return::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TaxReturn.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    /// Keeps `created_at` / `updated_at` current on every write.
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let now = Utc::now().naive_utc();
        if insert && matches!(self.created_at, ActiveValue::NotSet) {
            self.created_at = ActiveValue::Set(now);
        }
        self.updated_at = ActiveValue::Set(now);
        Ok(self)
    }
}
