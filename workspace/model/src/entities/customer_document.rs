use chrono::{NaiveDateTime, Utc};
use sea_orm::entity::prelude::*;

use super::customer;

/// A file attached to a customer, stored inline as a base64 data URL.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "customer_documents")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub customer_id: i32,
    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub data_url: String,
    pub uploaded_at: NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "customer::Entity",
        from = "Column::CustomerId",
        to = "customer::Column::Id",
        on_delete = "Cascade"
    )]
    Customer,
}

impl Related<customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl ActiveModelBehavior for ActiveModel {
    fn new() -> Self {
        Self {
            uploaded_at: sea_orm::ActiveValue::Set(Utc::now().naive_utc()),
            ..<Self as ActiveModelTrait>::default()
        }
    }
}
