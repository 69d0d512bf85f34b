use chrono::NaiveDateTime;
use sea_orm::entity::prelude::*;

use super::customer;

/// One concrete filing obligation generated from a declaration setting.
///
/// `(customer_id, declaration_type, period)` is unique; regenerating a year
/// never stores a period twice.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "tax_returns")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub customer_id: i32,
    pub declaration_type: String,
    /// Period label: `YYYY-MM`, `YYYY-Qn` or `YYYY`.
    pub period: String,
    pub due_date: NaiveDateTime,
    pub submitted_date: Option<NaiveDateTime>,
    #[sea_orm(default_value = "false")]
    pub is_submitted: bool,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
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

impl ActiveModelBehavior for ActiveModel {}
