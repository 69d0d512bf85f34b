use sea_orm::entity::prelude::*;

use super::customer;
use super::declaration_type::{self, Frequency};

/// A declaration configured for one customer.
///
/// `declaration_type` holds the catalog name rather than an id so that
/// custom declarations outside the catalog can be tracked as well.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "declaration_settings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub customer_id: i32,
    pub declaration_type: String,
    pub enabled: bool,
    pub frequency: Frequency,
    pub due_day: i32,
    pub due_hour: i32,
    pub due_minute: i32,
    pub due_month: Option<i32>,
    pub quarter_offset: Option<i32>,
    pub yearly_count: Option<i32>,
    pub skip_quarter: Option<i32>,
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
    #[sea_orm(
        belongs_to = "declaration_type::Entity",
        from = "Column::DeclarationType",
        to = "declaration_type::Column::Name"
    )]
    DeclarationType,
}

impl Related<customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl Related<declaration_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DeclarationType.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
