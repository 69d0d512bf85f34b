use sea_orm::entity::prelude::*;

use super::declaration_setting;

/// How often a declaration recurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum Frequency {
    #[sea_orm(string_value = "monthly")]
    Monthly,
    #[sea_orm(string_value = "quarterly")]
    Quarterly,
    #[sea_orm(string_value = "yearly")]
    Yearly,
}

/// Catalog entry for a declaration the office files for customers, with the
/// legal default schedule. Served as the declarations config.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "declaration_types")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Declaration name, e.g. "KDV1 Beyannamesi".
    #[sea_orm(unique)]
    pub name: String,
    /// Whether the declaration is offered to customers at all.
    #[sea_orm(default_value = "true")]
    pub enabled: bool,
    pub frequency: Frequency,
    pub due_day: i32,
    pub due_hour: i32,
    pub due_minute: i32,
    /// Month a yearly declaration is due in.
    pub due_month: Option<i32>,
    /// Months after quarter end a quarterly declaration is due.
    pub quarter_offset: Option<i32>,
    /// Number of quarters actually filed per year.
    pub yearly_count: Option<i32>,
    /// Quarter that is never filed.
    pub skip_quarter: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "declaration_setting::Entity")]
    DeclarationSetting,
}

impl Related<declaration_setting::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DeclarationSetting.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
