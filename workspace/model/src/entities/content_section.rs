use chrono::NaiveDateTime;
use sea_orm::entity::prelude::*;

/// Heading text shown around a content collection. One row per collection,
/// keyed by the collection slug.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "content_sections")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub kind: String,
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub paragraph: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub footer: Option<String>,
    pub updated_at: NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
