use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::Iterable;

/// The marketing-site collections edited from the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum ContentKind {
    #[sea_orm(string_value = "institutions")]
    Institutions,
    #[sea_orm(string_value = "pricing")]
    Pricing,
    #[sea_orm(string_value = "pricing/additional-services")]
    AdditionalServices,
    #[sea_orm(string_value = "services")]
    Services,
    #[sea_orm(string_value = "team")]
    Team,
    #[sea_orm(string_value = "testimonials")]
    Testimonials,
    #[sea_orm(string_value = "workflow")]
    Workflow,
}

impl ContentKind {
    /// URL segment(s) under `/api/content/`.
    pub fn slug(&self) -> &'static str {
        match self {
            ContentKind::Institutions => "institutions",
            ContentKind::Pricing => "pricing",
            ContentKind::AdditionalServices => "pricing/additional-services",
            ContentKind::Services => "services",
            ContentKind::Team => "team",
            ContentKind::Testimonials => "testimonials",
            ContentKind::Workflow => "workflow",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        <Self as Iterable>::iter().find(|kind| kind.slug() == slug)
    }

    /// Collections whose items carry a price.
    pub fn is_priced(&self) -> bool {
        matches!(self, ContentKind::Pricing | ContentKind::AdditionalServices)
    }
}

/// One ordered entry of a content collection (a service card, a pricing
/// plan, a team member, ...). Collection-specific fields live in `extra`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "content_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub kind: ContentKind,
    /// Display order within the collection, starting at 0.
    pub position: i32,
    pub title: String,
    pub subtitle: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))", nullable)]
    pub price: Option<Decimal>,
    /// Image as a base64 data URL.
    #[sea_orm(column_type = "Text", nullable)]
    pub image: Option<String>,
    pub extra: Json,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
