use crate::entity_iden::EntityIden;
use model::entities::prelude::*;
use model::entities::{content_item, content_section};
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ContentItem::table())
                    .if_not_exists()
                    .col(pk_auto(ContentItem::column(content_item::Column::Id)))
                    .col(string_len(ContentItem::column(content_item::Column::Kind), 32))
                    .col(integer(ContentItem::column(content_item::Column::Position)))
                    .col(string(ContentItem::column(content_item::Column::Title)))
                    .col(string_null(ContentItem::column(content_item::Column::Subtitle)))
                    .col(text_null(ContentItem::column(content_item::Column::Description)))
                    .col(
                        decimal_null(ContentItem::column(content_item::Column::Price))
                            .decimal_len(12, 2),
                    )
                    .col(text_null(ContentItem::column(content_item::Column::Image)))
                    .col(json(ContentItem::column(content_item::Column::Extra)))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_content_items_kind_position")
                    .table(ContentItem::table())
                    .col(ContentItem::column(content_item::Column::Kind))
                    .col(ContentItem::column(content_item::Column::Position))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ContentSection::table())
                    .if_not_exists()
                    .col(
                        string_len(ContentSection::column(content_section::Column::Kind), 32)
                            .primary_key(),
                    )
                    .col(string(ContentSection::column(content_section::Column::Title)))
                    .col(text_null(ContentSection::column(content_section::Column::Paragraph)))
                    .col(text_null(ContentSection::column(content_section::Column::Footer)))
                    .col(date_time(ContentSection::column(content_section::Column::UpdatedAt)))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ContentSection::table()).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ContentItem::table()).to_owned())
            .await?;

        Ok(())
    }
}
