//! Create `document` table.
//!
//! Every record of every doctype lives here; its attributes are kept in a JSON column.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Document::Table)
                    .if_not_exists()
                    .col(uuid(Document::Id).primary_key())
                    .col(string_len(Document::Doctype, 140).not_null())
                    .col(string_len(Document::Name, 140).not_null())
                    .col(json_binary(Document::Data).not_null())
                    .col(string_len(Document::Owner, 140).not_null())
                    .col(timestamp_with_time_zone(Document::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Document::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Document::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Document { Table, Id, Doctype, Name, Data, Owner, CreatedAt, UpdatedAt }
