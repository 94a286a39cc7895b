//! Uniqueness of (doctype, name) plus a doctype lookup index.
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("ux_document_doctype_name")
                    .table(Document::Table)
                    .col(Document::Doctype)
                    .col(Document::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_document_doctype")
                    .table(Document::Table)
                    .col(Document::Doctype)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_document_doctype").table(Document::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("ux_document_doctype_name").table(Document::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Document { Table, Doctype, Name }
