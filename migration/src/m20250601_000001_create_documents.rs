use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Documents::Table)
                    .if_not_exists()
                    .col(pk_auto(Documents::Seq))
                    .col(string(Documents::Id))
                    .col(string(Documents::Collection))
                    .col(text(Documents::Body))
                    .col(big_integer(Documents::InsertedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_documents_id_unique")
                    .table(Documents::Table)
                    .col(Documents::Id)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_documents_collection_seq")
                    .table(Documents::Table)
                    .col(Documents::Collection)
                    .col(Documents::Seq)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Documents::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Documents {
    Table,
    Seq,
    Id,
    Collection,
    Body,
    InsertedAt,
}
