use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Campaigns::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Campaigns::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(Campaigns::Name).string().not_null())
          .col(ColumnDef::new(Campaigns::Description).string().not_null())
          .col(ColumnDef::new(Campaigns::TotalLimit).integer().not_null())
          .col(
            ColumnDef::new(Campaigns::UsedCount)
              .integer()
              .not_null()
              .default(0),
          )
          .col(ColumnDef::new(Campaigns::ExpiresAt).date_time().not_null())
          .col(
            ColumnDef::new(Campaigns::IsActive)
              .boolean()
              .not_null()
              .default(true),
          )
          .col(ColumnDef::new(Campaigns::CreatedAt).date_time().not_null())
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Campaigns::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Campaigns {
  Table,
  Id,
  Name,
  Description,
  TotalLimit,
  UsedCount,
  ExpiresAt,
  IsActive,
  CreatedAt,
}
