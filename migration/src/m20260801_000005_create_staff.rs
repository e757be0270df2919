use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Staff::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Staff::TgUserId)
              .big_integer()
              .not_null()
              .primary_key(),
          )
          .col(ColumnDef::new(Staff::FirstName).string().null())
          .col(ColumnDef::new(Staff::LastName).string().null())
          .col(ColumnDef::new(Staff::Username).string().null())
          .col(
            ColumnDef::new(Staff::Role)
              .string()
              .not_null()
              .default("admin"),
          )
          .col(
            ColumnDef::new(Staff::IsActive)
              .boolean()
              .not_null()
              .default(true),
          )
          .col(ColumnDef::new(Staff::AddedBy).big_integer().null())
          .col(ColumnDef::new(Staff::AddedAt).date_time().not_null())
          .col(
            ColumnDef::new(Staff::RedemptionCount)
              .integer()
              .not_null()
              .default(0),
          )
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Staff::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Staff {
  Table,
  TgUserId,
  FirstName,
  LastName,
  Username,
  Role,
  IsActive,
  AddedBy,
  AddedAt,
  RedemptionCount,
}
