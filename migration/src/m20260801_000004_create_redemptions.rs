use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Redemptions::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Redemptions::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(Redemptions::CampaignId).integer().not_null())
          .col(ColumnDef::new(Redemptions::Code).string().not_null())
          .col(ColumnDef::new(Redemptions::RedeemedBy).big_integer().not_null())
          .col(ColumnDef::new(Redemptions::RedeemedAt).date_time().not_null())
          .to_owned(),
      )
      .await?;

    // the uniqueness constraint that makes double redemption impossible
    manager
      .create_index(
        Index::create()
          .name("idx_redemptions_code")
          .table(Redemptions::Table)
          .col(Redemptions::Code)
          .unique()
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_redemptions_redeemed_by")
          .table(Redemptions::Table)
          .col(Redemptions::RedeemedBy)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_index(
        Index::drop()
          .name("idx_redemptions_redeemed_by")
          .table(Redemptions::Table)
          .to_owned(),
      )
      .await?;

    manager
      .drop_index(
        Index::drop().name("idx_redemptions_code").table(Redemptions::Table).to_owned(),
      )
      .await?;

    manager.drop_table(Table::drop().table(Redemptions::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Redemptions {
  Table,
  Id,
  CampaignId,
  Code,
  RedeemedBy,
  RedeemedAt,
}
