use sea_orm_migration::prelude::*;

use super::m20260801_000001_create_users::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    // campaign_id has no foreign key on purpose: campaigns are hard-deleted
    // and existing claims must keep working with the dangling id.
    manager
      .create_table(
        Table::create()
          .table(Claims::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Claims::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(Claims::TgUserId).big_integer().not_null())
          .col(ColumnDef::new(Claims::CampaignId).integer().not_null())
          .col(ColumnDef::new(Claims::Code).string().not_null())
          .col(ColumnDef::new(Claims::ClaimedAt).date_time().not_null())
          .col(
            ColumnDef::new(Claims::Redeemed)
              .boolean()
              .not_null()
              .default(false),
          )
          .col(ColumnDef::new(Claims::RedeemedAt).date_time().null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_claims_user")
              .from(Claims::Table, Claims::TgUserId)
              .to(Users::Table, Users::TgUserId)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_claims_code")
          .table(Claims::Table)
          .col(Claims::Code)
          .unique()
          .to_owned(),
      )
      .await?;

    // one claim per (user, campaign)
    manager
      .create_index(
        Index::create()
          .name("idx_claims_user_campaign")
          .table(Claims::Table)
          .col(Claims::TgUserId)
          .col(Claims::CampaignId)
          .unique()
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_index(
        Index::drop().name("idx_claims_user_campaign").table(Claims::Table).to_owned(),
      )
      .await?;

    manager
      .drop_index(Index::drop().name("idx_claims_code").table(Claims::Table).to_owned())
      .await?;

    manager.drop_table(Table::drop().table(Claims::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Claims {
  Table,
  Id,
  TgUserId,
  CampaignId,
  Code,
  ClaimedAt,
  Redeemed,
  RedeemedAt,
}
