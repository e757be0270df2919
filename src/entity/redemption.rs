use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Immutable record of a code being used. The unique index on `code` is
/// what makes redemption exactly-once.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "redemptions")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  pub campaign_id: i32,
  #[sea_orm(unique)]
  pub code: String,
  pub redeemed_by: i64,
  pub redeemed_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
