use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::user;

/// One issued code. `campaign_id` is a weak reference: the campaign may be
/// hard-deleted afterwards, so it is looked up as an `Option` everywhere.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "claims")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  pub tg_user_id: i64,
  pub campaign_id: i32,
  #[sea_orm(unique)]
  pub code: String,
  pub claimed_at: DateTime,
  pub redeemed: bool,
  pub redeemed_at: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "user::Entity",
    from = "Column::TgUserId",
    to = "user::Column::TgUserId"
  )]
  User,
}

impl Related<user::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::User.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
