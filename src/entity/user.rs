use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::claim;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub tg_user_id: i64,
  pub first_name: Option<String>,
  pub last_name: Option<String>,
  pub username: Option<String>,
  pub reg_date: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(has_many = "claim::Entity")]
  Claims,
}

impl Related<claim::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Claims.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
