use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "campaigns")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  pub name: String,
  pub description: String,
  pub total_limit: i32,
  pub used_count: i32,
  pub expires_at: DateTime,
  pub is_active: bool,
  pub created_at: DateTime,
}

impl Model {
  pub fn is_expired(&self, now: DateTime) -> bool {
    self.expires_at < now
  }

  pub fn is_limit_reached(&self) -> bool {
    self.used_count >= self.total_limit
  }

  pub fn is_available(&self, now: DateTime) -> bool {
    self.is_active && !self.is_expired(now) && !self.is_limit_reached()
  }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
