use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum StaffRole {
  #[sea_orm(string_value = "admin")]
  #[default]
  Admin,
  #[sea_orm(string_value = "seller")]
  Seller,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "staff")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub tg_user_id: i64,
  pub first_name: Option<String>,
  pub last_name: Option<String>,
  pub username: Option<String>,
  pub role: StaffRole,
  pub is_active: bool,
  pub added_by: Option<i64>,
  pub added_at: DateTime,
  pub redemption_count: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
