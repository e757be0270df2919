pub use sea_orm_migration::prelude::*;

mod m20260801_000001_create_users;
mod m20260801_000002_create_campaigns;
mod m20260801_000003_create_claims;
mod m20260801_000004_create_redemptions;
mod m20260801_000005_create_staff;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
  fn migrations() -> Vec<Box<dyn MigrationTrait>> {
    vec![
      Box::new(m20260801_000001_create_users::Migration),
      Box::new(m20260801_000002_create_campaigns::Migration),
      Box::new(m20260801_000003_create_claims::Migration),
      Box::new(m20260801_000004_create_redemptions::Migration),
      Box::new(m20260801_000005_create_staff::Migration),
    ]
  }
}
