use sea_orm::sea_query::Expr;

use crate::{entity::campaign, prelude::*};

pub struct Campaign<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Campaign<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn create(
    &self,
    name: &str,
    description: &str,
    total_limit: i32,
    expires_at: DateTime,
  ) -> Result<campaign::Model> {
    if total_limit <= 0 {
      return Err(Error::InvalidNumber);
    }

    let now = Utc::now().naive_utc();
    if expires_at <= now {
      return Err(Error::InvalidDate);
    }

    let campaign = campaign::ActiveModel {
      id: NotSet,
      name: Set(name.trim().to_string()),
      description: Set(description.trim().to_string()),
      total_limit: Set(total_limit),
      used_count: Set(0),
      expires_at: Set(expires_at),
      is_active: Set(true),
      created_at: Set(now),
    };

    Ok(campaign.insert(self.db).await?)
  }

  pub async fn by_id(&self, id: i32) -> Result<Option<campaign::Model>> {
    let campaign = campaign::Entity::find_by_id(id).one(self.db).await?;
    Ok(campaign)
  }

  pub async fn all(&self) -> Result<Vec<campaign::Model>> {
    let campaigns = campaign::Entity::find()
      .order_by_desc(campaign::Column::CreatedAt)
      .all(self.db)
      .await?;
    Ok(campaigns)
  }

  /// Campaigns a user may claim from: active, unexpired, limit not reached.
  pub async fn available(&self) -> Result<Vec<campaign::Model>> {
    let now = Utc::now().naive_utc();
    let campaigns = campaign::Entity::find()
      .filter(campaign::Column::IsActive.eq(true))
      .filter(campaign::Column::ExpiresAt.gt(now))
      .filter(
        Expr::col(campaign::Column::UsedCount)
          .lt(Expr::col(campaign::Column::TotalLimit)),
      )
      .order_by_desc(campaign::Column::CreatedAt)
      .all(self.db)
      .await?;
    Ok(campaigns)
  }

  pub async fn rename(&self, id: i32, name: &str) -> Result<campaign::Model> {
    let campaign = self.by_id(id).await?.ok_or(Error::CampaignNotFound)?;

    let campaign =
      campaign::ActiveModel { name: Set(name.trim().to_string()), ..campaign.into() }
        .update(self.db)
        .await?;

    Ok(campaign)
  }

  pub async fn set_description(
    &self,
    id: i32,
    description: &str,
  ) -> Result<campaign::Model> {
    let campaign = self.by_id(id).await?.ok_or(Error::CampaignNotFound)?;

    let campaign = campaign::ActiveModel {
      description: Set(description.trim().to_string()),
      ..campaign.into()
    }
    .update(self.db)
    .await?;

    Ok(campaign)
  }

  /// The limit can move, but never below the codes already handed out.
  pub async fn set_limit(&self, id: i32, limit: i32) -> Result<campaign::Model> {
    if limit <= 0 {
      return Err(Error::InvalidNumber);
    }

    let campaign = self.by_id(id).await?.ok_or(Error::CampaignNotFound)?;

    if limit < campaign.used_count {
      return Err(Error::LimitBelowUsage { used: campaign.used_count });
    }

    let campaign =
      campaign::ActiveModel { total_limit: Set(limit), ..campaign.into() }
        .update(self.db)
        .await?;

    Ok(campaign)
  }

  /// Expiry edits follow the same strictly-future rule as creation.
  pub async fn set_expires(
    &self,
    id: i32,
    expires_at: DateTime,
  ) -> Result<campaign::Model> {
    let now = Utc::now().naive_utc();
    if expires_at <= now {
      return Err(Error::InvalidDate);
    }

    let campaign = self.by_id(id).await?.ok_or(Error::CampaignNotFound)?;

    let campaign =
      campaign::ActiveModel { expires_at: Set(expires_at), ..campaign.into() }
        .update(self.db)
        .await?;

    Ok(campaign)
  }

  pub async fn toggle_active(&self, id: i32) -> Result<campaign::Model> {
    let campaign = self.by_id(id).await?.ok_or(Error::CampaignNotFound)?;

    let campaign = campaign::ActiveModel {
      is_active: Set(!campaign.is_active),
      ..campaign.into()
    }
    .update(self.db)
    .await?;

    Ok(campaign)
  }

  /// Hard delete. Claims keep the dangling id and display handles it.
  pub async fn delete(&self, id: i32) -> Result<()> {
    let res = campaign::Entity::delete_by_id(id).exec(self.db).await?;
    if res.rows_affected == 0 {
      return Err(Error::CampaignNotFound);
    }
    Ok(())
  }

  /// Atomically take one slot: `used_count` only moves when it is still
  /// below the limit, so two racing claims can never push it past
  /// `total_limit`. Returns false when the campaign is exhausted (or gone).
  pub async fn consume_slot<C: ConnectionTrait>(
    conn: &C,
    id: i32,
  ) -> Result<bool> {
    let res = campaign::Entity::update_many()
      .col_expr(
        campaign::Column::UsedCount,
        Expr::col(campaign::Column::UsedCount).add(1),
      )
      .filter(campaign::Column::Id.eq(id))
      .filter(
        Expr::col(campaign::Column::UsedCount)
          .lt(Expr::col(campaign::Column::TotalLimit)),
      )
      .exec(conn)
      .await?;

    Ok(res.rows_affected > 0)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sv::test_utils::test_db;

  fn next_month() -> DateTime {
    Utc::now().naive_utc() + TimeDelta::days(30)
  }

  #[tokio::test]
  async fn create_validates_inputs() {
    let db = test_db::setup().await;
    let sv = Campaign::new(&db);

    assert!(matches!(
      sv.create("x", "y", 0, next_month()).await,
      Err(Error::InvalidNumber)
    ));
    assert!(matches!(
      sv.create("x", "y", 10, Utc::now().naive_utc() - TimeDelta::days(1)).await,
      Err(Error::InvalidDate)
    ));

    let campaign = sv.create("Launch", "10% off", 10, next_month()).await.unwrap();
    assert_eq!(campaign.used_count, 0);
    assert!(campaign.is_active);
  }

  #[tokio::test]
  async fn limit_cannot_go_below_usage() {
    let db = test_db::setup().await;
    let sv = Campaign::new(&db);

    let campaign = sv.create("Launch", "10% off", 10, next_month()).await.unwrap();
    for _ in 0..3 {
      assert!(Campaign::consume_slot(&db, campaign.id).await.unwrap());
    }

    assert!(matches!(
      sv.set_limit(campaign.id, 2).await,
      Err(Error::LimitBelowUsage { used: 3 })
    ));

    // the failed edit must leave the row untouched
    let unchanged = sv.by_id(campaign.id).await.unwrap().unwrap();
    assert_eq!(unchanged.total_limit, 10);
    assert_eq!(unchanged.used_count, 3);

    let updated = sv.set_limit(campaign.id, 3).await.unwrap();
    assert_eq!(updated.total_limit, 3);
  }

  #[tokio::test]
  async fn consume_slot_stops_at_the_limit() {
    let db = test_db::setup().await;
    let sv = Campaign::new(&db);

    let campaign = sv.create("Launch", "10% off", 2, next_month()).await.unwrap();

    assert!(Campaign::consume_slot(&db, campaign.id).await.unwrap());
    assert!(Campaign::consume_slot(&db, campaign.id).await.unwrap());
    assert!(!Campaign::consume_slot(&db, campaign.id).await.unwrap());

    let campaign = sv.by_id(campaign.id).await.unwrap().unwrap();
    assert_eq!(campaign.used_count, campaign.total_limit);
  }

  #[tokio::test]
  async fn available_filters_unclaimable() {
    let db = test_db::setup().await;
    let sv = Campaign::new(&db);

    let open = sv.create("Open", "d", 5, next_month()).await.unwrap();
    let paused = sv.create("Paused", "d", 5, next_month()).await.unwrap();
    sv.toggle_active(paused.id).await.unwrap();

    let full = sv.create("Full", "d", 1, next_month()).await.unwrap();
    assert!(Campaign::consume_slot(&db, full.id).await.unwrap());

    let available = sv.available().await.unwrap();
    assert_eq!(available.iter().map(|c| c.id).collect::<Vec<_>>(), vec![open.id]);
  }

  #[tokio::test]
  async fn toggle_and_delete() {
    let db = test_db::setup().await;
    let sv = Campaign::new(&db);

    let campaign = sv.create("Launch", "d", 5, next_month()).await.unwrap();
    assert!(!sv.toggle_active(campaign.id).await.unwrap().is_active);
    assert!(sv.toggle_active(campaign.id).await.unwrap().is_active);

    sv.delete(campaign.id).await.unwrap();
    assert!(matches!(sv.delete(campaign.id).await, Err(Error::CampaignNotFound)));
    assert!(sv.by_id(campaign.id).await.unwrap().is_none());
  }
}
