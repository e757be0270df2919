use crate::{
  entity::{campaign, claim},
  prelude::*,
  sv::{self, MembershipGate},
  utils,
};

/// How many fresh codes to try before giving up on a claim. A collision on
/// an 8-character code is already a once-in-a-blue-moon event; two in a row
/// means something else is wrong.
const CODE_ATTEMPTS: usize = 4;

pub struct IssuedCode {
  pub code: String,
  pub campaign: campaign::Model,
}

pub struct Claims<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Claims<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// Claim one code from a campaign. Preconditions are checked in a fixed
  /// order so the first failure decides the reply; the counter increment
  /// and the claim insert then commit in one transaction, with the
  /// conditional `consume_slot` re-checking the limit at write time.
  pub async fn claim(
    &self,
    gate: &dyn MembershipGate,
    tg_user_id: i64,
    campaign_id: i32,
  ) -> Result<IssuedCode> {
    sv::User::new(self.db).get_or_create(tg_user_id).await?;

    if self.exists(tg_user_id, campaign_id).await? {
      return Err(Claim::AlreadyClaimed.into());
    }

    if !gate.is_member(tg_user_id).await {
      return Err(Claim::MembershipRequired.into());
    }

    let found = campaign::Entity::find_by_id(campaign_id)
      .one(self.db)
      .await?
      .ok_or(Error::CampaignNotFound)?;

    let now = Utc::now().naive_utc();
    if !found.is_active {
      return Err(Claim::Inactive.into());
    }
    if found.is_expired(now) {
      return Err(Claim::Expired.into());
    }
    if found.is_limit_reached() {
      return Err(Claim::LimitExhausted.into());
    }

    for _ in 0..CODE_ATTEMPTS {
      let code = utils::generate_code(utils::CODE_LEN);

      match self.issue(tg_user_id, campaign_id, &code).await {
        Err(err) if err.is_unique_violation() => {
          // either the code collided or the same user claimed concurrently
          if self.exists(tg_user_id, campaign_id).await? {
            return Err(Claim::AlreadyClaimed.into());
          }
          debug!("code collision on campaign {campaign_id}, regenerating");
          continue;
        }
        other => return other,
      }
    }

    Err(Error::Internal("could not generate a unique code".into()))
  }

  async fn issue(
    &self,
    tg_user_id: i64,
    campaign_id: i32,
    code: &str,
  ) -> Result<IssuedCode> {
    let txn = self.db.begin().await?;

    if !sv::Campaign::consume_slot(&txn, campaign_id).await? {
      return Err(Claim::LimitExhausted.into());
    }

    let now = Utc::now().naive_utc();
    claim::ActiveModel {
      id: NotSet,
      tg_user_id: Set(tg_user_id),
      campaign_id: Set(campaign_id),
      code: Set(code.to_string()),
      claimed_at: Set(now),
      redeemed: Set(false),
      redeemed_at: Set(None),
    }
    .insert(&txn)
    .await?;

    let campaign = campaign::Entity::find_by_id(campaign_id)
      .one(&txn)
      .await?
      .ok_or(Error::CampaignNotFound)?;

    txn.commit().await?;

    Ok(IssuedCode { code: code.to_string(), campaign })
  }

  pub async fn exists(
    &self,
    tg_user_id: i64,
    campaign_id: i32,
  ) -> Result<bool> {
    let found = claim::Entity::find()
      .filter(claim::Column::TgUserId.eq(tg_user_id))
      .filter(claim::Column::CampaignId.eq(campaign_id))
      .one(self.db)
      .await?;
    Ok(found.is_some())
  }

  /// A user's claims, newest first, with the campaign resolved where it
  /// still exists. Deleted campaigns come back as `None`.
  pub async fn of_user(
    &self,
    tg_user_id: i64,
  ) -> Result<Vec<(claim::Model, Option<campaign::Model>)>> {
    let claims = claim::Entity::find()
      .filter(claim::Column::TgUserId.eq(tg_user_id))
      .order_by_desc(claim::Column::ClaimedAt)
      .all(self.db)
      .await?;

    let ids: Vec<i32> = claims.iter().map(|c| c.campaign_id).collect();
    let campaigns: HashMap<i32, campaign::Model> = campaign::Entity::find()
      .filter(campaign::Column::Id.is_in(ids))
      .all(self.db)
      .await?
      .into_iter()
      .map(|c| (c.id, c))
      .collect();

    Ok(
      claims
        .into_iter()
        .map(|c| {
          let campaign = campaigns.get(&c.campaign_id).cloned();
          (c, campaign)
        })
        .collect(),
    )
  }
}

#[cfg(test)]
mod tests {
  use futures::future;

  use super::*;
  use crate::sv::test_utils::{StubGate, test_db};

  fn next_month() -> DateTime {
    Utc::now().naive_utc() + TimeDelta::days(30)
  }

  async fn campaign_with_limit(
    db: &DatabaseConnection,
    limit: i32,
  ) -> campaign::Model {
    sv::Campaign::new(db)
      .create("Launch", "10% off", limit, next_month())
      .await
      .unwrap()
  }

  #[tokio::test]
  async fn claim_issues_a_code_once() {
    let db = test_db::setup().await;
    let sv = Claims::new(&db);
    let campaign = campaign_with_limit(&db, 10).await;

    let issued = sv.claim(&StubGate(true), 100, campaign.id).await.unwrap();
    assert_eq!(issued.code.len(), utils::CODE_LEN);
    assert_eq!(issued.campaign.used_count, 1);

    // idempotent-rejecting: the second call fails and adds nothing
    assert!(matches!(
      sv.claim(&StubGate(true), 100, campaign.id).await,
      Err(Error::Claim(Claim::AlreadyClaimed))
    ));
    let claims = claim::Entity::find().all(&db).await.unwrap();
    assert_eq!(claims.len(), 1);
    assert!(!claims[0].redeemed);
  }

  #[tokio::test]
  async fn claim_is_fail_closed_on_membership() {
    let db = test_db::setup().await;
    let sv = Claims::new(&db);
    let campaign = campaign_with_limit(&db, 10).await;

    assert!(matches!(
      sv.claim(&StubGate(false), 100, campaign.id).await,
      Err(Error::Claim(Claim::MembershipRequired))
    ));

    let fresh = sv::Campaign::new(&db).by_id(campaign.id).await.unwrap().unwrap();
    assert_eq!(fresh.used_count, 0);
  }

  #[tokio::test]
  async fn claim_rejects_unavailable_campaigns() {
    let db = test_db::setup().await;
    let sv = Claims::new(&db);
    let campaigns = sv::Campaign::new(&db);

    assert!(matches!(
      sv.claim(&StubGate(true), 100, 404).await,
      Err(Error::CampaignNotFound)
    ));

    let paused = campaign_with_limit(&db, 10).await;
    campaigns.toggle_active(paused.id).await.unwrap();
    assert!(matches!(
      sv.claim(&StubGate(true), 100, paused.id).await,
      Err(Error::Claim(Claim::Inactive))
    ));

    // expiry wins regardless of the remaining limit
    let expired = campaigns
      .create("Old", "d", 10, Utc::now().naive_utc() + TimeDelta::seconds(1))
      .await
      .unwrap();
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(matches!(
      sv.claim(&StubGate(true), 100, expired.id).await,
      Err(Error::Claim(Claim::Expired))
    ));
  }

  #[tokio::test]
  async fn limit_is_never_exceeded() {
    let db = test_db::setup().await;
    let sv = Claims::new(&db);
    let campaign = campaign_with_limit(&db, 1).await;

    sv.claim(&StubGate(true), 100, campaign.id).await.unwrap();
    assert!(matches!(
      sv.claim(&StubGate(true), 101, campaign.id).await,
      Err(Error::Claim(Claim::LimitExhausted))
    ));

    let fresh = sv::Campaign::new(&db).by_id(campaign.id).await.unwrap().unwrap();
    assert_eq!(fresh.used_count, 1);
  }

  #[tokio::test]
  async fn concurrent_claims_take_the_last_slot_once() {
    let db = test_db::setup().await;
    let campaign = campaign_with_limit(&db, 1).await;

    let attempts = (0..5).map(|i| {
      let db = &db;
      async move {
        Claims::new(db).claim(&StubGate(true), 200 + i, campaign.id).await
      }
    });

    let results = future::join_all(attempts).await;
    let won = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(won, 1);

    let fresh = sv::Campaign::new(&db).by_id(campaign.id).await.unwrap().unwrap();
    assert_eq!(fresh.used_count, 1);
    assert_eq!(claim::Entity::find().all(&db).await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn of_user_tolerates_deleted_campaigns() {
    let db = test_db::setup().await;
    let sv = Claims::new(&db);
    let campaigns = sv::Campaign::new(&db);

    let first = campaign_with_limit(&db, 5).await;
    let second = campaigns.create("Other", "d", 5, next_month()).await.unwrap();

    sv.claim(&StubGate(true), 100, first.id).await.unwrap();
    sv.claim(&StubGate(true), 100, second.id).await.unwrap();
    campaigns.delete(second.id).await.unwrap();

    let claims = sv.of_user(100).await.unwrap();
    assert_eq!(claims.len(), 2);

    let dangling =
      claims.iter().find(|(c, _)| c.campaign_id == second.id).unwrap();
    assert!(dangling.1.is_none());
    let live = claims.iter().find(|(c, _)| c.campaign_id == first.id).unwrap();
    assert_eq!(live.1.as_ref().unwrap().name, "Launch");
  }
}
