use crate::{
  entity::{StaffRole, campaign, claim, redemption, staff, user},
  prelude::*,
};

pub struct RedeemedCode {
  pub record: redemption::Model,
  pub campaign: campaign::Model,
  pub claimant: user::Model,
  pub claim: claim::Model,
}

pub struct HistoryEntry {
  pub record: redemption::Model,
  pub campaign: Option<campaign::Model>,
  pub claimant: Option<user::Model>,
}

pub struct SellerStats {
  pub total: u64,
  pub by_campaign: Vec<(Option<campaign::Model>, u64)>,
  pub recent: Vec<(redemption::Model, Option<campaign::Model>)>,
}

pub struct Redemption<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Redemption<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub fn normalize(code: &str) -> String {
    code.trim().to_uppercase()
  }

  /// Mark a claimed code as used, exactly once. The redemption record, the
  /// claim flag and the seller counter move in one transaction; the unique
  /// index on `redemptions.code` backs the already-redeemed check against
  /// races. A code whose campaign was deleted is not redeemable, the same
  /// policy everywhere this service is called from.
  pub async fn redeem(&self, code: &str, redeemer: i64) -> Result<RedeemedCode> {
    let code = Self::normalize(code);
    let txn = self.db.begin().await?;

    if let Some(existing) = redemption::Entity::find()
      .filter(redemption::Column::Code.eq(&code))
      .one(&txn)
      .await?
    {
      let campaign =
        campaign::Entity::find_by_id(existing.campaign_id).one(&txn).await?;
      return Err(Error::AlreadyRedeemed {
        campaign: campaign.map(|c| c.name),
        at: existing.redeemed_at,
      });
    }

    let (found, claimant) = claim::Entity::find()
      .filter(claim::Column::Code.eq(&code))
      .find_also_related(user::Entity)
      .one(&txn)
      .await?
      .ok_or(Error::CodeNotFound)?;
    let claimant = claimant.ok_or(Error::UserNotFound)?;

    let campaign = campaign::Entity::find_by_id(found.campaign_id)
      .one(&txn)
      .await?
      .ok_or(Error::CampaignMissing)?;

    let now = Utc::now().naive_utc();
    let record = redemption::ActiveModel {
      id: NotSet,
      campaign_id: Set(found.campaign_id),
      code: Set(code),
      redeemed_by: Set(redeemer),
      redeemed_at: Set(now),
    }
    .insert(&txn)
    .await?;

    let found = claim::ActiveModel {
      redeemed: Set(true),
      redeemed_at: Set(Some(now)),
      ..found.into()
    }
    .update(&txn)
    .await?;

    if let Some(seller) = staff::Entity::find_by_id(redeemer).one(&txn).await?
      && seller.role == StaffRole::Seller
    {
      staff::ActiveModel {
        redemption_count: Set(seller.redemption_count + 1),
        ..seller.into()
      }
      .update(&txn)
      .await?;
    }

    txn.commit().await?;

    Ok(RedeemedCode { record, campaign, claimant, claim: found })
  }

  /// Latest redemptions with campaign and claimant resolved where possible.
  pub async fn history(&self, limit: u64) -> Result<Vec<HistoryEntry>> {
    let records = redemption::Entity::find()
      .order_by_desc(redemption::Column::RedeemedAt)
      .limit(limit)
      .all(self.db)
      .await?;

    let mut entries = Vec::with_capacity(records.len());
    for record in records {
      let campaign =
        campaign::Entity::find_by_id(record.campaign_id).one(self.db).await?;
      let claimant = claim::Entity::find()
        .filter(claim::Column::Code.eq(&record.code))
        .find_also_related(user::Entity)
        .one(self.db)
        .await?
        .and_then(|(_, user)| user);

      entries.push(HistoryEntry { record, campaign, claimant });
    }

    Ok(entries)
  }

  pub async fn seller_stats(&self, tg_user_id: i64) -> Result<SellerStats> {
    let all = redemption::Entity::find()
      .filter(redemption::Column::RedeemedBy.eq(tg_user_id))
      .order_by_desc(redemption::Column::RedeemedAt)
      .all(self.db)
      .await?;

    let mut counts: HashMap<i32, u64> = HashMap::new();
    for record in &all {
      *counts.entry(record.campaign_id).or_default() += 1;
    }

    let campaigns: HashMap<i32, campaign::Model> = campaign::Entity::find()
      .filter(campaign::Column::Id.is_in(counts.keys().copied().collect::<Vec<_>>()))
      .all(self.db)
      .await?
      .into_iter()
      .map(|c| (c.id, c))
      .collect();

    let by_campaign = counts
      .into_iter()
      .map(|(id, count)| (campaigns.get(&id).cloned(), count))
      .collect();

    let recent = all
      .iter()
      .take(10)
      .map(|r| (r.clone(), campaigns.get(&r.campaign_id).cloned()))
      .collect();

    Ok(SellerStats { total: all.len() as u64, by_campaign, recent })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sv::{
    self,
    test_utils::{StubGate, test_db},
  };

  fn next_month() -> DateTime {
    Utc::now().naive_utc() + TimeDelta::days(30)
  }

  async fn issued_code(db: &DatabaseConnection) -> (i32, String) {
    let campaign = sv::Campaign::new(db)
      .create("Launch", "10% off", 1, next_month())
      .await
      .unwrap();
    let issued =
      sv::Claims::new(db).claim(&StubGate(true), 100, campaign.id).await.unwrap();
    (campaign.id, issued.code)
  }

  #[tokio::test]
  async fn code_redeems_exactly_once() {
    let db = test_db::setup().await;
    let sv = Redemption::new(&db);
    let (campaign_id, code) = issued_code(&db).await;

    let redeemed = sv.redeem(&code, 900).await.unwrap();
    assert_eq!(redeemed.campaign.id, campaign_id);
    assert_eq!(redeemed.claimant.tg_user_id, 100);
    assert!(redeemed.claim.redeemed);
    assert!(redeemed.claim.redeemed_at.is_some());

    assert!(matches!(
      sv.redeem(&code, 901).await,
      Err(Error::AlreadyRedeemed { .. })
    ));
    assert_eq!(redemption::Entity::find().all(&db).await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn input_is_case_normalized() {
    let db = test_db::setup().await;
    let sv = Redemption::new(&db);
    let (_, code) = issued_code(&db).await;

    let sloppy = format!("  {}  ", code.to_lowercase());
    let redeemed = sv.redeem(&sloppy, 900).await.unwrap();
    assert_eq!(redeemed.record.code, code);
  }

  #[tokio::test]
  async fn unknown_code_is_rejected() {
    let db = test_db::setup().await;
    let sv = Redemption::new(&db);

    assert!(matches!(
      sv.redeem("NOTACODE", 900).await,
      Err(Error::CodeNotFound)
    ));
  }

  #[tokio::test]
  async fn deleted_campaign_aborts_redemption() {
    let db = test_db::setup().await;
    let sv = Redemption::new(&db);
    let (campaign_id, code) = issued_code(&db).await;

    sv::Campaign::new(&db).delete(campaign_id).await.unwrap();

    assert!(matches!(sv.redeem(&code, 900).await, Err(Error::CampaignMissing)));

    // nothing may be written on the abort path
    assert!(redemption::Entity::find().all(&db).await.unwrap().is_empty());
    let found = claim::Entity::find().one(&db).await.unwrap().unwrap();
    assert!(!found.redeemed);
  }

  #[tokio::test]
  async fn seller_counter_tracks_redemptions() {
    let db = test_db::setup().await;
    let sv = Redemption::new(&db);
    let staff_sv = sv::Staff::new(&db);

    staff_sv
      .add(900, StaffRole::Seller, Some(1), Default::default())
      .await
      .unwrap();

    let (_, code) = issued_code(&db).await;
    sv.redeem(&code, 900).await.unwrap();

    let seller = staff::Entity::find_by_id(900i64).one(&db).await.unwrap().unwrap();
    assert_eq!(seller.redemption_count, 1);

    let stats = sv.seller_stats(900).await.unwrap();
    assert_eq!(stats.total, 1);
    assert_eq!(stats.recent.len(), 1);
    assert_eq!(stats.by_campaign.len(), 1);
  }

  #[tokio::test]
  async fn admin_redemptions_do_not_bump_the_seller_counter() {
    let db = test_db::setup().await;
    let sv = Redemption::new(&db);
    let staff_sv = sv::Staff::new(&db);

    staff_sv
      .add(900, StaffRole::Admin, None, Default::default())
      .await
      .unwrap();

    let (_, code) = issued_code(&db).await;
    sv.redeem(&code, 900).await.unwrap();

    let admin = staff::Entity::find_by_id(900i64).one(&db).await.unwrap().unwrap();
    assert_eq!(admin.redemption_count, 0);
  }

  #[tokio::test]
  async fn one_slot_campaign_runs_its_full_course() {
    let db = test_db::setup().await;
    let campaigns = sv::Campaign::new(&db);
    let claims = sv::Claims::new(&db);
    let redemptions = Redemption::new(&db);

    let campaign =
      campaigns.create("Launch", "10% off", 1, next_month()).await.unwrap();

    // first user takes the only slot
    let issued =
      claims.claim(&StubGate(true), 100, campaign.id).await.unwrap();
    assert_eq!(issued.campaign.used_count, 1);

    // second user finds the campaign exhausted
    assert!(matches!(
      claims.claim(&StubGate(true), 101, campaign.id).await,
      Err(Error::Claim(Claim::LimitExhausted))
    ));

    // staff redeems the code exactly once
    let redeemed = redemptions.redeem(&issued.code, 900).await.unwrap();
    assert!(redeemed.claim.redeemed);
    assert!(matches!(
      redemptions.redeem(&issued.code, 900).await,
      Err(Error::AlreadyRedeemed { .. })
    ));

    let fresh = campaigns.by_id(campaign.id).await.unwrap().unwrap();
    assert_eq!(fresh.used_count, 1);
    assert_eq!(redemption::Entity::find().all(&db).await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn history_resolves_what_still_exists() {
    let db = test_db::setup().await;
    let sv = Redemption::new(&db);

    let (live_id, live_code) = issued_code(&db).await;
    sv.redeem(&live_code, 900).await.unwrap();

    let doomed = sv::Campaign::new(&db)
      .create("Doomed", "d", 1, next_month())
      .await
      .unwrap();
    let issued = sv::Claims::new(&db)
      .claim(&StubGate(true), 101, doomed.id)
      .await
      .unwrap();
    sv.redeem(&issued.code, 900).await.unwrap();
    sv::Campaign::new(&db).delete(doomed.id).await.unwrap();

    let history = sv.history(20).await.unwrap();
    assert_eq!(history.len(), 2);

    let dangling =
      history.iter().find(|e| e.record.campaign_id == doomed.id).unwrap();
    assert!(dangling.campaign.is_none());
    assert_eq!(dangling.claimant.as_ref().unwrap().tg_user_id, 101);

    let live = history.iter().find(|e| e.record.campaign_id == live_id).unwrap();
    assert_eq!(live.campaign.as_ref().unwrap().name, "Launch");
  }
}
