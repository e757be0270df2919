use crate::{
  entity::{StaffRole, staff},
  prelude::*,
  sv::user::Profile,
};

pub struct Staff<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Staff<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn by_id(&self, tg_user_id: i64) -> Result<Option<staff::Model>> {
    let found = staff::Entity::find_by_id(tg_user_id).one(self.db).await?;
    Ok(found)
  }

  pub async fn is_admin(&self, tg_user_id: i64) -> Result<bool> {
    let found = self.by_id(tg_user_id).await?;
    Ok(found.is_some_and(|s| s.is_active && s.role == StaffRole::Admin))
  }

  /// Admins count as sellers: every redemption surface is open to both.
  pub async fn is_seller(&self, tg_user_id: i64) -> Result<bool> {
    let found = self.by_id(tg_user_id).await?;
    Ok(found.is_some_and(|s| s.is_active))
  }

  /// Capability check composed before each admin operation.
  pub async fn require_admin(&self, tg_user_id: i64) -> Result<staff::Model> {
    match self.by_id(tg_user_id).await? {
      Some(staff) if staff.is_active && staff.role == StaffRole::Admin => {
        Ok(staff)
      }
      _ => Err(Error::Unauthorized),
    }
  }

  pub async fn require_seller(&self, tg_user_id: i64) -> Result<staff::Model> {
    match self.by_id(tg_user_id).await? {
      Some(staff) if staff.is_active => Ok(staff),
      _ => Err(Error::Unauthorized),
    }
  }

  /// Add a principal to the roster. A previously deactivated principal is
  /// reactivated in place with a fresh role and provenance.
  pub async fn add(
    &self,
    tg_user_id: i64,
    role: StaffRole,
    added_by: Option<i64>,
    profile: Profile,
  ) -> Result<staff::Model> {
    let now = Utc::now().naive_utc();

    if let Some(existing) = self.by_id(tg_user_id).await? {
      if existing.is_active {
        return Err(Error::InvalidArgs(
          "This user is already a staff member.".into(),
        ));
      }

      let restored = staff::ActiveModel {
        is_active: Set(true),
        role: Set(role),
        added_by: Set(added_by),
        added_at: Set(now),
        ..existing.into()
      }
      .update(self.db)
      .await?;

      return Ok(restored);
    }

    let staff = staff::ActiveModel {
      tg_user_id: Set(tg_user_id),
      first_name: Set(profile.first_name),
      last_name: Set(profile.last_name),
      username: Set(profile.username),
      role: Set(role),
      is_active: Set(true),
      added_by: Set(added_by),
      added_at: Set(now),
      redemption_count: Set(0),
    };

    Ok(staff.insert(self.db).await?)
  }

  /// Flip a principal's active flag. Nobody locks themselves out.
  pub async fn toggle_active(
    &self,
    target: i64,
    actor: i64,
  ) -> Result<staff::Model> {
    if target == actor {
      return Err(Error::CannotModifySelf);
    }

    let found = self.by_id(target).await?.ok_or(Error::StaffNotFound)?;

    let updated =
      staff::ActiveModel { is_active: Set(!found.is_active), ..found.into() }
        .update(self.db)
        .await?;

    Ok(updated)
  }

  pub async fn remove(&self, target: i64, actor: i64) -> Result<()> {
    if target == actor {
      return Err(Error::CannotModifySelf);
    }

    let res = staff::Entity::delete_by_id(target).exec(self.db).await?;
    if res.rows_affected == 0 {
      return Err(Error::StaffNotFound);
    }
    Ok(())
  }

  pub async fn list(
    &self,
    role: Option<StaffRole>,
  ) -> Result<Vec<staff::Model>> {
    let mut query =
      staff::Entity::find().order_by_desc(staff::Column::AddedAt);

    if let Some(role) = role {
      query = query.filter(staff::Column::Role.eq(role));
    }

    Ok(query.all(self.db).await?)
  }

  /// Refresh the display fields on /start; no-op for non-staff.
  pub async fn update_profile(
    &self,
    tg_user_id: i64,
    profile: &Profile,
  ) -> Result<()> {
    let Some(found) = self.by_id(tg_user_id).await? else {
      return Ok(());
    };

    staff::ActiveModel {
      first_name: Set(profile.first_name.clone()),
      last_name: Set(profile.last_name.clone()),
      username: Set(profile.username.clone()),
      ..found.into()
    }
    .update(self.db)
    .await?;

    Ok(())
  }

  /// Ensure each bootstrap id is an active admin. Run once at startup so
  /// the roster is never empty on a fresh database.
  pub async fn bootstrap(&self, ids: &HashSet<i64>) -> Result<()> {
    for &id in ids {
      match self.by_id(id).await? {
        None => {
          self.add(id, StaffRole::Admin, None, Profile::default()).await?;
          info!("bootstrapped admin {id}");
        }
        Some(existing) if !existing.is_active => {
          staff::ActiveModel { is_active: Set(true), ..existing.into() }
            .update(self.db)
            .await?;
          info!("reactivated bootstrap admin {id}");
        }
        Some(_) => {}
      }
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sv::test_utils::test_db;

  #[tokio::test]
  async fn roles_gate_the_panels() {
    let db = test_db::setup().await;
    let sv = Staff::new(&db);

    sv.add(1, StaffRole::Admin, None, Profile::default()).await.unwrap();
    sv.add(2, StaffRole::Seller, Some(1), Profile::default()).await.unwrap();

    assert!(sv.is_admin(1).await.unwrap());
    assert!(sv.is_seller(1).await.unwrap());
    assert!(!sv.is_admin(2).await.unwrap());
    assert!(sv.is_seller(2).await.unwrap());
    assert!(!sv.is_seller(3).await.unwrap());

    assert!(sv.require_admin(1).await.is_ok());
    assert!(matches!(sv.require_admin(2).await, Err(Error::Unauthorized)));
    assert!(matches!(sv.require_seller(3).await, Err(Error::Unauthorized)));
  }

  #[tokio::test]
  async fn deactivated_staff_lose_access() {
    let db = test_db::setup().await;
    let sv = Staff::new(&db);

    sv.add(1, StaffRole::Admin, None, Profile::default()).await.unwrap();
    sv.add(2, StaffRole::Seller, Some(1), Profile::default()).await.unwrap();
    sv.toggle_active(2, 1).await.unwrap();

    assert!(!sv.is_seller(2).await.unwrap());
    assert!(matches!(sv.require_seller(2).await, Err(Error::Unauthorized)));
  }

  #[tokio::test]
  async fn self_modification_is_rejected() {
    let db = test_db::setup().await;
    let sv = Staff::new(&db);

    sv.add(1, StaffRole::Admin, None, Profile::default()).await.unwrap();

    assert!(matches!(
      sv.toggle_active(1, 1).await,
      Err(Error::CannotModifySelf)
    ));
    assert!(matches!(sv.remove(1, 1).await, Err(Error::CannotModifySelf)));

    // the record is intact afterwards
    let same = sv.by_id(1).await.unwrap().unwrap();
    assert!(same.is_active);
  }

  #[tokio::test]
  async fn add_rejects_active_and_revives_inactive() {
    let db = test_db::setup().await;
    let sv = Staff::new(&db);

    sv.add(1, StaffRole::Admin, None, Profile::default()).await.unwrap();
    sv.add(2, StaffRole::Seller, Some(1), Profile::default()).await.unwrap();

    assert!(matches!(
      sv.add(2, StaffRole::Seller, Some(1), Profile::default()).await,
      Err(Error::InvalidArgs(_))
    ));

    sv.toggle_active(2, 1).await.unwrap();
    let revived =
      sv.add(2, StaffRole::Admin, Some(1), Profile::default()).await.unwrap();
    assert!(revived.is_active);
    assert_eq!(revived.role, StaffRole::Admin);
  }

  #[tokio::test]
  async fn bootstrap_is_idempotent() {
    let db = test_db::setup().await;
    let sv = Staff::new(&db);

    let ids = HashSet::from([1i64, 2]);
    sv.bootstrap(&ids).await.unwrap();
    sv.bootstrap(&ids).await.unwrap();

    assert_eq!(sv.list(None).await.unwrap().len(), 2);
    assert!(sv.is_admin(1).await.unwrap());

    sv.toggle_active(2, 1).await.unwrap();
    sv.bootstrap(&ids).await.unwrap();
    assert!(sv.is_admin(2).await.unwrap());
  }
}
