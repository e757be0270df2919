use crate::{entity::user, prelude::*};

/// Display fields refreshed opportunistically on every interaction.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Profile {
  pub first_name: Option<String>,
  pub last_name: Option<String>,
  pub username: Option<String>,
}

impl Profile {
  pub fn full_name(&self) -> String {
    let name = [self.first_name.as_deref(), self.last_name.as_deref()]
      .into_iter()
      .flatten()
      .collect::<Vec<_>>()
      .join(" ");

    match (name.is_empty(), &self.username) {
      (false, Some(username)) => format!("{name} (@{username})"),
      (false, None) => name,
      (true, Some(username)) => format!("@{username}"),
      (true, None) => "unknown".into(),
    }
  }
}

impl From<&user::Model> for Profile {
  fn from(user: &user::Model) -> Self {
    Self {
      first_name: user.first_name.clone(),
      last_name: user.last_name.clone(),
      username: user.username.clone(),
    }
  }
}

pub struct User<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> User<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn get_or_create(&self, tg_user_id: i64) -> Result<user::Model> {
    if let Some(user) =
      user::Entity::find_by_id(tg_user_id).one(self.db).await?
    {
      return Ok(user);
    }

    let now = Utc::now().naive_utc();
    let user = user::ActiveModel {
      tg_user_id: Set(tg_user_id),
      first_name: Set(None),
      last_name: Set(None),
      username: Set(None),
      reg_date: Set(now),
    };

    Ok(user.insert(self.db).await?)
  }

  /// Create the user on first contact, refresh the display fields after.
  pub async fn upsert(
    &self,
    tg_user_id: i64,
    profile: &Profile,
  ) -> Result<user::Model> {
    let user = self.get_or_create(tg_user_id).await?;

    if Profile::from(&user) == *profile {
      return Ok(user);
    }

    let user = user::ActiveModel {
      first_name: Set(profile.first_name.clone()),
      last_name: Set(profile.last_name.clone()),
      username: Set(profile.username.clone()),
      ..user.into()
    }
    .update(self.db)
    .await?;

    Ok(user)
  }

  pub async fn by_id(&self, tg_user_id: i64) -> Result<Option<user::Model>> {
    let user = user::Entity::find_by_id(tg_user_id).one(self.db).await?;
    Ok(user)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sv::test_utils::test_db;

  #[tokio::test]
  async fn upsert_creates_then_refreshes() {
    let db = test_db::setup().await;
    let sv = User::new(&db);

    let profile = Profile {
      first_name: Some("Ada".into()),
      ..Profile::default()
    };
    let user = sv.upsert(100, &profile).await.unwrap();
    assert_eq!(user.first_name.as_deref(), Some("Ada"));

    let renamed = Profile {
      first_name: Some("Ada".into()),
      username: Some("ada".into()),
      ..Profile::default()
    };
    let user = sv.upsert(100, &renamed).await.unwrap();
    assert_eq!(user.username.as_deref(), Some("ada"));
    assert_eq!(user::Entity::find().all(&db).await.unwrap().len(), 1);
  }

  #[test]
  fn full_name_handles_missing_fields() {
    let profile = Profile {
      first_name: Some("Ada".into()),
      last_name: Some("Lovelace".into()),
      username: Some("ada".into()),
    };
    assert_eq!(profile.full_name(), "Ada Lovelace (@ada)");
    assert_eq!(Profile::default().full_name(), "unknown");
  }
}
