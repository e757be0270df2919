use teloxide::Bot;

use crate::{entity::StaffRole, prelude::*, sv};

pub struct Config {
  /// Group a user must belong to before claiming anything.
  pub group_id: i64,
  /// Upper bound on the membership API round trip; fail-closed past it.
  pub gate_timeout: Duration,
}

/// Which campaign attribute an edit dialog is changing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CampaignField {
  Name,
  Description,
  Limit,
  Expires,
}

/// Progress of the add-campaign wizard; each step carries what was
/// collected so far, so an invalid input re-prompts without losing it.
#[derive(Debug, Clone, PartialEq)]
pub enum AddCampaign {
  Name,
  Description { name: String },
  Limit { name: String, description: String },
  Expires { name: String, description: String, limit: i32 },
}

/// Per-conversation dialog state, keyed by user id in `AppState::dialogs`.
/// Every flow clears its entry on completion, on cancel and on /cancel,
/// so a conversation can always get back to the neutral menu.
#[derive(Debug, Clone, PartialEq)]
pub enum Dialog {
  AddCampaign(AddCampaign),
  EditCampaign { id: i32, field: CampaignField },
  AddStaff { role: StaffRole },
  Redeem,
}

pub struct AppState {
  pub db: DatabaseConnection,
  pub bot: Bot,
  pub config: Config,
  pub dialogs: DashMap<i64, Dialog>,
}

impl AppState {
  pub async fn new(db_url: &str, token: &str, config: Config) -> Self {
    let db = Database::connect(db_url)
      .await
      .expect("Failed to connect to database");

    migration::Migrator::up(&db, None)
      .await
      .expect("Failed to run migrations");

    Self { db, bot: Bot::new(token), config, dialogs: DashMap::new() }
  }

  pub fn sv(&self) -> Services<'_> {
    Services {
      user: sv::User::new(&self.db),
      campaign: sv::Campaign::new(&self.db),
      claim: sv::Claims::new(&self.db),
      redemption: sv::Redemption::new(&self.db),
      staff: sv::Staff::new(&self.db),
    }
  }

  pub fn dialog(&self, user_id: i64) -> Option<Dialog> {
    self.dialogs.get(&user_id).map(|d| d.clone())
  }

  pub fn set_dialog(&self, user_id: i64, dialog: Dialog) {
    self.dialogs.insert(user_id, dialog);
  }

  pub fn clear_dialog(&self, user_id: i64) {
    self.dialogs.remove(&user_id);
  }
}

pub struct Services<'a> {
  pub user: sv::User<'a>,
  pub campaign: sv::Campaign<'a>,
  pub claim: sv::Claims<'a>,
  pub redemption: sv::Redemption<'a>,
  pub staff: sv::Staff<'a>,
}
