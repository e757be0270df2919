mod entity;
mod error;
mod plugins;
mod prelude;
mod state;
mod sv;
mod utils;

use std::env;

use tracing_subscriber::{
  EnvFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::{
  prelude::*,
  state::{AppState, Config},
};

#[tokio::main]
async fn main() {
  dotenvy::dotenv().ok();

  tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
      "promobot=debug,teloxide=info,sea_orm=warn".into()
    }))
    .with(tracing_subscriber::fmt::layer())
    .init();

  let token = env::var("TELOXIDE_TOKEN").expect("TELOXIDE_TOKEN not set");
  let db_url = env::var("DATABASE_URL")
    .unwrap_or_else(|_| "sqlite:promobot.db?mode=rwc".into());
  let group_id: i64 = env::var("GROUP_ID")
    .expect("GROUP_ID not set")
    .trim()
    .parse()
    .expect("Invalid GROUP_ID format");
  let gate_timeout = env::var("GATE_TIMEOUT_SECS")
    .ok()
    .and_then(|secs| secs.parse().ok())
    .unwrap_or(5);

  let admins: HashSet<i64> = env::var("ADMIN_IDS")
    .unwrap_or_default()
    .split(',')
    .filter(|id| !id.trim().is_empty())
    .map(|id| id.trim().parse().expect("Invalid admin ID format"))
    .collect();

  info!("Starting promo bot v{}", env!("CARGO_PKG_VERSION"));

  let config =
    Config { group_id, gate_timeout: Duration::from_secs(gate_timeout) };
  let app = Arc::new(AppState::new(&db_url, &token, config).await);

  if admins.is_empty() {
    warn!("ADMIN_IDS is empty, relying on the staff roster in the database");
  } else if let Err(err) = app.sv().staff.bootstrap(&admins).await {
    error!("Failed to bootstrap the admin roster: {err}");
  }

  plugins::App::new().register(plugins::telegram::Plugin).run(app).await;
}
