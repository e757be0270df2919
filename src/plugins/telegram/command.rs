use std::sync::Arc;

use teloxide::{prelude::*, utils::command::BotCommands};

use super::{ReplyBot, callback};
use crate::{prelude::*, state::AppState};

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase")]
pub enum Command {
  #[command(description = "register and open the main menu")]
  Start,
  #[command(description = "how to use this bot")]
  Help,
  #[command(description = "show your Telegram ID")]
  Myid,
  #[command(description = "open the admin panel")]
  Admin,
  #[command(description = "open the seller panel")]
  Seller,
  #[command(description = "abort the current operation")]
  Cancel,
}

const USER_HELP: &str = "\
<b>🎁 Promo Code Bot</b>

Use /start to open the main menu.
• <b>Campaigns</b>: claim a personal code from an active campaign
• <b>My codes</b>: codes you already claimed and their status

A claimed code is shown to the staff at the point of sale, \
who redeems it for you.";

const ADMIN_HELP: &str = "\
<b>📋 Admin Panel</b>

/admin - open the admin panel
/seller - open the seller panel

<b>Campaigns:</b> create, edit, pause, delete; each campaign hands out
a limited number of single-use codes until it expires.

<b>Staff:</b> add or remove admins and sellers. You cannot deactivate
or delete yourself.

<b>Redemption:</b> redeem a code a customer shows you, or review the
redemption history.";

pub async fn handle(
  app: Arc<AppState>,
  bot: ReplyBot,
  cmd: Command,
) -> ResponseResult<()> {
  match cmd {
    // /myid answers anywhere, even in groups
    Command::Myid => {
      bot
        .reply_html(format!("Your Telegram ID: <code>{}</code>", bot.user_id))
        .await?;
      return Ok(());
    }
    // every other command is private-chat only and silent in groups
    _ if !bot.private => return Ok(()),
    _ => {}
  }

  let sv = app.sv();

  let profile = bot.profile();
  if let Err(err) = sv.user.upsert(bot.user_id, &profile).await {
    error!("user upsert failed for {}: {err}", bot.user_id);
  }

  match cmd {
    Command::Start => {
      // a command always interrupts whatever wizard was in progress
      app.clear_dialog(bot.user_id);

      if let Err(err) = sv.staff.update_profile(bot.user_id, &profile).await {
        error!("staff profile refresh failed for {}: {err}", bot.user_id);
      }

      let name = profile.first_name.as_deref().unwrap_or("there");
      let text = format!(
        "Hi, {name}! Welcome to the promo code bot.\n\n\
        Claim personal codes from our campaigns and show them \
        at the point of sale."
      );
      bot.reply_with_keyboard(text, callback::main_menu()).await?;
    }
    Command::Help => {
      let is_admin = sv.staff.is_admin(bot.user_id).await.unwrap_or(false);
      bot.reply_html(if is_admin { ADMIN_HELP } else { USER_HELP }).await?;
    }
    Command::Admin => {
      app.clear_dialog(bot.user_id);

      match sv.staff.require_admin(bot.user_id).await {
        Ok(_) => {
          bot
            .reply_with_keyboard(
              "Welcome to the admin panel.",
              callback::admin_menu(),
            )
            .await?;
        }
        Err(err) => {
          bot.reply_html(format!("❌ {}", err.user_message())).await?;
        }
      }
    }
    Command::Seller => {
      app.clear_dialog(bot.user_id);

      match sv.staff.require_seller(bot.user_id).await {
        Ok(_) => {
          bot
            .reply_with_keyboard(
              "Welcome to the seller panel.",
              callback::seller_menu(),
            )
            .await?;
        }
        Err(err) => {
          bot.reply_html(format!("❌ {}", err.user_message())).await?;
        }
      }
    }
    Command::Cancel => {
      app.clear_dialog(bot.user_id);
      bot
        .reply_with_keyboard("Operation cancelled.", callback::main_menu())
        .await?;
    }
    Command::Myid => {}
  }

  Ok(())
}
