use std::sync::Arc;

use teloxide::{prelude::*, types::ChatId};

use super::{ReplyBot, callback};
use crate::{
  entity::StaffRole,
  prelude::*,
  state::{AddCampaign, AppState, CampaignField, Dialog},
  sv::user::Profile,
  utils,
};

/// Free-text input. Only a conversation with a wizard in progress gets
/// here; everything else falls through untouched.
pub async fn handle(
  app: Arc<AppState>,
  bot: ReplyBot,
  text: Option<String>,
) -> ResponseResult<()> {
  if !bot.private {
    return Ok(());
  }

  let Some(dialog) = app.dialog(bot.user_id) else {
    return Ok(());
  };

  let Some(text) = text else {
    bot
      .reply_with_keyboard(
        "Please send a text message.",
        callback::cancel_keyboard(),
      )
      .await?;
    return Ok(());
  };
  let text = text.trim().to_owned();

  match dialog {
    Dialog::AddCampaign(step) => {
      handle_add_campaign(&app, &bot, step, &text).await
    }
    Dialog::EditCampaign { id, field } => {
      handle_edit_campaign(&app, &bot, id, field, &text).await
    }
    Dialog::AddStaff { role } => handle_add_staff(&app, &bot, role, &text).await,
    Dialog::Redeem => handle_redeem(&app, &bot, &text).await,
  }
}

/// Re-prompt in place: the dialog entry stays, the collected steps survive.
async fn retry(bot: &ReplyBot, message: String) -> ResponseResult<()> {
  bot.reply_with_keyboard(message, callback::cancel_keyboard()).await?;
  Ok(())
}

async fn handle_add_campaign(
  app: &AppState,
  bot: &ReplyBot,
  step: AddCampaign,
  text: &str,
) -> ResponseResult<()> {
  let sv = app.sv();

  match step {
    AddCampaign::Name => {
      if text.is_empty() {
        return retry(bot, "The name cannot be empty. Enter the campaign name:".into()).await;
      }

      app.set_dialog(
        bot.user_id,
        Dialog::AddCampaign(AddCampaign::Description { name: text.into() }),
      );
      bot
        .reply_with_keyboard(
          "Enter the campaign description:",
          callback::cancel_keyboard(),
        )
        .await?;
    }
    AddCampaign::Description { name } => {
      app.set_dialog(
        bot.user_id,
        Dialog::AddCampaign(AddCampaign::Limit {
          name,
          description: text.into(),
        }),
      );
      bot
        .reply_with_keyboard(
          "Enter how many codes can be claimed (limit):",
          callback::cancel_keyboard(),
        )
        .await?;
    }
    AddCampaign::Limit { name, description } => {
      let Ok(limit) = text.parse::<i32>() else {
        return retry(bot, Error::InvalidNumber.user_message()).await;
      };
      if limit <= 0 {
        return retry(bot, Error::InvalidNumber.user_message()).await;
      }

      app.set_dialog(
        bot.user_id,
        Dialog::AddCampaign(AddCampaign::Expires { name, description, limit }),
      );
      bot
        .reply_with_keyboard(
          "Enter the expiry date (DD.MM.YYYY):",
          callback::cancel_keyboard(),
        )
        .await?;
    }
    AddCampaign::Expires { name, description, limit } => {
      let Some(expires_at) = utils::parse_date(text) else {
        return retry(bot, Error::InvalidDate.user_message()).await;
      };

      match sv.campaign.create(&name, &description, limit, expires_at).await {
        Ok(campaign) => {
          app.clear_dialog(bot.user_id);
          let text = format!(
            "✅ Campaign created!\n\n\
            Name: <b>{}</b>\n\
            Description: {}\n\
            Limit: {}\n\
            Valid until: {}",
            campaign.name,
            campaign.description,
            campaign.total_limit,
            utils::format_date(campaign.expires_at),
          );
          bot
            .reply_with_keyboard(text, callback::campaign_manage_menu())
            .await?;
        }
        Err(err @ (Error::InvalidDate | Error::InvalidNumber)) => {
          return retry(bot, err.user_message()).await;
        }
        Err(err) => {
          error!("campaign creation failed: {err}");
          app.clear_dialog(bot.user_id);
          bot.reply_html(format!("❌ {}", err.user_message())).await?;
        }
      }
    }
  }

  Ok(())
}

async fn handle_edit_campaign(
  app: &AppState,
  bot: &ReplyBot,
  id: i32,
  field: CampaignField,
  text: &str,
) -> ResponseResult<()> {
  let sv = app.sv();

  let result = match field {
    CampaignField::Name => {
      if text.is_empty() {
        return retry(bot, "The name cannot be empty. Enter the new name:".into()).await;
      }
      sv.campaign.rename(id, text).await
    }
    CampaignField::Description => sv.campaign.set_description(id, text).await,
    CampaignField::Limit => {
      let Ok(limit) = text.parse::<i32>() else {
        return retry(bot, Error::InvalidNumber.user_message()).await;
      };
      sv.campaign.set_limit(id, limit).await
    }
    CampaignField::Expires => {
      let Some(expires_at) = utils::parse_date(text) else {
        return retry(bot, Error::InvalidDate.user_message()).await;
      };
      sv.campaign.set_expires(id, expires_at).await
    }
  };

  match result {
    Ok(campaign) => {
      app.clear_dialog(bot.user_id);
      let text = format!(
        "✅ Campaign updated!\n\n\
        Name: <b>{}</b>\n\
        Description: {}\n\
        Used: {}/{}\n\
        Valid until: {}",
        campaign.name,
        campaign.description,
        campaign.used_count,
        campaign.total_limit,
        utils::format_date(campaign.expires_at),
      );
      bot.reply_with_keyboard(text, callback::campaign_manage_menu()).await?;
    }
    Err(
      err @ (Error::InvalidNumber
      | Error::InvalidDate
      | Error::LimitBelowUsage { .. }),
    ) => {
      return retry(bot, err.user_message()).await;
    }
    Err(err) => {
      if matches!(err, Error::Db(_)) {
        error!("campaign edit failed: {err}");
      }
      app.clear_dialog(bot.user_id);
      bot.reply_html(format!("❌ {}", err.user_message())).await?;
    }
  }

  Ok(())
}

async fn handle_add_staff(
  app: &AppState,
  bot: &ReplyBot,
  role: StaffRole,
  text: &str,
) -> ResponseResult<()> {
  let sv = app.sv();

  let Ok(new_id) = text.parse::<i64>() else {
    return retry(bot, "Please enter a valid Telegram ID (a number).".into())
      .await;
  };

  // best effort: ask the platform who this is; an unknown id still gets
  // added, just without display fields
  let profile = match bot.inner.get_chat(ChatId(new_id)).await {
    Ok(chat) => Profile {
      first_name: chat.first_name().map(str::to_owned),
      last_name: chat.last_name().map(str::to_owned),
      username: chat.username().map(str::to_owned),
    },
    Err(err) => {
      warn!("could not resolve profile for {new_id}: {err}");
      Profile::default()
    }
  };

  match sv.staff.add(new_id, role, Some(bot.user_id), profile).await {
    Ok(member) => {
      app.clear_dialog(bot.user_id);
      let role = match member.role {
        StaffRole::Admin => "Admin",
        StaffRole::Seller => "Seller",
      };
      let username = member
        .username
        .as_deref()
        .map(|u| format!("@{u}"))
        .unwrap_or_else(|| "not set".into());
      let text = format!(
        "✅ {role} added!\n\n\
        ID: <code>{}</code>\n\
        Name: {}\n\
        Username: {}",
        member.tg_user_id,
        member.first_name.as_deref().unwrap_or("not set"),
        username,
      );
      bot.reply_with_keyboard(text, callback::staff_manage_menu()).await?;
    }
    Err(err) => {
      if matches!(err, Error::Db(_)) {
        error!("staff add failed: {err}");
      }
      app.clear_dialog(bot.user_id);
      bot.reply_html(format!("❌ {}", err.user_message())).await?;
    }
  }

  Ok(())
}

async fn handle_redeem(
  app: &AppState,
  bot: &ReplyBot,
  text: &str,
) -> ResponseResult<()> {
  let sv = app.sv();

  // the wizard could outlive the permission that opened it
  if let Err(err) = sv.staff.require_seller(bot.user_id).await {
    app.clear_dialog(bot.user_id);
    bot.reply_html(format!("❌ {}", err.user_message())).await?;
    return Ok(());
  }

  app.clear_dialog(bot.user_id);

  let menu = if sv.staff.is_admin(bot.user_id).await.unwrap_or(false) {
    callback::admin_menu()
  } else {
    callback::seller_menu()
  };

  match sv.redemption.redeem(text, bot.user_id).await {
    Ok(redeemed) => {
      let reply = format!(
        "✅ Code <code>{}</code> redeemed!\n\n\
        User: {}\n\
        User ID: <code>{}</code>\n\
        Campaign: {}\n\
        Description: {}\n\
        Claimed: {}\n\
        Redeemed: {}\n\n\
        Campaign usage: {}/{}",
        redeemed.record.code,
        Profile::from(&redeemed.claimant).full_name(),
        redeemed.claimant.tg_user_id,
        redeemed.campaign.name,
        redeemed.campaign.description,
        utils::format_date(redeemed.claim.claimed_at),
        utils::format_date(redeemed.record.redeemed_at),
        redeemed.campaign.used_count,
        redeemed.campaign.total_limit,
      );
      bot.reply_with_keyboard(reply, menu).await?;
    }
    Err(err) => {
      if matches!(err, Error::Db(_)) {
        error!("redemption failed: {err}");
      }
      bot
        .reply_with_keyboard(format!("❌ {}", err.user_message()), menu)
        .await?;
    }
  }

  Ok(())
}
