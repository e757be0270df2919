use std::sync::Arc;

use teloxide::{
  prelude::*,
  types::{InlineKeyboardButton, InlineKeyboardMarkup},
};

use super::{ReplyBot, membership::TelegramGate};
use crate::{
  entity::{StaffRole, campaign, staff},
  prelude::*,
  state::{AddCampaign, AppState, CampaignField, Dialog, Services},
  sv::user::Profile,
  utils,
};

/// Callback data enum - provides type-safe callback handling
#[derive(Debug, Clone, PartialEq)]
pub enum Callback {
  Campaigns,
  Claim(i32),
  MyCodes,
  MainMenu,
  AdminMenu,
  CampaignManage,
  CampaignAdd,
  CampaignList,
  CampaignView(i32),
  CampaignToggle(i32),
  CampaignDelete(i32),
  CampaignEdit(i32),
  CampaignEditField(i32, CampaignField),
  StaffManage,
  StaffAdd(StaffRole),
  StaffList,
  StaffView(i64),
  StaffToggle(i64),
  StaffDelete(i64),
  Redeem,
  History,
  SellerMenu,
  SellerStats,
  Cancel,
}

impl Callback {
  pub fn to_data(&self) -> String {
    match self {
      Callback::Campaigns => "campaigns".into(),
      Callback::Claim(id) => format!("claim:{id}"),
      Callback::MyCodes => "codes".into(),
      Callback::MainMenu => "menu".into(),
      Callback::AdminMenu => "admin".into(),
      Callback::CampaignManage => "camp_mgmt".into(),
      Callback::CampaignAdd => "camp_add".into(),
      Callback::CampaignList => "camp_list".into(),
      Callback::CampaignView(id) => format!("camp_view:{id}"),
      Callback::CampaignToggle(id) => format!("camp_toggle:{id}"),
      Callback::CampaignDelete(id) => format!("camp_del:{id}"),
      Callback::CampaignEdit(id) => format!("camp_edit:{id}"),
      Callback::CampaignEditField(id, field) => {
        let field = match field {
          CampaignField::Name => "name",
          CampaignField::Description => "desc",
          CampaignField::Limit => "limit",
          CampaignField::Expires => "expires",
        };
        format!("camp_set:{id}:{field}")
      }
      Callback::StaffManage => "staff_mgmt".into(),
      Callback::StaffAdd(StaffRole::Admin) => "staff_add:admin".into(),
      Callback::StaffAdd(StaffRole::Seller) => "staff_add:seller".into(),
      Callback::StaffList => "staff_list".into(),
      Callback::StaffView(id) => format!("staff_view:{id}"),
      Callback::StaffToggle(id) => format!("staff_toggle:{id}"),
      Callback::StaffDelete(id) => format!("staff_del:{id}"),
      Callback::Redeem => "redeem".into(),
      Callback::History => "history".into(),
      Callback::SellerMenu => "seller".into(),
      Callback::SellerStats => "seller_stats".into(),
      Callback::Cancel => "cancel".into(),
    }
  }

  pub fn from_data(data: &str) -> Option<Self> {
    let plain = match data {
      "campaigns" => Some(Callback::Campaigns),
      "codes" => Some(Callback::MyCodes),
      "menu" => Some(Callback::MainMenu),
      "admin" => Some(Callback::AdminMenu),
      "camp_mgmt" => Some(Callback::CampaignManage),
      "camp_add" => Some(Callback::CampaignAdd),
      "camp_list" => Some(Callback::CampaignList),
      "staff_mgmt" => Some(Callback::StaffManage),
      "staff_add:admin" => Some(Callback::StaffAdd(StaffRole::Admin)),
      "staff_add:seller" => Some(Callback::StaffAdd(StaffRole::Seller)),
      "staff_list" => Some(Callback::StaffList),
      "redeem" => Some(Callback::Redeem),
      "history" => Some(Callback::History),
      "seller" => Some(Callback::SellerMenu),
      "seller_stats" => Some(Callback::SellerStats),
      "cancel" => Some(Callback::Cancel),
      _ => None,
    };
    if plain.is_some() {
      return plain;
    }

    let (prefix, rest) = data.split_once(':')?;
    match prefix {
      "claim" => rest.parse().ok().map(Callback::Claim),
      "camp_view" => rest.parse().ok().map(Callback::CampaignView),
      "camp_toggle" => rest.parse().ok().map(Callback::CampaignToggle),
      "camp_del" => rest.parse().ok().map(Callback::CampaignDelete),
      "camp_edit" => rest.parse().ok().map(Callback::CampaignEdit),
      "camp_set" => {
        let (id, field) = rest.split_once(':')?;
        let field = match field {
          "name" => CampaignField::Name,
          "desc" => CampaignField::Description,
          "limit" => CampaignField::Limit,
          "expires" => CampaignField::Expires,
          _ => return None,
        };
        Some(Callback::CampaignEditField(id.parse().ok()?, field))
      }
      "staff_view" => rest.parse().ok().map(Callback::StaffView),
      "staff_toggle" => rest.parse().ok().map(Callback::StaffToggle),
      "staff_del" => rest.parse().ok().map(Callback::StaffDelete),
      _ => None,
    }
  }
}

pub fn main_menu() -> InlineKeyboardMarkup {
  InlineKeyboardMarkup::new(vec![
    vec![InlineKeyboardButton::callback(
      "🎁 Campaigns",
      Callback::Campaigns.to_data(),
    )],
    vec![InlineKeyboardButton::callback(
      "📋 My codes",
      Callback::MyCodes.to_data(),
    )],
  ])
}

pub fn admin_menu() -> InlineKeyboardMarkup {
  InlineKeyboardMarkup::new(vec![
    vec![InlineKeyboardButton::callback(
      "📦 Manage campaigns",
      Callback::CampaignManage.to_data(),
    )],
    vec![InlineKeyboardButton::callback(
      "👥 Manage staff",
      Callback::StaffManage.to_data(),
    )],
    vec![InlineKeyboardButton::callback(
      "🧾 Redeem a code",
      Callback::Redeem.to_data(),
    )],
    vec![InlineKeyboardButton::callback(
      "🕒 Redemption history",
      Callback::History.to_data(),
    )],
    vec![InlineKeyboardButton::callback(
      "« Back to Menu",
      Callback::MainMenu.to_data(),
    )],
  ])
}

pub fn seller_menu() -> InlineKeyboardMarkup {
  InlineKeyboardMarkup::new(vec![
    vec![InlineKeyboardButton::callback(
      "🧾 Redeem a code",
      Callback::Redeem.to_data(),
    )],
    vec![InlineKeyboardButton::callback(
      "📊 My stats",
      Callback::SellerStats.to_data(),
    )],
    vec![InlineKeyboardButton::callback(
      "« Back to Menu",
      Callback::MainMenu.to_data(),
    )],
  ])
}

pub fn campaign_manage_menu() -> InlineKeyboardMarkup {
  InlineKeyboardMarkup::new(vec![
    vec![InlineKeyboardButton::callback(
      "➕ Add campaign",
      Callback::CampaignAdd.to_data(),
    )],
    vec![InlineKeyboardButton::callback(
      "📋 List campaigns",
      Callback::CampaignList.to_data(),
    )],
    vec![InlineKeyboardButton::callback(
      "« Back",
      Callback::AdminMenu.to_data(),
    )],
  ])
}

pub fn staff_manage_menu() -> InlineKeyboardMarkup {
  InlineKeyboardMarkup::new(vec![
    vec![InlineKeyboardButton::callback(
      "➕ Add admin",
      Callback::StaffAdd(StaffRole::Admin).to_data(),
    )],
    vec![InlineKeyboardButton::callback(
      "➕ Add seller",
      Callback::StaffAdd(StaffRole::Seller).to_data(),
    )],
    vec![InlineKeyboardButton::callback(
      "📋 List staff",
      Callback::StaffList.to_data(),
    )],
    vec![InlineKeyboardButton::callback(
      "« Back",
      Callback::AdminMenu.to_data(),
    )],
  ])
}

pub fn back_keyboard() -> InlineKeyboardMarkup {
  InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
    "« Back to Menu",
    Callback::MainMenu.to_data(),
  )]])
}

pub fn cancel_keyboard() -> InlineKeyboardMarkup {
  InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
    "✖ Cancel",
    Callback::Cancel.to_data(),
  )]])
}

fn campaign_icon(campaign: &campaign::Model, now: DateTime) -> &'static str {
  if !campaign.is_active {
    "❌"
  } else if campaign.is_expired(now) {
    "⏱"
  } else if campaign.is_limit_reached() {
    "🔒"
  } else {
    "✅"
  }
}

fn campaign_status(campaign: &campaign::Model, now: DateTime) -> &'static str {
  if !campaign.is_active {
    "❌ Inactive"
  } else if campaign.is_expired(now) {
    "⏱ Expired"
  } else if campaign.is_limit_reached() {
    "🔒 Limit reached"
  } else {
    "✅ Active"
  }
}

fn staff_profile(staff: &staff::Model) -> Profile {
  Profile {
    first_name: staff.first_name.clone(),
    last_name: staff.last_name.clone(),
    username: staff.username.clone(),
  }
}

pub async fn handle(
  app: Arc<AppState>,
  bot: ReplyBot,
  data: &str,
) -> ResponseResult<()> {
  let sv = app.sv();

  let Some(callback) = Callback::from_data(data) else {
    return Ok(());
  };

  match callback {
    Callback::MainMenu => {
      app.clear_dialog(bot.user_id);
      bot
        .edit_with_keyboard(
          "What would you like to do?",
          main_menu(),
        )
        .await?;
    }
    Callback::Cancel => {
      app.clear_dialog(bot.user_id);
      bot.edit_with_keyboard("Operation cancelled.", back_keyboard()).await?;
    }
    Callback::Campaigns => {
      handle_campaign_list(&sv, &bot).await?;
    }
    Callback::Claim(id) => {
      handle_claim(&app, &sv, &bot, id).await?;
    }
    Callback::MyCodes => {
      handle_my_codes(&sv, &bot).await?;
    }
    Callback::AdminMenu => {
      if authorize_admin(&sv, &bot).await?.is_none() {
        return Ok(());
      }
      app.clear_dialog(bot.user_id);
      bot
        .edit_with_keyboard("Welcome to the admin panel.", admin_menu())
        .await?;
    }
    Callback::CampaignManage => {
      if authorize_admin(&sv, &bot).await?.is_none() {
        return Ok(());
      }
      bot.edit_with_keyboard("Choose an action:", campaign_manage_menu()).await?;
    }
    Callback::CampaignAdd => {
      if authorize_admin(&sv, &bot).await?.is_none() {
        return Ok(());
      }
      app.set_dialog(bot.user_id, Dialog::AddCampaign(AddCampaign::Name));
      bot
        .edit_with_keyboard("Enter the campaign name:", cancel_keyboard())
        .await?;
    }
    Callback::CampaignList => {
      if authorize_admin(&sv, &bot).await?.is_none() {
        return Ok(());
      }
      handle_campaign_admin_list(&sv, &bot).await?;
    }
    Callback::CampaignView(id) => {
      if authorize_admin(&sv, &bot).await?.is_none() {
        return Ok(());
      }
      handle_campaign_view(&sv, &bot, id).await?;
    }
    Callback::CampaignToggle(id) => {
      if authorize_admin(&sv, &bot).await?.is_none() {
        return Ok(());
      }
      match sv.campaign.toggle_active(id).await {
        Ok(_) => handle_campaign_view(&sv, &bot, id).await?,
        Err(err) => {
          bot
            .edit_with_keyboard(
              format!("❌ {}", err.user_message()),
              back_keyboard(),
            )
            .await?;
        }
      }
    }
    Callback::CampaignDelete(id) => {
      if authorize_admin(&sv, &bot).await?.is_none() {
        return Ok(());
      }
      match sv.campaign.delete(id).await {
        Ok(()) => handle_campaign_admin_list(&sv, &bot).await?,
        Err(err) => {
          bot
            .edit_with_keyboard(
              format!("❌ {}", err.user_message()),
              back_keyboard(),
            )
            .await?;
        }
      }
    }
    Callback::CampaignEdit(id) => {
      if authorize_admin(&sv, &bot).await?.is_none() {
        return Ok(());
      }
      let fields = InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
          "Name",
          Callback::CampaignEditField(id, CampaignField::Name).to_data(),
        )],
        vec![InlineKeyboardButton::callback(
          "Description",
          Callback::CampaignEditField(id, CampaignField::Description).to_data(),
        )],
        vec![InlineKeyboardButton::callback(
          "Limit",
          Callback::CampaignEditField(id, CampaignField::Limit).to_data(),
        )],
        vec![InlineKeyboardButton::callback(
          "Expiry date",
          Callback::CampaignEditField(id, CampaignField::Expires).to_data(),
        )],
        vec![InlineKeyboardButton::callback(
          "« Back",
          Callback::CampaignView(id).to_data(),
        )],
      ]);
      bot.edit_with_keyboard("What do you want to change?", fields).await?;
    }
    Callback::CampaignEditField(id, field) => {
      if authorize_admin(&sv, &bot).await?.is_none() {
        return Ok(());
      }
      if sv.campaign.by_id(id).await.ok().flatten().is_none() {
        bot
          .edit_with_keyboard("❌ Campaign not found.", back_keyboard())
          .await?;
        return Ok(());
      }

      app.set_dialog(bot.user_id, Dialog::EditCampaign { id, field });
      let prompt = match field {
        CampaignField::Name => "Enter the new campaign name:",
        CampaignField::Description => "Enter the new description:",
        CampaignField::Limit => "Enter the new code limit:",
        CampaignField::Expires => {
          "Enter the new expiry date (DD.MM.YYYY):"
        }
      };
      bot.edit_with_keyboard(prompt, cancel_keyboard()).await?;
    }
    Callback::StaffManage => {
      if authorize_admin(&sv, &bot).await?.is_none() {
        return Ok(());
      }
      bot.edit_with_keyboard("Choose an action:", staff_manage_menu()).await?;
    }
    Callback::StaffAdd(role) => {
      if authorize_admin(&sv, &bot).await?.is_none() {
        return Ok(());
      }
      app.set_dialog(bot.user_id, Dialog::AddStaff { role });
      let prompt = match role {
        StaffRole::Admin => "Enter the Telegram ID of the new admin:",
        StaffRole::Seller => "Enter the Telegram ID of the new seller:",
      };
      bot.edit_with_keyboard(prompt, cancel_keyboard()).await?;
    }
    Callback::StaffList => {
      if authorize_admin(&sv, &bot).await?.is_none() {
        return Ok(());
      }
      handle_staff_list(&sv, &bot).await?;
    }
    Callback::StaffView(id) => {
      if authorize_admin(&sv, &bot).await?.is_none() {
        return Ok(());
      }
      handle_staff_view(&sv, &bot, id).await?;
    }
    Callback::StaffToggle(id) => {
      if authorize_admin(&sv, &bot).await?.is_none() {
        return Ok(());
      }
      match sv.staff.toggle_active(id, bot.user_id).await {
        Ok(_) => handle_staff_view(&sv, &bot, id).await?,
        Err(err) => {
          bot
            .edit_with_keyboard(
              format!("❌ {}", err.user_message()),
              back_keyboard(),
            )
            .await?;
        }
      }
    }
    Callback::StaffDelete(id) => {
      if authorize_admin(&sv, &bot).await?.is_none() {
        return Ok(());
      }
      match sv.staff.remove(id, bot.user_id).await {
        Ok(()) => handle_staff_list(&sv, &bot).await?,
        Err(err) => {
          bot
            .edit_with_keyboard(
              format!("❌ {}", err.user_message()),
              back_keyboard(),
            )
            .await?;
        }
      }
    }
    Callback::Redeem => {
      if authorize_seller(&sv, &bot).await?.is_none() {
        return Ok(());
      }
      app.set_dialog(bot.user_id, Dialog::Redeem);
      bot
        .edit_with_keyboard(
          "Enter the code you want to redeem:",
          cancel_keyboard(),
        )
        .await?;
    }
    Callback::History => {
      if authorize_admin(&sv, &bot).await?.is_none() {
        return Ok(());
      }
      handle_history(&sv, &bot).await?;
    }
    Callback::SellerMenu => {
      if authorize_seller(&sv, &bot).await?.is_none() {
        return Ok(());
      }
      bot
        .edit_with_keyboard("Welcome to the seller panel.", seller_menu())
        .await?;
    }
    Callback::SellerStats => {
      if authorize_seller(&sv, &bot).await?.is_none() {
        return Ok(());
      }
      handle_seller_stats(&sv, &bot).await?;
    }
  }

  Ok(())
}

async fn authorize_admin(
  sv: &Services<'_>,
  bot: &ReplyBot,
) -> ResponseResult<Option<staff::Model>> {
  match sv.staff.require_admin(bot.user_id).await {
    Ok(staff) => Ok(Some(staff)),
    Err(err) => {
      bot
        .edit_with_keyboard(format!("❌ {}", err.user_message()), back_keyboard())
        .await?;
      Ok(None)
    }
  }
}

async fn authorize_seller(
  sv: &Services<'_>,
  bot: &ReplyBot,
) -> ResponseResult<Option<staff::Model>> {
  match sv.staff.require_seller(bot.user_id).await {
    Ok(staff) => Ok(Some(staff)),
    Err(err) => {
      bot
        .edit_with_keyboard(format!("❌ {}", err.user_message()), back_keyboard())
        .await?;
      Ok(None)
    }
  }
}

async fn handle_campaign_list(
  sv: &Services<'_>,
  bot: &ReplyBot,
) -> ResponseResult<()> {
  match sv.campaign.available().await {
    Ok(campaigns) if !campaigns.is_empty() => {
      let mut rows: Vec<_> = campaigns
        .iter()
        .map(|c| {
          vec![InlineKeyboardButton::callback(
            c.name.clone(),
            Callback::Claim(c.id).to_data(),
          )]
        })
        .collect();
      rows.push(vec![InlineKeyboardButton::callback(
        "« Back to Menu",
        Callback::MainMenu.to_data(),
      )]);

      bot
        .edit_with_keyboard(
          "Pick a campaign to claim a code from:",
          InlineKeyboardMarkup::new(rows),
        )
        .await?;
    }
    Ok(_) => {
      bot
        .edit_with_keyboard(
          "There are no active campaigns right now.",
          back_keyboard(),
        )
        .await?;
    }
    Err(err) => {
      error!("campaign list failed: {err}");
      bot
        .edit_with_keyboard(format!("❌ {}", err.user_message()), back_keyboard())
        .await?;
    }
  }

  Ok(())
}

async fn handle_claim(
  app: &AppState,
  sv: &Services<'_>,
  bot: &ReplyBot,
  campaign_id: i32,
) -> ResponseResult<()> {
  if !bot.private {
    bot
      .reply_html("This action is only available in a private chat with the bot.")
      .await?;
    return Ok(());
  }

  let gate = TelegramGate::new(
    bot.inner.clone(),
    app.config.group_id,
    app.config.gate_timeout,
  );

  match sv.claim.claim(&gate, bot.user_id, campaign_id).await {
    Ok(issued) => {
      let text = format!(
        "🎟 Your code: <code>{}</code>\n\n\
        {}\n\
        Valid until: {}\n\n\
        Show this code to a staff member to use it.",
        issued.code,
        issued.campaign.description,
        utils::format_date(issued.campaign.expires_at)
      );
      bot.reply_with_keyboard(text, back_keyboard()).await?;
    }
    Err(err) => {
      if matches!(err, Error::Db(_) | Error::Internal(_)) {
        error!("claim failed for {}: {err}", bot.user_id);
      }
      bot
        .reply_with_keyboard(format!("❌ {}", err.user_message()), back_keyboard())
        .await?;
    }
  }

  Ok(())
}

async fn handle_my_codes(
  sv: &Services<'_>,
  bot: &ReplyBot,
) -> ResponseResult<()> {
  let claims = match sv.claim.of_user(bot.user_id).await {
    Ok(claims) => claims,
    Err(err) => {
      error!("claim listing failed for {}: {err}", bot.user_id);
      bot
        .edit_with_keyboard(format!("❌ {}", err.user_message()), back_keyboard())
        .await?;
      return Ok(());
    }
  };

  if claims.is_empty() {
    bot
      .edit_with_keyboard("You have not claimed any codes yet.", back_keyboard())
      .await?;
    return Ok(());
  }

  let now = Utc::now().naive_utc();
  let mut text = String::from("📋 <b>Your codes:</b>\n\n");

  for (claim, campaign) in claims {
    match campaign {
      Some(campaign) => {
        text.push_str(&format!(
          "{} <b>{}</b>\n\
          Code: <code>{}</code>\n\
          {}\n\
          Valid until: {}\n\
          Claimed: {}\n",
          campaign_icon(&campaign, now),
          campaign.name,
          claim.code,
          campaign.description,
          utils::format_date(campaign.expires_at),
          utils::format_date(claim.claimed_at),
        ));

        let status = if claim.redeemed {
          format!(
            "🔐 redeemed {}",
            claim.redeemed_at.map(utils::format_date).unwrap_or_default()
          )
        } else if !campaign.is_active {
          "❌ unavailable (campaign cancelled)".into()
        } else if campaign.is_expired(now) {
          "⏱ unavailable (campaign expired)".into()
        } else {
          "🔓 ready to use".into()
        };
        text.push_str(&format!("Status: {status}\n\n"));
      }
      None => {
        // the campaign was removed; the claim still belongs to the user
        text.push_str(&format!(
          "🔄 Code: <code>{}</code>\n\
          The campaign was removed\n\
          Claimed: {}\n",
          claim.code,
          utils::format_date(claim.claimed_at),
        ));

        let status = if claim.redeemed {
          format!(
            "🔐 redeemed {}",
            claim.redeemed_at.map(utils::format_date).unwrap_or_default()
          )
        } else {
          "⏳ waiting to be used".into()
        };
        text.push_str(&format!("Status: {status}\n\n"));
      }
    }
  }

  bot.reply_html_chunked(text).await?;
  Ok(())
}

async fn handle_campaign_admin_list(
  sv: &Services<'_>,
  bot: &ReplyBot,
) -> ResponseResult<()> {
  let campaigns = match sv.campaign.all().await {
    Ok(campaigns) => campaigns,
    Err(err) => {
      error!("admin campaign list failed: {err}");
      bot
        .edit_with_keyboard(format!("❌ {}", err.user_message()), back_keyboard())
        .await?;
      return Ok(());
    }
  };

  if campaigns.is_empty() {
    bot
      .edit_with_keyboard("No campaigns yet.", campaign_manage_menu())
      .await?;
    return Ok(());
  }

  let now = Utc::now().naive_utc();
  let mut rows: Vec<_> = campaigns
    .iter()
    .map(|c| {
      vec![InlineKeyboardButton::callback(
        format!(
          "{} {} ({}/{})",
          campaign_icon(c, now),
          c.name,
          c.used_count,
          c.total_limit
        ),
        Callback::CampaignView(c.id).to_data(),
      )]
    })
    .collect();
  rows.push(vec![InlineKeyboardButton::callback(
    "◀️ Back",
    Callback::CampaignManage.to_data(),
  )]);

  bot
    .edit_with_keyboard(
      "Campaigns:\nPick one to manage:",
      InlineKeyboardMarkup::new(rows),
    )
    .await?;
  Ok(())
}

async fn handle_campaign_view(
  sv: &Services<'_>,
  bot: &ReplyBot,
  id: i32,
) -> ResponseResult<()> {
  let Some(campaign) = sv.campaign.by_id(id).await.ok().flatten() else {
    bot.edit_with_keyboard("❌ Campaign not found.", back_keyboard()).await?;
    return Ok(());
  };

  let now = Utc::now().naive_utc();
  let text = format!(
    "Campaign: <b>{}</b>\n\n\
    Description: {}\n\
    Status: {}\n\
    Used: {}/{}\n\
    Valid until: {}\n\
    Created: {}\n\n\
    Choose an action:",
    campaign.name,
    campaign.description,
    campaign_status(&campaign, now),
    campaign.used_count,
    campaign.total_limit,
    utils::format_date(campaign.expires_at),
    utils::format_date(campaign.created_at),
  );

  let keyboard = InlineKeyboardMarkup::new(vec![
    vec![InlineKeyboardButton::callback(
      if campaign.is_active { "🔴 Deactivate" } else { "🟢 Activate" },
      Callback::CampaignToggle(id).to_data(),
    )],
    vec![InlineKeyboardButton::callback(
      "🗑 Delete",
      Callback::CampaignDelete(id).to_data(),
    )],
    vec![InlineKeyboardButton::callback(
      "✏️ Edit",
      Callback::CampaignEdit(id).to_data(),
    )],
    vec![InlineKeyboardButton::callback(
      "◀️ Back to list",
      Callback::CampaignList.to_data(),
    )],
  ]);

  bot.edit_with_keyboard(text, keyboard).await?;
  Ok(())
}

async fn handle_staff_list(
  sv: &Services<'_>,
  bot: &ReplyBot,
) -> ResponseResult<()> {
  let staff = match sv.staff.list(None).await {
    Ok(staff) => staff,
    Err(err) => {
      error!("staff list failed: {err}");
      bot
        .edit_with_keyboard(format!("❌ {}", err.user_message()), back_keyboard())
        .await?;
      return Ok(());
    }
  };

  if staff.is_empty() {
    bot.edit_with_keyboard("No staff members yet.", staff_manage_menu()).await?;
    return Ok(());
  }

  let mut rows: Vec<_> = staff
    .iter()
    .map(|member| {
      let icon = if member.is_active { "✅" } else { "❌" };
      let role = match member.role {
        StaffRole::Admin => "admin",
        StaffRole::Seller => "seller",
      };
      vec![InlineKeyboardButton::callback(
        format!("{icon} {} [{role}]", staff_profile(member).full_name()),
        Callback::StaffView(member.tg_user_id).to_data(),
      )]
    })
    .collect();
  rows.push(vec![InlineKeyboardButton::callback(
    "◀️ Back",
    Callback::StaffManage.to_data(),
  )]);

  bot
    .edit_with_keyboard(
      "Staff members:\nPick one to manage:",
      InlineKeyboardMarkup::new(rows),
    )
    .await?;
  Ok(())
}

async fn handle_staff_view(
  sv: &Services<'_>,
  bot: &ReplyBot,
  id: i64,
) -> ResponseResult<()> {
  let Some(member) = sv.staff.by_id(id).await.ok().flatten() else {
    bot.edit_with_keyboard("❌ Staff member not found.", back_keyboard()).await?;
    return Ok(());
  };

  let you = if member.tg_user_id == bot.user_id { " (you)" } else { "" };
  let role = match member.role {
    StaffRole::Admin => "Admin",
    StaffRole::Seller => "Seller",
  };

  let mut text = format!(
    "Staff member: <b>{}</b>{you}\n\n\
    ID: <code>{}</code>\n\
    Role: {role}\n\
    Status: {}\n\
    Added: {}\n",
    staff_profile(&member).full_name(),
    member.tg_user_id,
    if member.is_active { "✅ Active" } else { "❌ Inactive" },
    utils::format_date(member.added_at),
  );
  if member.role == StaffRole::Seller {
    text.push_str(&format!("Redemptions: {}\n", member.redemption_count));
  }
  text.push_str("\nChoose an action:");

  let keyboard = InlineKeyboardMarkup::new(vec![
    vec![InlineKeyboardButton::callback(
      if member.is_active { "🔴 Deactivate" } else { "🟢 Activate" },
      Callback::StaffToggle(id).to_data(),
    )],
    vec![InlineKeyboardButton::callback(
      "🗑 Delete",
      Callback::StaffDelete(id).to_data(),
    )],
    vec![InlineKeyboardButton::callback(
      "◀️ Back to list",
      Callback::StaffList.to_data(),
    )],
  ]);

  bot.edit_with_keyboard(text, keyboard).await?;
  Ok(())
}

async fn handle_history(
  sv: &Services<'_>,
  bot: &ReplyBot,
) -> ResponseResult<()> {
  let entries = match sv.redemption.history(20).await {
    Ok(entries) => entries,
    Err(err) => {
      error!("redemption history failed: {err}");
      bot
        .edit_with_keyboard(format!("❌ {}", err.user_message()), back_keyboard())
        .await?;
      return Ok(());
    }
  };

  if entries.is_empty() {
    bot
      .edit_with_keyboard("No codes have been redeemed yet.", back_keyboard())
      .await?;
    return Ok(());
  }

  let mut text = String::from("📋 <b>Latest redemptions:</b>\n\n");
  for entry in entries {
    let campaign = entry
      .campaign
      .map(|c| c.name)
      .unwrap_or_else(|| "removed campaign".into());
    let claimant = entry
      .claimant
      .as_ref()
      .map(|u| Profile::from(u).full_name())
      .unwrap_or_else(|| "unknown user".into());

    text.push_str(&format!(
      "🔑 Code: <code>{}</code>\n\
      📦 Campaign: {}\n\
      👤 Claimed by: {}\n\
      🕒 Redeemed: {}\n\n",
      entry.record.code,
      campaign,
      claimant,
      utils::format_date(entry.record.redeemed_at),
    ));
  }

  bot.reply_html_chunked(text).await?;
  Ok(())
}

async fn handle_seller_stats(
  sv: &Services<'_>,
  bot: &ReplyBot,
) -> ResponseResult<()> {
  let stats = match sv.redemption.seller_stats(bot.user_id).await {
    Ok(stats) => stats,
    Err(err) => {
      error!("seller stats failed for {}: {err}", bot.user_id);
      bot
        .edit_with_keyboard(format!("❌ {}", err.user_message()), back_keyboard())
        .await?;
      return Ok(());
    }
  };

  let mut text =
    format!("📊 <b>Your stats</b>\n\nTotal redemptions: {}\n\n", stats.total);

  text.push_str("🔍 By campaign:\n");
  if stats.by_campaign.is_empty() {
    text.push_str("No redemptions yet\n");
  } else {
    for (campaign, count) in &stats.by_campaign {
      let name = campaign
        .as_ref()
        .map(|c| c.name.as_str())
        .unwrap_or("removed campaign");
      text.push_str(&format!("- {name}: {count}\n"));
    }
  }

  text.push_str("\n🕒 Recent:\n");
  if stats.recent.is_empty() {
    text.push_str("No recent redemptions\n");
  } else {
    for (record, campaign) in &stats.recent {
      let name = campaign
        .as_ref()
        .map(|c| c.name.as_str())
        .unwrap_or("removed campaign");
      text.push_str(&format!(
        "- {}: {name} (<code>{}</code>)\n",
        utils::format_date(record.redeemed_at),
        record.code,
      ));
    }
  }

  bot.edit_with_keyboard(text, seller_menu()).await?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn callback_data_round_trips() {
    let callbacks = [
      Callback::Campaigns,
      Callback::Claim(42),
      Callback::MyCodes,
      Callback::MainMenu,
      Callback::AdminMenu,
      Callback::CampaignManage,
      Callback::CampaignAdd,
      Callback::CampaignList,
      Callback::CampaignView(7),
      Callback::CampaignToggle(7),
      Callback::CampaignDelete(7),
      Callback::CampaignEdit(7),
      Callback::CampaignEditField(7, CampaignField::Expires),
      Callback::StaffManage,
      Callback::StaffAdd(StaffRole::Seller),
      Callback::StaffList,
      Callback::StaffView(123456789),
      Callback::StaffToggle(123456789),
      Callback::StaffDelete(123456789),
      Callback::Redeem,
      Callback::History,
      Callback::SellerMenu,
      Callback::SellerStats,
      Callback::Cancel,
    ];

    for callback in callbacks {
      assert_eq!(Callback::from_data(&callback.to_data()), Some(callback));
    }
  }

  #[test]
  fn junk_data_is_ignored() {
    assert_eq!(Callback::from_data("bogus"), None);
    assert_eq!(Callback::from_data("claim:notanumber"), None);
    assert_eq!(Callback::from_data("camp_set:1:bogus"), None);
  }
}
