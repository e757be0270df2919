use teloxide::{
  Bot,
  prelude::Requester,
  requests::Request,
  types::{ChatId, UserId},
};

use crate::{prelude::*, sv::MembershipGate};

/// Membership gate backed by the chat platform. Fail-closed: an API error
/// or a timed-out round trip reads as "membership not confirmed".
pub struct TelegramGate {
  bot: Bot,
  group_id: ChatId,
  timeout: Duration,
}

impl TelegramGate {
  pub fn new(bot: Bot, group_id: i64, timeout: Duration) -> Self {
    Self { bot, group_id: ChatId(group_id), timeout }
  }
}

#[async_trait::async_trait]
impl MembershipGate for TelegramGate {
  async fn is_member(&self, user_id: i64) -> bool {
    let request =
      self.bot.get_chat_member(self.group_id, UserId(user_id as u64));

    match tokio::time::timeout(self.timeout, request.send()).await {
      Ok(Ok(member)) => !member.kind.is_left() && !member.kind.is_banned(),
      Ok(Err(err)) => {
        warn!("membership check failed for {user_id}: {err}");
        false
      }
      Err(_) => {
        warn!("membership check timed out for {user_id}");
        false
      }
    }
  }
}
