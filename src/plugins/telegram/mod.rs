mod callback;
mod command;
mod dialog;
mod membership;

use std::sync::Arc;

use command::Command;
use teloxide::{
  Bot,
  dispatching::{Dispatcher, HandlerExt, UpdateFilterExt},
  prelude::*,
  types::{
    CallbackQuery, ChatId, InlineKeyboardMarkup, Message, MessageId,
    ParseMode, Update, User,
  },
  utils::command::BotCommands,
};

use crate::{prelude::*, state::AppState, sv::user::Profile, utils};

pub struct Plugin;

#[async_trait::async_trait]
impl super::Plugin for Plugin {
  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()> {
    run_bot(app).await;
    Ok(())
  }
}

async fn setup_commands(bot: &Bot) {
  if let Err(err) = bot.set_my_commands(Command::bot_commands()).await {
    warn!("Failed to set command hints: {}", err);
  }
}

pub async fn run_bot(app: Arc<AppState>) {
  info!("Starting Telegram bot...");

  let bot = app.bot.clone();
  setup_commands(&bot).await;

  let handler = teloxide::dptree::entry()
    .branch(Update::filter_message().filter_command::<Command>().endpoint({
      let app = app.clone();
      move |bot: Bot, msg: Message, cmd: Command| {
        let app = app.clone();
        let bot = ReplyBot::from_message(bot, &msg);
        command::handle(app, bot, cmd)
      }
    }))
    // free text only reaches a wizard that is waiting for it
    .branch(Update::filter_message().endpoint({
      let app = app.clone();
      move |bot: Bot, msg: Message| {
        let app = app.clone();
        let text = msg.text().map(str::to_owned);
        let bot = ReplyBot::from_message(bot, &msg);
        dialog::handle(app, bot, text)
      }
    }))
    .branch(Update::filter_callback_query().endpoint({
      let app = app.clone();
      move |bot: Bot, query: CallbackQuery| {
        let app = app.clone();
        callback_handle(app, bot, query)
      }
    }));

  Dispatcher::builder(bot, handler).build().dispatch().await;
}

async fn callback_handle(
  app: Arc<AppState>,
  bot: Bot,
  query: CallbackQuery,
) -> ResponseResult<()> {
  if let Some(data) = query.data
    && let Some(msg) = query.message.as_ref()
  {
    let bot = ReplyBot::new(
      bot,
      query.from.id.0 as i64,
      msg.chat().id,
      msg.id(),
      Some(query.from.clone()),
      msg.chat().is_private(),
    );

    // answer callback to remove loading state
    bot.inner.answer_callback_query(query.id.clone()).await?;

    callback::handle(app, bot, &data).await
  } else {
    Ok(())
  }
}

#[derive(Debug, Clone)]
pub struct ReplyBot {
  inner: Bot,
  pub user_id: i64,
  pub chat_id: ChatId,
  pub message_id: MessageId,
  pub from: Option<User>,
  pub private: bool,
}

impl ReplyBot {
  pub fn new(
    inner: Bot,
    user_id: i64,
    chat_id: ChatId,
    message_id: MessageId,
    from: Option<User>,
    private: bool,
  ) -> Self {
    Self { inner, user_id, chat_id, message_id, from, private }
  }

  fn from_message(inner: Bot, msg: &Message) -> Self {
    let user_id = msg
      .from
      .as_ref()
      .map(|from| from.id.0 as i64)
      .unwrap_or(msg.chat.id.0);

    Self::new(
      inner,
      user_id,
      msg.chat.id,
      msg.id,
      msg.from.clone(),
      msg.chat.is_private(),
    )
  }

  pub fn profile(&self) -> Profile {
    match &self.from {
      Some(from) => Profile {
        first_name: Some(from.first_name.clone()),
        last_name: from.last_name.clone(),
        username: from.username.clone(),
      },
      None => Profile::default(),
    }
  }

  async fn reply_html(&self, text: impl Into<String>) -> ResponseResult<Message> {
    self
      .inner
      .send_message(self.chat_id, text.into())
      .parse_mode(ParseMode::Html)
      .await
  }

  /// Send a potentially long message by splitting it into chunks if needed.
  async fn reply_html_chunked(
    &self,
    text: impl Into<String>,
  ) -> ResponseResult<()> {
    for chunk in utils::chunk_message(&text.into(), 0) {
      self
        .inner
        .send_message(self.chat_id, chunk)
        .parse_mode(ParseMode::Html)
        .await?;
    }
    Ok(())
  }

  async fn reply_with_keyboard(
    &self,
    text: impl Into<String>,
    keyboard: InlineKeyboardMarkup,
  ) -> ResponseResult<Message> {
    self
      .inner
      .send_message(self.chat_id, text.into())
      .parse_mode(ParseMode::Html)
      .reply_markup(keyboard)
      .await
  }

  /// Edit the message the pressed button is attached to. Falls back to a
  /// fresh message when the original can no longer be edited.
  pub async fn edit_with_keyboard(
    &self,
    text: impl Into<String>,
    keyboard: InlineKeyboardMarkup,
  ) -> ResponseResult<()> {
    let text = text.into();
    let edited = self
      .inner
      .edit_message_text(self.chat_id, self.message_id, text.clone())
      .parse_mode(ParseMode::Html)
      .reply_markup(keyboard.clone())
      .await;

    if edited.is_err() {
      self.reply_with_keyboard(text, keyboard).await?;
    }
    Ok(())
  }
}
