use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::Recipient;
use tracing::{error, info};

use crate::config::{Config, ConfigError, ENV_TELEGRAM_CHAT_ID};
use crate::error::BotError;

/// Delivery channel for notification texts.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> Result<(), BotError>;
}

/// Sends every notification to one fixed Telegram chat or channel.
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    bot: Bot,
    recipient: Recipient,
}

impl TelegramNotifier {
    pub fn new(bot: Bot, recipient: Recipient) -> Self {
        Self { bot, recipient }
    }

    pub fn from_config(cfg: &Config) -> Result<Self, ConfigError> {
        let recipient = cfg
            .telegram
            .chat_id
            .clone()
            .ok_or(ConfigError::Missing(ENV_TELEGRAM_CHAT_ID))?;
        let bot = Bot::new(cfg.telegram.bot_token.clone());
        Ok(Self::new(bot, recipient))
    }

    pub fn recipient(&self) -> &Recipient {
        &self.recipient
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<(), BotError> {
        match self.bot.send_message(self.recipient.clone(), text).await {
            Ok(_) => {
                info!(chat = ?self.recipient, text, "bot sent message");
                Ok(())
            }
            Err(err) => {
                error!(chat = ?self.recipient, ?err, "failed to send telegram message");
                Err(BotError::Notify(err.to_string()))
            }
        }
    }
}
