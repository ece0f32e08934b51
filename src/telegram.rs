use anyhow::Result;
use teloxide::prelude::*;

pub struct Telegram {
    bot: Bot,
}

impl Telegram {
    pub fn new(token: &str) -> Self {
        Telegram { bot: Bot::new(token) }
    }

    /// Verifies the bot token by asking Telegram who the bot is.
    pub async fn check(&self) -> Result<String> {
        let me = self.bot.get_me().send().await?;
        Ok(me.username().to_string())
    }
}

// eof
