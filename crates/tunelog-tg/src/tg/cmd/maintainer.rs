use crate::error::UserError;
use crate::prelude::*;
use crate::tg;
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use teloxide::utils::markdown;

#[derive(BotCommands, Clone, Debug)]
#[command(
    rename_rule = "snake_case",
    description = "These commands are supported for the bot maintainer:"
)]
pub(crate) enum Cmd {
    #[command(description = "display this text")]
    MaintainerHelp,

    #[command(description = "record a started track in the given chat")]
    TrackStarted(String),
}

#[async_trait]
impl tg::cmd::Command for Cmd {
    async fn handle(self, ctx: &tg::Ctx, msg: &Message) -> Result {
        match self {
            Cmd::MaintainerHelp => {
                let help = markdown::escape(&Cmd::descriptions().to_string());
                ctx.bot.reply_text(msg, help).await?;
            }
            Cmd::TrackStarted(args) => {
                let chat_id = args.trim();
                if chat_id.is_empty() {
                    return Err(UserError::TrackStartedUsage.into());
                }
                let chat_id = tunelog::parse_chat_id(chat_id)?;

                let reply = if ctx.play_counter.track_started(chat_id).await {
                    "Play counted"
                } else {
                    "Failed to count the play, see the logs"
                };

                ctx.bot.reply_text(msg, markdown::escape(reply)).await?;
            }
        }

        Ok(())
    }
}

pub(crate) fn is_maintainer(ctx: Arc<tg::Ctx>, msg: Message) -> bool {
    matches!(msg.from(), Some(sender) if sender.id == ctx.cfg.maintainer)
}
