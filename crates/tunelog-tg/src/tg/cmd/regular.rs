use crate::error::UserError;
use crate::prelude::*;
use crate::tg;
use crate::Result;
use async_trait::async_trait;
use itertools::Itertools;
use teloxide::prelude::*;
use teloxide::types::ChatId;
use teloxide::utils::command::BotCommands;
use teloxide::utils::markdown;
use tunelog::{PlayCount, DEFAULT_TOP_LIMIT};

const UNKNOWN_GROUP_TITLE: &str = "Unknown Group";

#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "snake_case", description = "Commands:")]
pub(crate) enum Cmd {
    #[command(description = "show this text")]
    Help,

    #[command(description = "show how many tracks were played in the given group")]
    Check(String),

    #[command(description = "show the groups that played the most tracks")]
    Topgroup,

    #[command(description = "show how many tracks were played in this group")]
    Mycount,
}

#[async_trait]
impl tg::cmd::Command for Cmd {
    async fn handle(self, ctx: &tg::Ctx, msg: &Message) -> Result {
        match self {
            Cmd::Help => {
                let bot_username = ctx
                    .bot
                    .get_me()
                    .await?
                    .user
                    .username
                    .fatal_ctx(|| "Bot has no username")?;

                let header = markdown::escape(&format!(
                    "Add @{bot_username} to a group and I'll count \
                    every track played in its voice chat.",
                ));

                let commands = markdown::escape(&Cmd::descriptions().to_string());

                ctx.bot
                    .reply_text(msg, format!("{header}\n\n{commands}"))
                    .await?;
            }
            Cmd::Check(args) => {
                ensure_group(msg)?;

                let chat_id = parse_check_args(&args)?;
                let play_count = ctx.play_counter.get_count(chat_id).await?;

                ctx.bot
                    .reply_text(msg, render_play_count(chat_id, play_count))
                    .await?;
            }
            Cmd::Topgroup => {
                let top = ctx.play_counter.get_top(DEFAULT_TOP_LIMIT).await?;
                let top = resolve_titles(ctx, top).await;

                ctx.bot.reply_text(msg, render_top(&top)).await?;
            }
            Cmd::Mycount => {
                ensure_group(msg)?;

                let play_count = ctx.play_counter.get_count(msg.chat.id).await?;

                ctx.bot
                    .reply_text(msg, render_play_count(msg.chat.id, play_count))
                    .await?;
            }
        }

        Ok(())
    }
}

fn ensure_group(msg: &Message) -> Result<(), UserError> {
    if msg.chat.is_any_group() {
        return Ok(());
    }
    Err(UserError::GroupOnlyCommand)
}

/// Exactly one argument is expected, the chat id
fn parse_check_args(args: &str) -> Result<ChatId> {
    let Ok(chat_id) = args.split_whitespace().exactly_one() else {
        return Err(UserError::CheckUsage.into());
    };
    Ok(tunelog::parse_chat_id(chat_id)?)
}

/// Fetches the titles of the chats concurrently. Chats that the bot can't
/// see anymore get a placeholder title instead of failing the whole list.
async fn resolve_titles(ctx: &tg::Ctx, top: Vec<PlayCount>) -> Vec<(String, u64)> {
    let titles = top.iter().map(|entry| async move {
        match ctx.bot.get_chat(entry.chat_id).await {
            Ok(chat) => chat.title().unwrap_or(UNKNOWN_GROUP_TITLE).to_owned(),
            Err(err) => {
                debug!(
                    chat_id = entry.chat_id.0,
                    err = tracing_err(&err),
                    "Failed to resolve chat title"
                );
                UNKNOWN_GROUP_TITLE.to_owned()
            }
        }
    });

    let titles = futures::future::join_all(titles).await;

    titles
        .into_iter()
        .zip(top)
        .map(|(title, entry)| (title, entry.play_count))
        .collect()
}

fn render_play_count(chat_id: ChatId, play_count: u64) -> String {
    format!(
        "Chat {} has played {} tracks",
        markdown::code_inline(&chat_id.0.to_string()),
        markdown::code_inline(&play_count.to_string()),
    )
}

fn render_top(top: &[(String, u64)]) -> String {
    if top.is_empty() {
        return markdown::escape("No groups found");
    }

    top.iter()
        .enumerate()
        .format_with("\n", |(i, (title, play_count)), f| {
            let line = format!("{}. {title} - {play_count} plays", i + 1);
            f(&markdown::escape(&line))
        })
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use assert_matches::assert_matches;
    use expect_test::expect;

    #[test]
    fn check_args() {
        assert_eq!(parse_check_args("-1001").unwrap(), ChatId(-1001));
        assert_eq!(parse_check_args("  42  ").unwrap(), ChatId(42));

        let usage_errors = ["", "   ", "1 2", "abc def"];
        for args in usage_errors {
            let err = parse_check_args(args).unwrap_err();
            assert_matches!(
                err.kind(),
                ErrorKind::User {
                    source: UserError::CheckUsage
                },
                "{args:?}"
            );
        }

        let err = parse_check_args("abc").unwrap_err();
        assert_matches!(
            err.kind(),
            ErrorKind::PlayCount {
                source: tunelog::Error::InvalidInput { .. }
            }
        );
        assert!(err.is_user_error());
    }

    #[test]
    fn play_count_reply() {
        expect!["Chat `-1001` has played `7` tracks"]
            .assert_eq(&render_play_count(ChatId(-1001), 7));
        expect!["Chat `5` has played `0` tracks"].assert_eq(&render_play_count(ChatId(5), 0));
    }

    #[test]
    fn empty_top_reply() {
        expect!["No groups found"].assert_eq(&render_top(&[]));
    }

    #[test]
    fn top_reply() {
        let top = [
            ("Night shift".to_owned(), 120),
            ("Lo-fi beats!".to_owned(), 37),
            (UNKNOWN_GROUP_TITLE.to_owned(), 1),
        ];

        expect![[r#"
            1\. Night shift \- 120 plays
            2\. Lo\-fi beats\! \- 37 plays
            3\. Unknown Group \- 1 plays"#]]
        .assert_eq(&render_top(&top));
    }
}
