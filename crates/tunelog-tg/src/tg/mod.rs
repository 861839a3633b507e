//! Telegram commands root module

mod cmd;
mod config;

use crate::observability::metrics::{TG_UPDATES_SKIPPED_TOTAL, TG_UPDATES_TOTAL};
use crate::prelude::*;
use crate::Result;
use dptree::di::DependencyMap;
use std::sync::Arc;
use teloxide::adaptors::{CacheMe, DefaultParseMode, Throttle, Trace};
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use teloxide::utils::command::BotCommands;
use tunelog::PlayCounter;

pub(crate) use config::*;

pub(crate) type Bot = Trace<CacheMe<DefaultParseMode<Throttle<teloxide::Bot>>>>;

pub(crate) struct Ctx {
    bot: Bot,
    cfg: Config,
    play_counter: PlayCounter,
}

pub(crate) struct RunBotOptions {
    pub(crate) tg_cfg: Config,
    pub(crate) play_counter: PlayCounter,
}

pub(crate) async fn run_bot(opts: RunBotOptions) -> Result {
    let mut di = DependencyMap::new();

    let bot: Bot = teloxide::Bot::new(opts.tg_cfg.token.clone())
        .throttle(Default::default())
        .parse_mode(ParseMode::MarkdownV2)
        .cache_me()
        .trace(teloxide::adaptors::trace::Settings::TRACE_REQUESTS);

    di.insert(Arc::new(Ctx {
        bot: bot.clone(),
        cfg: opts.tg_cfg,
        play_counter: opts.play_counter,
    }));

    info!("Starting bot...");

    bot.set_my_commands(cmd::regular::Cmd::bot_commands())
        .await?;

    let handler = dptree::entry()
        .inspect(|update: Update| {
            metrics::counter!(TG_UPDATES_TOTAL, 1, "kind" => update.kind.discriminator());
        })
        .branch(
            Update::filter_message()
                .filter_command::<cmd::StartCommand>()
                .chain(dptree::filter(cmd::filter_pm_with_bot))
                .endpoint(cmd::handle::<cmd::StartCommand>()),
        )
        .branch(
            Update::filter_message()
                .filter_command::<cmd::regular::Cmd>()
                .endpoint(cmd::handle::<cmd::regular::Cmd>()),
        )
        .branch(
            Update::filter_message()
                .filter_command::<cmd::maintainer::Cmd>()
                .chain(dptree::filter(cmd::maintainer::is_maintainer))
                .endpoint(cmd::handle::<cmd::maintainer::Cmd>()),
        );

    Dispatcher::builder(bot, handler)
        .dependencies(di)
        // We don't handle all possible messages that users send, so
        // we only count them in the default handler
        .default_handler(|update| {
            metrics::counter!(
                TG_UPDATES_SKIPPED_TOTAL,
                1,
                "kind" => update.kind.discriminator()
            );
            std::future::ready(())
        })
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("Bot stopped");

    Ok(())
}
