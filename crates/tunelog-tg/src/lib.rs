mod config;
mod db;
mod error;
mod observability;
mod tg;
mod util;

pub use crate::error::*;
pub use config::*;
pub use observability::*;

#[allow(unused_imports)]
mod prelude {
    pub(crate) use crate::error::prelude::*;
    pub(crate) use crate::observability::logging::prelude::*;
    pub(crate) use crate::util::prelude::*;
}

/// Run the telegram bot processing loop
pub async fn run(config: Config) -> Result {
    let play_counter = db::init(config.db).await?;

    let opts = tg::RunBotOptions {
        tg_cfg: config.tg,
        play_counter,
    };

    tg::run_bot(opts).await
}
