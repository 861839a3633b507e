use crate::{Error, Result};
use teloxide::types::ChatId;

/// Number of chats returned by a leaderboard query when the caller has
/// no preference.
pub const DEFAULT_TOP_LIMIT: u32 = 10;

/// Number of tracks that were started in a single chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlayCount {
    pub chat_id: ChatId,
    pub play_count: u64,
}

/// Parses a chat id supplied by a human (e.g. a command argument).
/// Surrounding whitespace is ignored, everything else must be a valid `i64`.
pub fn parse_chat_id(input: &str) -> Result<ChatId> {
    input
        .trim()
        .parse()
        .map(ChatId)
        .map_err(|source| Error::InvalidInput {
            input: input.to_owned(),
            source,
        })
}
