use easy_ext::ext;
use teloxide::payloads::SendMessageSetters;
use teloxide::requests::Requester;
use teloxide::types::{Chat, Message, UpdateKind, User};

pub(crate) mod prelude {
    pub(crate) use super::{
        ChatExt as _, UpdateKindExt as _, UserExt as _, UtilRequesterExt as _,
    };
}

#[ext(UserExt)]
pub(crate) impl User {
    fn debug_id(&self) -> String {
        let name = self.username.clone().unwrap_or_else(|| self.full_name());
        format!("{name} ({})", self.id)
    }
}

#[ext(ChatExt)]
pub(crate) impl Chat {
    fn debug_id(&self) -> String {
        let title = self.title().unwrap_or("{{unknown_chat_title}}");
        let username = self
            .username()
            .map(|name| format!("{name}, "))
            .unwrap_or_default();

        format!("{title} ({username}{})", self.id)
    }

    /// Play counts are tracked only for group chats, channels don't have
    /// voice chats the bot could join via commands.
    fn is_any_group(&self) -> bool {
        self.is_group() || self.is_supergroup()
    }
}

#[ext(UtilRequesterExt)]
pub(crate) impl<R: Requester> R {
    /// Replies to the message with the given text. The text must already be
    /// formatted according to the bot's default parse mode.
    fn reply_text(&self, msg: &Message, text: impl Into<String>) -> R::SendMessage {
        self.send_message(msg.chat.id, text)
            .reply_to_message_id(msg.id)
            .allow_sending_without_reply(true)
    }
}

#[ext(UpdateKindExt)]
pub(crate) impl UpdateKind {
    fn discriminator(&self) -> &'static str {
        macro_rules! stringify_enum {
            ($val:expr, $($variant:ident)*) => {
                match $val {
                    $( UpdateKind::$variant(_) => stringify!($variant), )*
                    #[allow(unreachable_patterns)]
                    _ => "Unknown",
                }
            }
        }
        stringify_enum! {
            self,
            Message
            EditedMessage
            ChannelPost
            EditedChannelPost
            InlineQuery
            ChosenInlineResult
            CallbackQuery
            ShippingQuery
            PreCheckoutQuery
            Poll
            PollAnswer
            MyChatMember
            ChatMember
            ChatJoinRequest
            Error
        }
    }
}
