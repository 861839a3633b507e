//! Per-chat play counting for a Telegram music bot.
//!
//! The entry point is [`PlayCounter`], which is built once at startup around
//! some [`PlayCountStore`] and then cloned into every place that needs to
//! record or query plays.
//!
//! ```
//! use std::sync::Arc;
//! use teloxide::types::ChatId;
//! use tunelog::{MemoryPlayCountStore, PlayCounter};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> tunelog::Result {
//! let counter = PlayCounter::new(Arc::new(MemoryPlayCountStore::new()));
//!
//! assert!(counter.increment(ChatId(100)).await);
//! assert_eq!(counter.get_count(ChatId(100)).await?, 1);
//! # Ok(())
//! # }
//! ```

mod counter;
mod error;
mod model;
mod retry;
mod store;
mod telemetry;

pub use counter::*;
pub use error::*;
pub use model::*;
pub use store::*;
pub use telemetry::*;

pub use retry_policies::policies::ExponentialBackoff;
