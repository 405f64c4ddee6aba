//! External collaborators: live price lookup and trend commentary.

mod commentary;
mod price_feed;
mod types;

pub use commentary::{CommentaryClient, CommentaryProvider};
pub use price_feed::{lookup, symbol_candidates, Quote, YahooClient};
