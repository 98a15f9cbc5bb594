//! Client for the external price feed and the pure planning step that turns
//! a feed response into price-store updates.

mod client;
mod error;
mod plan;

pub use client::{FeedItem, PriceFeedClient};
pub use error::FeedError;
pub use plan::{plan_feed_updates, FeedPlan, PriceChange, SyncReport};
