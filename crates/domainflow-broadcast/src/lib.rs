//! Progress Broadcaster (§4.10): real-time fan-out of campaign and pool
//! events to any number of subscribers, each with its own filter.

pub mod broadcaster;
pub mod events;

pub use broadcaster::{Broadcaster, Subscriber};
pub use events::{Event, Subscription};
