//! A topic-based publish/subscribe message broker over raw TCP.
//!
//! Publishers and subscribers are ordinary peers on the same wire protocol:
//! a connection becomes a subscriber by sending a SUBSCRIBE frame, and a
//! publisher by sending a DATA frame. The broker fans a DATA frame out to
//! every connection currently subscribed to its topic, verbatim.
//!
//! ```rust,no_run
//! use pubsub_broker::{BrokerConfig, server, shutdown};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BrokerConfig::default();
//!     let (_trigger, shutdown) = shutdown::channel();
//!     server::run(config, shutdown).await?;
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod config;
pub mod connection;
pub mod error;
pub mod index;
pub mod server;
pub mod session;
pub mod shutdown;

pub use codec::{Frame, TradeMessage};
pub use config::BrokerConfig;
pub use error::{BrokerError, CodecError};
pub use index::SubscriptionIndex;
pub use session::SessionHandle;
