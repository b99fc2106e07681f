//! Livecache - client for an EVM live-cache service.
//!
//! The cache service indexes token contracts and is the source of truth for
//! balances; this crate never computes them. It provides:
//!
//! - [`remote`]: the `(element, code)` result envelope and the transport the
//!   handlers call through (HTTP via reqwest by default).
//! - [`cache`]: typed handlers for the three token-accounting schemes
//!   (ERC20 balances, ERC721 ownership, ERC1155 ownership) plus the state
//!   handler, decoding amounts and token ids into arbitrary-precision integers.
//! - [`grab`]: the grab loop, which periodically drains accumulated state
//!   events and feeds them to a caller-supplied processor.
//!
//! # Example
//!
//! ```rust,ignore
//! use livecache::cache::{Erc20BalanceHandler, GrabbedItem};
//! use livecache::grab::{Clock, FnProcessor, GrabLoop, GrabberConfig};
//! use livecache::remote::{Authorization, Root};
//!
//! let root = Root::new("http://localhost:6666", Authorization::bearer("key"));
//! let balance = Erc20BalanceHandler::new(&root)
//!     .balance_of("erc20-sample", "0xAF950274754d7408B7bAA9358F5CB92D162C5c09")
//!     .await?;
//!
//! let grabber = GrabLoop::new(
//!     GrabberConfig::default(),
//!     FnProcessor(|item: GrabbedItem| async move {
//!         println!("{:?}: {:?}", item.contract_key(), item.fields());
//!         Ok(())
//!     }),
//! );
//! grabber.start(Clock::Unscaled);
//! ```

pub mod cache;
pub mod grab;
pub mod remote;

pub use livecache_common::{decode_amount, decode_token_id, format_token_id, Amount, TokenId};

pub use cache::{
    Erc1155OwnershipHandler, Erc20BalanceHandler, Erc721OwnershipHandler, GrabbedItem,
    StateHandler,
};
pub use grab::{Clock, GrabError, GrabLoop, GrabberConfig, Phase};
pub use remote::{Authorization, CacheResult, ResultCode, Root, TransportError};
