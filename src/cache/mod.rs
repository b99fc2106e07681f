//! Resource handlers: one per accounting scheme, plus the state handler.

pub mod erc1155;
pub mod erc20;
pub mod erc721;
pub mod scheme;
pub mod state;

pub use erc1155::{Erc1155, Erc1155Ownership, Erc1155OwnershipHandler};
pub use erc20::{Erc20, Erc20Balance, Erc20BalanceHandler};
pub use erc721::{Erc721, Erc721Ownership, Erc721OwnershipHandler};
pub use scheme::{Axes, CacheHandler, Entry, FromRecord, RawRecord, Scheme, CONTRACT_KEY_FIELD};
pub use state::{GrabbedItem, StateHandler, StateSnapshot, DEFAULT_STATE_RESOURCE};
