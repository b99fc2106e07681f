//! Non-fungible ownership: each token of a contract has one owner.

use livecache_common::TokenId;

use super::scheme::{
    contract_key_of, page_params, Axes, CacheHandler, Entry, FromRecord, RawRecord, Scheme,
};
use crate::remote::{CacheResult, TransportError};

/// ERC721-style non-fungible scheme.
#[derive(Debug, Clone, Copy)]
pub struct Erc721;

impl Scheme for Erc721 {
    const NAME: &'static str = "erc721";
    const DEFAULT_RESOURCE: &'static str = "evm-erc721-ownership";
    const AXES: Axes = Axes {
        owner: true,
        token: true,
        amount: false,
    };
}

pub type Erc721OwnershipHandler = CacheHandler<Erc721>;

impl CacheHandler<Erc721> {
    /// All `(owner, token)` ownerships of a contract, one page.
    pub async fn collections(
        &self,
        contract_key: &str,
        offset: u32,
        limit: u32,
    ) -> Result<CacheResult<Vec<(String, Option<TokenId>)>>, TransportError> {
        self.query_list(
            "collections",
            page_params(contract_key, offset, limit),
            |entry| (entry.owner, entry.token),
        )
        .await
    }

    /// Tokens owned by one address, one page.
    pub async fn collection_of(
        &self,
        contract_key: &str,
        owner: &str,
        offset: u32,
        limit: u32,
    ) -> Result<CacheResult<Vec<Option<TokenId>>>, TransportError> {
        let mut params = page_params(contract_key, offset, limit);
        params.insert("owner".to_string(), owner.to_string());
        self.query_list("collection-of", params, |entry| entry.token)
            .await
    }
}

/// A non-fungible ownership record as it appears in drained state items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Erc721Ownership {
    pub contract_key: String,
    pub owner: String,
    pub token: Option<TokenId>,
}

impl FromRecord for Erc721Ownership {
    fn from_record(record: &RawRecord) -> Self {
        let Entry { owner, token, .. } = Entry::decode(Erc721::AXES, record);
        Self {
            contract_key: contract_key_of(record),
            owner,
            token,
        }
    }
}
