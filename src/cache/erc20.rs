//! Fungible balances: one amount per owner.

use livecache_common::Amount;

use super::scheme::{
    contract_key_of, page_params, Axes, CacheHandler, Entry, FromRecord, RawRecord, Scheme,
    CONTRACT_KEY_FIELD,
};
use crate::remote::{params, CacheResult, TransportError};

/// ERC20-style fungible scheme.
#[derive(Debug, Clone, Copy)]
pub struct Erc20;

impl Scheme for Erc20 {
    const NAME: &'static str = "erc20";
    const DEFAULT_RESOURCE: &'static str = "evm-erc20-balance";
    const AXES: Axes = Axes {
        owner: true,
        token: false,
        amount: true,
    };
}

pub type Erc20BalanceHandler = CacheHandler<Erc20>;

impl CacheHandler<Erc20> {
    /// All `(owner, amount)` balances of a contract, one page.
    pub async fn balances(
        &self,
        contract_key: &str,
        offset: u32,
        limit: u32,
    ) -> Result<CacheResult<Vec<(String, Amount)>>, TransportError> {
        self.query_list(
            "balances",
            page_params(contract_key, offset, limit),
            |entry| (entry.owner, entry.amount),
        )
        .await
    }

    /// The balance of one owner.
    pub async fn balance_of(
        &self,
        contract_key: &str,
        owner: &str,
    ) -> Result<CacheResult<Amount>, TransportError> {
        self.query_one(
            "balance-of",
            params([(CONTRACT_KEY_FIELD, contract_key), ("owner", owner)]),
            |entry| entry.amount,
        )
        .await
    }
}

/// A fungible balance record as it appears in drained state items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Erc20Balance {
    pub contract_key: String,
    pub owner: String,
    pub amount: Amount,
}

impl FromRecord for Erc20Balance {
    fn from_record(record: &RawRecord) -> Self {
        let Entry { owner, amount, .. } = Entry::decode(Erc20::AXES, record);
        Self {
            contract_key: contract_key_of(record),
            owner,
            amount,
        }
    }
}
