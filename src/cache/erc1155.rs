//! Semi-fungible ownership: many owners per token, each with a quantity.

use livecache_common::{format_token_id, Amount, TokenId};

use super::scheme::{
    contract_key_of, page_params, Axes, CacheHandler, Entry, FromRecord, RawRecord, Scheme,
    CONTRACT_KEY_FIELD,
};
use crate::remote::{params, CacheResult, TransportError};

/// ERC1155-style semi-fungible scheme.
#[derive(Debug, Clone, Copy)]
pub struct Erc1155;

impl Scheme for Erc1155 {
    const NAME: &'static str = "erc1155";
    const DEFAULT_RESOURCE: &'static str = "evm-erc1155-ownership";
    const AXES: Axes = Axes {
        owner: true,
        token: true,
        amount: true,
    };
}

pub type Erc1155OwnershipHandler = CacheHandler<Erc1155>;

impl CacheHandler<Erc1155> {
    /// All `(owner, token, amount)` balances of a contract, one page.
    pub async fn balances(
        &self,
        contract_key: &str,
        offset: u32,
        limit: u32,
    ) -> Result<CacheResult<Vec<(String, Option<TokenId>, Amount)>>, TransportError> {
        self.query_list(
            "balances",
            page_params(contract_key, offset, limit),
            |entry| (entry.owner, entry.token, entry.amount),
        )
        .await
    }

    /// `(token, amount)` balances of one owner, one page.
    pub async fn balances_of(
        &self,
        contract_key: &str,
        owner: &str,
        offset: u32,
        limit: u32,
    ) -> Result<CacheResult<Vec<(Option<TokenId>, Amount)>>, TransportError> {
        let mut params = page_params(contract_key, offset, limit);
        params.insert("owner".to_string(), owner.to_string());
        self.query_list("balances-of", params, |entry| (entry.token, entry.amount))
            .await
    }

    /// Amount of one token held by one owner.
    pub async fn balance_of(
        &self,
        contract_key: &str,
        owner: &str,
        token: &TokenId,
    ) -> Result<CacheResult<Amount>, TransportError> {
        self.query_one(
            "balance-of",
            params([
                (CONTRACT_KEY_FIELD, contract_key.to_string()),
                ("owner", owner.to_string()),
                ("token", format_token_id(token)),
            ]),
            |entry| entry.amount,
        )
        .await
    }
}

/// A semi-fungible ownership record as it appears in drained state items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Erc1155Ownership {
    pub contract_key: String,
    pub owner: String,
    pub token: Option<TokenId>,
    pub amount: Amount,
}

impl FromRecord for Erc1155Ownership {
    fn from_record(record: &RawRecord) -> Self {
        let Entry {
            owner,
            token,
            amount,
        } = Entry::decode(Erc1155::AXES, record);
        Self {
            contract_key: contract_key_of(record),
            owner,
            token,
            amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_from_item() {
        let raw = json!({
            "contract-key": "erc1155-sample",
            "owner": "0xAF",
            "token": "0x111",
            "amount": "3"
        });
        let record = Erc1155Ownership::from_record(raw.as_object().unwrap());
        assert_eq!(record.token, Some(TokenId::from(0x111u32)));
        assert_eq!(record.amount, Amount::from(3));
    }

    #[test]
    fn test_record_degrades_per_field() {
        let raw = json!({"contract-key": "c", "owner": "o", "token": "??", "amount": "7"});
        let record = Erc1155Ownership::from_record(raw.as_object().unwrap());
        assert_eq!(record.token, None);
        assert_eq!(record.amount, Amount::from(7));
    }
}
