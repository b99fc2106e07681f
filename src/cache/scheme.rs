//! Generic accounting-scheme handler.
//!
//! The three token-accounting schemes differ only in which of
//! `{owner, token, amount}` their records carry and in the queries they
//! expose. [`CacheHandler`] holds the shared scaffolding (reset, list and
//! single-row views, record decoding); each scheme adds its own inherent
//! query methods on `CacheHandler<ItsScheme>`.

use std::borrow::Cow;
use std::marker::PhantomData;

use livecache_common::{decode_amount_field, decode_token_id_field, Amount, TokenId};
use serde_json::Value;

use crate::remote::{params, CacheResult, Params, Resource, Root, TransportError};

/// A generic remote record: field name to JSON value.
pub type RawRecord = serde_json::Map<String, Value>;

/// Field holding the contract key in every record.
pub const CONTRACT_KEY_FIELD: &str = "contract-key";

/// Which record fields a scheme carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Axes {
    pub owner: bool,
    pub token: bool,
    pub amount: bool,
}

/// A token-accounting scheme.
pub trait Scheme: Send + Sync + 'static {
    /// Short name used in logs.
    const NAME: &'static str;
    /// Resource key the handler binds to unless overridden.
    const DEFAULT_RESOURCE: &'static str;
    const AXES: Axes;
}

/// One decoded row. Fields outside the scheme's axes keep their fallback.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entry {
    pub owner: String,
    pub token: Option<TokenId>,
    pub amount: Amount,
}

impl Entry {
    /// Decode the fields named by `axes`. Never fails: a malformed amount is
    /// zero and a malformed token is `None`.
    pub fn decode(axes: Axes, record: &RawRecord) -> Self {
        let owner = if axes.owner {
            field_text(record, "owner")
                .map(Cow::into_owned)
                .unwrap_or_default()
        } else {
            String::new()
        };
        let token = if axes.token {
            decode_token_id_field(field_text(record, "token").as_deref())
        } else {
            None
        };
        let amount = if axes.amount {
            decode_amount_field(field_text(record, "amount").as_deref())
        } else {
            Amount::default()
        };

        Self {
            owner,
            token,
            amount,
        }
    }
}

/// Typed views built from a generic record.
pub trait FromRecord: Sized {
    fn from_record(record: &RawRecord) -> Self;
}

/// Text of a record field. Numbers are accepted and rendered in base 10.
pub fn field_text<'a>(record: &'a RawRecord, name: &str) -> Option<Cow<'a, str>> {
    match record.get(name)? {
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        _ => None,
    }
}

/// Contract key of a record, empty when missing.
pub(crate) fn contract_key_of(record: &RawRecord) -> String {
    field_text(record, CONTRACT_KEY_FIELD)
        .map(Cow::into_owned)
        .unwrap_or_default()
}

fn decode_row(axes: Axes, row: &Value) -> Entry {
    match row.as_object() {
        Some(record) => Entry::decode(axes, record),
        None => Entry::default(),
    }
}

/// Handler over one scheme's remote resource.
pub struct CacheHandler<S: Scheme> {
    resource: Resource,
    _scheme: PhantomData<S>,
}

impl<S: Scheme> Clone for CacheHandler<S> {
    fn clone(&self) -> Self {
        Self {
            resource: self.resource.clone(),
            _scheme: PhantomData,
        }
    }
}

impl<S: Scheme> CacheHandler<S> {
    /// Handler bound to the scheme's default resource key.
    pub fn new(root: &Root) -> Self {
        Self::with_resource(root, S::DEFAULT_RESOURCE)
    }

    pub fn with_resource(root: &Root, resource: impl Into<String>) -> Self {
        Self {
            resource: root.resource(resource),
            _scheme: PhantomData,
        }
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    pub fn axes(&self) -> Axes {
        S::AXES
    }

    /// Ask the service to drop its cache for one contract. The
    /// acknowledgement is returned as-is.
    pub async fn reset(&self, contract_key: &str) -> Result<CacheResult<Value>, TransportError> {
        let result = self
            .resource
            .operation_to_json("reset-cache", &params([(CONTRACT_KEY_FIELD, contract_key)]))
            .await?;

        if result.is_ok() {
            tracing::info!(
                target: "livecache::cache",
                scheme = S::NAME,
                contract_key,
                "Cache reset"
            );
        } else {
            tracing::warn!(
                target: "livecache::cache",
                scheme = S::NAME,
                contract_key,
                code = %result.code(),
                "Cache reset refused"
            );
        }

        Ok(result)
    }

    /// View returning an array of rows, each decoded and projected. A
    /// `null` element (empty body) reads as no rows.
    pub(crate) async fn query_list<T, F>(
        &self,
        method: &str,
        params: Params,
        project: F,
    ) -> Result<CacheResult<Vec<T>>, TransportError>
    where
        F: Fn(Entry) -> T,
    {
        let result: CacheResult<Option<Vec<Value>>> =
            self.resource.view_to(method, &params).await?;
        self.log_failure(method, &result);
        Ok(result.map(|rows| {
            rows.unwrap_or_default()
                .iter()
                .map(|row| project(decode_row(S::AXES, row)))
                .collect()
        }))
    }

    /// View returning a single row, decoded and projected.
    pub(crate) async fn query_one<T, F>(
        &self,
        method: &str,
        params: Params,
        project: F,
    ) -> Result<CacheResult<T>, TransportError>
    where
        F: FnOnce(Entry) -> T,
    {
        let result: CacheResult<Value> = self.resource.view_to(method, &params).await?;
        self.log_failure(method, &result);
        Ok(result.map(|row| project(decode_row(S::AXES, &row))))
    }

    fn log_failure<T>(&self, method: &str, result: &CacheResult<T>) {
        if !result.is_ok() {
            tracing::warn!(
                target: "livecache::cache",
                scheme = S::NAME,
                resource = self.resource.key(),
                method,
                code = %result.code(),
                "Cache query failed"
            );
        }
    }
}

/// Parameters shared by the paginated views.
pub(crate) fn page_params(contract_key: &str, offset: u32, limit: u32) -> Params {
    params([
        (CONTRACT_KEY_FIELD, contract_key.to_string()),
        ("offset", offset.to_string()),
        ("limit", limit.to_string()),
    ])
}
