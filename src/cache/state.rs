//! The state resource, drained by the grab loop.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::scheme::{field_text, FromRecord, RawRecord, CONTRACT_KEY_FIELD};
use crate::remote::{CacheResult, Params, Resource, Root, TransportError};

/// Resource key the state handler binds to unless overridden.
pub const DEFAULT_STATE_RESOURCE: &str = "evm-state";

/// One item returned by a `grab` call.
///
/// Items are generic records; the `contract-key` field tells processors which
/// contract (and so which record type) the item belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GrabbedItem(RawRecord);

impl GrabbedItem {
    pub fn new(record: RawRecord) -> Self {
        Self(record)
    }

    pub fn fields(&self) -> &RawRecord {
        &self.0
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn contract_key(&self) -> Option<&str> {
        self.0.get(CONTRACT_KEY_FIELD).and_then(Value::as_str)
    }

    /// Decode the item as a typed record.
    pub fn record<R: FromRecord>(&self) -> R {
        R::from_record(&self.0)
    }

    pub fn into_inner(self) -> RawRecord {
        self.0
    }
}

/// Opaque string-to-string state snapshot held by the service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    #[serde(default)]
    pub value: HashMap<String, String>,
}

impl FromRecord for StateSnapshot {
    fn from_record(record: &RawRecord) -> Self {
        let value = record
            .get("value")
            .and_then(Value::as_object)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|(key, _)| {
                        field_text(entries, key).map(|text| (key.clone(), text.into_owned()))
                    })
                    .collect()
            })
            .unwrap_or_default();
        Self { value }
    }
}

/// Handler over the state resource. Its only job is to trigger `grab`.
#[derive(Clone)]
pub struct StateHandler {
    resource: Resource,
}

impl StateHandler {
    pub fn new(root: &Root) -> Self {
        Self::with_resource(root, DEFAULT_STATE_RESOURCE)
    }

    pub fn with_resource(root: &Root, resource: impl Into<String>) -> Self {
        Self {
            resource: root.resource(resource),
        }
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    /// Take the items the service accumulated since the previous grab.
    ///
    /// An empty list means nothing is pending. A `null` element is read as
    /// an empty list.
    pub async fn grab(&self) -> Result<CacheResult<Vec<GrabbedItem>>, TransportError> {
        let result: CacheResult<Option<Vec<GrabbedItem>>> =
            self.resource.operation_to("grab", &Params::new()).await?;
        Ok(result.map(Option::unwrap_or_default))
    }
}
