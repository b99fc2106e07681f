//! In-memory transport replaying scripted responses.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use livecache::remote::{CacheResult, Params, ResultCode, Root, Transport, TransportError};
use serde_json::{json, Value};
use tokio::sync::Notify;

/// One scripted answer.
pub enum Scripted {
    Ok(Value),
    Status(ResultCode),
    Fault(String),
    /// Wait for `release` before answering with `then`.
    Held { release: Arc<Notify>, then: Box<Scripted> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    View,
    Operation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub kind: CallKind,
    pub resource: String,
    pub method: String,
    pub params: Params,
}

/// Answers calls from a queue; once the queue is empty every call gets `[]`.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedTransport {
    pub fn new(responses: impl IntoIterator<Item = Scripted>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn root(self: &Arc<Self>) -> Root {
        Root::with_transport(self.clone())
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_call(&self) -> Call {
        self.calls.lock().unwrap().last().cloned().expect("no call recorded")
    }

    async fn answer(
        &self,
        kind: CallKind,
        resource: &str,
        method: &str,
        params: &Params,
    ) -> Result<CacheResult<Value>, TransportError> {
        self.calls.lock().unwrap().push(Call {
            kind,
            resource: resource.to_string(),
            method: method.to_string(),
            params: params.clone(),
        });

        let mut next = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Scripted::Ok(json!([])));

        loop {
            match next {
                Scripted::Held { release, then } => {
                    release.notified().await;
                    next = *then;
                }
                Scripted::Ok(value) => return Ok(CacheResult::ok(value)),
                Scripted::Status(code) => return Ok(CacheResult::failed(code)),
                Scripted::Fault(reason) => return Err(TransportError::Unavailable(reason)),
            }
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn view(
        &self,
        resource: &str,
        method: &str,
        params: &Params,
    ) -> Result<CacheResult<Value>, TransportError> {
        self.answer(CallKind::View, resource, method, params).await
    }

    async fn operation(
        &self,
        resource: &str,
        method: &str,
        params: &Params,
    ) -> Result<CacheResult<Value>, TransportError> {
        self.answer(CallKind::Operation, resource, method, params).await
    }
}

/// A `grab` batch of `count` items numbered from `first`.
pub fn batch(first: u64, count: u64) -> Scripted {
    let items: Vec<Value> = (first..first + count)
        .map(|seq| {
            json!({
                "contract-key": "erc20-sample",
                "owner": format!("0x{seq:040x}"),
                "amount": seq.to_string(),
                "seq": seq,
            })
        })
        .collect();
    Scripted::Ok(Value::Array(items))
}

pub fn empty() -> Scripted {
    Scripted::Ok(json!([]))
}
