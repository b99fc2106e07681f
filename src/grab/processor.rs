//! Caller-supplied strategies plugged into a grab loop.

use std::future::Future;

use async_trait::async_trait;

use super::error::GrabError;
use crate::cache::GrabbedItem;

/// Consumes drained items, one call per item, in response order.
///
/// Dispatch on [`GrabbedItem::contract_key`] to decide how to read an item.
/// Returning `Err` ends the current run like any other grab failure.
#[async_trait]
pub trait ItemProcessor: Send + Sync + 'static {
    async fn process_item(&self, item: GrabbedItem) -> anyhow::Result<()>;
}

/// Receives the failure that ended a run. Must not fail itself.
#[async_trait]
pub trait GrabErrorHandler: Send + Sync + 'static {
    async fn on_grab_error(&self, _error: &GrabError) {}
}

/// Error handler that ignores failures.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopErrorHandler;

impl GrabErrorHandler for NoopErrorHandler {}

/// [`ItemProcessor`] backed by an async closure.
pub struct FnProcessor<F>(pub F);

#[async_trait]
impl<F, Fut> ItemProcessor for FnProcessor<F>
where
    F: Fn(GrabbedItem) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send,
{
    async fn process_item(&self, item: GrabbedItem) -> anyhow::Result<()> {
        (self.0)(item).await
    }
}

/// [`GrabErrorHandler`] backed by a plain closure.
pub struct FnErrorHandler<F>(pub F);

#[async_trait]
impl<F> GrabErrorHandler for FnErrorHandler<F>
where
    F: Fn(&GrabError) + Send + Sync + 'static,
{
    async fn on_grab_error(&self, error: &GrabError) {
        (self.0)(error);
    }
}
