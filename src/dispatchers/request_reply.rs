// Copyright 2025 Cowboy AI, LLC.

//! First-match dispatch with a reply

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{orphaned, Dispatcher};
use crate::conditional::ConditionalValue;
use crate::errors::{DispatchError, DispatchResult};
use crate::handlers::{RequestReplyActivator, RequestReplyActivatorExt};
use crate::request::{AsAny, Request};
use crate::services::ServiceLocator;

/// Asks handler instances in locator order and returns the first reply
///
/// Unlike [`FireForgetDispatcher`](super::FireForgetDispatcher) there is no
/// fan-out: instances after the first match are not invoked.
#[derive(Debug, Clone)]
pub struct RequestReplyDispatcher {
    base: Dispatcher,
}

impl RequestReplyDispatcher {
    /// Create a dispatcher over a service locator
    pub fn new(locator: Arc<dyn ServiceLocator>) -> Self {
        Self {
            base: Dispatcher::new(locator),
        }
    }

    /// Shared dispatcher plumbing
    pub fn base(&self) -> &Dispatcher {
        &self.base
    }

    /// Return the reply of the first `H` instance that handles `request`
    pub fn dispatch<H, R, TResult>(
        &self,
        request: &R,
        activator: impl Fn(&H) -> &dyn RequestReplyActivator<R>,
    ) -> DispatchResult<TResult>
    where
        H: ?Sized + Send + Sync + 'static,
        R: ?Sized + Request,
        TResult: Send + 'static,
    {
        for service in self.base.services::<H>() {
            if let Some(reply) = activator(service.as_ref()).try_invoke::<TResult>(request)? {
                debug!(
                    contract = std::any::type_name::<H>(),
                    request = AsAny::type_name(request),
                    "dispatched request-reply request"
                );
                return Ok(reply);
            }
        }
        debug!(
            contract = std::any::type_name::<H>(),
            request = AsAny::type_name(request),
            "no handler replied"
        );
        Err(orphaned::<H, R>(request))
    }

    /// Await the reply of the first `H` instance that handles `request`
    pub async fn dispatch_async<H, R, TResult>(
        &self,
        request: Arc<R>,
        token: &CancellationToken,
        activator: impl Fn(&H) -> &dyn RequestReplyActivator<R>,
    ) -> DispatchResult<TResult>
    where
        H: ?Sized + Send + Sync + 'static,
        R: ?Sized + Request,
        TResult: Send + 'static,
    {
        for service in self.base.services::<H>() {
            if token.is_cancelled() {
                return Err(DispatchError::Cancelled);
            }
            let outcome = activator(service.as_ref())
                .try_invoke_async::<TResult>(Arc::clone(&request), token)
                .await?;
            if let ConditionalValue::Successful(reply) = outcome {
                debug!(
                    contract = std::any::type_name::<H>(),
                    request = AsAny::type_name(&*request),
                    "dispatched request-reply request"
                );
                return Ok(reply);
            }
        }
        if token.is_cancelled() {
            return Err(DispatchError::Cancelled);
        }
        Err(orphaned::<H, R>(&*request))
    }
}
