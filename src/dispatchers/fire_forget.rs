// Copyright 2025 Cowboy AI, LLC.

//! Fan-out dispatch without replies

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{orphaned, Dispatcher};
use crate::errors::{DispatchError, DispatchResult};
use crate::handlers::FireForgetActivator;
use crate::request::{AsAny, Request};
use crate::services::ServiceLocator;

/// Delivers a request to every handler instance that accepts it
///
/// Instances are tried in locator order. At least one must handle the
/// request, otherwise the dispatch fails with
/// [`DispatchError::OrphanedHandler`]. A handler error stops the loop and is
/// returned as-is; handlers that already ran are not compensated.
#[derive(Debug, Clone)]
pub struct FireForgetDispatcher {
    base: Dispatcher,
}

impl FireForgetDispatcher {
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

    /// Dispatch `request` to every `H` instance
    pub fn dispatch<H, R>(
        &self,
        request: &R,
        activator: impl Fn(&H) -> &dyn FireForgetActivator<R>,
    ) -> DispatchResult<()>
    where
        H: ?Sized + Send + Sync + 'static,
        R: ?Sized + Request,
    {
        if self.deliver::<H, R>(request, activator)? {
            Ok(())
        } else {
            Err(orphaned::<H, R>(request))
        }
    }

    /// Deliver `request` to every `H` instance and report whether any handled it
    ///
    /// Errors raised by handlers pass through unchanged, including an
    /// orphaned handler error from a nested dispatch.
    pub fn deliver<H, R>(
        &self,
        request: &R,
        activator: impl Fn(&H) -> &dyn FireForgetActivator<R>,
    ) -> DispatchResult<bool>
    where
        H: ?Sized + Send + Sync + 'static,
        R: ?Sized + Request,
    {
        let services = self.base.services::<H>();
        let mut handled = false;
        for service in &services {
            handled |= activator(service.as_ref()).try_invoke(request)?;
        }
        debug!(
            contract = std::any::type_name::<H>(),
            request = AsAny::type_name(request),
            instances = services.len(),
            handled,
            "dispatched fire-and-forget request"
        );
        Ok(handled)
    }

    /// Dispatch `request` to every `H` instance, awaiting each in turn
    ///
    /// The token is checked before every instance. Once it is cancelled the
    /// loop stops, and if nothing handled the request the result is
    /// [`DispatchError::Cancelled`] rather than an orphaned handler.
    pub async fn dispatch_async<H, R>(
        &self,
        request: Arc<R>,
        token: &CancellationToken,
        activator: impl Fn(&H) -> &dyn FireForgetActivator<R>,
    ) -> DispatchResult<()>
    where
        H: ?Sized + Send + Sync + 'static,
        R: ?Sized + Request,
    {
        let handled = self
            .deliver_async::<H, R>(Arc::clone(&request), token, activator)
            .await?;
        match (handled, token.is_cancelled()) {
            (true, _) => Ok(()),
            (false, true) => Err(DispatchError::Cancelled),
            (false, false) => Err(orphaned::<H, R>(&*request)),
        }
    }

    /// Deliver `request` to every async `H` instance and report whether any handled it
    ///
    /// Stops before the next instance once `token` is cancelled.
    pub async fn deliver_async<H, R>(
        &self,
        request: Arc<R>,
        token: &CancellationToken,
        activator: impl Fn(&H) -> &dyn FireForgetActivator<R>,
    ) -> DispatchResult<bool>
    where
        H: ?Sized + Send + Sync + 'static,
        R: ?Sized + Request,
    {
        let services = self.base.services::<H>();
        let mut handled = false;
        let mut invoked = 0usize;
        for service in &services {
            if token.is_cancelled() {
                break;
            }
            invoked += 1;
            handled |= activator(service.as_ref())
                .try_invoke_async(Arc::clone(&request), token)
                .await?
                .succeeded();
        }
        debug!(
            contract = std::any::type_name::<H>(),
            request = AsAny::type_name(&*request),
            instances = services.len(),
            invoked,
            handled,
            "dispatched fire-and-forget request"
        );
        Ok(handled)
    }
}
