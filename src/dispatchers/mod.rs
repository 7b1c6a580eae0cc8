// Copyright 2025 Cowboy AI, LLC.

//! Dispatchers resolve handler-bearing services and invoke their tables
//!
//! A dispatcher never knows concrete handlers. It asks the
//! [`ServiceLocator`] for every instance of an abstract handler contract
//! (`dyn CommandHandler`, `dyn QueryHandler`, ...) and lets each instance's
//! activator decide whether it handles the request.

mod fire_forget;
mod request_reply;

pub use fire_forget::FireForgetDispatcher;
pub use request_reply::RequestReplyDispatcher;

use std::any::TypeId;
use std::sync::Arc;
use tracing::trace;

use crate::errors::DispatchError;
use crate::request::{AsAny, Request};
use crate::services::ServiceLocator;

/// Shared plumbing of every dispatcher
#[derive(Clone)]
pub struct Dispatcher {
    locator: Arc<dyn ServiceLocator>,
}

impl Dispatcher {
    /// Create a dispatcher over a service locator
    pub fn new(locator: Arc<dyn ServiceLocator>) -> Self {
        Self { locator }
    }

    /// The service locator handlers are resolved from
    pub fn locator(&self) -> &Arc<dyn ServiceLocator> {
        &self.locator
    }

    /// Every registered instance of the handler contract `H`, in locator order
    pub fn services<H: ?Sized + Send + Sync + 'static>(&self) -> Vec<Arc<H>> {
        self.locator
            .resolve(TypeId::of::<H>())
            .into_iter()
            .filter_map(|service| {
                let instance = service.downcast_ref::<Arc<H>>().cloned();
                if instance.is_none() {
                    trace!(
                        contract = std::any::type_name::<H>(),
                        "skipped service registered under the wrong contract"
                    );
                }
                instance
            })
            .collect()
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher").finish_non_exhaustive()
    }
}

fn orphaned<H: ?Sized, R: Request + ?Sized>(request: &R) -> DispatchError {
    DispatchError::orphaned_handler(
        "request",
        std::any::type_name::<H>(),
        AsAny::type_name(request),
    )
}
