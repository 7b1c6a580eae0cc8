// Copyright 2025 Cowboy AI, LLC.

//! Integration events: facts published across bounded contexts
//!
//! Integration events are the contract a context offers its neighbours.
//! Delivery inside this crate uses the fire-and-forget protocol; carrying
//! them between processes is left to a transport.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::dispatchers::FireForgetDispatcher;
use crate::domain::Event;
use crate::errors::DispatchResult;
use crate::handlers::FireForgetActivator;
use crate::request::Upcast;
use crate::services::ServiceLocator;

/// An event published to other bounded contexts
pub trait IntegrationEvent: Event {}

impl<T: IntegrationEvent> Upcast<dyn IntegrationEvent> for T {
    fn upcast(&self) -> &dyn IntegrationEvent {
        self
    }

    fn upcast_arc(self: Arc<Self>) -> Arc<dyn IntegrationEvent> {
        self
    }
}

/// Contract of services that handle integration events
pub trait IntegrationEventHandler: Send + Sync {
    /// The handler's integration event table
    fn delegates(&self) -> &dyn FireForgetActivator<dyn IntegrationEvent>;
}

/// Publishes integration events to every [`IntegrationEventHandler`] that accepts them
#[derive(Debug, Clone)]
pub struct IntegrationEventDispatcher {
    dispatcher: FireForgetDispatcher,
}

impl IntegrationEventDispatcher {
    /// Create a dispatcher over a service locator
    pub fn new(locator: Arc<dyn ServiceLocator>) -> Self {
        Self {
            dispatcher: FireForgetDispatcher::new(locator),
        }
    }

    /// Deliver `event` to its handlers
    pub fn publish(&self, event: &dyn IntegrationEvent) -> DispatchResult<()> {
        self.dispatcher
            .dispatch::<dyn IntegrationEventHandler, dyn IntegrationEvent>(event, |handler| {
                handler.delegates()
            })
    }

    /// Deliver `event` to its asynchronous handlers
    pub async fn publish_async(
        &self,
        event: Arc<dyn IntegrationEvent>,
        token: &CancellationToken,
    ) -> DispatchResult<()> {
        self.dispatcher
            .dispatch_async::<dyn IntegrationEventHandler, dyn IntegrationEvent>(
                event,
                token,
                |handler| handler.delegates(),
            )
            .await
    }

    /// Publish `event` and report whether any handler accepted it
    pub(crate) fn deliver(&self, event: &dyn IntegrationEvent) -> DispatchResult<bool> {
        self.dispatcher
            .deliver::<dyn IntegrationEventHandler, dyn IntegrationEvent>(event, |handler| {
                handler.delegates()
            })
    }

    pub(crate) async fn deliver_async(
        &self,
        event: Arc<dyn IntegrationEvent>,
        token: &CancellationToken,
    ) -> DispatchResult<bool> {
        self.dispatcher
            .deliver_async::<dyn IntegrationEventHandler, dyn IntegrationEvent>(
                event,
                token,
                |handler| handler.delegates(),
            )
            .await
    }
}

/// Implements [`Event`] and [`IntegrationEvent`] for the given types
#[macro_export]
macro_rules! integration_event {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::Event for $ty {
                fn into_integration_event(
                    self: ::std::sync::Arc<Self>,
                ) -> ::std::option::Option<::std::sync::Arc<dyn $crate::IntegrationEvent>> {
                    ::std::option::Option::Some(self)
                }
            }

            impl $crate::IntegrationEvent for $ty {}
        )+
    };
}
