// Copyright 2025 Cowboy AI, LLC.

//! Domain events, the aggregates that raise them, and their dispatch
//!
//! Events are delivered with the fire-and-forget protocol to every
//! [`DomainEventHandler`] accepting the event's exact type. Aggregates buffer
//! the events their behavior produces; [`DomainEventPublisherExt`] drains a
//! buffer into any [`DomainEventPublisher`].

mod aggregate;
mod flush;
mod traced;

pub use aggregate::{Aggregate, AggregateRoot, BufferedEvent};
pub use flush::DomainEventPublisherExt;
pub use traced::{TracedAggregate, TracedDomainEvent};

use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::dispatchers::FireForgetDispatcher;
use crate::errors::DispatchResult;
use crate::handlers::FireForgetActivator;
use crate::integration::IntegrationEvent;
use crate::request::{Request, Upcast};
use crate::services::ServiceLocator;

/// Something that happened
///
/// An event satisfies one or more handler contracts. The views below say
/// which; [`domain_event!`](crate::domain_event) and
/// [`integration_event!`](crate::integration_event) implement them for
/// single-contract events. An event satisfying both overrides both.
pub trait Event: Request {
    /// This event as a domain event, when it is one
    fn into_domain_event(self: Arc<Self>) -> Option<Arc<dyn DomainEvent>> {
        None
    }

    /// This event as an integration event, when it is one
    fn into_integration_event(self: Arc<Self>) -> Option<Arc<dyn IntegrationEvent>> {
        None
    }
}

/// An event raised inside a bounded context by an aggregate
pub trait DomainEvent: Event + AsDomainEvent {}

/// Views any domain event, including traced ones, as `dyn DomainEvent`
pub trait AsDomainEvent {
    /// Borrow as a domain event
    fn as_domain_event(&self) -> &dyn DomainEvent;

    /// Convert a shared pointer into a shared domain event
    fn to_domain_event(self: Arc<Self>) -> Arc<dyn DomainEvent>;
}

impl<T: DomainEvent> AsDomainEvent for T {
    fn as_domain_event(&self) -> &dyn DomainEvent {
        self
    }

    fn to_domain_event(self: Arc<Self>) -> Arc<dyn DomainEvent> {
        self
    }
}

impl<T: DomainEvent> Upcast<dyn DomainEvent> for T {
    fn upcast(&self) -> &dyn DomainEvent {
        self
    }

    fn upcast_arc(self: Arc<Self>) -> Arc<dyn DomainEvent> {
        self
    }
}

/// Contract of services that handle domain events
pub trait DomainEventHandler: Send + Sync {
    /// The handler's domain event table
    fn delegates(&self) -> &dyn FireForgetActivator<dyn DomainEvent>;
}

/// Anything that can raise domain events to their handlers
#[async_trait]
pub trait DomainEventPublisher: Send + Sync {
    /// Deliver `event` to its handlers
    fn raise(&self, event: &dyn DomainEvent) -> DispatchResult<()>;

    /// Deliver `event` to its asynchronous handlers
    async fn raise_async(
        &self,
        event: Arc<dyn DomainEvent>,
        token: &CancellationToken,
    ) -> DispatchResult<()>;
}

/// Raises domain events to every [`DomainEventHandler`] that accepts them
#[derive(Debug, Clone)]
pub struct DomainEventDispatcher {
    dispatcher: FireForgetDispatcher,
}

impl DomainEventDispatcher {
    /// Create a dispatcher over a service locator
    pub fn new(locator: Arc<dyn ServiceLocator>) -> Self {
        Self {
            dispatcher: FireForgetDispatcher::new(locator),
        }
    }

    /// Raise `event` and report whether any handler accepted it
    pub(crate) fn deliver(&self, event: &dyn DomainEvent) -> DispatchResult<bool> {
        self.dispatcher
            .deliver::<dyn DomainEventHandler, dyn DomainEvent>(event, |handler| {
                handler.delegates()
            })
    }

    pub(crate) async fn deliver_async(
        &self,
        event: Arc<dyn DomainEvent>,
        token: &CancellationToken,
    ) -> DispatchResult<bool> {
        self.dispatcher
            .deliver_async::<dyn DomainEventHandler, dyn DomainEvent>(event, token, |handler| {
                handler.delegates()
            })
            .await
    }
}

#[async_trait]
impl DomainEventPublisher for DomainEventDispatcher {
    fn raise(&self, event: &dyn DomainEvent) -> DispatchResult<()> {
        self.dispatcher
            .dispatch::<dyn DomainEventHandler, dyn DomainEvent>(event, |handler| {
                handler.delegates()
            })
    }

    async fn raise_async(
        &self,
        event: Arc<dyn DomainEvent>,
        token: &CancellationToken,
    ) -> DispatchResult<()> {
        self.dispatcher
            .dispatch_async::<dyn DomainEventHandler, dyn DomainEvent>(event, token, |handler| {
                handler.delegates()
            })
            .await
    }
}

/// Implements [`Event`] and [`DomainEvent`] for the given types
#[macro_export]
macro_rules! domain_event {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::Event for $ty {
                fn into_domain_event(
                    self: ::std::sync::Arc<Self>,
                ) -> ::std::option::Option<::std::sync::Arc<dyn $crate::DomainEvent>> {
                    ::std::option::Option::Some(self)
                }
            }

            impl $crate::DomainEvent for $ty {}
        )+
    };
}
