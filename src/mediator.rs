// Copyright 2025 Cowboy AI, LLC.

//! The single entry point for commands, events and queries
//!
//! The mediator owns one dispatcher per request kind, all resolving handlers
//! from the same [`ServiceLocator`]:
//!
//! | Request | Operation | Protocol |
//! |---|---|---|
//! | [`Command`] | `commit` | fire-and-forget, fan-out |
//! | [`DomainEvent`] | `raise` | fire-and-forget, fan-out |
//! | [`IntegrationEvent`] | `publish` | fire-and-forget, fan-out |
//! | [`Event`] | `publish_event` | fire-and-forget to every contract the event satisfies |
//! | [`Query`] | `query` | request-reply, first answer |
//!
//! Every operation fails with [`DispatchError::OrphanedHandler`] when no
//! handler accepts the request; handler errors are returned unchanged.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::commands::{Command, CommandDispatcher};
use crate::domain::{DomainEvent, DomainEventDispatcher, DomainEventPublisher, Event};
use crate::errors::{DispatchError, DispatchResult};
use crate::integration::{IntegrationEvent, IntegrationEventDispatcher};
use crate::queries::{Query, QueryDispatcher};
use crate::request::AsAny;
use crate::services::ServiceLocator;

/// Contract name reported when an event satisfies no handler contract
const EVENT_HANDLER: &str = "EventHandler";

/// Options for [`Mediator`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediatorOptions {
    /// Log the locator's handler summary when the mediator is created
    pub include_handler_services_descriptor: bool,
}

/// Routes every request kind to its handlers
#[derive(Debug, Clone)]
pub struct Mediator {
    commands: CommandDispatcher,
    domain_events: DomainEventDispatcher,
    integration_events: IntegrationEventDispatcher,
    queries: QueryDispatcher,
}

impl Mediator {
    /// Create a mediator with default options
    pub fn new(locator: Arc<dyn ServiceLocator>) -> Self {
        Self::with_options(locator, MediatorOptions::default())
    }

    /// Create a mediator
    pub fn with_options(locator: Arc<dyn ServiceLocator>, options: MediatorOptions) -> Self {
        if options.include_handler_services_descriptor {
            match locator.descriptor() {
                Some(descriptor) => info!("handler services\n{descriptor}"),
                None => debug!("service locator keeps no handler services descriptor"),
            }
        }
        Self {
            commands: CommandDispatcher::new(Arc::clone(&locator)),
            domain_events: DomainEventDispatcher::new(Arc::clone(&locator)),
            integration_events: IntegrationEventDispatcher::new(Arc::clone(&locator)),
            queries: QueryDispatcher::new(locator),
        }
    }

    /// Deliver `command` to its handlers
    pub fn commit(&self, command: &dyn Command) -> DispatchResult<()> {
        self.commands.commit(command)
    }

    /// Deliver `command` to its asynchronous handlers
    pub async fn commit_async(
        &self,
        command: Arc<dyn Command>,
        token: &CancellationToken,
    ) -> DispatchResult<()> {
        self.commands.commit_async(command, token).await
    }

    /// Deliver an integration event to its handlers
    pub fn publish(&self, event: &dyn IntegrationEvent) -> DispatchResult<()> {
        self.integration_events.publish(event)
    }

    /// Deliver an integration event to its asynchronous handlers
    pub async fn publish_async(
        &self,
        event: Arc<dyn IntegrationEvent>,
        token: &CancellationToken,
    ) -> DispatchResult<()> {
        self.integration_events.publish_async(event, token).await
    }

    /// Deliver an event to every handler contract it satisfies
    ///
    /// The event counts as handled when any contract handled it. It is
    /// orphaned when it satisfies no contract, or when none of the
    /// contracts it satisfies has a matching handler. Errors raised by a
    /// handler are returned unchanged, even when another contract handled
    /// the event.
    pub fn publish_event(&self, event: Arc<dyn Event>) -> DispatchResult<()> {
        let mut handled = false;
        if let Some(domain) = Arc::clone(&event).into_domain_event() {
            handled |= self.domain_events.deliver(&*domain)?;
        }
        if let Some(integration) = Arc::clone(&event).into_integration_event() {
            handled |= self.integration_events.deliver(&*integration)?;
        }
        if handled {
            Ok(())
        } else {
            Err(orphaned_event(&*event))
        }
    }

    /// Deliver an event to every asynchronous handler contract it satisfies
    ///
    /// When nothing handled the event and `token` was cancelled, the result
    /// is [`DispatchError::Cancelled`].
    pub async fn publish_event_async(
        &self,
        event: Arc<dyn Event>,
        token: &CancellationToken,
    ) -> DispatchResult<()> {
        let mut handled = false;
        if let Some(domain) = Arc::clone(&event).into_domain_event() {
            handled |= self.domain_events.deliver_async(domain, token).await?;
        }
        if let Some(integration) = Arc::clone(&event).into_integration_event() {
            handled |= self.integration_events.deliver_async(integration, token).await?;
        }
        match (handled, token.is_cancelled()) {
            (true, _) => Ok(()),
            (false, true) => Err(DispatchError::Cancelled),
            (false, false) => Err(orphaned_event(&*event)),
        }
    }

    /// Reply of the first handler answering `query`
    pub fn query<Q: Query>(&self, query: &Q) -> DispatchResult<Q::Output> {
        self.queries.query(query)
    }

    /// Reply of the first asynchronous handler answering `query`
    pub async fn query_async<Q: Query>(
        &self,
        query: Arc<Q>,
        token: &CancellationToken,
    ) -> DispatchResult<Q::Output> {
        self.queries.query_async(query, token).await
    }
}

#[async_trait]
impl DomainEventPublisher for Mediator {
    fn raise(&self, event: &dyn DomainEvent) -> DispatchResult<()> {
        self.domain_events.raise(event)
    }

    async fn raise_async(
        &self,
        event: Arc<dyn DomainEvent>,
        token: &CancellationToken,
    ) -> DispatchResult<()> {
        self.domain_events.raise_async(event, token).await
    }
}

fn orphaned_event(event: &dyn Event) -> DispatchError {
    debug!(request = AsAny::type_name(event), "no event handler accepted event");
    DispatchError::orphaned_handler("request", EVENT_HANDLER, AsAny::type_name(event))
}
