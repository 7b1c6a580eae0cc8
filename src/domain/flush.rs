// Copyright 2025 Cowboy AI, LLC.

//! Publishing an aggregate's pending events

use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{AggregateRoot, AsDomainEvent, BufferedEvent, DomainEventPublisher};
use crate::errors::DispatchResult;
use crate::metadata::MetadataFactory;

/// Events to publish, taken from the buffer unless the aggregate is traced
fn pending<A: AggregateRoot + ?Sized>(aggregate: &mut A) -> Vec<Arc<A::Event>> {
    let inner = aggregate.aggregate_mut();
    if <A::Event as BufferedEvent>::TRACED {
        inner.events().to_vec()
    } else {
        inner.take_events()
    }
}

/// Drains aggregates through a [`DomainEventPublisher`]
///
/// The buffer is emptied before the first event is raised, so a handler
/// touching the aggregate never sees events that are already on their way.
/// Each event first receives the aggregate's metadata for keys it lacks,
/// then is raised in the order it was added. The first handler error stops
/// the flush; events after it are not raised.
#[async_trait]
pub trait DomainEventPublisherExt: DomainEventPublisher {
    /// Raise every pending event of `aggregate`
    fn raise_many<A: AggregateRoot + ?Sized>(&self, aggregate: &mut A) -> DispatchResult<()> {
        let events = pending(aggregate);
        debug!(count = events.len(), "raising aggregate events");
        for event in events {
            MetadataFactory::merge(&*event, aggregate.aggregate());
            self.raise(AsDomainEvent::as_domain_event(&*event))?;
        }
        Ok(())
    }

    /// Raise every pending event of `aggregate` to asynchronous handlers
    async fn raise_many_async<A: AggregateRoot + ?Sized>(
        &self,
        aggregate: &mut A,
        token: &CancellationToken,
    ) -> DispatchResult<()> {
        let events = pending(aggregate);
        debug!(count = events.len(), "raising aggregate events");
        for event in events {
            MetadataFactory::merge(&*event, aggregate.aggregate());
            self.raise_async(AsDomainEvent::to_domain_event(event), token)
                .await?;
        }
        Ok(())
    }
}

impl<P: DomainEventPublisher + ?Sized> DomainEventPublisherExt for P {}
