// Copyright 2025 Cowboy AI, LLC.

//! Traced aggregates keep their full event history
//!
//! A traced aggregate is event sourced: its state is whatever its events
//! say. Flushing a traced aggregate publishes the events but leaves the
//! buffer in place, and every event is stamped with the version it produced.

use std::sync::Arc;
use tracing::trace;

use super::{Aggregate, AggregateRoot, DomainEvent};
use crate::errors::DispatchResult;
use crate::metadata::{MetadataDictionary, MetadataExt};
use crate::request::{Metadata, Upcast};

/// A domain event that is part of an aggregate's permanent history
pub trait TracedDomainEvent: DomainEvent {}

impl<T: TracedDomainEvent> Upcast<dyn TracedDomainEvent> for T {
    fn upcast(&self) -> &dyn TracedDomainEvent {
        self
    }

    fn upcast_arc(self: Arc<Self>) -> Arc<dyn TracedDomainEvent> {
        self
    }
}

/// Implements [`Event`](crate::Event), [`DomainEvent`] and
/// [`TracedDomainEvent`] for the given types
#[macro_export]
macro_rules! traced_domain_event {
    ($($ty:ty),+ $(,)?) => {
        $(
            $crate::domain_event!($ty);

            impl $crate::TracedDomainEvent for $ty {}
        )+
    };
}

/// An aggregate whose events carry a version and are never discarded
#[derive(Debug, Default)]
pub struct TracedAggregate {
    aggregate: Aggregate<dyn TracedDomainEvent>,
    version: u64,
}

impl TracedAggregate {
    /// Create an aggregate at version zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an aggregate at version zero carrying `metadata`
    pub fn with_metadata(metadata: MetadataDictionary) -> Self {
        Self {
            aggregate: Aggregate::with_metadata(metadata),
            version: 0,
        }
    }

    /// Version of the most recent event
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Record a new event, advancing the version and stamping it on the event
    pub fn add_event<T: Upcast<dyn TracedDomainEvent>>(
        &mut self,
        event: T,
    ) -> Arc<dyn TracedDomainEvent> {
        self.version += 1;
        event.set_aggregate_version(self.version);
        self.aggregate.add_event(event)
    }

    /// Rebuild state from historical events
    ///
    /// Each event is passed to `apply` in order. Replayed events are not
    /// buffered; the version follows the `AggregateVersion` stamped on each
    /// event, or counts up when an event carries none.
    pub fn replay<I, F>(&mut self, events: I, mut apply: F) -> DispatchResult<()>
    where
        I: IntoIterator<Item = Arc<dyn TracedDomainEvent>>,
        F: FnMut(&dyn TracedDomainEvent) -> DispatchResult<()>,
    {
        for event in events {
            apply(&*event)?;
            self.version = event.aggregate_version().unwrap_or(self.version + 1);
            trace!(version = self.version, "replayed traced event");
        }
        Ok(())
    }
}

impl Metadata for TracedAggregate {
    fn metadata(&self) -> &MetadataDictionary {
        self.aggregate.metadata()
    }
}

impl AggregateRoot for TracedAggregate {
    type Event = dyn TracedDomainEvent;

    fn aggregate(&self) -> &Aggregate<dyn TracedDomainEvent> {
        &self.aggregate
    }

    fn aggregate_mut(&mut self) -> &mut Aggregate<dyn TracedDomainEvent> {
        &mut self.aggregate
    }
}
