// Copyright 2025 Cowboy AI, LLC.

//! Aggregates and their pending event buffers

use std::sync::Arc;

use super::{DomainEvent, TracedDomainEvent};
use crate::metadata::MetadataDictionary;
use crate::request::{Metadata, Upcast};

/// An event kind an aggregate can buffer
pub trait BufferedEvent: DomainEvent {
    /// Traced buffers survive a flush so the aggregate can be rehydrated
    const TRACED: bool;
}

impl BufferedEvent for dyn DomainEvent {
    const TRACED: bool = false;
}

impl BufferedEvent for dyn TracedDomainEvent {
    const TRACED: bool = true;
}

/// Metadata and the ordered buffer of events not yet published
#[derive(Debug)]
pub struct Aggregate<E: ?Sized = dyn DomainEvent> {
    metadata: MetadataDictionary,
    events: Vec<Arc<E>>,
}

impl<E: ?Sized> Default for Aggregate<E> {
    fn default() -> Self {
        Self {
            metadata: MetadataDictionary::new(),
            events: Vec::new(),
        }
    }
}

impl<E: ?Sized + BufferedEvent> Aggregate<E> {
    /// Create an aggregate with no metadata and no pending events
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an aggregate carrying `metadata`
    pub fn with_metadata(metadata: MetadataDictionary) -> Self {
        Self {
            metadata,
            events: Vec::new(),
        }
    }

    /// Pending events in the order they were added
    pub fn events(&self) -> &[Arc<E>] {
        &self.events
    }

    /// Append an event to the buffer
    pub fn add_event<T: Upcast<E>>(&mut self, event: T) -> Arc<E> {
        let event = Upcast::upcast_arc(Arc::new(event));
        self.events.push(Arc::clone(&event));
        event
    }

    /// Drop every pending event
    pub fn remove_all_events(&mut self) {
        self.events.clear();
    }

    pub(crate) fn take_events(&mut self) -> Vec<Arc<E>> {
        std::mem::take(&mut self.events)
    }
}

impl<E: ?Sized> Metadata for Aggregate<E> {
    fn metadata(&self) -> &MetadataDictionary {
        &self.metadata
    }
}

/// A type built around an [`Aggregate`]
///
/// Application aggregates embed an `Aggregate` and expose it here, which is
/// all the flush protocol needs.
pub trait AggregateRoot: Send {
    /// Kind of event the aggregate buffers
    type Event: ?Sized + BufferedEvent;

    /// The embedded aggregate
    fn aggregate(&self) -> &Aggregate<Self::Event>;

    /// The embedded aggregate, mutably
    fn aggregate_mut(&mut self) -> &mut Aggregate<Self::Event>;
}

impl<E: ?Sized + BufferedEvent> AggregateRoot for Aggregate<E> {
    type Event = E;

    fn aggregate(&self) -> &Aggregate<E> {
        self
    }

    fn aggregate_mut(&mut self) -> &mut Aggregate<E> {
        self
    }
}
