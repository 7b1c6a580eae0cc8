// Copyright 2025 Cowboy AI, LLC.

//! Typed accessors for the reserved metadata keys

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{
    MetadataFactory, AGGREGATE_VERSION, CAUSATION_ID, CORRELATION_ID, EVENT_ID, MEMBER_TYPE,
    REQUEST_ID, TIMESTAMP,
};
use crate::request::Metadata;

fn text<T: Metadata + ?Sized>(carrier: &T, key: &str) -> Option<String> {
    MetadataFactory::get(carrier, key).map(|value| value.to_string())
}

/// Reserved-key bookkeeping available on every [`Metadata`] carrier
///
/// Setters go through the unrestricted path, so these are the only public
/// way to write reserved keys.
pub trait MetadataExt: Metadata {
    /// Identifier shared by every request of one logical operation
    fn correlation_id(&self) -> Option<String> {
        text(self, CORRELATION_ID)
    }

    /// Stamp the correlation identifier
    fn set_correlation_id(&self, id: impl Into<String>) -> &Self {
        MetadataFactory::set_unrestricted(self, CORRELATION_ID, id.into());
        self
    }

    /// Identifier of the request that caused this one
    fn causation_id(&self) -> Option<String> {
        text(self, CAUSATION_ID)
    }

    /// Stamp the causation identifier
    fn set_causation_id(&self, id: impl Into<String>) -> &Self {
        MetadataFactory::set_unrestricted(self, CAUSATION_ID, id.into());
        self
    }

    /// Identifier of a command or query
    fn request_id(&self) -> Option<String> {
        text(self, REQUEST_ID)
    }

    /// Stamp the request identifier
    fn set_request_id(&self, id: Uuid) -> &Self {
        MetadataFactory::set_unrestricted(self, REQUEST_ID, id.simple().to_string());
        self
    }

    /// Identifier of an event
    fn event_id(&self) -> Option<String> {
        text(self, EVENT_ID)
    }

    /// Stamp the event identifier
    fn set_event_id(&self, id: Uuid) -> &Self {
        MetadataFactory::set_unrestricted(self, EVENT_ID, id.simple().to_string());
        self
    }

    /// When the carrier was created
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        MetadataFactory::get(self, TIMESTAMP).and_then(|value| value.as_timestamp())
    }

    /// Stamp the creation instant
    fn set_timestamp(&self, timestamp: DateTime<Utc>) -> &Self {
        MetadataFactory::set_unrestricted(self, TIMESTAMP, timestamp);
        self
    }

    /// Type name recorded on traced events
    fn member_type(&self) -> Option<String> {
        text(self, MEMBER_TYPE)
    }

    /// Stamp the member type
    fn set_member_type(&self, member_type: &str) -> &Self {
        MetadataFactory::set_unrestricted(self, MEMBER_TYPE, member_type);
        self
    }

    /// Aggregate version this event produced
    fn aggregate_version(&self) -> Option<u64> {
        MetadataFactory::get(self, AGGREGATE_VERSION).and_then(|value| value.as_unsigned())
    }

    /// Stamp the aggregate version
    fn set_aggregate_version(&self, version: u64) -> &Self {
        MetadataFactory::set_unrestricted(self, AGGREGATE_VERSION, version);
        self
    }

    /// Link this carrier to the request or event that caused it.
    ///
    /// The correlation identifier is inherited from `parent`, or started
    /// from the parent's own identifier when the parent is a root. The
    /// causation identifier is the parent's event or request identifier.
    fn caused_by<P: Metadata + ?Sized>(&self, parent: &P) -> &Self {
        let parent_id = parent.event_id().or_else(|| parent.request_id());
        if let Some(correlation) = parent.correlation_id().or_else(|| parent_id.clone()) {
            self.set_correlation_id(correlation);
        }
        if let Some(causation) = parent_id {
            self.set_causation_id(causation);
        }
        self
    }
}

impl<T: Metadata + ?Sized> MetadataExt for T {}
