// Copyright 2025 Cowboy AI, LLC.

//! Request metadata
//!
//! Every request carries a [`MetadataDictionary`]: a case-insensitive bag of
//! [`MetadataValue`]s. A fixed set of reserved keys is bookkeeping owned by
//! the framework; they can only be written through the crate-internal
//! unrestricted path used by [`MetadataFactory`] and [`MetadataExt`].

mod extensions;
mod factory;

pub use extensions::MetadataExt;
pub use factory::MetadataFactory;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use crate::errors::{DispatchError, DispatchResult};

/// Reserved key holding the UTC instant a request was created
pub const TIMESTAMP: &str = "Timestamp";
/// Reserved key holding the type name of a traced event
pub const MEMBER_TYPE: &str = "MemberType";
/// Reserved key correlating every request of one logical operation
pub const CORRELATION_ID: &str = "CorrelationId";
/// Reserved key naming the request that caused this one
pub const CAUSATION_ID: &str = "CausationId";
/// Reserved key identifying an event
pub const EVENT_ID: &str = "EventId";
/// Reserved key holding the aggregate version an event produced
pub const AGGREGATE_VERSION: &str = "AggregateVersion";
/// Reserved key identifying a command or query
pub const REQUEST_ID: &str = "RequestId";

/// All reserved keys in their canonical casing
pub const RESERVED_KEYWORDS: [&str; 7] = [
    TIMESTAMP,
    MEMBER_TYPE,
    CORRELATION_ID,
    CAUSATION_ID,
    EVENT_ID,
    AGGREGATE_VERSION,
    REQUEST_ID,
];

/// Returns the canonical spelling of `key` when it is reserved
pub fn reserved_keyword(key: &str) -> Option<&'static str> {
    RESERVED_KEYWORDS
        .iter()
        .copied()
        .find(|reserved| reserved.eq_ignore_ascii_case(key))
}

/// Check whether `key` matches a reserved key, ignoring case
pub fn is_reserved_keyword(key: &str) -> bool {
    reserved_keyword(key).is_some()
}

/// A single metadata value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum MetadataValue {
    /// Free-form text
    String(String),
    /// A UTC instant
    Timestamp(DateTime<Utc>),
    /// A signed integer
    Integer(i64),
    /// An unsigned integer, such as a version counter
    Unsigned(u64),
    /// A UUID
    Uuid(Uuid),
}

impl MetadataValue {
    /// Borrow the value as text, if it is one
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// The value as a timestamp, if it is one
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            MetadataValue::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    /// The value as an integer, if it is one
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            MetadataValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// The value as an unsigned integer, if it is one or a non-negative integer
    pub fn as_unsigned(&self) -> Option<u64> {
        match self {
            MetadataValue::Unsigned(u) => Some(*u),
            MetadataValue::Integer(i) => u64::try_from(*i).ok(),
            _ => None,
        }
    }

    /// The value as a UUID, if it is one
    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            MetadataValue::Uuid(id) => Some(*id),
            _ => None,
        }
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::String(s) => f.write_str(s),
            MetadataValue::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
            MetadataValue::Integer(i) => write!(f, "{i}"),
            MetadataValue::Unsigned(u) => write!(f, "{u}"),
            MetadataValue::Uuid(id) => write!(f, "{}", id.simple()),
        }
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::String(value)
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::String(value.to_string())
    }
}

impl From<DateTime<Utc>> for MetadataValue {
    fn from(value: DateTime<Utc>) -> Self {
        MetadataValue::Timestamp(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        MetadataValue::Integer(value)
    }
}

impl From<u64> for MetadataValue {
    fn from(value: u64) -> Self {
        MetadataValue::Unsigned(value)
    }
}

impl From<Uuid> for MetadataValue {
    fn from(value: Uuid) -> Self {
        MetadataValue::Uuid(value)
    }
}

#[derive(Debug, Clone)]
struct Entry {
    key: String,
    value: MetadataValue,
}

/// Case-insensitive metadata attached to a request
///
/// The dictionary is internally synchronized so framework code can stamp
/// metadata on requests that are already shared behind an `Arc`. Cloning
/// copies the entries; two requests never share one dictionary.
#[derive(Default)]
pub struct MetadataDictionary {
    entries: RwLock<IndexMap<String, Entry>>,
}

impl MetadataDictionary {
    /// Create an empty dictionary
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a dictionary stamped with a fresh `RequestId` and `Timestamp`
    pub fn for_request() -> Self {
        let metadata = Self::new();
        metadata.set_unrestricted(REQUEST_ID, Uuid::new_v4().simple().to_string());
        metadata.set_unrestricted(TIMESTAMP, Utc::now());
        metadata
    }

    /// Create a dictionary stamped with a fresh `EventId` and `Timestamp`
    pub fn for_event() -> Self {
        let metadata = Self::new();
        metadata.set_unrestricted(EVENT_ID, Uuid::new_v4().simple().to_string());
        metadata.set_unrestricted(TIMESTAMP, Utc::now());
        metadata
    }

    /// Create an event dictionary that also records `T` as its `MemberType`
    pub fn for_traced_event<T: ?Sized>() -> Self {
        let metadata = Self::for_event();
        metadata.set_unrestricted(MEMBER_TYPE, std::any::type_name::<T>());
        metadata
    }

    fn read(&self) -> RwLockReadGuard<'_, IndexMap<String, Entry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, IndexMap<String, Entry>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn fold(key: &str) -> String {
        key.to_lowercase()
    }

    /// Get a copy of the value stored under `key`
    pub fn get(&self, key: &str) -> Option<MetadataValue> {
        self.read().get(&Self::fold(key)).map(|e| e.value.clone())
    }

    /// Check whether `key` is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.read().contains_key(&Self::fold(key))
    }

    /// Add a new entry
    ///
    /// Fails with [`DispatchError::ReservedKeyword`] for reserved keys and
    /// with [`DispatchError::DuplicateKey`] if the key is already present.
    pub fn add(
        &self,
        key: impl Into<String>,
        value: impl Into<MetadataValue>,
    ) -> DispatchResult<()> {
        let key = key.into();
        if is_reserved_keyword(&key) {
            return Err(DispatchError::reserved_keyword(key));
        }
        let mut entries = self.write();
        let folded = Self::fold(&key);
        if entries.contains_key(&folded) {
            return Err(DispatchError::DuplicateKey { key });
        }
        entries.insert(
            folded,
            Entry {
                key,
                value: value.into(),
            },
        );
        Ok(())
    }

    /// Insert or replace the entry under a non-reserved key
    ///
    /// Returns the previous value, if any.
    pub fn set(
        &self,
        key: impl Into<String>,
        value: impl Into<MetadataValue>,
    ) -> DispatchResult<Option<MetadataValue>> {
        let key = key.into();
        if is_reserved_keyword(&key) {
            return Err(DispatchError::reserved_keyword(key));
        }
        Ok(self.upsert(key, value.into()))
    }

    /// Insert or replace an entry without the reserved-key check
    pub(crate) fn set_unrestricted(
        &self,
        key: &str,
        value: impl Into<MetadataValue>,
    ) -> Option<MetadataValue> {
        let key = reserved_keyword(key).map_or_else(|| key.to_string(), str::to_string);
        self.upsert(key, value.into())
    }

    fn upsert(&self, key: String, value: MetadataValue) -> Option<MetadataValue> {
        let folded = Self::fold(&key);
        self.write()
            .insert(folded, Entry { key, value })
            .map(|previous| previous.value)
    }

    /// Copy every entry of `source` whose key is absent here
    ///
    /// Existing entries are never overwritten. Reserved keys are copied too,
    /// since they were already validated when `source` received them.
    pub(crate) fn merge_from(&self, source: &MetadataDictionary) {
        let incoming: Vec<(String, Entry)> = source
            .read()
            .iter()
            .map(|(folded, entry)| (folded.clone(), entry.clone()))
            .collect();
        let mut entries = self.write();
        for (folded, entry) in incoming {
            entries.entry(folded).or_insert(entry);
        }
    }

    /// Remove the entry under `key`, returning its value
    pub fn remove(&self, key: &str) -> Option<MetadataValue> {
        self.write()
            .shift_remove(&Self::fold(key))
            .map(|entry| entry.value)
    }

    /// Remove every entry
    pub fn clear(&self) {
        self.write().clear();
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Check whether the dictionary is empty
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Keys as they were first written
    pub fn keys(&self) -> Vec<String> {
        self.read().values().map(|e| e.key.clone()).collect()
    }

    /// Snapshot of every entry
    pub fn entries(&self) -> Vec<(String, MetadataValue)> {
        self.read()
            .values()
            .map(|e| (e.key.clone(), e.value.clone()))
            .collect()
    }
}

impl Clone for MetadataDictionary {
    fn clone(&self) -> Self {
        Self {
            entries: RwLock::new(self.read().clone()),
        }
    }
}

impl fmt::Debug for MetadataDictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.read().values().map(|e| (&e.key, &e.value)))
            .finish()
    }
}

impl PartialEq for MetadataDictionary {
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        let mine = self.read();
        let theirs = other.read();
        mine.len() == theirs.len()
            && mine
                .iter()
                .all(|(k, e)| theirs.get(k).is_some_and(|o| o.value == e.value))
    }
}

impl Serialize for MetadataDictionary {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let entries = self.read();
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for entry in entries.values() {
            map.serialize_entry(&entry.key, &entry.value)?;
        }
        map.end()
    }
}
