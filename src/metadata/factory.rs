// Copyright 2025 Cowboy AI, LLC.

//! Typed access to the metadata of any [`Metadata`] carrier

use super::MetadataValue;
use crate::errors::DispatchResult;
use crate::request::Metadata;

/// Get, set and merge metadata on requests and aggregates
pub struct MetadataFactory;

impl MetadataFactory {
    /// Value stored under `key`, or `None` when absent
    pub fn get<T: Metadata + ?Sized>(carrier: &T, key: &str) -> Option<MetadataValue> {
        carrier.metadata().get(key)
    }

    /// Insert or replace a non-reserved entry
    pub fn set<T: Metadata + ?Sized>(
        carrier: &T,
        key: &str,
        value: impl Into<MetadataValue>,
    ) -> DispatchResult<()> {
        carrier.metadata().set(key, value)?;
        Ok(())
    }

    /// Insert or replace any entry, reserved keys included
    pub(crate) fn set_unrestricted<T: Metadata + ?Sized>(
        carrier: &T,
        key: &str,
        value: impl Into<MetadataValue>,
    ) {
        carrier.metadata().set_unrestricted(key, value);
    }

    /// Copy entries from `source` into `destination` where `destination` lacks the key
    pub fn merge<D, S>(destination: &D, source: &S)
    where
        D: Metadata + ?Sized,
        S: Metadata + ?Sized,
    {
        destination.metadata().merge_from(source.metadata());
    }
}
