// Copyright 2025 Cowboy AI, LLC.

//! Requests and the type erasure dispatch relies on
//!
//! Dispatch is keyed by the exact runtime type of a request. Every request
//! kind (`dyn Command`, `dyn DomainEvent`, ...) is a trait object over
//! [`Request`], and [`AsAny`] recovers the concrete value behind it.

use std::any::{Any, TypeId};
use std::fmt::Debug;
use std::sync::Arc;

use crate::metadata::MetadataDictionary;

/// Access to the concrete value behind a trait object
pub trait AsAny: Any + Send + Sync {
    /// Borrow as `dyn Any`
    fn as_any(&self) -> &dyn Any;

    /// Convert a shared pointer into a shared `dyn Any`
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;

    /// Fully qualified name of the concrete type
    fn type_name(&self) -> &'static str;
}

impl<T: Any + Send + Sync> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Anything carrying a [`MetadataDictionary`]
pub trait Metadata {
    /// The carried metadata
    fn metadata(&self) -> &MetadataDictionary;
}

impl Metadata for MetadataDictionary {
    fn metadata(&self) -> &MetadataDictionary {
        self
    }
}

/// A command, event or query that can be dispatched
pub trait Request: Metadata + AsAny + Debug {}

impl<T: Metadata + AsAny + Debug> Request for T {}

/// Runtime identity of a request: its exact concrete type
pub fn request_type_id<R: Request + ?Sized>(request: &R) -> TypeId {
    AsAny::as_any(request).type_id()
}

/// Views a concrete request as the request kind `R`
///
/// Implemented for every concrete type of a kind, so registries can
/// restrict registrations to the kind they serve.
pub trait Upcast<R: ?Sized>: Request + Sized {
    /// Borrow as the request kind
    fn upcast(&self) -> &R;

    /// Convert a shared pointer into the request kind
    fn upcast_arc(self: Arc<Self>) -> Arc<R>;
}

/// Implements [`Metadata`] for types holding a `metadata` field
#[macro_export]
macro_rules! impl_metadata {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::Metadata for $ty {
                fn metadata(&self) -> &$crate::MetadataDictionary {
                    &self.metadata
                }
            }
        )+
    };
}
