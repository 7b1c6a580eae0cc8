// Copyright 2025 Cowboy AI, LLC.

//! Type-keyed handler tables for both message exchange protocols

mod factory;
mod fire_forget;
mod request_reply;

pub use factory::HandlerFactory;
pub use fire_forget::{FireForgetActivator, FireForgetManager, FireForgetRegistry};
pub use request_reply::{
    Reply, ReplyType, RequestReplyActivator, RequestReplyActivatorExt, RequestReplyManager,
    RequestReplyRegistry,
};

use dashmap::DashMap;
use std::any::TypeId;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::errors::{DispatchError, DispatchResult};

/// A callback stored under the exact type it handles
struct Registration<H> {
    type_id: TypeId,
    type_name: &'static str,
    handler: H,
}

impl<H> Registration<H> {
    fn new<T: 'static>(handler: H) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            handler,
        }
    }
}

/// Stores `registration` unless its type already has a handler in `table`
fn insert<H>(
    table: &DashMap<TypeId, Registration<H>>,
    registration: Registration<H>,
    protocol: &'static str,
    mode: &'static str,
) {
    let type_name = registration.type_name;
    let mut inserted = false;
    table.entry(registration.type_id).or_insert_with(|| {
        inserted = true;
        registration
    });
    if inserted {
        trace!(request = type_name, protocol, mode, "registered handler");
    } else {
        debug!(request = type_name, protocol, mode, "ignored duplicate handler");
    }
}

/// Folds cancellation into the outcome of an async handler.
///
/// A handler that returned `Cancelled`, or returned after `token` fired,
/// did not complete its work and yields `None`. Other errors pass through.
fn settle<T>(outcome: DispatchResult<T>, token: &CancellationToken) -> DispatchResult<Option<T>> {
    match outcome {
        Ok(_) if token.is_cancelled() => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(DispatchError::Cancelled) => Ok(None),
        Err(err) => Err(err),
    }
}
