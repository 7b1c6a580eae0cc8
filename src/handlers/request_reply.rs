// Copyright 2025 Cowboy AI, LLC.

//! Request-reply handler tables
//!
//! Structured like the fire-and-forget tables, but every callback produces
//! a reply. The table is keyed by request type only; the reply type is
//! recorded next to the callback and checked on every invocation, so asking
//! for a different reply type is an error rather than a bad cast.

use async_trait::async_trait;
use dashmap::DashMap;
use futures::future::{self, BoxFuture, FutureExt};
use std::any::{Any, TypeId};
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::{insert, settle, Registration};
use crate::conditional::ConditionalValue;
use crate::errors::{DispatchError, DispatchResult};
use crate::request::{request_type_id, AsAny, Request, Upcast};

/// A type-erased reply
pub type Reply = Box<dyn Any + Send>;

type SyncCall = Arc<dyn Fn(&dyn Any) -> DispatchResult<Option<Reply>> + Send + Sync>;

type AsyncCall = Arc<
    dyn Fn(
            Arc<dyn Any + Send + Sync>,
            CancellationToken,
        ) -> BoxFuture<'static, DispatchResult<Option<Reply>>>
        + Send
        + Sync,
>;

/// Identity of a reply type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyType {
    id: TypeId,
    name: &'static str,
}

impl ReplyType {
    /// The reply type `T`
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Fully qualified name of the reply type
    pub fn name(&self) -> &'static str {
        self.name
    }
}

#[derive(Clone)]
struct ReplyHandler<C> {
    reply: ReplyType,
    call: C,
}

impl<C: Clone> ReplyHandler<C> {
    fn checked(&self, expected: ReplyType, request: &'static str) -> DispatchResult<C> {
        if self.reply != expected {
            return Err(DispatchError::ResultTypeMismatch {
                request: request.to_string(),
                expected: expected.name,
                registered: self.reply.name,
            });
        }
        Ok(self.call.clone())
    }
}

/// Write side of a request-reply table for request kind `R`
pub trait RequestReplyRegistry<R: ?Sized> {
    /// Register a synchronous handler for `T` producing `TResult`
    ///
    /// The first registration for a type wins; later ones are ignored.
    fn register<T, TResult, F>(&self, handler: F) -> &Self
    where
        T: Upcast<R>,
        TResult: Send + 'static,
        F: Fn(&T) -> DispatchResult<TResult> + Send + Sync + 'static;

    /// Register an asynchronous handler for `T` producing `TResult`
    fn register_async<T, TResult, F, Fut>(&self, handler: F) -> &Self
    where
        T: Upcast<R>,
        TResult: Send + 'static,
        F: Fn(Arc<T>, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DispatchResult<TResult>> + Send + 'static;
}

/// Read side of a request-reply table for request kind `R`
///
/// The methods here are type-erased so the trait can be used as an object;
/// [`RequestReplyActivatorExt`] adds the typed entry points.
#[async_trait]
pub trait RequestReplyActivator<R: ?Sized + Request>: Send + Sync {
    /// Invoke the synchronous handler for the request's exact type
    ///
    /// `Ok(None)` when no handler is registered.
    fn invoke_reply(&self, request: &R, expected: ReplyType) -> DispatchResult<Option<Reply>>;

    /// Invoke the asynchronous handler for the request's exact type
    async fn invoke_reply_async(
        &self,
        request: Arc<R>,
        expected: ReplyType,
        token: &CancellationToken,
    ) -> DispatchResult<ConditionalValue<Reply>>;

    /// Names of every request type with a registered handler
    fn registered_types(&self) -> Vec<&'static str>;
}

fn unbox<TResult: 'static>(reply: Reply, request: &'static str) -> DispatchResult<TResult> {
    reply
        .downcast::<TResult>()
        .map(|reply| *reply)
        .map_err(|_| DispatchError::ResultTypeMismatch {
            request: request.to_string(),
            expected: std::any::type_name::<TResult>(),
            registered: "an unknown type",
        })
}

/// Typed invocation on any [`RequestReplyActivator`]
#[async_trait]
pub trait RequestReplyActivatorExt<R: ?Sized + Request>: RequestReplyActivator<R> {
    /// Invoke the synchronous handler and return its reply
    fn try_invoke<TResult: Send + 'static>(&self, request: &R) -> DispatchResult<Option<TResult>> {
        self.invoke_reply(request, ReplyType::of::<TResult>())?
            .map(|reply| unbox(reply, AsAny::type_name(request)))
            .transpose()
    }

    /// Invoke the asynchronous handler and return its reply
    async fn try_invoke_async<TResult: Send + 'static>(
        &self,
        request: Arc<R>,
        token: &CancellationToken,
    ) -> DispatchResult<ConditionalValue<TResult>> {
        let name = AsAny::type_name(&*request);
        match self
            .invoke_reply_async(request, ReplyType::of::<TResult>(), token)
            .await?
        {
            ConditionalValue::Successful(reply) => {
                unbox(reply, name).map(ConditionalValue::Successful)
            }
            ConditionalValue::Unsuccessful => Ok(ConditionalValue::Unsuccessful),
        }
    }
}

impl<R: ?Sized + Request, A: RequestReplyActivator<R> + ?Sized> RequestReplyActivatorExt<R> for A {}

/// Concurrent request-reply table implementing both roles
pub struct RequestReplyManager<R: ?Sized> {
    handlers: DashMap<TypeId, Registration<ReplyHandler<SyncCall>>>,
    async_handlers: DashMap<TypeId, Registration<ReplyHandler<AsyncCall>>>,
    _kind: PhantomData<fn(&R)>,
}

impl<R: ?Sized> RequestReplyManager<R> {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            handlers: DashMap::new(),
            async_handlers: DashMap::new(),
            _kind: PhantomData,
        }
    }
}

impl<R: ?Sized> Default for RequestReplyManager<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: ?Sized> std::fmt::Debug for RequestReplyManager<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestReplyManager")
            .field("kind", &std::any::type_name::<R>())
            .field("handlers", &self.handlers.len())
            .field("async_handlers", &self.async_handlers.len())
            .finish()
    }
}

impl<R: ?Sized> RequestReplyRegistry<R> for RequestReplyManager<R> {
    fn register<T, TResult, F>(&self, handler: F) -> &Self
    where
        T: Upcast<R>,
        TResult: Send + 'static,
        F: Fn(&T) -> DispatchResult<TResult> + Send + Sync + 'static,
    {
        let call: SyncCall = Arc::new(move |request: &dyn Any| match request.downcast_ref::<T>() {
            Some(request) => handler(request).map(|reply| Some(Box::new(reply) as Reply)),
            None => Ok(None),
        });
        let handler = ReplyHandler {
            reply: ReplyType::of::<TResult>(),
            call,
        };
        insert(&self.handlers, Registration::new::<T>(handler), "request-reply", "sync");
        self
    }

    fn register_async<T, TResult, F, Fut>(&self, handler: F) -> &Self
    where
        T: Upcast<R>,
        TResult: Send + 'static,
        F: Fn(Arc<T>, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DispatchResult<TResult>> + Send + 'static,
    {
        let call: AsyncCall = Arc::new(
            move |request: Arc<dyn Any + Send + Sync>, token: CancellationToken| {
                match request.downcast::<T>() {
                    Ok(request) => handler(request, token)
                        .map(|reply| reply.map(|reply| Some(Box::new(reply) as Reply)))
                        .boxed(),
                    Err(_) => future::ready(Ok(None)).boxed(),
                }
            },
        );
        let handler = ReplyHandler {
            reply: ReplyType::of::<TResult>(),
            call,
        };
        insert(&self.async_handlers, Registration::new::<T>(handler), "request-reply", "async");
        self
    }
}

#[async_trait]
impl<R: ?Sized + Request> RequestReplyActivator<R> for RequestReplyManager<R> {
    fn invoke_reply(&self, request: &R, expected: ReplyType) -> DispatchResult<Option<Reply>> {
        let handler = self
            .handlers
            .get(&request_type_id(request))
            .map(|entry| entry.handler.clone());
        match handler {
            Some(handler) => {
                let call = handler.checked(expected, AsAny::type_name(request))?;
                call(AsAny::as_any(request))
            }
            None => Ok(None),
        }
    }

    async fn invoke_reply_async(
        &self,
        request: Arc<R>,
        expected: ReplyType,
        token: &CancellationToken,
    ) -> DispatchResult<ConditionalValue<Reply>> {
        let handler = self
            .async_handlers
            .get(&request_type_id(&*request))
            .map(|entry| entry.handler.clone());
        let Some(handler) = handler else {
            return Ok(ConditionalValue::Unsuccessful);
        };
        let call = handler.checked(expected, AsAny::type_name(&*request))?;
        let outcome = call(AsAny::into_any_arc(request), token.clone()).await;
        Ok(settle(outcome, token)?.flatten().into())
    }

    fn registered_types(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self
            .handlers
            .iter()
            .map(|entry| entry.type_name)
            .chain(self.async_handlers.iter().map(|entry| entry.type_name))
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}
