// Copyright 2025 Cowboy AI, LLC.

//! Fire-and-forget handler tables
//!
//! A [`FireForgetManager`] maps the exact type of a request to a single
//! callback. Registration is the write side ([`FireForgetRegistry`]),
//! invocation the read side ([`FireForgetActivator`]).

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
use crate::errors::DispatchResult;
use crate::request::{request_type_id, AsAny, Request, Upcast};

type SyncHandler = Arc<dyn Fn(&dyn Any) -> DispatchResult<bool> + Send + Sync>;

type AsyncHandler = Arc<
    dyn Fn(
            Arc<dyn Any + Send + Sync>,
            CancellationToken,
        ) -> BoxFuture<'static, DispatchResult<bool>>
        + Send
        + Sync,
>;

/// Write side of a fire-and-forget table for request kind `R`
pub trait FireForgetRegistry<R: ?Sized> {
    /// Register a synchronous handler for `T`
    ///
    /// The first registration for a type wins; later ones are ignored.
    fn register<T, F>(&self, handler: F) -> &Self
    where
        T: Upcast<R>,
        F: Fn(&T) -> DispatchResult<()> + Send + Sync + 'static;

    /// Register an asynchronous handler for `T`
    ///
    /// Kept apart from the synchronous table: a type may have one of each.
    fn register_async<T, F, Fut>(&self, handler: F) -> &Self
    where
        T: Upcast<R>,
        F: Fn(Arc<T>, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DispatchResult<()>> + Send + 'static;
}

/// Read side of a fire-and-forget table for request kind `R`
#[async_trait]
pub trait FireForgetActivator<R: ?Sized + Request>: Send + Sync {
    /// Invoke the synchronous handler registered for the request's exact type
    ///
    /// Returns `Ok(false)` when there is none. Handler errors pass through.
    fn try_invoke(&self, request: &R) -> DispatchResult<bool>;

    /// Invoke the asynchronous handler registered for the request's exact type
    ///
    /// Reports `Unsuccessful` when there is none, or when the handler
    /// stopped because `token` was cancelled.
    async fn try_invoke_async(
        &self,
        request: Arc<R>,
        token: &CancellationToken,
    ) -> DispatchResult<ConditionalValue>;

    /// Names of every request type with a registered handler
    fn registered_types(&self) -> Vec<&'static str>;
}

/// Concurrent fire-and-forget table implementing both roles
pub struct FireForgetManager<R: ?Sized> {
    handlers: DashMap<TypeId, Registration<SyncHandler>>,
    async_handlers: DashMap<TypeId, Registration<AsyncHandler>>,
    _kind: PhantomData<fn(&R)>,
}

impl<R: ?Sized> FireForgetManager<R> {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            handlers: DashMap::new(),
            async_handlers: DashMap::new(),
            _kind: PhantomData,
        }
    }
}

impl<R: ?Sized> Default for FireForgetManager<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: ?Sized> std::fmt::Debug for FireForgetManager<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FireForgetManager")
            .field("kind", &std::any::type_name::<R>())
            .field("handlers", &self.handlers.len())
            .field("async_handlers", &self.async_handlers.len())
            .finish()
    }
}

impl<R: ?Sized> FireForgetRegistry<R> for FireForgetManager<R> {
    fn register<T, F>(&self, handler: F) -> &Self
    where
        T: Upcast<R>,
        F: Fn(&T) -> DispatchResult<()> + Send + Sync + 'static,
    {
        let erased: SyncHandler = Arc::new(move |request: &dyn Any| {
            match request.downcast_ref::<T>() {
                Some(request) => handler(request).map(|()| true),
                None => Ok(false),
            }
        });
        insert(&self.handlers, Registration::new::<T>(erased), "fire-and-forget", "sync");
        self
    }

    fn register_async<T, F, Fut>(&self, handler: F) -> &Self
    where
        T: Upcast<R>,
        F: Fn(Arc<T>, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DispatchResult<()>> + Send + 'static,
    {
        let erased: AsyncHandler = Arc::new(
            move |request: Arc<dyn Any + Send + Sync>, token: CancellationToken| {
                match request.downcast::<T>() {
                    Ok(request) => handler(request, token).map(|r| r.map(|()| true)).boxed(),
                    Err(_) => future::ready(Ok(false)).boxed(),
                }
            },
        );
        insert(&self.async_handlers, Registration::new::<T>(erased), "fire-and-forget", "async");
        self
    }
}

#[async_trait]
impl<R: ?Sized + Request> FireForgetActivator<R> for FireForgetManager<R> {
    fn try_invoke(&self, request: &R) -> DispatchResult<bool> {
        let handler = self
            .handlers
            .get(&request_type_id(request))
            .map(|entry| Arc::clone(&entry.handler));
        match handler {
            Some(handler) => handler(AsAny::as_any(request)),
            None => Ok(false),
        }
    }

    async fn try_invoke_async(
        &self,
        request: Arc<R>,
        token: &CancellationToken,
    ) -> DispatchResult<ConditionalValue> {
        let handler = self
            .async_handlers
            .get(&request_type_id(&*request))
            .map(|entry| Arc::clone(&entry.handler));
        let Some(handler) = handler else {
            return Ok(ConditionalValue::Unsuccessful);
        };
        let outcome = handler(AsAny::into_any_arc(request), token.clone()).await;
        Ok(settle(outcome, token)?.map_or(ConditionalValue::Unsuccessful, |handled| {
            ConditionalValue::from_flag(handled)
        }))
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Command;
    use crate::errors::DispatchError;
    use crate::fakes::{FakeCommand, GenericFakeCommand, OtherCommand};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[test]
    fn test_try_invoke_matches_exact_type() {
        let manager = FireForgetManager::<dyn Command>::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        manager.register::<FakeCommand, _>(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        assert!(manager.try_invoke(&FakeCommand::new("a")).unwrap());
        assert!(!manager.try_invoke(&GenericFakeCommand::new(1i32)).unwrap());
        assert!(!manager.try_invoke(&OtherCommand::default()).unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_generic_instantiations_are_distinct() {
        let manager = FireForgetManager::<dyn Command>::new();
        manager.register::<GenericFakeCommand<i32>, _>(|_| Ok(()));

        assert!(manager.try_invoke(&GenericFakeCommand::new(1i32)).unwrap());
        assert!(!manager.try_invoke(&GenericFakeCommand::new(1i64)).unwrap());
    }

    #[test]
    fn test_first_registration_wins() {
        let manager = FireForgetManager::<dyn Command>::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let first = log.clone();
        let second = log.clone();
        manager
            .register::<FakeCommand, _>(move |_| {
                first.lock().unwrap().push("first");
                Ok(())
            })
            .register::<FakeCommand, _>(move |_| {
                second.lock().unwrap().push("second");
                Ok(())
            });

        manager.try_invoke(&FakeCommand::new("a")).unwrap();
        manager.try_invoke(&FakeCommand::new("b")).unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["first", "first"]);
    }

    #[test]
    fn test_handler_error_propagates() {
        let manager = FireForgetManager::<dyn Command>::new();
        manager.register::<FakeCommand, _>(|_| Err(anyhow::anyhow!("rejected").into()));

        let err = manager.try_invoke(&FakeCommand::new("a")).unwrap_err();
        assert_eq!(err.to_string(), "rejected");
    }

    #[test]
    fn test_trait_object_dispatch() {
        let manager = FireForgetManager::<dyn Command>::new();
        manager.register::<FakeCommand, _>(|command| {
            assert_eq!(command.name, "boxed");
            Ok(())
        });

        let command: Box<dyn Command> = Box::new(FakeCommand::new("boxed"));
        assert!(manager.try_invoke(&*command).unwrap());
    }

    #[test]
    fn test_concurrent_registration_keeps_one_entry() {
        let manager = Arc::new(FireForgetManager::<dyn Command>::new());
        let winners = Arc::new(Mutex::new(Vec::new()));

        let threads: Vec<_> = (0..8)
            .map(|i| {
                let manager = manager.clone();
                let winners = winners.clone();
                std::thread::spawn(move || {
                    manager.register::<FakeCommand, _>(move |_| {
                        winners.lock().unwrap().push(i);
                        Ok(())
                    });
                })
            })
            .collect();
        for thread in threads {
            thread.join().unwrap();
        }

        manager.try_invoke(&FakeCommand::new("a")).unwrap();
        assert_eq!(winners.lock().unwrap().len(), 1);
        assert_eq!(manager.registered_types().len(), 1);
    }

    #[tokio::test]
    async fn test_sync_and_async_tables_are_independent() {
        let manager = FireForgetManager::<dyn Command>::new();
        manager.register_async::<FakeCommand, _, _>(|_, _| async { Ok(()) });
        let token = CancellationToken::new();

        assert!(!manager.try_invoke(&FakeCommand::new("a")).unwrap());
        let outcome = manager
            .try_invoke_async(Arc::new(FakeCommand::new("a")), &token)
            .await
            .unwrap();
        assert!(outcome.succeeded());

        let missing = manager
            .try_invoke_async(Arc::new(OtherCommand::default()), &token)
            .await
            .unwrap();
        assert!(!missing.succeeded());
    }

    #[tokio::test]
    async fn test_async_handler_observing_cancellation_is_unsuccessful() {
        let manager = FireForgetManager::<dyn Command>::new();
        manager.register_async::<FakeCommand, _, _>(|_, token: CancellationToken| async move {
            tokio::select! {
                _ = token.cancelled() => Ok(()),
                _ = tokio::time::sleep(std::time::Duration::from_secs(30)) => Ok(()),
            }
        });
        let token = CancellationToken::new();
        token.cancel();

        let outcome = manager
            .try_invoke_async(Arc::new(FakeCommand::new("a")), &token)
            .await
            .unwrap();
        assert!(!outcome.succeeded());
    }

    #[tokio::test]
    async fn test_async_cancelled_error_is_unsuccessful() {
        let manager = FireForgetManager::<dyn Command>::new();
        manager.register_async::<FakeCommand, _, _>(|_, _| async { Err(DispatchError::Cancelled) });

        let outcome = manager
            .try_invoke_async(Arc::new(FakeCommand::new("a")), &CancellationToken::new())
            .await
            .unwrap();
        assert!(!outcome.succeeded());
    }

    #[tokio::test]
    async fn test_async_handler_error_propagates() {
        let manager = FireForgetManager::<dyn Command>::new();
        manager.register_async::<FakeCommand, _, _>(|command: Arc<FakeCommand>, _| async move {
            Err(anyhow::anyhow!("bad {}", command.name).into())
        });

        let err = manager
            .try_invoke_async(Arc::new(FakeCommand::new("input")), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "bad input");
    }

    #[test]
    fn test_registered_types_merges_tables() {
        let manager = FireForgetManager::<dyn Command>::new();
        manager
            .register::<FakeCommand, _>(|_| Ok(()))
            .register_async::<FakeCommand, _, _>(|_, _| async { Ok(()) })
            .register::<OtherCommand, _>(|_| Ok(()));

        let names = manager.registered_types();
        assert_eq!(names.len(), 2);
        assert!(names.iter().any(|n| n.ends_with("FakeCommand")));
    }
}
