// Copyright 2025 Cowboy AI, LLC.

//! Requests and handlers shared by the unit tests

use std::fmt::Debug;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::commands::{Command, CommandHandler};
use crate::domain::{DomainEvent, DomainEventHandler, Event};
use crate::handlers::{
    FireForgetActivator, FireForgetManager, FireForgetRegistry, HandlerFactory,
    RequestReplyActivator, RequestReplyManager, RequestReplyRegistry,
};
use crate::integration::{IntegrationEvent, IntegrationEventHandler};
use crate::metadata::MetadataDictionary;
use crate::queries::{AnyQuery, Query, QueryHandler};
use crate::request::Metadata;

#[derive(Debug)]
pub struct FakeCommand {
    metadata: MetadataDictionary,
    pub name: String,
}

impl FakeCommand {
    pub fn new(name: &str) -> Self {
        Self {
            metadata: MetadataDictionary::for_request(),
            name: name.to_string(),
        }
    }
}

#[derive(Debug)]
pub struct GenericFakeCommand<T> {
    metadata: MetadataDictionary,
    pub value: T,
}

impl<T> GenericFakeCommand<T> {
    pub fn new(value: T) -> Self {
        Self {
            metadata: MetadataDictionary::for_request(),
            value,
        }
    }
}

impl<T> Metadata for GenericFakeCommand<T> {
    fn metadata(&self) -> &MetadataDictionary {
        &self.metadata
    }
}

impl<T: Debug + Send + Sync + 'static> Command for GenericFakeCommand<T> {}

#[derive(Debug, Default)]
pub struct OtherCommand {
    metadata: MetadataDictionary,
}

#[derive(Debug, Default)]
pub struct ThirdCommand {
    metadata: MetadataDictionary,
}

crate::impl_metadata!(FakeCommand, OtherCommand, ThirdCommand);

impl Command for FakeCommand {}
impl Command for OtherCommand {}
impl Command for ThirdCommand {}

#[derive(Debug)]
pub struct FakeDomainEvent {
    metadata: MetadataDictionary,
    pub name: String,
}

impl FakeDomainEvent {
    pub fn new(name: &str) -> Self {
        Self {
            metadata: MetadataDictionary::for_event(),
            name: name.to_string(),
        }
    }
}

#[derive(Debug, Default)]
pub struct OtherDomainEvent {
    metadata: MetadataDictionary,
}

#[derive(Debug)]
pub struct FakeTracedEvent {
    metadata: MetadataDictionary,
    pub amount: i32,
}

impl FakeTracedEvent {
    pub fn new(amount: i32) -> Self {
        Self {
            metadata: MetadataDictionary::for_traced_event::<Self>(),
            amount,
        }
    }
}

#[derive(Debug)]
pub struct FakeIntegrationEvent {
    metadata: MetadataDictionary,
    pub name: String,
}

impl FakeIntegrationEvent {
    pub fn new(name: &str) -> Self {
        Self {
            metadata: MetadataDictionary::for_event(),
            name: name.to_string(),
        }
    }
}

/// Satisfies both event contracts
#[derive(Debug)]
pub struct FakeCombinedEvent {
    metadata: MetadataDictionary,
    pub name: String,
}

impl FakeCombinedEvent {
    pub fn new(name: &str) -> Self {
        Self {
            metadata: MetadataDictionary::for_event(),
            name: name.to_string(),
        }
    }
}

crate::impl_metadata!(
    FakeDomainEvent,
    OtherDomainEvent,
    FakeTracedEvent,
    FakeIntegrationEvent,
    FakeCombinedEvent
);

crate::domain_event!(FakeDomainEvent, OtherDomainEvent);
crate::traced_domain_event!(FakeTracedEvent);
crate::integration_event!(FakeIntegrationEvent);

impl Event for FakeCombinedEvent {
    fn into_domain_event(self: Arc<Self>) -> Option<Arc<dyn DomainEvent>> {
        Some(self)
    }

    fn into_integration_event(self: Arc<Self>) -> Option<Arc<dyn IntegrationEvent>> {
        Some(self)
    }
}

impl DomainEvent for FakeCombinedEvent {}
impl IntegrationEvent for FakeCombinedEvent {}

#[derive(Debug)]
pub struct FakeQuery {
    metadata: MetadataDictionary,
    pub name: String,
}

impl FakeQuery {
    pub fn new(name: &str) -> Self {
        Self {
            metadata: MetadataDictionary::for_request(),
            name: name.to_string(),
        }
    }
}

#[derive(Debug, Default)]
pub struct CountQuery {
    pub metadata: MetadataDictionary,
    pub upto: i64,
}

crate::impl_metadata!(FakeQuery, CountQuery);

impl Query for FakeQuery {
    type Output = String;
}

impl Query for CountQuery {
    type Output = i64;
}

fn counter() -> Arc<AtomicUsize> {
    Arc::new(AtomicUsize::new(0))
}

/// Handles exactly one command type, counting sync and async calls apart
pub struct FakeCommandHandler {
    delegates: FireForgetManager<dyn Command>,
    calls: Arc<AtomicUsize>,
    async_calls: Arc<AtomicUsize>,
}

impl FakeCommandHandler {
    fn handling<T: Command>() -> Self {
        let (calls, async_calls) = (counter(), counter());
        let (sync_seen, async_seen) = (Arc::clone(&calls), Arc::clone(&async_calls));
        let delegates = HandlerFactory::create_fire_forget::<dyn Command>(move |registry| {
            registry
                .register::<T, _>(move |_| {
                    sync_seen.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .register_async::<T, _, _>(move |_, _| {
                    async_seen.fetch_add(1, Ordering::SeqCst);
                    async { Ok(()) }
                });
        });
        Self {
            delegates,
            calls,
            async_calls,
        }
    }

    pub fn for_fake() -> Self {
        Self::handling::<FakeCommand>()
    }

    pub fn for_other() -> Self {
        Self::handling::<OtherCommand>()
    }

    pub fn for_third() -> Self {
        Self::handling::<ThirdCommand>()
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    pub fn async_calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.async_calls)
    }
}

impl CommandHandler for FakeCommandHandler {
    fn delegates(&self) -> &dyn FireForgetActivator<dyn Command> {
        &self.delegates
    }
}

/// Records domain events by name, and traced events by amount
///
/// An event named `fail` makes the synchronous handler return an error.
pub struct FakeDomainEventHandler {
    delegates: FireForgetManager<dyn DomainEvent>,
    seen: Arc<Mutex<Vec<String>>>,
    traced: Arc<Mutex<Vec<i32>>>,
    async_calls: Arc<AtomicUsize>,
}

impl FakeDomainEventHandler {
    pub fn new() -> Self {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let traced = Arc::new(Mutex::new(Vec::new()));
        let async_calls = counter();
        let delegates = FireForgetManager::<dyn DomainEvent>::new();
        {
            let seen = Arc::clone(&seen);
            delegates.register::<FakeDomainEvent, _>(move |event| {
                if event.name == "fail" {
                    return Err(anyhow::anyhow!("handler refused {}", event.name).into());
                }
                seen.lock().unwrap().push(event.name.clone());
                Ok(())
            });
        }
        {
            let seen = Arc::clone(&seen);
            delegates.register::<FakeCombinedEvent, _>(move |event| {
                seen.lock().unwrap().push(event.name.clone());
                Ok(())
            });
        }
        {
            let traced = Arc::clone(&traced);
            delegates.register::<FakeTracedEvent, _>(move |event| {
                traced.lock().unwrap().push(event.amount);
                Ok(())
            });
        }
        {
            let seen = Arc::clone(&seen);
            let calls = Arc::clone(&async_calls);
            delegates.register_async::<FakeDomainEvent, _, _>(
                move |event: Arc<FakeDomainEvent>, _| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    seen.lock().unwrap().push(event.name.clone());
                    async { Ok(()) }
                },
            );
        }
        {
            let calls = Arc::clone(&async_calls);
            delegates.register_async::<FakeCombinedEvent, _, _>(move |_, _| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(()) }
            });
        }
        Self {
            delegates,
            seen,
            traced,
            async_calls,
        }
    }

    pub fn seen(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.seen)
    }

    pub fn traced(&self) -> Arc<Mutex<Vec<i32>>> {
        Arc::clone(&self.traced)
    }

    pub fn async_calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.async_calls)
    }
}

impl DomainEventHandler for FakeDomainEventHandler {
    fn delegates(&self) -> &dyn FireForgetActivator<dyn DomainEvent> {
        &self.delegates
    }
}

/// Counts integration events, sync and async apart
pub struct FakeIntegrationEventHandler {
    delegates: FireForgetManager<dyn IntegrationEvent>,
    calls: Arc<AtomicUsize>,
    async_calls: Arc<AtomicUsize>,
}

impl FakeIntegrationEventHandler {
    pub fn new() -> Self {
        let (calls, async_calls) = (counter(), counter());
        let delegates = FireForgetManager::<dyn IntegrationEvent>::new();
        count_integration_events(&delegates, &calls, &async_calls);
        Self {
            delegates,
            calls,
            async_calls,
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    pub fn async_calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.async_calls)
    }
}

fn count_integration_events(
    delegates: &FireForgetManager<dyn IntegrationEvent>,
    calls: &Arc<AtomicUsize>,
    async_calls: &Arc<AtomicUsize>,
) {
    fn counting<T: IntegrationEvent>(
        delegates: &FireForgetManager<dyn IntegrationEvent>,
        calls: &Arc<AtomicUsize>,
        async_calls: &Arc<AtomicUsize>,
    ) {
        let (sync_seen, async_seen) = (Arc::clone(calls), Arc::clone(async_calls));
        delegates
            .register::<T, _>(move |_| {
                sync_seen.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .register_async::<T, _, _>(move |_, _| {
                async_seen.fetch_add(1, Ordering::SeqCst);
                async { Ok(()) }
            });
    }

    counting::<FakeIntegrationEvent>(delegates, calls, async_calls);
    counting::<FakeCombinedEvent>(delegates, calls, async_calls);
}

impl IntegrationEventHandler for FakeIntegrationEventHandler {
    fn delegates(&self) -> &dyn FireForgetActivator<dyn IntegrationEvent> {
        &self.delegates
    }
}

/// Answers [`FakeQuery`] with `"{prefix}: {name}"`
pub struct FakeQueryHandler {
    delegates: RequestReplyManager<dyn AnyQuery>,
    calls: Arc<AtomicUsize>,
    async_calls: Arc<AtomicUsize>,
}

impl FakeQueryHandler {
    pub fn answering(prefix: &str) -> Self {
        let (calls, async_calls) = (counter(), counter());
        let (sync_seen, async_seen) = (Arc::clone(&calls), Arc::clone(&async_calls));
        let (sync_prefix, async_prefix) = (prefix.to_string(), prefix.to_string());
        let delegates = HandlerFactory::create_request_reply::<dyn AnyQuery>(move |registry| {
            registry
                .register::<FakeQuery, String, _>(move |query| {
                    sync_seen.fetch_add(1, Ordering::SeqCst);
                    Ok(format!("{sync_prefix}: {}", query.name))
                })
                .register_async::<FakeQuery, String, _, _>(move |query: Arc<FakeQuery>, _| {
                    async_seen.fetch_add(1, Ordering::SeqCst);
                    let reply = format!("{async_prefix}: {}", query.name);
                    async move { Ok(reply) }
                });
        });
        Self {
            delegates,
            calls,
            async_calls,
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    pub fn async_calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.async_calls)
    }
}

impl QueryHandler for FakeQueryHandler {
    fn delegates(&self) -> &dyn RequestReplyActivator<dyn AnyQuery> {
        &self.delegates
    }
}
