// Copyright 2025 Cowboy AI, LLC.

//! # CIM Mediator
//!
//! Routes commands, domain events, integration events and queries to the
//! handlers registered for their exact type, without the producer knowing
//! who handles them.
//!
//! - **Requests**: every request carries a [`MetadataDictionary`] and is
//!   dispatched by its exact runtime type, never by a supertype
//! - **Handler tables**: [`FireForgetManager`] and [`RequestReplyManager`]
//!   map request types to sync and async callbacks, first registration wins
//! - **Dispatchers**: resolve every instance of a handler contract from a
//!   [`ServiceLocator`] and invoke the tables; fire-and-forget fans out,
//!   request-reply stops at the first answer
//! - **Mediator**: one entry point for every request kind
//! - **Aggregates**: buffer domain events and flush them through
//!   [`DomainEventPublisherExt::raise_many`]
//!
//! ## Example
//!
//! ```
//! use cim_mediator::{
//!     Command, CommandHandler, FireForgetActivator, FireForgetManager, FireForgetRegistry,
//!     HandlerServices, Mediator, MetadataDictionary,
//! };
//! use std::sync::Arc;
//!
//! #[derive(Debug)]
//! struct OpenAccount {
//!     metadata: MetadataDictionary,
//!     owner: String,
//! }
//! cim_mediator::impl_metadata!(OpenAccount);
//! impl Command for OpenAccount {}
//!
//! struct Accounts {
//!     delegates: FireForgetManager<dyn Command>,
//! }
//!
//! impl CommandHandler for Accounts {
//!     fn delegates(&self) -> &dyn FireForgetActivator<dyn Command> {
//!         &self.delegates
//!     }
//! }
//!
//! let accounts = Accounts { delegates: FireForgetManager::new() };
//! accounts.delegates.register::<OpenAccount, _>(|command| {
//!     assert_eq!(command.owner, "ada");
//!     Ok(())
//! });
//!
//! let services = HandlerServices::builder().add_command_handler(accounts).build();
//! let mediator = Mediator::new(Arc::new(services));
//!
//! mediator
//!     .commit(&OpenAccount {
//!         metadata: MetadataDictionary::for_request(),
//!         owner: "ada".to_string(),
//!     })
//!     .unwrap();
//! ```

#![warn(missing_docs)]

mod commands;
mod conditional;
pub mod dispatchers;
pub mod domain;
mod errors;
pub mod handlers;
pub mod integration;
mod mediator;
pub mod metadata;
mod queries;
mod request;
pub mod services;

#[cfg(test)]
pub(crate) mod fakes;

pub use commands::{Command, CommandDispatcher, CommandHandler};
pub use conditional::ConditionalValue;
pub use dispatchers::{Dispatcher, FireForgetDispatcher, RequestReplyDispatcher};
pub use domain::{
    Aggregate, AggregateRoot, AsDomainEvent, BufferedEvent, DomainEvent, DomainEventDispatcher,
    DomainEventHandler, DomainEventPublisher, DomainEventPublisherExt, Event, TracedAggregate,
    TracedDomainEvent,
};
pub use errors::{short_type_name, DispatchError, DispatchResult};
pub use handlers::{
    FireForgetActivator, FireForgetManager, FireForgetRegistry, HandlerFactory, Reply, ReplyType,
    RequestReplyActivator, RequestReplyActivatorExt, RequestReplyManager, RequestReplyRegistry,
};
pub use integration::{IntegrationEvent, IntegrationEventDispatcher, IntegrationEventHandler};
pub use mediator::{Mediator, MediatorOptions};
pub use metadata::{MetadataDictionary, MetadataExt, MetadataFactory, MetadataValue};
pub use queries::{AnyQuery, Query, QueryDispatcher, QueryHandler};
pub use request::{request_type_id, AsAny, Metadata, Request, Upcast};
pub use services::{
    HandlerServices, HandlerServicesBuilder, HandlerServicesDescriptor, Service, ServiceLocator,
};

// Re-exported so applications can name the token without another dependency
pub use tokio_util::sync::CancellationToken;
