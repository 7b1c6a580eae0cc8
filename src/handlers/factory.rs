// Copyright 2025 Cowboy AI, LLC.

//! Builds handler tables from a registration closure

use super::{FireForgetManager, RequestReplyManager};

/// Creates handler tables, populated once and read-only afterwards
///
/// ```
/// use cim_mediator::{Command, FireForgetRegistry, HandlerFactory, MetadataDictionary};
///
/// #[derive(Debug, Default)]
/// struct Ping {
///     metadata: MetadataDictionary,
/// }
/// cim_mediator::impl_metadata!(Ping);
/// impl Command for Ping {}
///
/// let table = HandlerFactory::create_fire_forget::<dyn Command>(|registry| {
///     registry.register::<Ping, _>(|_| Ok(()));
/// });
/// ```
pub struct HandlerFactory;

impl HandlerFactory {
    /// Create a fire-and-forget table for request kind `R`
    pub fn create_fire_forget<R: ?Sized>(
        registrar: impl FnOnce(&FireForgetManager<R>),
    ) -> FireForgetManager<R> {
        let manager = FireForgetManager::new();
        registrar(&manager);
        manager
    }

    /// Create a request-reply table for request kind `R`
    pub fn create_request_reply<R: ?Sized>(
        registrar: impl FnOnce(&RequestReplyManager<R>),
    ) -> RequestReplyManager<R> {
        let manager = RequestReplyManager::new();
        registrar(&manager);
        manager
    }
}
