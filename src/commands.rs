// Copyright 2025 Cowboy AI, LLC.

//! Commands: requests to change state, handled without a reply

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::dispatchers::FireForgetDispatcher;
use crate::errors::DispatchResult;
use crate::handlers::FireForgetActivator;
use crate::request::{Request, Upcast};
use crate::services::ServiceLocator;

/// A request to change state
pub trait Command: Request {}

impl<T: Command> Upcast<dyn Command> for T {
    fn upcast(&self) -> &dyn Command {
        self
    }

    fn upcast_arc(self: Arc<Self>) -> Arc<dyn Command> {
        self
    }
}

/// Contract of services that handle commands
///
/// ```
/// use cim_mediator::{
///     Command, CommandHandler, FireForgetActivator, FireForgetManager, FireForgetRegistry,
///     HandlerFactory, MetadataDictionary,
/// };
///
/// #[derive(Debug)]
/// struct OpenAccount {
///     metadata: MetadataDictionary,
/// }
/// cim_mediator::impl_metadata!(OpenAccount);
/// impl Command for OpenAccount {}
///
/// struct AccountCommandHandler {
///     delegates: FireForgetManager<dyn Command>,
/// }
///
/// impl AccountCommandHandler {
///     fn new() -> Self {
///         let delegates = HandlerFactory::create_fire_forget::<dyn Command>(|registry| {
///             registry.register::<OpenAccount, _>(|_| Ok(()));
///         });
///         Self { delegates }
///     }
/// }
///
/// impl CommandHandler for AccountCommandHandler {
///     fn delegates(&self) -> &dyn FireForgetActivator<dyn Command> {
///         &self.delegates
///     }
/// }
/// ```
pub trait CommandHandler: Send + Sync {
    /// The handler's command table
    fn delegates(&self) -> &dyn FireForgetActivator<dyn Command>;
}

/// Commits commands to every [`CommandHandler`] that accepts them
#[derive(Debug, Clone)]
pub struct CommandDispatcher {
    dispatcher: FireForgetDispatcher,
}

impl CommandDispatcher {
    /// Create a dispatcher over a service locator
    pub fn new(locator: Arc<dyn ServiceLocator>) -> Self {
        Self {
            dispatcher: FireForgetDispatcher::new(locator),
        }
    }

    /// Deliver `command` to its handlers
    pub fn commit(&self, command: &dyn Command) -> DispatchResult<()> {
        self.dispatcher
            .dispatch::<dyn CommandHandler, dyn Command>(command, |handler| handler.delegates())
    }

    /// Deliver `command` to its asynchronous handlers
    pub async fn commit_async(
        &self,
        command: Arc<dyn Command>,
        token: &CancellationToken,
    ) -> DispatchResult<()> {
        self.dispatcher
            .dispatch_async::<dyn CommandHandler, dyn Command>(command, token, |handler| {
                handler.delegates()
            })
            .await
    }
}
