// Copyright 2025 Cowboy AI, LLC.

//! Handler services and the locator dispatchers resolve them from
//!
//! Handlers are wired explicitly at start-up: the application adds every
//! handler instance to a [`HandlerServicesBuilder`] under the contract it
//! fulfils, and the resulting [`HandlerServices`] answers the dispatchers'
//! "every instance of contract X" lookups. Any other container can take its
//! place by implementing [`ServiceLocator`].

use indexmap::IndexMap;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

use crate::commands::CommandHandler;
use crate::domain::DomainEventHandler;
use crate::errors::short_type_name;
use crate::integration::IntegrationEventHandler;
use crate::queries::QueryHandler;

/// A resolved service instance
///
/// For a contract `H` each element wraps an `Arc<H>`, for example an
/// `Arc<dyn CommandHandler>`.
pub type Service = Arc<dyn Any + Send + Sync>;

/// Resolves every instance of a handler contract
pub trait ServiceLocator: Send + Sync {
    /// Instances registered for the contract with type id `contract`, in a
    /// stable order
    fn resolve(&self, contract: TypeId) -> Vec<Service>;

    /// Summary of the registered handlers, when the locator keeps one
    fn descriptor(&self) -> Option<HandlerServicesDescriptor> {
        None
    }
}

impl<F> ServiceLocator for F
where
    F: Fn(TypeId) -> Vec<Service> + Send + Sync,
{
    fn resolve(&self, contract: TypeId) -> Vec<Service> {
        self(contract)
    }
}

/// A handler and the request types its table covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerDescriptor {
    /// Fully qualified handler type name
    pub handler: &'static str,
    /// Fully qualified names of the handled request types
    pub requests: Vec<&'static str>,
}

impl HandlerDescriptor {
    fn module(&self) -> &'static str {
        let path = self.handler.split('<').next().unwrap_or(self.handler);
        path.rsplit_once("::").map_or("", |(module, _)| module)
    }
}

/// Handlers registered under one contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractDescriptor {
    /// Contract type name, such as `dyn CommandHandler`
    pub contract: &'static str,
    /// Name of the request kind the contract handles
    pub request_kind: &'static str,
    /// Handlers in registration order
    pub handlers: Vec<HandlerDescriptor>,
}

impl ContractDescriptor {
    /// Total number of request types covered by all handlers
    pub fn method_count(&self) -> usize {
        self.handlers.iter().map(|h| h.requests.len()).sum()
    }
}

/// Summary of the handlers known to a [`HandlerServices`]
///
/// The `Display` form is a human readable report, grouped by contract and
/// then by the module each handler lives in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandlerServicesDescriptor {
    contracts: Vec<ContractDescriptor>,
}

impl HandlerServicesDescriptor {
    /// Contracts with at least one handler, ordered by contract name
    pub fn contracts(&self) -> &[ContractDescriptor] {
        &self.contracts
    }
}

impl fmt::Display for HandlerServicesDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for contract in &self.contracts {
            let header = format!(
                "Discovered {} {} implementation(s) covering a total of {} {} method(s)",
                contract.handlers.len(),
                short_type_name(contract.contract),
                contract.method_count(),
                contract.request_kind,
            );
            writeln!(f, "{header}")?;

            let mut modules: IndexMap<&str, Vec<&HandlerDescriptor>> = IndexMap::new();
            for handler in &contract.handlers {
                modules.entry(handler.module()).or_default().push(handler);
            }
            for (module, handlers) in modules {
                writeln!(f)?;
                writeln!(f, "Module: {module}")?;
                writeln!(f)?;
                for handler in handlers {
                    writeln!(f, "<{}>", short_type_name(handler.handler))?;
                    let mut requests: Vec<&str> =
                        handler.requests.iter().map(|r| short_type_name(r)).collect();
                    requests.sort_by_key(|r| r.to_lowercase());
                    for request in requests {
                        writeln!(f, "\t*{request}")?;
                    }
                    writeln!(f)?;
                }
            }
            writeln!(f, "{}", "-".repeat(header.len()))?;
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Handler instances keyed by the contract they fulfil
#[derive(Default)]
pub struct HandlerServices {
    services: HashMap<TypeId, Vec<Service>>,
    descriptor: HandlerServicesDescriptor,
}

impl HandlerServices {
    /// Start an explicit registration
    pub fn builder() -> HandlerServicesBuilder {
        HandlerServicesBuilder::default()
    }

    /// Summary of the registered handlers
    pub fn descriptor(&self) -> &HandlerServicesDescriptor {
        &self.descriptor
    }
}

impl ServiceLocator for HandlerServices {
    fn resolve(&self, contract: TypeId) -> Vec<Service> {
        self.services.get(&contract).cloned().unwrap_or_default()
    }

    fn descriptor(&self) -> Option<HandlerServicesDescriptor> {
        Some(self.descriptor.clone())
    }
}

impl fmt::Debug for HandlerServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerServices")
            .field("contracts", &self.services.len())
            .field("descriptor", &self.descriptor)
            .finish()
    }
}

/// Builder for [`HandlerServices`]
#[derive(Default)]
pub struct HandlerServicesBuilder {
    services: HashMap<TypeId, Vec<Service>>,
    contracts: IndexMap<&'static str, ContractDescriptor>,
}

impl HandlerServicesBuilder {
    /// Add a command handler
    pub fn add_command_handler<H: CommandHandler + 'static>(self, handler: H) -> Self {
        let requests = handler.delegates().registered_types();
        let service: Arc<dyn CommandHandler> = Arc::new(handler);
        self.add_handler::<dyn CommandHandler, H>(service, "Command", requests)
    }

    /// Add a domain event handler
    pub fn add_domain_event_handler<H: DomainEventHandler + 'static>(self, handler: H) -> Self {
        let requests = handler.delegates().registered_types();
        let service: Arc<dyn DomainEventHandler> = Arc::new(handler);
        self.add_handler::<dyn DomainEventHandler, H>(service, "DomainEvent", requests)
    }

    /// Add an integration event handler
    pub fn add_integration_event_handler<H: IntegrationEventHandler + 'static>(
        self,
        handler: H,
    ) -> Self {
        let requests = handler.delegates().registered_types();
        let service: Arc<dyn IntegrationEventHandler> = Arc::new(handler);
        self.add_handler::<dyn IntegrationEventHandler, H>(service, "IntegrationEvent", requests)
    }

    /// Add a query handler
    pub fn add_query_handler<H: QueryHandler + 'static>(self, handler: H) -> Self {
        let requests = handler.delegates().registered_types();
        let service: Arc<dyn QueryHandler> = Arc::new(handler);
        self.add_handler::<dyn QueryHandler, H>(service, "Query", requests)
    }

    /// Add an instance under any contract `C`
    ///
    /// Use this for contracts beyond the four built-in handler kinds. The
    /// instance is resolvable but does not appear in the descriptor.
    pub fn add_service<C: ?Sized + Send + Sync + 'static>(mut self, service: Arc<C>) -> Self {
        trace!(contract = std::any::type_name::<C>(), "added service");
        self.services
            .entry(TypeId::of::<C>())
            .or_default()
            .push(Arc::new(service));
        self
    }

    fn add_handler<C, H>(
        mut self,
        service: Arc<C>,
        request_kind: &'static str,
        requests: Vec<&'static str>,
    ) -> Self
    where
        C: ?Sized + Send + Sync + 'static,
        H: 'static,
    {
        let contract = std::any::type_name::<C>();
        trace!(
            contract,
            handler = std::any::type_name::<H>(),
            requests = requests.len(),
            "added handler"
        );
        self.contracts
            .entry(contract)
            .or_insert_with(|| ContractDescriptor {
                contract,
                request_kind,
                handlers: Vec::new(),
            })
            .handlers
            .push(HandlerDescriptor {
                handler: std::any::type_name::<H>(),
                requests,
            });
        self.add_service(service)
    }

    /// Finish the registration
    pub fn build(self) -> HandlerServices {
        let mut contracts: Vec<ContractDescriptor> = self.contracts.into_values().collect();
        contracts.sort_by_key(|c| short_type_name(c.contract));
        HandlerServices {
            services: self.services,
            descriptor: HandlerServicesDescriptor { contracts },
        }
    }
}
