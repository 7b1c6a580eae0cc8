// Copyright 2025 Cowboy AI, LLC.

//! Queries: requests answered with a typed reply

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::dispatchers::RequestReplyDispatcher;
use crate::errors::DispatchResult;
use crate::handlers::RequestReplyActivator;
use crate::request::{Request, Upcast};
use crate::services::ServiceLocator;

/// A request for data
///
/// `Output` is the reply a handler must produce. Registering a handler for
/// the query with any other reply type makes the query fail with
/// [`DispatchError::ResultTypeMismatch`](crate::DispatchError::ResultTypeMismatch).
pub trait Query: Request {
    /// Reply type
    type Output: Send + 'static;
}

/// The query kind with its reply type erased, as stored in handler tables
pub trait AnyQuery: Request {}

impl<Q: Query> AnyQuery for Q {}

impl<Q: Query> Upcast<dyn AnyQuery> for Q {
    fn upcast(&self) -> &dyn AnyQuery {
        self
    }

    fn upcast_arc(self: Arc<Self>) -> Arc<dyn AnyQuery> {
        self
    }
}

/// Contract of services that answer queries
pub trait QueryHandler: Send + Sync {
    /// The handler's query table
    fn delegates(&self) -> &dyn RequestReplyActivator<dyn AnyQuery>;
}

/// Asks [`QueryHandler`]s for a reply, stopping at the first one that answers
#[derive(Debug, Clone)]
pub struct QueryDispatcher {
    dispatcher: RequestReplyDispatcher,
}

impl QueryDispatcher {
    /// Create a dispatcher over a service locator
    pub fn new(locator: Arc<dyn ServiceLocator>) -> Self {
        Self {
            dispatcher: RequestReplyDispatcher::new(locator),
        }
    }

    /// Reply of the first handler answering `query`
    pub fn query<Q: Query>(&self, query: &Q) -> DispatchResult<Q::Output> {
        self.dispatcher
            .dispatch::<dyn QueryHandler, dyn AnyQuery, Q::Output>(
                query as &dyn AnyQuery,
                |handler| handler.delegates(),
            )
    }

    /// Reply of the first asynchronous handler answering `query`
    pub async fn query_async<Q: Query>(
        &self,
        query: Arc<Q>,
        token: &CancellationToken,
    ) -> DispatchResult<Q::Output> {
        self.dispatcher
            .dispatch_async::<dyn QueryHandler, dyn AnyQuery, Q::Output>(
                query as Arc<dyn AnyQuery>,
                token,
                |handler| handler.delegates(),
            )
            .await
    }
}
