//! Type-keyed command dispatch.
//!
//! Each `(Request, Response)` pair has exactly one [`Handler`]. Endpoint shims
//! parse input, build a request value and hand it to [`Mediator::send`];
//! errors flow back untouched.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::Instrument;

use crate::context::RequestContext;
use crate::error::{AppError, AppResult};

/// Unit response for commands that return nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoResponse;

/// Handles one request type.
#[async_trait]
pub trait Handler<Req, Resp>: Send + Sync
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    /// Executes the request on behalf of the caller in `ctx`.
    async fn handle(&self, ctx: &RequestContext, request: Req) -> AppResult<Resp>;
}

type Slot = Box<dyn Any + Send + Sync>;

/// Collects handlers at startup.
#[derive(Default)]
pub struct MediatorBuilder {
    handlers: HashMap<TypeId, (Slot, &'static str)>,
}

impl MediatorBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `(Req, Resp)`.
    ///
    /// # Panics
    ///
    /// Panics if a handler for the same pair is already registered.
    pub fn register<Req, Resp, H>(&mut self, handler: H) -> &mut Self
    where
        Req: Send + 'static,
        Resp: Send + 'static,
        H: Handler<Req, Resp> + 'static,
    {
        let key = TypeId::of::<(Req, Resp)>();
        let handler: Arc<dyn Handler<Req, Resp>> = Arc::new(handler);
        let name = type_name::<H>();
        if let Some((_, existing)) = self.handlers.get(&key) {
            panic!(
                "duplicate handler for ({}, {}): {existing} already registered, {name} rejected",
                type_name::<Req>(),
                type_name::<Resp>(),
            );
        }
        self.handlers.insert(key, (Box::new(handler), name));
        self
    }

    /// Freezes the handler table.
    #[must_use]
    pub fn build(self) -> Mediator {
        Mediator {
            handlers: self.handlers,
        }
    }
}

/// Immutable dispatch table.
pub struct Mediator {
    handlers: HashMap<TypeId, (Slot, &'static str)>,
}

impl std::fmt::Debug for Mediator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.handlers.values().map(|(_, name)| *name).collect();
        names.sort_unstable();
        f.debug_struct("Mediator").field("handlers", &names).finish()
    }
}

impl Mediator {
    /// Dispatches `request` to its registered handler.
    ///
    /// The handler runs inside the request span carried by `ctx`.
    pub async fn send<Req, Resp>(&self, ctx: &RequestContext, request: Req) -> AppResult<Resp>
    where
        Req: Send + 'static,
        Resp: Send + 'static,
    {
        let handler = self
            .handlers
            .get(&TypeId::of::<(Req, Resp)>())
            .and_then(|(slot, _)| slot.downcast_ref::<Arc<dyn Handler<Req, Resp>>>())
            .cloned()
            .ok_or_else(|| {
                AppError::internal(format!(
                    "no handler registered for ({}, {})",
                    type_name::<Req>(),
                    type_name::<Resp>()
                ))
            })?;

        handler
            .handle(ctx, request)
            .instrument(ctx.span().clone())
            .await
    }

    /// Number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns true when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
