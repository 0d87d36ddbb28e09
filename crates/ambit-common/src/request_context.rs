use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// A pending asynchronous operation handed to [`WaitUntil`].
pub type PendingWork = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Deferred-work registration callback.
///
/// Calling it schedules the given work to run to completion without blocking
/// the caller. Clones share the same callback.
#[derive(Clone)]
pub struct WaitUntil(Arc<dyn Fn(PendingWork) + Send + Sync>);

impl WaitUntil {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(PendingWork) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Register an already boxed operation.
    pub fn register(&self, work: PendingWork) {
        (self.0)(work)
    }

    pub fn call<Fut>(&self, fut: Fut)
    where
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.register(Box::pin(fut))
    }
}

impl PartialEq for WaitUntil {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for WaitUntil {}

impl std::fmt::Debug for WaitUntil {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("WaitUntil")
            .field(&Arc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}

/// Per-request value made available by the hosting platform.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuiltinRequestContextValue {
    pub wait_until: Option<WaitUntil>,
}

impl BuiltinRequestContextValue {
    pub fn with_wait_until(wait_until: WaitUntil) -> Self {
        Self {
            wait_until: Some(wait_until),
        }
    }
}

/// A request context provided by the platform.
pub trait BuiltinRequestContext: Send + Sync {
    fn get(&self) -> Option<BuiltinRequestContextValue>;
}

impl<F> BuiltinRequestContext for F
where
    F: Fn() -> Option<BuiltinRequestContextValue> + Send + Sync,
{
    fn get(&self) -> Option<BuiltinRequestContextValue> {
        self()
    }
}

/// A request context that can also activate a value for a dynamic extent.
pub trait RunnableBuiltinRequestContext: BuiltinRequestContext {
    fn run<R, F>(&self, value: BuiltinRequestContextValue, f: F) -> R
    where
        F: FnOnce() -> R;
}
