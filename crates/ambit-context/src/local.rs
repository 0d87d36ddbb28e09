use std::future::Future;

use ambit_common::{BuiltinRequestContext, BuiltinRequestContextValue, RunnableBuiltinRequestContext};
use tokio::task::JoinHandle;

use crate::storage::{self, AsyncLocalStorage};

/// Request context provider kept in-process rather than supplied by the platform.
#[derive(Debug, Clone, Default)]
pub struct LocalRequestContext {
    storage: AsyncLocalStorage<BuiltinRequestContextValue>,
}

pub fn create_local_request_context() -> LocalRequestContext {
    LocalRequestContext {
        storage: AsyncLocalStorage::new(),
    }
}

impl LocalRequestContext {
    pub fn run_async<F>(
        &self,
        value: BuiltinRequestContextValue,
        fut: F,
    ) -> impl Future<Output = F::Output>
    where
        F: Future,
    {
        self.storage.run_async(value, fut)
    }

    /// Spawn onto tokio, keeping the caller's active request context.
    ///
    /// Values of every [`AsyncLocalStorage`] active in the caller are carried
    /// over, not only this context's; this is [`storage::spawn`].
    pub fn spawn<F>(&self, fut: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        storage::spawn(fut)
    }
}

impl BuiltinRequestContext for LocalRequestContext {
    fn get(&self) -> Option<BuiltinRequestContextValue> {
        self.storage.get_store()
    }
}

impl RunnableBuiltinRequestContext for LocalRequestContext {
    fn run<R, F>(&self, value: BuiltinRequestContextValue, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        self.storage.run(value, f)
    }
}
