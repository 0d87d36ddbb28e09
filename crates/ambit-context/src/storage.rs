//! Async-propagating local storage on top of tokio task-locals.
//!
//! Every task carries one immutable snapshot mapping storage ids to values.
//! Activating a value clones the snapshot with one entry replaced and scopes
//! the copy, so nested activations shadow outer ones and are undone when the
//! scope ends. Task-locals do not cross `tokio::spawn` on their own; [`spawn`]
//! and [`propagate`] carry the caller's snapshot over the boundary.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;

type Snapshot = Arc<HashMap<u64, Arc<dyn Any + Send + Sync>>>;

tokio::task_local! {
    static CURRENT: Snapshot;
}

static NEXT_STORAGE_ID: AtomicU64 = AtomicU64::new(1);

fn current_snapshot() -> Snapshot {
    CURRENT.try_with(Arc::clone).unwrap_or_default()
}

fn enter<T>(id: u64, value: T) -> Snapshot
where
    T: Send + Sync + 'static,
{
    let mut next = (*current_snapshot()).clone();
    next.insert(id, Arc::new(value));
    Arc::new(next)
}

// Entries in `top` win over entries in `base`.
fn overlay(base: Snapshot, top: &Snapshot) -> Snapshot {
    if top.is_empty() {
        return base;
    }
    if base.is_empty() {
        return Arc::clone(top);
    }
    let mut next = (*base).clone();
    next.extend(top.iter().map(|(id, v)| (*id, Arc::clone(v))));
    Arc::new(next)
}

pub struct AsyncLocalStorage<T> {
    id: u64,
    _marker: PhantomData<fn() -> T>,
}

impl<T> AsyncLocalStorage<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// A fresh storage. Values set through one instance are invisible to all others.
    pub fn new() -> Self {
        Self {
            id: NEXT_STORAGE_ID.fetch_add(1, Ordering::Relaxed),
            _marker: PhantomData,
        }
    }

    pub fn get_store(&self) -> Option<T> {
        CURRENT
            .try_with(|snapshot| {
                snapshot
                    .get(&self.id)
                    .and_then(|v| v.downcast_ref::<T>())
                    .cloned()
            })
            .ok()
            .flatten()
    }

    /// Run `f` with `value` active, restoring the previous state afterwards
    /// (also on unwind).
    pub fn run<R, F>(&self, value: T, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        CURRENT.sync_scope(enter(self.id, value), f)
    }

    /// Like [`run`](Self::run) for a future: `value` is active on every poll.
    /// The enclosing values are read on first poll, so an outer `run_async`
    /// wrapped around this future stays visible inside it.
    pub fn run_async<F>(&self, value: T, fut: F) -> impl Future<Output = F::Output>
    where
        F: Future,
    {
        let id = self.id;
        async move { CURRENT.scope(enter(id, value), fut).await }
    }
}

impl<T> Default for AsyncLocalStorage<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

// Clones are handles to the same storage.
impl<T> Clone for AsyncLocalStorage<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            _marker: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for AsyncLocalStorage<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncLocalStorage")
            .field("id", &self.id)
            .finish()
    }
}

/// Wrap `fut` so it runs with the caller's current values of every storage.
///
/// Values captured here are layered over whatever is active when the future
/// is first polled; storages the caller had no value for fall through.
pub fn propagate<F>(fut: F) -> impl Future<Output = F::Output>
where
    F: Future,
{
    let captured = current_snapshot();
    async move {
        let snapshot = overlay(current_snapshot(), &captured);
        CURRENT.scope(snapshot, fut).await
    }
}

/// `tokio::spawn` that carries the caller's current values into the new task.
pub fn spawn<F>(fut: F) -> JoinHandle<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    tokio::spawn(propagate(fut))
}
