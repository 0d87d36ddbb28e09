pub mod deferred;
pub mod error;
pub mod local;
pub mod lookup;
pub mod slots;
pub mod storage;

pub use deferred::DeferredWork;
pub use error::ContextError;
pub use local::{create_local_request_context, LocalRequestContext};
pub use lookup::{get_builtin_request_context, get_builtin_request_context_from};
pub use slots::{AmbientSlots, SlotKey};
pub use storage::AsyncLocalStorage;

pub use ambit_common::{
    BuiltinRequestContext, BuiltinRequestContextValue, RunnableBuiltinRequestContext, WaitUntil,
};
