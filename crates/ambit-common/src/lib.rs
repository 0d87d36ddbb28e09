pub mod config;
pub mod request_context;

pub use config::ContextConfig;
pub use request_context::{
    BuiltinRequestContext, BuiltinRequestContextValue, PendingWork, RunnableBuiltinRequestContext,
    WaitUntil,
};

pub mod telemetry;
