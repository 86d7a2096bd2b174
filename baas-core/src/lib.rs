pub mod adapters;
pub mod analytics;
pub mod config;
pub mod error;
pub mod executor;
pub mod files;
pub mod functions;
pub mod id;
pub mod livequery;
pub mod push;
pub mod rest;
pub mod triggers;

pub use adapters::Adapters;
pub use config::AppConfig;
pub use error::{BaasError, BaasResult};
pub use functions::FunctionRegistry;
pub use livequery::{LiveQueryRegistry, LiveQueryServer, NoLiveQuery};
pub use push::{PushDispatcher, PushState, PushStatus};
pub use rest::AccessPipeline;
pub use triggers::{TriggerRegistry, TriggerRequest, TriggerResponse, TriggerType};
