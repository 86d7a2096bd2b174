pub mod api;
pub mod bootstrap;
pub mod error;
pub mod server;

pub use bootstrap::{build_api_server, build_api_server_from_env, build_state};
pub use error::{ApiError, ApiResult};
pub use server::{ApiServer, AppState};
