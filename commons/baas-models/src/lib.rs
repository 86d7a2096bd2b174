pub mod auth;
pub mod object;
pub mod query;
pub mod response;

pub use auth::*;
pub use object::*;
pub use query::*;
pub use response::*;
