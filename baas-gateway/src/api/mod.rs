pub mod extractors;
pub mod handlers;
pub mod middleware;

pub use extractors::*;
pub use middleware::*;
