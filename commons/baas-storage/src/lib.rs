pub mod error;
pub mod factory;
pub mod matcher;
pub mod traits;

#[cfg(feature = "memory")]
pub mod memory;

pub use error::*;
pub use factory::*;
pub use traits::*;
