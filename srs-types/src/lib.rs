pub mod error;
pub mod site;

pub use error::*;
pub use site::*;
