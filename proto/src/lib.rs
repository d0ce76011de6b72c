pub mod data;
pub mod error;
pub mod id;
pub mod table;

pub use data::*;
pub use error::*;
pub use id::*;
pub use table::*;
