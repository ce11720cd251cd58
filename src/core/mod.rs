pub mod models;
pub mod types;
pub mod wire;

pub use models::*;
pub use types::*;
