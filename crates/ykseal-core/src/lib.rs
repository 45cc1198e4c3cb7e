pub mod config;
pub mod error;
pub mod types;

pub use error::{SealError, SealResult};
pub use types::{Algorithm, KeySlot};
