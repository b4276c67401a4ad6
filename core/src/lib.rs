pub mod db;
pub mod error;
pub mod insight;
pub mod model;
pub mod store;

pub use error::{EngineError, Result};
pub use store::Store;
