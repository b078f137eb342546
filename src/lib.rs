pub mod config;
pub mod dispatch;
pub mod error;
pub mod feed;
pub mod kernel;

// Re-export specific items if needed for convenient access
pub use error::{TriageError, TriageResult};
pub use kernel::reactor::Reactor;
