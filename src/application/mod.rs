// Application layer - use cases and orchestration on top of the ledger.

pub mod error;
pub mod service;

pub use error::*;
pub use service::*;
