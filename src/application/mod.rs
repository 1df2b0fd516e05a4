// Application layer: use cases over the store, and the in-memory state a client works against.

pub mod error;
pub mod service;
pub mod session;

pub use error::*;
pub use service::*;
pub use session::*;
