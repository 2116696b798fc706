//! Request handlers for conversation operations.

mod conversations;

pub use conversations::*;
