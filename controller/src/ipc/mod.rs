//! Line-oriented s-expression message protocol.

pub mod codec;
pub mod dispatch;

pub use dispatch::handle_message;
