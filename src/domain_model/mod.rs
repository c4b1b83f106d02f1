mod claims;
mod keys;
mod message;
mod token_kind;

pub use claims::*;
pub use keys::*;
pub use message::*;
pub use token_kind::*;
