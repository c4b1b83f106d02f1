// store

mod sync_store;
mod token_store;

pub use sync_store::*;
pub use token_store::*;
