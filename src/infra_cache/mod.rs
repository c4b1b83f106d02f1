mod token_store_cache;

pub use token_store_cache::*;
