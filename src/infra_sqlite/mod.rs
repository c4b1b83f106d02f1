mod sync_store_sqlite;
mod token_store_sqlite;

pub use sync_store_sqlite::*;
pub use token_store_sqlite::*;
