mod port;
pub use port::*;

mod bus_fake;
mod consumer_impl;
mod publisher_impl;

pub use bus_fake::*;
pub use consumer_impl::*;
pub use publisher_impl::*;

mod authority;
mod replica;
mod sync_service;

pub use authority::*;
pub use replica::*;
pub use sync_service::*;
