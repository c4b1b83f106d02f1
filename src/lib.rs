pub mod logger;
pub mod settings;

pub mod server;

pub mod application_port;
pub mod domain;
pub mod domain_model;
pub mod domain_port;
pub mod infra_cache;
pub mod infra_redis;
pub mod infra_sqlite;
pub mod scope;
