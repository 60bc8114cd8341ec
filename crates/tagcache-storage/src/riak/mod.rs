//! Riak store gateway (HTTP interface)

mod config;
mod gateway;
mod headers;

pub use config::RiakConfig;
pub use gateway::RiakGateway;
