//! Port traits decoupling the domain from storage and configuration.

pub mod config_port;
pub mod store_port;

pub use config_port::ConfigPort;
pub use store_port::StorePort;
