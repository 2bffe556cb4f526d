pub mod config;
pub mod decode;
pub mod domain;
pub mod errors;
pub mod ports;
pub mod services;

pub use config::ClientConfig;
pub use errors::CoreError;
