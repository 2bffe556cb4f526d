//! Transporte HTTP para el núcleo de Ella.

pub mod config;
pub mod transport;

pub use config::{HttpConfig, load_http_config};
pub use transport::{HttpPager, HttpTransport};
