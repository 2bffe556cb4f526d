use ella_config::{ConfigError, TomlConfigBackend};
use serde::{Deserialize, Serialize};

pub const HTTP_SECTION: &str = "http";

/// Sección `[http]` de `ella.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
  /// Raíz del servicio, sin `/` final.
  pub base_url: String,
  pub connect_timeout_secs: u64,
  pub read_timeout_secs: u64,
  pub user_agent: String,
}

impl Default for HttpConfig {
  fn default() -> Self {
    Self {
      base_url: "http://localhost:8080".to_string(),
      connect_timeout_secs: 5,
      read_timeout_secs: 15,
      user_agent: concat!("ella-http/", env!("CARGO_PKG_VERSION")).to_string(),
    }
  }
}

pub fn load_http_config(backend: &TomlConfigBackend) -> Result<HttpConfig, ConfigError> {
  backend.load_section_with_default(HTTP_SECTION)
}
