mod backend;
mod paths;

pub use backend::{ConfigBackend, TomlConfigBackend};
pub use paths::{ConfigError, EllaPaths};

use ella_core::ClientConfig;

pub const CLIENT_SECTION: &str = "client";

/// Backend sobre los directorios detectados (`ELLA_BASE_DIR` o sistema).
pub fn detect_backend() -> Result<TomlConfigBackend, ConfigError> {
  Ok(TomlConfigBackend::new(EllaPaths::new()?))
}

/// Sección `[client]`, con valores por defecto si falta.
pub fn load_client_config(backend: &TomlConfigBackend) -> Result<ClientConfig, ConfigError> {
  backend.load_section_with_default(CLIENT_SECTION)
}
