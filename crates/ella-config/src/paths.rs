use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
  #[error("toml error: {0}")]
  Toml(#[from] toml::de::Error),
  #[error("directories error: could not determine home directory")]
  Directories,
  #[error("other: {0}")]
  Other(String),
}

/// Directorios del cliente.
///
/// `ELLA_BASE_DIR` fuerza una instalación portable bajo esa ruta; si no,
/// se usan los directorios del sistema.
#[derive(Debug, Clone)]
pub struct EllaPaths {
  pub base_dir: PathBuf,
  pub config_dir: PathBuf,
}

impl EllaPaths {
  pub fn new() -> Result<Self, ConfigError> {
    if let Ok(env_base) = std::env::var("ELLA_BASE_DIR") {
      return Self::at(env_base);
    }

    let proj_dirs = ProjectDirs::from("com", "ella", "ella").ok_or(ConfigError::Directories)?;
    let paths = Self {
      base_dir: proj_dirs.config_dir().to_path_buf(),
      config_dir: proj_dirs.config_dir().to_path_buf(),
    };
    paths.ensure_dirs()?;

    Ok(paths)
  }

  /// Estructura portable bajo `base`: `config/`.
  pub fn at(base: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let base = base.as_ref();
    let paths = Self {
      base_dir: base.to_path_buf(),
      config_dir: base.join("config"),
    };
    paths.ensure_dirs()?;

    Ok(paths)
  }

  pub fn config_file(&self) -> PathBuf {
    self.config_dir.join("ella.toml")
  }

  fn ensure_dirs(&self) -> Result<(), ConfigError> {
    std::fs::create_dir_all(&self.config_dir)?;
    Ok(())
  }
}
