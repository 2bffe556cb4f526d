use serde::{Deserialize, Serialize};

/// Valores por defecto del cliente (sección `[client]` de `ella.toml`).
///
/// Se pasa explícitamente a cada entidad al construirla, en lugar de vivir en
/// constantes globales del proceso.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
  /// Máximo de pistas pedidas en una consulta de similitud.
  pub similar_tracks_limit: u32,

  /// Límite para búsquedas de texto (`search` / `match`).
  pub search_limit: u32,

  /// Límite para búsquedas difusas.
  pub fuzzy_limit: u32,

  /// Límite para `resolve`.
  pub resolve_limit: u32,

  /// Puntuación mínima que sobrevive a una búsqueda difusa.
  ///
  /// Es independiente del umbral que pase quien llama.
  pub fuzzy_min_score: f64,
}

impl Default for ClientConfig {
  fn default() -> Self {
    Self {
      similar_tracks_limit: 20,
      search_limit: 10,
      fuzzy_limit: 30,
      resolve_limit: 100,
      fuzzy_min_score: 0.4,
    }
  }
}
