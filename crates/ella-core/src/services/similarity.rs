use crate::domain::entity::Seed;
use crate::ports::transport::QueryParams;

/// Opciones de una consulta de similitud.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimilarityQuery {
  /// Máximo de resultados; `None` usa `ClientConfig::similar_tracks_limit`.
  pub limit: Option<u32>,

  /// Cláusulas de filtro, unidas con `AND`.
  pub filters: Vec<String>,

  /// Semillas extra, además de la propia entidad.
  pub seeds: Vec<Seed>,

  /// Puntuación mínima; el primer resultado por debajo corta la lista.
  pub threshold: Option<f64>,

  pub similarity_type: Option<String>,
}

/// Parámetros de una consulta de similitud a partir de `origin`.
///
/// `origin` siempre va primero en `seeds`.
pub fn similarity_params(
  origin: &Seed,
  query: &SimilarityQuery,
  fetch_fields: &[&str],
  default_limit: u32,
) -> QueryParams {
  let mut params = QueryParams::new();
  params.insert("limit".to_string(), query.limit.unwrap_or(default_limit).to_string());
  params.insert("fetch_metadata".to_string(), fetch_fields.join(","));

  if !query.filters.is_empty() {
    params.insert("filter".to_string(), query.filters.join(" AND "));
  }

  let seeds: Vec<String> = std::iter::once(origin).chain(&query.seeds).map(Seed::to_string).collect();
  params.insert("seeds".to_string(), seeds.join(","));

  if let Some(similarity_type) = &query.similarity_type {
    params.insert("similarity_type".to_string(), similarity_type.clone());
  }

  params
}
