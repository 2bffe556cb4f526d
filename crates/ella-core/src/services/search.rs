//! Búsqueda de pistas con paginación.
//!
//! [`SearchRequest`] describe qué se busca y es puro: de él salen la ruta y
//! los parámetros. [`TrackSearch`] abre un pager del transporte sobre esa
//! petición y decodifica cada página que se pide.

use std::rc::Rc;

use serde_json::Value;

use crate::config::ClientConfig;
use crate::decode::{DecodeContext, decode_scored};
use crate::domain::{Entity, Track};
use crate::domain::entity::TRACK_FIELDS;
use crate::errors::CoreError;
use crate::ports::transport::{Pager, QueryParams, Transport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMethod {
  /// Búsqueda de texto completo; ignora el umbral.
  Search,
  /// Coincidencia puntuada; respeta el umbral.
  Match,
}

impl SearchMethod {
  pub fn as_str(&self) -> &'static str {
    match self {
      SearchMethod::Search => "search",
      SearchMethod::Match => "match",
    }
  }
}

/// Qué se busca.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackQuery {
  Text {
    query: Option<String>,
    filters: Vec<String>,
    method: SearchMethod,
  },
  Fuzzy {
    query: String,
  },
  /// Localiza una pista concreta por artista y título.
  Resolve {
    artist: Option<String>,
    track: Option<String>,
  },
}

impl TrackQuery {
  pub fn text(query: impl Into<String>) -> Self {
    TrackQuery::Text { query: Some(query.into()), filters: Vec::new(), method: SearchMethod::Search }
  }

  pub fn fuzzy(query: impl Into<String>) -> Self {
    TrackQuery::Fuzzy { query: query.into() }
  }

  pub fn resolve(artist: impl Into<String>, track: impl Into<String>) -> Self {
    TrackQuery::Resolve { artist: Some(artist.into()), track: Some(track.into()) }
  }

  /// Método del servicio que atiende la consulta.
  pub fn method(&self) -> &'static str {
    match self {
      TrackQuery::Text { method, .. } => method.as_str(),
      TrackQuery::Fuzzy { .. } => "match",
      TrackQuery::Resolve { .. } => "resolve",
    }
  }

  fn honors_threshold(&self) -> bool {
    !matches!(self, TrackQuery::Text { method: SearchMethod::Search, .. })
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
  pub collection: String,
  pub query: TrackQuery,
  pub threshold: Option<f64>,
}

impl SearchRequest {
  pub fn new(collection: impl Into<String>, query: TrackQuery) -> Self {
    Self { collection: collection.into(), query, threshold: None }
  }

  pub fn with_threshold(mut self, threshold: f64) -> Self {
    self.threshold = Some(threshold);
    self
  }

  pub fn path(&self) -> String {
    format!("/collections/{}/tracks/{}.json", self.collection, self.query.method())
  }

  pub fn params(&self, config: &ClientConfig) -> QueryParams {
    let mut params = QueryParams::new();
    params.insert("fetch_metadata".to_string(), TRACK_FIELDS.join(","));

    match &self.query {
      TrackQuery::Text { query, filters, .. } => {
        params.insert("q".to_string(), text_query(query.as_deref(), filters));
        params.insert("limit".to_string(), config.search_limit.to_string());
      }
      TrackQuery::Fuzzy { query } => {
        params.insert("q".to_string(), query.clone());
        params.insert("fuzzy".to_string(), "true".to_string());
        params.insert("limit".to_string(), config.fuzzy_limit.to_string());
      }
      TrackQuery::Resolve { artist, track } => {
        if let Some(artist) = artist {
          params.insert("artist".to_string(), artist.clone());
        }
        if let Some(track) = track {
          params.insert("track".to_string(), track.clone());
        }
        params.insert("limit".to_string(), config.resolve_limit.to_string());
      }
    }

    params
  }

  /// Umbral efectivo: `search` no lo aplica.
  pub fn effective_threshold(&self) -> Option<f64> {
    if self.query.honors_threshold() { self.threshold } else { None }
  }
}

fn text_query(query: Option<&str>, filters: &[String]) -> String {
  let query = query.unwrap_or_default();
  if filters.is_empty() {
    return format!("trackartist:{query}");
  }

  let mut clauses = Vec::with_capacity(filters.len() + 1);
  if !query.is_empty() {
    clauses.push(query);
  }
  clauses.extend(filters.iter().map(String::as_str));
  clauses.join(" AND ")
}

/// Resultado paginado de una búsqueda de pistas.
///
/// El cursor lo guarda el `Pager` del transporte; aquí sólo se decodifica.
pub struct TrackSearch<'t> {
  pager: Box<dyn Pager + 't>,
  request: SearchRequest,
  config: Rc<ClientConfig>,
}

impl<'t> TrackSearch<'t> {
  /// Abre la búsqueda. No hace ninguna petición hasta pedir una página.
  pub fn open(transport: &'t dyn Transport, request: SearchRequest, config: Rc<ClientConfig>) -> Self {
    let pager = transport.pager(&request.path(), request.params(&config));
    tracing::debug!(path = %request.path(), method = request.query.method(), "opened track search");

    Self { pager, request, config }
  }

  pub fn request(&self) -> &SearchRequest {
    &self.request
  }

  /// Página `page`, contando desde 1. `0` y `1` son la misma página.
  pub fn get_page(&mut self, page: usize) -> Result<Option<Vec<Track>>, CoreError> {
    let index = page.saturating_sub(1);
    let results = self.pager.retrieve_page(index)?;
    Ok(results.map(|results| self.decode(&results)))
  }

  pub fn get_next_page(&mut self) -> Result<Option<Vec<Track>>, CoreError> {
    let results = self.pager.retrieve_next_page()?;
    Ok(results.map(|results| self.decode(&results)))
  }

  fn decode(&self, results: &[Value]) -> Vec<Track> {
    let mut ctx = DecodeContext::new(Rc::clone(&self.config));
    if let Some(threshold) = self.request.effective_threshold() {
      ctx = ctx.with_threshold(threshold);
    }

    let scored = decode_scored::<Track>(results, &ctx);
    if !matches!(self.request.query, TrackQuery::Fuzzy { .. }) {
      return scored.into_iter().map(|s| s.entity).collect();
    }

    let min_score = self.config.fuzzy_min_score;
    scored
      .into_iter()
      .filter(|s| {
        let keep = s.score >= min_score;
        if !keep {
          tracing::debug!(id = s.entity.id(), score = s.score, min_score, "fuzzy result below cutoff");
        }
        keep
      })
      .map(|s| s.entity)
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ports::sim::{SimCall, SimTransport};
  use serde_json::json;

  fn config() -> Rc<ClientConfig> {
    Rc::new(ClientConfig::default())
  }

  fn record(id: &str, score: f64) -> Value {
    json!({
      "entity": {
        "id": id,
        "collection": "bmat",
        "metadata": { "artist_service_id": "a1", "artist": "Bjork", "track": format!("Song {id}") },
      },
      "score": score,
    })
  }

  fn ids(tracks: &[Track]) -> Vec<String> {
    tracks.iter().map(|t| t.id().to_string()).collect()
  }

  fn page_indexes(sim: &SimTransport) -> Vec<usize> {
    sim
      .calls()
      .into_iter()
      .filter_map(|call| match call {
        SimCall::Page { index, .. } => Some(index),
        _ => None,
      })
      .collect()
  }

  #[test]
  fn text_query_without_filters_targets_trackartist() {
    let request = SearchRequest::new("bmat", TrackQuery::text("bjork"));
    let params = request.params(&ClientConfig::default());

    assert_eq!(request.path(), "/collections/bmat/tracks/search.json");
    assert_eq!(params.get("q").map(String::as_str), Some("trackartist:bjork"));
    assert_eq!(params.get("limit").map(String::as_str), Some("10"));
    assert!(params.get("fetch_metadata").is_some_and(|f| f.starts_with("track,name,")));
  }

  #[test]
  fn text_query_with_filters_joins_with_and() {
    let with_query = SearchRequest::new(
      "bmat",
      TrackQuery::Text {
        query: Some("bjork".into()),
        filters: vec!["genre:pop".into(), "year:1997".into()],
        method: SearchMethod::Match,
      },
    );
    let without_query = SearchRequest::new(
      "bmat",
      TrackQuery::Text { query: None, filters: vec!["genre:pop".into()], method: SearchMethod::Search },
    );

    assert_eq!(with_query.path(), "/collections/bmat/tracks/match.json");
    assert_eq!(
      with_query.params(&ClientConfig::default()).get("q").map(String::as_str),
      Some("bjork AND genre:pop AND year:1997")
    );
    assert_eq!(without_query.params(&ClientConfig::default()).get("q").map(String::as_str), Some("genre:pop"));
  }

  #[test]
  fn fuzzy_and_resolve_params() {
    let cfg = ClientConfig::default();

    let fuzzy = SearchRequest::new("bmat", TrackQuery::fuzzy("bjrk"));
    let params = fuzzy.params(&cfg);
    assert_eq!(fuzzy.path(), "/collections/bmat/tracks/match.json");
    assert_eq!(params.get("fuzzy").map(String::as_str), Some("true"));
    assert_eq!(params.get("limit").map(String::as_str), Some("30"));

    let resolve = SearchRequest::new("bmat", TrackQuery::resolve("Bjork", "Joga"));
    let params = resolve.params(&cfg);
    assert_eq!(resolve.path(), "/collections/bmat/tracks/resolve.json");
    assert_eq!(params.get("artist").map(String::as_str), Some("Bjork"));
    assert_eq!(params.get("track").map(String::as_str), Some("Joga"));
    assert_eq!(params.get("limit").map(String::as_str), Some("100"));
    assert!(!params.contains_key("q"));
  }

  #[test]
  fn plain_search_ignores_threshold() {
    let search = SearchRequest::new("bmat", TrackQuery::text("x")).with_threshold(0.5);
    let fuzzy = SearchRequest::new("bmat", TrackQuery::fuzzy("x")).with_threshold(0.5);

    assert_eq!(search.effective_threshold(), None);
    assert_eq!(fuzzy.effective_threshold(), Some(0.5));
  }

  #[test]
  fn page_zero_and_one_are_the_same() {
    let path = "/collections/bmat/tracks/search.json";
    let sim = SimTransport::new().with_pages(path, vec![vec![record("t1", 0.9)], vec![record("t2", 0.8)]]);
    let mut search = TrackSearch::open(&sim, SearchRequest::new("bmat", TrackQuery::text("bjork")), config());

    let zero = search.get_page(0).unwrap().unwrap();
    let one = search.get_page(1).unwrap().unwrap();

    assert_eq!(ids(&zero), ids(&one));
    assert_eq!(page_indexes(&sim), vec![0, 0]);
  }

  #[test]
  fn next_page_follows_requested_page() {
    let path = "/collections/bmat/tracks/search.json";
    let pages = vec![vec![record("t1", 0.9)], vec![record("t2", 0.8)], vec![record("t3", 0.7)]];
    let sim = SimTransport::new().with_pages(path, pages);
    let mut search = TrackSearch::open(&sim, SearchRequest::new("bmat", TrackQuery::text("bjork")), config());

    assert_eq!(ids(&search.get_page(2).unwrap().unwrap()), vec!["t2"]);
    assert_eq!(ids(&search.get_next_page().unwrap().unwrap()), vec!["t3"]);
    assert!(search.get_next_page().unwrap().is_none());
  }

  #[test]
  fn empty_page_differs_from_no_more_data() {
    let path = "/collections/bmat/tracks/search.json";
    let malformed = json!({ "entity": { "id": "t9", "collection": "bmat", "metadata": {} }, "score": 0.9 });
    let sim = SimTransport::new().with_pages(path, vec![vec![malformed]]);
    let mut search = TrackSearch::open(&sim, SearchRequest::new("bmat", TrackQuery::text("bjork")), config());

    assert_eq!(search.get_next_page().unwrap().map(|t| t.len()), Some(0));
    assert!(search.get_next_page().unwrap().is_none());
  }

  #[test]
  fn fuzzy_excludes_low_scores_without_stopping() {
    let path = "/collections/bmat/tracks/match.json";
    let page = vec![record("t1", 0.9), record("t2", 0.3), record("t3", 0.5)];
    let sim = SimTransport::new().with_pages(path, vec![page]);
    let mut search = TrackSearch::open(&sim, SearchRequest::new("bmat", TrackQuery::fuzzy("bjrk")), config());

    assert_eq!(ids(&search.get_page(1).unwrap().unwrap()), vec!["t1", "t3"]);
  }

  #[test]
  fn fuzzy_cutoff_and_threshold_are_independent() {
    let path = "/collections/bmat/tracks/match.json";
    let page = vec![record("t1", 0.9), record("t2", 0.3), record("t3", 0.5), record("t4", 0.95)];
    let sim = SimTransport::new().with_pages(path, vec![page]);
    let request = SearchRequest::new("bmat", TrackQuery::fuzzy("bjrk")).with_threshold(0.45);
    let mut search = TrackSearch::open(&sim, request, config());

    // t2 corta la página por el umbral; el corte difuso no interviene
    assert_eq!(ids(&search.get_page(1).unwrap().unwrap()), vec!["t1"]);
  }

  #[test]
  fn match_honors_threshold() {
    let path = "/collections/bmat/tracks/match.json";
    let page = vec![record("t1", 0.9), record("t2", 0.2), record("t3", 0.8)];
    let sim = SimTransport::new().with_pages(path, vec![page]);
    let query = TrackQuery::Text { query: Some("bjork".into()), filters: vec![], method: SearchMethod::Match };
    let mut search = TrackSearch::open(&sim, SearchRequest::new("bmat", query).with_threshold(0.5), config());

    assert_eq!(ids(&search.get_page(1).unwrap().unwrap()), vec!["t1"]);
  }

  #[test]
  fn transport_failure_is_an_error() {
    let path = "/collections/bmat/tracks/search.json";
    let sim = SimTransport::new().failing(path, 503);
    let mut search = TrackSearch::open(&sim, SearchRequest::new("bmat", TrackQuery::text("bjork")), config());

    assert!(matches!(search.get_page(1), Err(CoreError::Transport(_))));
  }
}
