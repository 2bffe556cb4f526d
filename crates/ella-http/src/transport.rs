//! Adapter bloqueante de [`Transport`] sobre `ureq`.

use std::time::Duration;

use ella_core::ports::transport::results_of;
use ella_core::ports::{Pager, QueryParams, Transport, TransportError};
use serde_json::Value;

use crate::config::HttpConfig;

/// Tamaño de página cuando la petición no trae `limit`.
const DEFAULT_PAGE_SIZE: usize = 10;

pub struct HttpTransport {
  http_client: ureq::Agent,
  base_url: String,
}

impl HttpTransport {
  pub fn new(config: &HttpConfig) -> Self {
    let http_client = ureq::AgentBuilder::new()
      .timeout_connect(Duration::from_secs(config.connect_timeout_secs))
      .timeout_read(Duration::from_secs(config.read_timeout_secs))
      .user_agent(&config.user_agent)
      .build();

    Self { http_client, base_url: config.base_url.trim().trim_end_matches('/').to_string() }
  }

  pub fn url(&self, path: &str) -> String {
    format!("{}{}", self.base_url, path)
  }

  fn get_json(&self, path: &str, params: &QueryParams) -> Result<Value, TransportError> {
    let url = self.url(path);
    tracing::debug!(%url, ?params, "GET");

    let mut request = self.http_client.get(&url);
    for (key, value) in params {
      request = request.query(key, value);
    }

    let response = request.call().map_err(map_ureq_error)?;
    response
      .into_json::<Value>()
      .map_err(|err| TransportError::InvalidResponse(format!("{url}: {err}")))
  }
}

fn map_ureq_error(err: ureq::Error) -> TransportError {
  match err {
    ureq::Error::Status(status, response) => {
      TransportError::Status { status, message: response.status_text().to_string() }
    }
    ureq::Error::Transport(transport) => TransportError::Connection(transport.to_string()),
  }
}

impl Transport for HttpTransport {
  fn request(&self, path: &str, params: &QueryParams) -> Result<Value, TransportError> {
    self.get_json(path, params)
  }

  fn fetch_metadata(
    &self,
    fields: &[&str],
    collection: &str,
    path: &str,
  ) -> Result<Vec<Value>, TransportError> {
    let mut params = QueryParams::new();
    params.insert("fetch_metadata".to_string(), fields.join(","));

    let response = self.get_json(&format!("/collections/{collection}{path}"), &params)?;
    Ok(results_of(&response)?.to_vec())
  }

  fn pager<'a>(&'a self, path: &str, params: QueryParams) -> Box<dyn Pager + 'a> {
    Box::new(HttpPager::new(self, path, params))
  }
}

/// Pager por `offset`: la página `i` empieza en `i * limit`.
///
/// Una página vacía es el final; una página corta también, así que a partir
/// de ella no se vuelve a preguntar por índices posteriores.
pub struct HttpPager<'a> {
  transport: &'a HttpTransport,
  path: String,
  params: QueryParams,
  page_size: usize,
  cursor: Option<usize>,
  last_page: Option<usize>,
}

impl<'a> HttpPager<'a> {
  fn new(transport: &'a HttpTransport, path: &str, params: QueryParams) -> Self {
    let page_size = params
      .get("limit")
      .and_then(|limit| limit.parse().ok())
      .filter(|&limit: &usize| limit > 0)
      .unwrap_or(DEFAULT_PAGE_SIZE);

    Self { transport, path: path.to_string(), params, page_size, cursor: None, last_page: None }
  }

  /// Parámetros de la página `index`; `None` si el `offset` no cabe en `usize`.
  fn page_params(&self, index: usize) -> Option<QueryParams> {
    let offset = index.checked_mul(self.page_size)?;
    let mut params = self.params.clone();
    params.insert("offset".to_string(), offset.to_string());
    Some(params)
  }

  fn is_past_end(&self, index: usize) -> bool {
    self.last_page.is_some_and(|last| index > last)
  }

  /// Actualiza cursor y final con la página `index` ya descargada.
  fn accept(&mut self, index: usize, results: Vec<Value>) -> Option<Vec<Value>> {
    self.cursor = Some(index);

    if results.is_empty() {
      self.last_page = Some(index.saturating_sub(1));
      return None;
    }
    if results.len() < self.page_size {
      self.last_page = Some(index);
    }

    Some(results)
  }
}

impl Pager for HttpPager<'_> {
  fn retrieve_page(&mut self, index: usize) -> Result<Option<Vec<Value>>, TransportError> {
    if self.is_past_end(index) {
      tracing::debug!(path = %self.path, index, "past last page, not requesting");
      self.cursor = Some(index);
      return Ok(None);
    }

    let Some(params) = self.page_params(index) else {
      tracing::debug!(path = %self.path, index, "page offset overflows, treating as past the end");
      self.cursor = Some(index);
      return Ok(None);
    };

    let response = self.transport.get_json(&self.path, &params)?;
    let results = results_of(&response)?.to_vec();

    Ok(self.accept(index, results))
  }

  fn retrieve_next_page(&mut self) -> Result<Option<Vec<Value>>, TransportError> {
    let next = self.cursor.map_or(0, |current| current.saturating_add(1));
    self.retrieve_page(next)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn transport() -> HttpTransport {
    HttpTransport::new(&HttpConfig { base_url: "http://ella.local/ws/".to_string(), ..HttpConfig::default() })
  }

  fn params(limit: &str) -> QueryParams {
    QueryParams::from([("limit".to_string(), limit.to_string()), ("q".to_string(), "bjork".to_string())])
  }

  #[test]
  fn url_joins_base_and_path() {
    assert_eq!(
      transport().url("/collections/bmat/tracks/search.json"),
      "http://ella.local/ws/collections/bmat/tracks/search.json"
    );
  }

  #[test]
  fn offset_is_index_times_limit() {
    let transport = transport();
    let pager = HttpPager::new(&transport, "/p", params("25"));

    let page = pager.page_params(3).unwrap();

    assert_eq!(page.get("offset").map(String::as_str), Some("75"));
    assert_eq!(page.get("q").map(String::as_str), Some("bjork"));
  }

  #[test]
  fn huge_page_index_is_past_the_end() {
    let transport = transport();
    let mut pager = HttpPager::new(&transport, "/p", params("10"));

    assert_eq!(pager.page_params(usize::MAX / 2), None);
    assert_eq!(pager.retrieve_page(usize::MAX / 2).unwrap(), None);
    assert_eq!(pager.cursor, Some(usize::MAX / 2));

    pager.cursor = Some(usize::MAX);
    assert_eq!(pager.retrieve_next_page().unwrap(), None);
  }

  #[test]
  fn missing_or_bad_limit_uses_default_page_size() {
    let transport = transport();

    assert_eq!(HttpPager::new(&transport, "/p", QueryParams::new()).page_size, DEFAULT_PAGE_SIZE);
    assert_eq!(HttpPager::new(&transport, "/p", params("0")).page_size, DEFAULT_PAGE_SIZE);
    assert_eq!(HttpPager::new(&transport, "/p", params("x")).page_size, DEFAULT_PAGE_SIZE);
  }

  #[test]
  fn short_page_marks_the_end() {
    let transport = transport();
    let mut pager = HttpPager::new(&transport, "/p", params("2"));

    assert!(pager.accept(0, vec![json!(1), json!(2)]).is_some());
    assert!(!pager.is_past_end(1));

    assert_eq!(pager.accept(1, vec![json!(3)]), Some(vec![json!(3)]));
    assert!(pager.is_past_end(2));
    assert!(!pager.is_past_end(1));
  }

  #[test]
  fn past_end_is_answered_without_network() {
    let transport = transport();
    let mut pager = HttpPager::new(&transport, "/p", params("2"));
    pager.accept(0, vec![json!(1)]);

    assert_eq!(pager.retrieve_next_page().unwrap(), None);
    assert_eq!(pager.cursor, Some(1));
  }

  #[test]
  fn empty_page_is_no_more_data() {
    let transport = transport();
    let mut pager = HttpPager::new(&transport, "/p", params("2"));

    assert_eq!(pager.accept(0, Vec::new()), None);
    assert!(pager.is_past_end(1));
  }
}
