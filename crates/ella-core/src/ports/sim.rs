//! Transporte simulado en memoria.
//!
//! Devuelve respuestas preparadas por ruta y registra cada llamada, de modo
//! que los tests pueden comprobar qué se pidió (y qué no) sin red.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde_json::Value;

use super::transport::{Pager, QueryParams, Transport, TransportError};

/// Una llamada registrada por [`SimTransport`].
#[derive(Debug, Clone, PartialEq)]
pub enum SimCall {
  Request { path: String, params: QueryParams },
  FetchMetadata { fields: String, collection: String, path: String },
  Page { path: String, index: usize },
}

#[derive(Debug, Default)]
pub struct SimTransport {
  responses: HashMap<String, Value>,
  metadata: HashMap<String, Vec<Value>>,
  pages: HashMap<String, Vec<Vec<Value>>>,
  failures: HashMap<String, u16>,
  calls: Rc<RefCell<Vec<SimCall>>>,
}

impl SimTransport {
  pub fn new() -> Self {
    Self::default()
  }

  /// Respuesta para `request(path, _)`.
  pub fn with_response(mut self, path: &str, response: Value) -> Self {
    self.responses.insert(path.to_string(), response);
    self
  }

  /// Resultados para `fetch_metadata(_, collection, path)`.
  pub fn with_metadata(mut self, collection: &str, path: &str, results: Vec<Value>) -> Self {
    self.metadata.insert(metadata_key(collection, path), results);
    self
  }

  /// Páginas (en orden) servidas por el pager abierto sobre `path`.
  pub fn with_pages(mut self, path: &str, pages: Vec<Vec<Value>>) -> Self {
    self.pages.insert(path.to_string(), pages);
    self
  }

  /// Hace que cualquier llamada sobre `path` falle con `status`.
  pub fn failing(mut self, path: &str, status: u16) -> Self {
    self.failures.insert(path.to_string(), status);
    self
  }

  pub fn calls(&self) -> Vec<SimCall> {
    self.calls.borrow().clone()
  }

  fn check_failure(&self, path: &str) -> Result<(), TransportError> {
    match self.failures.get(path) {
      Some(status) => Err(TransportError::Status { status: *status, message: format!("simulated failure on {path}") }),
      None => Ok(()),
    }
  }
}

fn metadata_key(collection: &str, path: &str) -> String {
  format!("/collections/{collection}{path}")
}

impl Transport for SimTransport {
  fn request(&self, path: &str, params: &QueryParams) -> Result<Value, TransportError> {
    self.calls.borrow_mut().push(SimCall::Request { path: path.to_string(), params: params.clone() });
    self.check_failure(path)?;

    self.responses.get(path).cloned().ok_or_else(|| TransportError::Status {
      status: 404,
      message: format!("no simulated response for {path}"),
    })
  }

  fn fetch_metadata(
    &self,
    fields: &[&str],
    collection: &str,
    path: &str,
  ) -> Result<Vec<Value>, TransportError> {
    let key = metadata_key(collection, path);
    self.calls.borrow_mut().push(SimCall::FetchMetadata {
      fields: fields.join(","),
      collection: collection.to_string(),
      path: path.to_string(),
    });
    self.check_failure(&key)?;

    Ok(self.metadata.get(&key).cloned().unwrap_or_default())
  }

  fn pager<'a>(&'a self, path: &str, _params: QueryParams) -> Box<dyn Pager + 'a> {
    Box::new(SimPager {
      path: path.to_string(),
      pages: self.pages.get(path).cloned().unwrap_or_default(),
      failure: self.failures.get(path).copied(),
      cursor: None,
      calls: Rc::clone(&self.calls),
    })
  }
}

struct SimPager {
  path: String,
  pages: Vec<Vec<Value>>,
  failure: Option<u16>,
  cursor: Option<usize>,
  calls: Rc<RefCell<Vec<SimCall>>>,
}

impl Pager for SimPager {
  fn retrieve_page(&mut self, index: usize) -> Result<Option<Vec<Value>>, TransportError> {
    self.calls.borrow_mut().push(SimCall::Page { path: self.path.clone(), index });
    if let Some(status) = self.failure {
      return Err(TransportError::Status { status, message: format!("simulated failure on {}", self.path) });
    }

    self.cursor = Some(index);
    Ok(self.pages.get(index).cloned())
  }

  fn retrieve_next_page(&mut self) -> Result<Option<Vec<Value>>, TransportError> {
    let next = self.cursor.map_or(0, |current| current + 1);
    self.retrieve_page(next)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn records_every_call() {
    let sim = SimTransport::new().with_response("/a", json!({ "results": [] }));

    sim.request("/a", &QueryParams::new()).unwrap();
    assert!(sim.request("/missing", &QueryParams::new()).is_err());

    assert_eq!(sim.calls().len(), 2);
  }

  #[test]
  fn pager_cursor_advances_from_last_page() {
    let sim = SimTransport::new().with_pages("/p", vec![vec![json!(0)], vec![json!(1)], vec![json!(2)]]);
    let mut pager = sim.pager("/p", QueryParams::new());

    assert_eq!(pager.retrieve_next_page().unwrap(), Some(vec![json!(0)]));
    assert_eq!(pager.retrieve_page(1).unwrap(), Some(vec![json!(1)]));
    assert_eq!(pager.retrieve_next_page().unwrap(), Some(vec![json!(2)]));
    assert_eq!(pager.retrieve_next_page().unwrap(), None);
  }
}
