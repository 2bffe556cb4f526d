use std::collections::BTreeMap;

use serde_json::Value;

/// Parámetros de consulta de una petición (`q`, `limit`, `seeds`, ...).
///
/// `BTreeMap` para que el orden sea estable en logs y tests.
pub type QueryParams = BTreeMap<String, String>;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
  #[error("connection error: {0}")]
  Connection(String),

  #[error("service returned status {status}: {message}")]
  Status { status: u16, message: String },

  #[error("invalid response: {0}")]
  InvalidResponse(String),
}

/// Port que abstrae el acceso al servicio web de Ella.
///
/// El núcleo nunca habla HTTP: recibe árboles JSON ya parseados y fallos
/// tipados. Implementaciones posibles:
/// - `ella-http` (ureq, bloqueante)
/// - [`SimTransport`](crate::ports::sim::SimTransport) para tests
pub trait Transport {
  /// Ejecuta `path` con `params`. `path` ya incluye el prefijo de colección.
  fn request(&self, path: &str, params: &QueryParams) -> Result<Value, TransportError>;

  /// Pide los campos `fields` de un recurso y devuelve el array `results`.
  ///
  /// `path` es relativo a la colección: el adapter añade
  /// `/collections/{collection}` delante.
  fn fetch_metadata(
    &self,
    fields: &[&str],
    collection: &str,
    path: &str,
  ) -> Result<Vec<Value>, TransportError>;

  /// Abre un cursor de paginación sobre `path` + `params`.
  fn pager<'a>(&'a self, path: &str, params: QueryParams) -> Box<dyn Pager + 'a>;
}

/// Cursor de páginas de resultados. El estado (página actual) vive aquí,
/// no en el servicio de búsqueda.
pub trait Pager {
  /// Página `index` (0-indexada). `None` cuando ya no hay más datos.
  fn retrieve_page(&mut self, index: usize) -> Result<Option<Vec<Value>>, TransportError>;

  /// Página siguiente a la última recuperada (la primera si aún no hubo ninguna).
  fn retrieve_next_page(&mut self) -> Result<Option<Vec<Value>>, TransportError>;
}

/// Extrae el array `results` de una respuesta del servicio.
pub fn results_of(response: &Value) -> Result<&[Value], TransportError> {
  response
    .get("results")
    .and_then(Value::as_array)
    .map(Vec::as_slice)
    .ok_or_else(|| TransportError::InvalidResponse("response has no `results` array".to_string()))
}
