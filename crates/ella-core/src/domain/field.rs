use std::cell::RefCell;
use std::collections::HashMap;

use serde_json::{Map, Value};

/// Bolsa de atributos crudos que el servicio devuelve para una entidad.
pub type Metadata = Map<String, Value>;

/// Valor de un campo ya decodificado.
///
/// El servicio devuelve algunos campos (imágenes, enlaces) unas veces como
/// cadena y otras como array; se normaliza aquí, una sola vez, en la frontera.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
  Scalar(String),
  List(Vec<String>),
}

impl FieldValue {
  /// Convierte un valor JSON. `null` y objetos no producen valor.
  pub fn from_json(value: &Value) -> Option<Self> {
    match value {
      Value::Array(items) => Some(FieldValue::List(items.iter().filter_map(scalar_text).collect())),
      other => scalar_text(other).map(FieldValue::Scalar),
    }
  }

  /// Vista escalar. Una lista devuelve su primer elemento.
  pub fn as_scalar(&self) -> Option<&str> {
    match self {
      FieldValue::Scalar(s) => Some(s),
      FieldValue::List(items) => items.first().map(String::as_str),
    }
  }

  /// Vista de lista. Un escalar se trata como lista de un elemento: el
  /// servicio a veces manda una cadena donde se espera un array.
  pub fn into_list(self) -> Vec<String> {
    match self {
      FieldValue::Scalar(s) => vec![s],
      FieldValue::List(items) => items,
    }
  }
}

fn scalar_text(value: &Value) -> Option<String> {
  match value {
    Value::String(s) => Some(s.clone()),
    Value::Number(n) => Some(n.to_string()),
    Value::Bool(b) => Some(b.to_string()),
    _ => None,
  }
}

impl From<String> for FieldValue {
  fn from(value: String) -> Self {
    FieldValue::Scalar(value)
  }
}

impl From<&str> for FieldValue {
  fn from(value: &str) -> Self {
    FieldValue::Scalar(value.to_string())
  }
}

impl From<Vec<String>> for FieldValue {
  fn from(value: Vec<String>) -> Self {
    FieldValue::List(value)
  }
}

/// Caché perezosa de campos de una entidad.
///
/// - `metadata`: la bolsa cruda, residente una sola vez (la trae el transporte).
/// - `fields`: memo por campo; se llena en el primer acceso o con `set`.
///
/// Una vez un campo está en `fields`, la metadata nunca se vuelve a consultar
/// para esa clave. Usa `RefCell`: una entidad es de un solo hilo.
#[derive(Debug, Default)]
pub struct FieldCache {
  metadata: RefCell<Option<Metadata>>,
  fields: RefCell<HashMap<String, FieldValue>>,
}

impl FieldCache {
  pub fn new() -> Self {
    Self::default()
  }

  /// `true` si la metadata ya está residente.
  pub fn is_loaded(&self) -> bool {
    self.metadata.borrow().is_some()
  }

  /// Deja `metadata` residente. Los campos ya cacheados no cambian.
  pub fn load(&self, metadata: Metadata) {
    *self.metadata.borrow_mut() = Some(metadata);
  }

  /// Resuelve `name`: memo primero, metadata residente después.
  ///
  /// Nunca hace una petición; si la metadata no está cargada devuelve `None`.
  pub fn get(&self, name: &str) -> Option<FieldValue> {
    if let Some(cached) = self.fields.borrow().get(name) {
      return Some(cached.clone());
    }

    let resolved = self
      .metadata
      .borrow()
      .as_ref()
      .and_then(|metadata| metadata.get(name))
      .and_then(FieldValue::from_json)?;

    self.fields.borrow_mut().insert(name.to_string(), resolved.clone());
    Some(resolved)
  }

  pub fn get_field(&self, name: &str) -> Option<String> {
    self.get(name).and_then(|value| value.as_scalar().map(ToOwned::to_owned))
  }

  pub fn get_field_list(&self, name: &str) -> Option<Vec<String>> {
    self.get(name).map(FieldValue::into_list)
  }

  /// Sobrescribe `name`; la metadata deja de consultarse para esa clave.
  pub fn set(&self, name: &str, value: impl Into<FieldValue>) {
    self.fields.borrow_mut().insert(name.to_string(), value.into());
  }
}
