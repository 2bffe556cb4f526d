use std::cell::RefCell;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use super::album::Album;
use super::entity::{ALBUM_FIELDS, Entity, EntityCore, EntityKind, Scored, TRACK_FIELDS, parse_number};
use super::field::FieldValue;
use super::track::Track;
use crate::config::ClientConfig;
use crate::decode::{DecodeContext, decode_batch, decode_scored};
use crate::errors::CoreError;
use crate::ports::transport::{QueryParams, Transport, results_of};

/// Representa a un artista del catálogo de Ella.
///
/// Igualdad, orden y hash dependen sólo del `id`. Un artista nunca guarda sus
/// pistas (cada pista guarda un `Rc` a su artista): [`Artist::tracks`] vuelve
/// a consultar el servicio cada vez. Los similares sí se memorizan.
#[derive(Debug)]
pub struct Artist {
  core: EntityCore,
  similar: RefCell<Option<Rc<Vec<Scored<Artist>>>>>,
}

/// Una coordenada de `artist_latlng`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLng {
  pub lat: f64,
  pub lng: f64,
}

impl LatLng {
  /// Parsea `"lat,lng"`. Cadenas vacías o mal formadas no producen valor.
  pub fn parse(raw: &str) -> Option<Self> {
    let (lat, lng) = raw.split_once(',')?;
    Some(Self { lat: lat.trim().parse().ok()?, lng: lng.trim().parse().ok()? })
  }
}

/// Décadas de actividad (`artist_decades1`, `artist_decades2`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decades {
  pub first: Option<String>,
  pub last: Option<String>,
}

impl Artist {
  pub fn new(id: impl Into<String>, collection: impl Into<String>, config: Rc<ClientConfig>) -> Self {
    Self {
      core: EntityCore::new(EntityKind::Artist, id.into(), collection.into(), config),
      similar: RefCell::new(None),
    }
  }

  /// Nombre: `name` y, si viene vacío, `artist`.
  pub fn name(&self) -> String {
    self
      .get_field("name")
      .filter(|name| !name.trim().is_empty())
      .or_else(|| self.get_field("artist"))
      .unwrap_or_default()
  }

  pub fn set_name(&self, name: impl Into<String>) {
    self.set_field("name", FieldValue::Scalar(name.into()));
  }

  pub fn location(&self) -> String {
    self.get_field("artist_location").unwrap_or_default()
  }

  pub fn set_location(&self, location: impl Into<String>) {
    self.set_field("artist_location", FieldValue::Scalar(location.into()));
  }

  /// Todas las coordenadas conocidas del artista.
  pub fn latlng(&self) -> Vec<LatLng> {
    self
      .get_field_list("artist_latlng")
      .unwrap_or_default()
      .iter()
      .filter_map(|raw| LatLng::parse(raw))
      .collect()
  }

  pub fn lat(&self) -> Option<f64> {
    self.get_field("artist_lat").and_then(|raw| raw.trim().parse().ok())
  }

  pub fn lng(&self) -> Option<f64> {
    self.get_field("artist_lng").and_then(|raw| raw.trim().parse().ok())
  }

  pub fn popularity(&self) -> f64 {
    parse_number(self.get_field("artist_popularity").as_deref())
  }

  pub fn set_popularity(&self, popularity: f64) {
    self.set_field("artist_popularity", FieldValue::Scalar(popularity.to_string()));
  }

  pub fn decades(&self) -> Decades {
    Decades { first: self.get_field("artist_decades1"), last: self.get_field("artist_decades2") }
  }

  pub fn set_decades(&self, decades: Decades) {
    if let Some(first) = decades.first {
      self.set_field("artist_decades1", FieldValue::Scalar(first));
    }
    if let Some(last) = decades.last {
      self.set_field("artist_decades2", FieldValue::Scalar(last));
    }
  }

  /// Artistas similares con su puntuación. Se piden una sola vez.
  ///
  /// `Ok(None)` sin hacer petición si el artista no es recomendable.
  pub fn similar_artists(&self, transport: &dyn Transport) -> Result<Option<Rc<Vec<Scored<Artist>>>>, CoreError> {
    if !self.is_recommendable() {
      return Ok(None);
    }
    if let Some(similar) = self.similar.borrow().as_ref() {
      return Ok(Some(Rc::clone(similar)));
    }

    let path = self.core.collection_path("/similar/artists.json");
    let mut params = QueryParams::new();
    params.insert("fetch_metadata".to_string(), EntityKind::Artist.fetch_fields().join(","));

    let response = transport.request(&path, &params)?;
    let results = results_of(&response)?;
    let ctx = DecodeContext::new(Rc::clone(self.core.config()));
    let similar = Rc::new(decode_scored(results, &ctx));
    *self.similar.borrow_mut() = Some(Rc::clone(&similar));

    Ok(Some(similar))
  }

  /// Pistas del artista; cada una comparte esta misma instancia como padre.
  pub fn tracks(self: &Rc<Self>, transport: &dyn Transport) -> Result<Vec<Track>, CoreError> {
    let path = format!("/artists/{}/tracks.json", self.id());
    let results = transport.fetch_metadata(TRACK_FIELDS, self.collection(), &path)?;
    let ctx = DecodeContext::new(Rc::clone(self.core.config())).with_artist(Rc::clone(self));

    Ok(decode_batch(&results, &ctx))
  }

  /// Lanzamientos del artista, con esta instancia como artista compartido.
  pub fn albums(self: &Rc<Self>, transport: &dyn Transport) -> Result<Vec<Album>, CoreError> {
    let path = format!("/artists/{}/releases.json", self.id());
    let results = transport.fetch_metadata(ALBUM_FIELDS, self.collection(), &path)?;
    let ctx = DecodeContext::new(Rc::clone(self.core.config())).with_artist(Rc::clone(self));

    Ok(decode_batch(&results, &ctx))
  }
}

impl Entity for Artist {
  fn core(&self) -> &EntityCore {
    &self.core
  }
}

impl PartialEq for Artist {
  fn eq(&self, other: &Self) -> bool {
    self.core.id() == other.core.id()
  }
}

impl Eq for Artist {}

impl PartialOrd for Artist {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for Artist {
  fn cmp(&self, other: &Self) -> Ordering {
    self.core.id().cmp(other.core.id())
  }
}

impl Hash for Artist {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.core.id().hash(state);
  }
}
