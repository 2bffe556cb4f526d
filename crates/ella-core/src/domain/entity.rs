use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use super::field::{FieldCache, FieldValue, Metadata};
use crate::config::ClientConfig;
use crate::errors::CoreError;
use crate::ports::Transport;

pub const ARTIST_FIELDS: &[&str] = &[
  "artist",
  "name",
  "artist_popularity",
  "artist_location",
  "recommendable",
  "artist_decades1",
  "artist_decades2",
  "artist_latlng",
  "musicbrainz_artist_id",
  "official_homepage_artist_url",
  "wikipedia_artist_url",
  "lastfm_artist_url",
  "myspace_artist_url",
  "spotify_artist_url",
  "itms_artist_url",
  "discogs_artist_url",
];

pub const ARTIST_LINKS: &[&str] = &[
  "official_homepage_artist_url",
  "wikipedia_artist_url",
  "lastfm_artist_url",
  "myspace_artist_url",
  "spotify_artist_url",
  "itms_artist_url",
  "discogs_artist_url",
];

pub const TRACK_FIELDS: &[&str] = &[
  "track",
  "name",
  "artist_service_id",
  "artist",
  "release_service_id",
  "release",
  "location",
  "year",
  "genre",
  "track_popularity",
  "track_small_image",
  "recommendable",
  "musicbrainz_track_id",
  "spotify_track_uri",
  "spotify_track_url",
  "grooveshark_track_url",
  "amazon_track_url",
  "itms_track_url",
  "hypem_track_url",
  "musicbrainz_track_url",
];

pub const TRACK_LINKS: &[&str] = &[
  "spotify_track_url",
  "grooveshark_track_url",
  "amazon_track_url",
  "itms_track_url",
  "hypem_track_url",
  "musicbrainz_track_url",
];

pub const ALBUM_FIELDS: &[&str] = &[
  "release",
  "name",
  "artist_service_id",
  "artist",
  "release_small_image",
  "recommendable",
  "musicbrainz_release_id",
];

/// Tipo de entidad tal como lo nombra el servicio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
  Artist,
  Track,
  /// El servicio llama `release` a los álbumes.
  Album,
}

impl EntityKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      EntityKind::Artist => "artist",
      EntityKind::Track => "track",
      EntityKind::Album => "release",
    }
  }

  /// Segmento de ruta de la API (`/artists/...`, `/tracks/...`).
  pub fn path_segment(&self) -> &'static str {
    match self {
      EntityKind::Artist => "artists",
      EntityKind::Track => "tracks",
      EntityKind::Album => "releases",
    }
  }

  /// Campos que se piden al hidratar una entidad de este tipo.
  pub fn fetch_fields(&self) -> &'static [&'static str] {
    match self {
      EntityKind::Artist => ARTIST_FIELDS,
      EntityKind::Track => TRACK_FIELDS,
      EntityKind::Album => ALBUM_FIELDS,
    }
  }

  pub fn link_fields(&self) -> &'static [&'static str] {
    match self {
      EntityKind::Artist => ARTIST_LINKS,
      EntityKind::Track => TRACK_LINKS,
      EntityKind::Album => &[],
    }
  }

  fn mbid_field(&self) -> &'static str {
    match self {
      EntityKind::Artist => "musicbrainz_artist_id",
      EntityKind::Track => "musicbrainz_track_id",
      EntityKind::Album => "musicbrainz_release_id",
    }
  }
}

impl fmt::Display for EntityKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Referencia a una entidad usada para sesgar una consulta de similitud.
///
/// Se serializa como `collection:kind/id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seed {
  pub collection: String,
  pub kind: EntityKind,
  pub id: String,
}

impl Seed {
  pub fn new(collection: impl Into<String>, kind: EntityKind, id: impl Into<String>) -> Self {
    Self { collection: collection.into(), kind, id: id.into() }
  }
}

impl fmt::Display for Seed {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}/{}", self.collection, self.kind, self.id)
  }
}

/// Una entidad junto a la puntuación con la que la devolvió el servicio.
#[derive(Debug, Clone, PartialEq)]
pub struct Scored<T> {
  pub entity: T,
  pub score: f64,
}

/// Identidad + caché de campos, compartida por todas las variantes.
#[derive(Debug)]
pub struct EntityCore {
  id: String,
  collection: String,
  kind: EntityKind,
  fields: FieldCache,
  config: Rc<ClientConfig>,
}

impl EntityCore {
  pub fn new(kind: EntityKind, id: String, collection: String, config: Rc<ClientConfig>) -> Self {
    Self { id, collection, kind, fields: FieldCache::new(), config }
  }

  pub fn id(&self) -> &str {
    &self.id
  }

  pub fn collection(&self) -> &str {
    &self.collection
  }

  pub fn kind(&self) -> EntityKind {
    self.kind
  }

  pub fn fields(&self) -> &FieldCache {
    &self.fields
  }

  pub fn config(&self) -> &Rc<ClientConfig> {
    &self.config
  }

  /// Ruta del recurso relativa a la colección: `/tracks/{id}.json`.
  pub fn resource_path(&self) -> String {
    format!("/{}/{}.json", self.kind.path_segment(), self.id)
  }

  /// Ruta absoluta de un sub-recurso: `/collections/{c}/artists/{id}{suffix}`.
  pub fn collection_path(&self, suffix: &str) -> String {
    format!("/collections/{}/{}/{}{}", self.collection, self.kind.path_segment(), self.id, suffix)
  }
}

/// Capacidades comunes de Artist, Track y Album.
///
/// Los getters tipados de cada variante leen de la caché de campos; ninguno
/// toca la red. Para traer la metadata hay que llamar a [`Entity::hydrate`].
pub trait Entity {
  fn core(&self) -> &EntityCore;

  fn id(&self) -> &str {
    self.core().id()
  }

  fn collection(&self) -> &str {
    self.core().collection()
  }

  fn kind(&self) -> EntityKind {
    self.core().kind()
  }

  fn get_field(&self, name: &str) -> Option<String> {
    self.core().fields().get_field(name)
  }

  fn get_field_list(&self, name: &str) -> Option<Vec<String>> {
    self.core().fields().get_field_list(name)
  }

  fn set_field(&self, name: &str, value: FieldValue) {
    self.core().fields().set(name, value);
  }

  /// Estado tri-valor: `None` mientras nadie lo haya fijado ni hidratado.
  fn recommendable(&self) -> Option<bool> {
    self.get_field("recommendable").map(|raw| parse_flag(&raw))
  }

  fn is_recommendable(&self) -> bool {
    self.recommendable().unwrap_or(false)
  }

  fn set_recommendable(&self, value: bool) {
    self.set_field("recommendable", FieldValue::Scalar(value.to_string()));
  }

  fn mbid(&self) -> String {
    self.get_field(self.kind().mbid_field()).unwrap_or_default()
  }

  /// Enlaces externos presentes, cada uno normalizado a lista.
  fn links(&self) -> BTreeMap<String, Vec<String>> {
    self
      .kind()
      .link_fields()
      .iter()
      .filter_map(|name| self.get_field_list(name).map(|urls| (name.to_string(), urls)))
      .collect()
  }

  fn seed(&self) -> Seed {
    Seed::new(self.collection(), self.kind(), self.id())
  }

  /// Trae la metadata del recurso si aún no está residente. Idempotente.
  fn hydrate(&self, transport: &dyn Transport) -> Result<(), CoreError> {
    let core = self.core();
    if core.fields().is_loaded() {
      return Ok(());
    }

    let path = core.resource_path();
    tracing::debug!(kind = %core.kind(), id = core.id(), path = %path, "hydrating entity metadata");

    let results = transport.fetch_metadata(core.kind().fetch_fields(), core.collection(), &path)?;
    let metadata = results.first().map(metadata_of).unwrap_or_default();
    core.fields().load(metadata);
    Ok(())
  }
}

/// `entity.metadata` de un registro de resultados, o vacío.
pub fn metadata_of(record: &Value) -> Metadata {
  record
    .get("entity")
    .and_then(|entity| entity.get("metadata"))
    .and_then(Value::as_object)
    .cloned()
    .unwrap_or_default()
}

/// Lee banderas que el servicio manda como bool, número o cadena.
pub fn parse_flag(raw: &str) -> bool {
  matches!(raw.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}

/// Número tolerante: vacío o mal formado vale `0.0`.
pub fn parse_number(raw: Option<&str>) -> f64 {
  raw.map(str::trim).filter(|s| !s.is_empty()).and_then(|s| s.parse().ok()).unwrap_or(0.0)
}
