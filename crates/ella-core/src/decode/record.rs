//! Decodificación de un único registro de resultados.
//!
//! Un registro tiene la forma
//! `{ "entity": { "id", "collection", "metadata": {...} }, "score" }`.
//! El resultado es una entidad enlazada, o bien una señal: `Skip` (registro
//! inservible, se ignora) o `Stop` (puntuación bajo el umbral, se corta el lote).

use std::rc::Rc;

use serde_json::Value;

use crate::config::ClientConfig;
use crate::domain::entity::{Entity, Scored, parse_number};
use crate::domain::field::{FieldValue, Metadata};
use crate::domain::{Album, Artist, Track};

/// Motivo por el que un registro se descarta. Nunca llega a quien llama.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SkipReason {
  #[error("record has no entity id")]
  MissingId,

  #[error("record has no artist_service_id")]
  MissingArtistId,

  #[error("record artist has no name")]
  MissingArtistName,
}

#[derive(Debug)]
pub enum RecordOutcome<T> {
  Decoded(Scored<T>),
  Skip(SkipReason),
  /// La iteración del lote debe terminar aquí.
  Stop { score: f64, threshold: f64 },
}

/// Lo que la decodificación de un lote comparte entre registros.
#[derive(Debug, Clone)]
pub struct DecodeContext {
  config: Rc<ClientConfig>,
  artist: Option<Rc<Artist>>,
  album: Option<Rc<Album>>,
  threshold: Option<f64>,
}

impl DecodeContext {
  pub fn new(config: Rc<ClientConfig>) -> Self {
    Self { config, artist: None, album: None, threshold: None }
  }

  /// Artista padre compartido: se reutiliza en vez de construir uno por registro.
  pub fn with_artist(mut self, artist: Rc<Artist>) -> Self {
    self.artist = Some(artist);
    self
  }

  pub fn with_album(mut self, album: Rc<Album>) -> Self {
    self.album = Some(album);
    self
  }

  pub fn with_threshold(mut self, threshold: f64) -> Self {
    self.threshold = Some(threshold);
    self
  }
}

/// Vista ya validada de un registro: `id` no vacío, metadata (o vacía).
#[derive(Debug)]
pub struct RecordView<'a> {
  pub id: &'a str,
  pub collection: &'a str,
  pub metadata: &'a Metadata,
}

impl RecordView<'_> {
  /// Campo de la metadata como texto; cadenas en blanco cuentan como ausentes.
  pub fn text(&self, name: &str) -> Option<String> {
    self
      .metadata
      .get(name)
      .and_then(FieldValue::from_json)
      .and_then(|value| value.as_scalar().map(ToOwned::to_owned))
      .filter(|text| !text.trim().is_empty())
  }

  fn copy_recommendable(&self, entity: &impl Entity) {
    if let Some(value) = self.metadata.get("recommendable").and_then(FieldValue::from_json) {
      entity.set_field("recommendable", value);
    }
  }
}

/// Entidades que saben construirse a partir de un registro validado.
pub trait FromRecord: Sized {
  fn from_record(record: &RecordView<'_>, ctx: &DecodeContext) -> Result<Self, SkipReason>;
}

/// Puntuación de un registro: número o cadena; ausente o vacía vale `0.0`.
pub fn parse_score(value: Option<&Value>) -> f64 {
  match value {
    Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
    Some(Value::String(s)) if s.trim().is_empty() => 0.0,
    Some(Value::String(s)) => s.trim().parse().unwrap_or_else(|_| {
      tracing::warn!(score = %s, "unparsable score, using 0.0");
      0.0
    }),
    _ => 0.0,
  }
}

pub fn decode_record<T: FromRecord>(record: &Value, ctx: &DecodeContext) -> RecordOutcome<T> {
  let score = parse_score(record.get("score"));
  if let Some(threshold) = ctx.threshold {
    if score < threshold {
      return RecordOutcome::Stop { score, threshold };
    }
  }

  let entity = record.get("entity");
  let Some(id) = entity.and_then(|e| e.get("id")).and_then(Value::as_str).filter(|id| !id.trim().is_empty())
  else {
    return RecordOutcome::Skip(SkipReason::MissingId);
  };
  let collection = entity.and_then(|e| e.get("collection")).and_then(Value::as_str).unwrap_or_default();

  let empty = Metadata::new();
  let metadata = entity.and_then(|e| e.get("metadata")).and_then(Value::as_object).unwrap_or(&empty);

  let view = RecordView { id, collection, metadata };
  match T::from_record(&view, ctx) {
    Ok(entity) => RecordOutcome::Decoded(Scored { entity, score }),
    Err(reason) => RecordOutcome::Skip(reason),
  }
}

/// Artista del registro: el padre compartido si lo hay; si no, uno nuevo
/// poblado con los campos de este mismo registro (sin otra petición).
fn resolve_artist(record: &RecordView<'_>, ctx: &DecodeContext) -> Result<Rc<Artist>, SkipReason> {
  if let Some(artist) = &ctx.artist {
    return Ok(Rc::clone(artist));
  }

  let artist_id = record.text("artist_service_id").ok_or(SkipReason::MissingArtistId)?;
  let name = record.text("artist").ok_or(SkipReason::MissingArtistName)?;

  let artist = Artist::new(artist_id, record.collection, Rc::clone(&ctx.config));
  artist.set_name(name);
  artist.set_location(record.text("artist_location").unwrap_or_default());
  artist.set_popularity(parse_number(record.text("artist_popularity").as_deref()));
  record.copy_recommendable(&artist);

  Ok(Rc::new(artist))
}

fn require_artist_id(record: &RecordView<'_>) -> Result<(), SkipReason> {
  record.text("artist_service_id").map(|_| ()).ok_or(SkipReason::MissingArtistId)
}

impl FromRecord for Track {
  fn from_record(record: &RecordView<'_>, ctx: &DecodeContext) -> Result<Self, SkipReason> {
    require_artist_id(record)?;
    let artist = resolve_artist(record, ctx)?;

    // la metadata del registro es la de la pista: título, audio, imágenes,
    // popularidad, enlaces y `recommendable` quedan residentes de una vez
    let track = Track::new(record.id, record.collection, Rc::clone(&ctx.config));
    track.core().fields().load(record.metadata.clone());
    track.set_artist(Rc::clone(&artist));

    match &ctx.album {
      Some(album) => track.set_album(Rc::clone(album)),
      None => {
        if let Some(album_id) = record.text("release_service_id") {
          let album = Album::new(album_id, record.collection, Rc::clone(&ctx.config));
          if let Some(title) = record.text("release") {
            album.set_title(title);
          }
          if let Some(image) = record.text("release_small_image") {
            album.set_image(image);
          }
          album.set_artist(artist);
          track.set_album(Rc::new(album));
        }
      }
    }

    Ok(track)
  }
}

impl FromRecord for Album {
  fn from_record(record: &RecordView<'_>, ctx: &DecodeContext) -> Result<Self, SkipReason> {
    require_artist_id(record)?;
    let artist = resolve_artist(record, ctx)?;

    let album = Album::new(record.id, record.collection, Rc::clone(&ctx.config));
    album.core().fields().load(record.metadata.clone());
    album.set_artist(artist);

    Ok(album)
  }
}

impl FromRecord for Artist {
  /// El registro es el propio artista: basta con el `id`. Un artista sin
  /// nombre se conserva con el resto de sus campos.
  fn from_record(record: &RecordView<'_>, ctx: &DecodeContext) -> Result<Self, SkipReason> {
    let artist = Artist::new(record.id, record.collection, Rc::clone(&ctx.config));
    artist.core().fields().load(record.metadata.clone());

    Ok(artist)
  }
}
