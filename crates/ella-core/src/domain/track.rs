use std::cell::RefCell;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use super::album::Album;
use super::artist::Artist;
use super::entity::{Entity, EntityCore, EntityKind, parse_number};
use super::field::FieldValue;
use crate::config::ClientConfig;
use crate::decode::{DecodeContext, decode_batch};
use crate::errors::CoreError;
use crate::ports::transport::{Transport, results_of};
use crate::services::similarity::{SimilarityQuery, similarity_params};

/// Una pista del catálogo.
///
/// No es dueña de su artista ni de su álbum: guarda un `Rc` que puede venir
/// de quien la construye (instancia compartida) o crearse aquí a partir de
/// `artist_service_id` / `release_service_id` la primera vez que se pide.
/// Un padre fijado con `set_artist` / `set_album` nunca se vuelve a derivar.
#[derive(Debug)]
pub struct Track {
  core: EntityCore,
  artist: RefCell<Option<Rc<Artist>>>,
  album: RefCell<Option<Rc<Album>>>,
}

impl Track {
  pub fn new(id: impl Into<String>, collection: impl Into<String>, config: Rc<ClientConfig>) -> Self {
    Self {
      core: EntityCore::new(EntityKind::Track, id.into(), collection.into(), config),
      artist: RefCell::new(None),
      album: RefCell::new(None),
    }
  }

  /// Título: `name` y, si viene vacío, `track`.
  pub fn title(&self) -> String {
    self
      .get_field("name")
      .filter(|name| !name.is_empty())
      .or_else(|| self.get_field("track"))
      .unwrap_or_default()
  }

  pub fn set_title(&self, title: impl Into<String>) {
    self.set_field("name", FieldValue::Scalar(title.into()));
  }

  /// `"<artista> - <título>"`.
  pub fn full_title(&self) -> String {
    format!("{} - {}", self.artist_name(), self.title())
  }

  pub fn artist(&self) -> Option<Rc<Artist>> {
    if let Some(artist) = self.artist.borrow().as_ref() {
      return Some(Rc::clone(artist));
    }

    let artist_id = self.get_field("artist_service_id").filter(|id| !id.trim().is_empty())?;
    let artist = Rc::new(Artist::new(artist_id, self.collection(), Rc::clone(self.core.config())));
    if let Some(name) = self.get_field("artist") {
      artist.set_name(name);
    }
    *self.artist.borrow_mut() = Some(Rc::clone(&artist));
    Some(artist)
  }

  pub fn set_artist(&self, artist: Rc<Artist>) {
    self.set_field("artist_service_id", FieldValue::Scalar(artist.id().to_string()));
    *self.artist.borrow_mut() = Some(artist);
  }

  pub fn artist_id(&self) -> String {
    self.get_field("artist_service_id").unwrap_or_default()
  }

  /// Nombre del artista: el del padre si lo conoce, si no el de la metadata.
  pub fn artist_name(&self) -> String {
    let from_parent = self.artist.borrow().as_ref().map(|artist| artist.name()).filter(|name| !name.is_empty());
    from_parent.or_else(|| self.get_field("artist")).unwrap_or_default()
  }

  pub fn album(&self) -> Option<Rc<Album>> {
    if let Some(album) = self.album.borrow().as_ref() {
      return Some(Rc::clone(album));
    }

    let album_id = self.get_field("release_service_id").filter(|id| !id.trim().is_empty())?;
    let album = Rc::new(Album::new(album_id, self.collection(), Rc::clone(self.core.config())));
    if let Some(title) = self.get_field("release") {
      album.set_title(title);
    }
    if let Some(artist) = self.artist() {
      album.set_artist(artist);
    }
    *self.album.borrow_mut() = Some(Rc::clone(&album));
    Some(album)
  }

  pub fn set_album(&self, album: Rc<Album>) {
    self.set_field("release_service_id", FieldValue::Scalar(album.id().to_string()));
    *self.album.borrow_mut() = Some(album);
  }

  pub fn album_id(&self) -> String {
    self.get_field("release_service_id").unwrap_or_default()
  }

  pub fn album_title(&self) -> String {
    let from_parent = self.album.borrow().as_ref().map(|album| album.title()).filter(|title| !title.is_empty());
    from_parent.or_else(|| self.get_field("release")).unwrap_or_default()
  }

  /// Ubicación del audio (`location`).
  pub fn audio(&self) -> String {
    self.get_field("location").unwrap_or_default()
  }

  pub fn set_audio(&self, audio: impl Into<String>) {
    self.set_field("location", FieldValue::Scalar(audio.into()));
  }

  /// Imágenes pequeñas; una cadena suelta cuenta como lista de uno.
  pub fn images(&self) -> Vec<String> {
    self.get_field_list("track_small_image").unwrap_or_default()
  }

  pub fn set_images(&self, images: FieldValue) {
    self.set_field("track_small_image", images);
  }

  pub fn popularity(&self) -> f64 {
    parse_number(self.get_field("track_popularity").as_deref())
  }

  pub fn set_popularity(&self, popularity: f64) {
    self.set_field("track_popularity", FieldValue::Scalar(popularity.to_string()));
  }

  /// Pistas similares a ésta.
  ///
  /// La propia pista es siempre la primera semilla. `Ok(None)` sin petición
  /// si no es recomendable.
  pub fn similar_tracks(
    &self,
    transport: &dyn Transport,
    query: &SimilarityQuery,
  ) -> Result<Option<Vec<Track>>, CoreError> {
    if !self.is_recommendable() {
      return Ok(None);
    }

    let config = self.core.config();
    let path = format!("/collections/{}/tracks/similar_to.json", self.collection());
    let params = similarity_params(&self.seed(), query, EntityKind::Track.fetch_fields(), config.similar_tracks_limit);

    let response = transport.request(&path, &params)?;
    let results = results_of(&response)?;
    let mut ctx = DecodeContext::new(Rc::clone(config));
    if let Some(threshold) = query.threshold {
      ctx = ctx.with_threshold(threshold);
    }

    Ok(Some(decode_batch(results, &ctx)))
  }
}

impl Entity for Track {
  fn core(&self) -> &EntityCore {
    &self.core
  }
}

impl PartialEq for Track {
  fn eq(&self, other: &Self) -> bool {
    self.core.id() == other.core.id()
  }
}

impl Eq for Track {}

impl PartialOrd for Track {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for Track {
  fn cmp(&self, other: &Self) -> Ordering {
    self.core.id().cmp(other.core.id())
  }
}

impl Hash for Track {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.core.id().hash(state);
  }
}
