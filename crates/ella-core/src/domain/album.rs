use std::cell::RefCell;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use super::artist::Artist;
use super::entity::{Entity, EntityCore, EntityKind, TRACK_FIELDS};
use super::field::FieldValue;
use super::track::Track;
use crate::config::ClientConfig;
use crate::decode::{DecodeContext, decode_batch};
use crate::errors::CoreError;
use crate::ports::transport::Transport;

/// Un lanzamiento (`release` para el servicio).
#[derive(Debug)]
pub struct Album {
  core: EntityCore,
  artist: RefCell<Option<Rc<Artist>>>,
}

impl Album {
  pub fn new(id: impl Into<String>, collection: impl Into<String>, config: Rc<ClientConfig>) -> Self {
    Self {
      core: EntityCore::new(EntityKind::Album, id.into(), collection.into(), config),
      artist: RefCell::new(None),
    }
  }

  /// Título: `release` y, si falta, `name`.
  pub fn title(&self) -> String {
    self
      .get_field("release")
      .filter(|title| !title.is_empty())
      .or_else(|| self.get_field("name"))
      .unwrap_or_default()
  }

  pub fn set_title(&self, title: impl Into<String>) {
    self.set_field("release", FieldValue::Scalar(title.into()));
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

  pub fn image(&self) -> String {
    self.get_field("release_small_image").unwrap_or_default()
  }

  pub fn set_image(&self, image: impl Into<String>) {
    self.set_field("release_small_image", FieldValue::Scalar(image.into()));
  }

  /// Pistas del lanzamiento. Comparten este álbum y, si se conoce, su artista.
  pub fn tracks(self: &Rc<Self>, transport: &dyn Transport) -> Result<Vec<Track>, CoreError> {
    let path = format!("/releases/{}/tracks.json", self.id());
    let results = transport.fetch_metadata(TRACK_FIELDS, self.collection(), &path)?;

    let mut ctx = DecodeContext::new(Rc::clone(self.core.config())).with_album(Rc::clone(self));
    if let Some(artist) = self.artist() {
      ctx = ctx.with_artist(artist);
    }

    Ok(decode_batch(&results, &ctx))
  }
}

impl Entity for Album {
  fn core(&self) -> &EntityCore {
    &self.core
  }
}

impl PartialEq for Album {
  fn eq(&self, other: &Self) -> bool {
    self.core.id() == other.core.id()
  }
}

impl Eq for Album {}

impl PartialOrd for Album {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for Album {
  fn cmp(&self, other: &Self) -> Ordering {
    self.core.id().cmp(other.core.id())
  }
}

impl Hash for Album {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.core.id().hash(state);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ports::SimTransport;
  use serde_json::json;

  #[test]
  fn tracks_share_album_and_artist() {
    let config = Rc::new(ClientConfig::default());
    let sim = SimTransport::new().with_metadata(
      "bmat",
      "/releases/r1/tracks.json",
      vec![json!({ "entity": { "id": "t1", "collection": "bmat", "metadata": {
        "artist_service_id": "a1",
        "track": "Venus as a Boy",
        "release_service_id": "other-release",
      } } })],
    );
    let artist = Rc::new(Artist::new("a1", "bmat", Rc::clone(&config)));
    artist.set_name("Björk");
    let album = Rc::new(Album::new("r1", "bmat", Rc::clone(&config)));
    album.set_title("Debut");
    album.set_artist(Rc::clone(&artist));

    let tracks = album.tracks(&sim).unwrap();

    assert_eq!(tracks.len(), 1);
    assert!(Rc::ptr_eq(&tracks[0].album().unwrap(), &album));
    assert!(Rc::ptr_eq(&tracks[0].artist().unwrap(), &artist));
    assert_eq!(tracks[0].album_title(), "Debut");
  }

  #[test]
  fn title_prefers_release_field() {
    let album = Album::new("r1", "bmat", Rc::new(ClientConfig::default()));
    album.core().fields().load(json!({ "name": "Fallback" }).as_object().cloned().unwrap());

    assert_eq!(album.title(), "Fallback");

    album.set_title("Post");
    assert_eq!(album.title(), "Post");
  }
}
