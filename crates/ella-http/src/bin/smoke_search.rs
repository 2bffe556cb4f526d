use std::error::Error;
use std::rc::Rc;

use ella_config::{detect_backend, load_client_config};
use ella_core::domain::Entity;
use ella_core::services::{SearchRequest, SimilarityQuery, TrackQuery, TrackSearch};
use ella_http::{HttpTransport, load_http_config};
use tracing_subscriber::EnvFilter;

// uso: smoke_search <colección> <consulta>
fn main() -> Result<(), Box<dyn Error>> {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

  let mut args = std::env::args().skip(1);
  let collection = args.next().unwrap_or_else(|| "bmat".to_string());
  let query = args.next().unwrap_or_else(|| "bjork".to_string());

  let backend = detect_backend()?;
  let client = Rc::new(load_client_config(&backend)?);
  let http = load_http_config(&backend)?;
  tracing::info!(base_url = %http.base_url, %collection, %query, "searching");

  let transport = HttpTransport::new(&http);
  let request = SearchRequest::new(collection, TrackQuery::text(query));
  let mut search = TrackSearch::open(&transport, request, Rc::clone(&client));

  let Some(tracks) = search.get_page(1)? else {
    println!("Sin resultados.");
    return Ok(());
  };

  println!("------------------------------------------------");
  for track in &tracks {
    println!("{} | {} | {}", track.id(), track.full_title(), track.album_title());
  }
  println!("------------------------------------------------");

  if let Some(first) = tracks.first() {
    if let Some(similar) = first.similar_tracks(&transport, &SimilarityQuery::default())? {
      println!("Similares a {}: {}", first.full_title(), similar.len());
      for track in similar {
        println!("  {} | {}", track.id(), track.full_title());
      }
    }
  }

  Ok(())
}
