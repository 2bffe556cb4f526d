use serde_json::Value;

use super::record::{DecodeContext, FromRecord, RecordOutcome, decode_record};
use crate::domain::entity::Scored;

/// Decodifica un array de resultados en orden, conservando las puntuaciones.
///
/// - `Skip`: el registro se omite y se sigue con el siguiente.
/// - `Stop`: se devuelve lo acumulado; los registros posteriores ni se miran.
///
/// El servicio ordena por puntuación descendente, así que cortar en el primer
/// registro bajo el umbral equivale a filtrar.
pub fn decode_scored<T: FromRecord>(results: &[Value], ctx: &DecodeContext) -> Vec<Scored<T>> {
  let mut decoded = Vec::with_capacity(results.len());

  for (position, record) in results.iter().enumerate() {
    match decode_record::<T>(record, ctx) {
      RecordOutcome::Decoded(scored) => decoded.push(scored),
      RecordOutcome::Skip(reason) => {
        tracing::debug!(position, %reason, "skipping malformed record");
      }
      RecordOutcome::Stop { score, threshold } => {
        tracing::debug!(position, score, threshold, "score below threshold, stopping batch");
        break;
      }
    }
  }

  decoded
}

/// Igual que [`decode_scored`], sin las puntuaciones.
pub fn decode_batch<T: FromRecord>(results: &[Value], ctx: &DecodeContext) -> Vec<T> {
  decode_scored(results, ctx).into_iter().map(|scored| scored.entity).collect()
}

#[cfg(test)]
mod tests {
  use std::rc::Rc;

  use super::*;
  use crate::config::ClientConfig;
  use crate::domain::{Entity, Track};
  use serde_json::json;

  fn ctx() -> DecodeContext {
    DecodeContext::new(Rc::new(ClientConfig::default()))
  }

  fn track(id: &str, score: f64) -> Value {
    json!({
      "entity": { "id": id, "collection": "bmat", "metadata": { "artist_service_id": "a1", "artist": "X", "track": id } },
      "score": score.to_string(),
    })
  }

  fn ids(tracks: &[Track]) -> Vec<&str> {
    tracks.iter().map(|t| t.id()).collect()
  }

  #[test]
  fn empty_input_gives_empty_output() {
    assert!(decode_batch::<Track>(&[], &ctx()).is_empty());
  }

  #[test]
  fn stops_at_first_score_below_threshold() {
    let results = vec![
      json!({ "entity": { "id": "t1", "collection": "c", "metadata": { "artist_service_id": "a1", "artist": "X", "track": "Song" } }, "score": "0.9" }),
      json!({ "entity": { "id": "", "collection": "c", "metadata": { "artist_service_id": "a1", "artist": "X" } }, "score": "0.8" }),
      json!({ "entity": { "id": "t2", "collection": "c", "metadata": { "artist_service_id": "a1", "artist": "X" } }, "score": "0.1" }),
    ];

    let tracks = decode_batch::<Track>(&results, &ctx().with_threshold(0.5));

    assert_eq!(ids(&tracks), vec!["t1"]);
  }

  #[test]
  fn keeps_prefix_at_or_above_threshold_in_order() {
    let results = vec![track("t1", 0.95), track("t2", 0.7), track("t3", 0.6), track("t4", 0.59), track("t5", 0.9)];

    let tracks = decode_batch::<Track>(&results, &ctx().with_threshold(0.6));

    // t5 no se evalúa aunque su puntuación supere el umbral
    assert_eq!(ids(&tracks), vec!["t1", "t2", "t3"]);
  }

  #[test]
  fn malformed_record_does_not_truncate() {
    let results = vec![
      track("t1", 0.9),
      json!({ "entity": { "id": "bad", "collection": "bmat", "metadata": {} }, "score": "0.85" }),
      json!({ "entity": { "id": "  " }, "score": 0.82 }),
      track("t2", 0.8),
    ];

    let scored = decode_scored::<Track>(&results, &ctx().with_threshold(0.5));

    assert_eq!(scored.iter().map(|s| s.entity.id()).collect::<Vec<_>>(), vec!["t1", "t2"]);
    assert_eq!(scored[1].score, 0.8);
  }

  #[test]
  fn without_threshold_nothing_stops() {
    let results = vec![track("t1", 0.9), track("t2", 0.0), track("t3", 0.5)];

    assert_eq!(decode_batch::<Track>(&results, &ctx()).len(), 3);
  }

  #[test]
  fn all_skipped_is_empty_not_error() {
    let results = vec![json!({ "score": 1 }), json!({ "entity": { "id": "t1" }, "score": 1 })];

    assert!(decode_batch::<Track>(&results, &ctx()).is_empty());
  }
}
