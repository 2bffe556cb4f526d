// crates/ella-core/src/errors.rs
use thiserror::Error;

use crate::ports::transport::TransportError;

/// Error genérico del núcleo de Ella.
///
/// Sólo los fallos de transporte llegan hasta aquí: los registros mal formados
/// se descartan durante la decodificación y nunca se convierten en error.
#[derive(Debug, Error)]
pub enum CoreError {
  #[error("transport error: {0}")]
  Transport(#[from] TransportError),
}
